use std::collections::BTreeMap;

use reqwest::header::AUTHORIZATION;

#[test]
fn builds_bearer_auth_header() {
	let headers = strata_providers::auth_headers("secret", &BTreeMap::new())
		.expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");

	assert_eq!(value, "Bearer secret");
}

#[test]
fn merges_default_headers() {
	let mut defaults = BTreeMap::new();

	defaults.insert("x-org-id".to_string(), "acme".to_string());

	let headers =
		strata_providers::auth_headers("secret", &defaults).expect("Failed to build headers.");

	assert_eq!(headers.get("x-org-id").unwrap(), "acme");
}
