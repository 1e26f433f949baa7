use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

pub const INTENTS: &[&str] = &["lookup", "how_to", "debug", "explore", "compare", "configure"];

/// Classifies a free-text query into one of [`INTENTS`], used to select the adaptive-weight
/// bucket in the prioritization stage (§4.G). Falls back to `"lookup"` if the provider returns an
/// intent this build doesn't recognize.
pub async fn classify(cfg: &strata_config::ProviderConfig, query: &str) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"query": query,
		"labels": INTENTS,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_classify_response(json)
}

fn parse_classify_response(json: Value) -> Result<String> {
	let label = json
		.get("label")
		.or_else(|| json.get("intent"))
		.and_then(|v| v.as_str())
		.ok_or_else(|| eyre::eyre!("Classifier response is missing a label/intent field."))?;

	if INTENTS.contains(&label) {
		Ok(label.to_string())
	} else {
		Ok("lookup".to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn falls_back_to_lookup_for_unknown_label() {
		let json = serde_json::json!({ "label": "unrecognized" });

		assert_eq!(parse_classify_response(json).unwrap(), "lookup");
	}

	#[test]
	fn accepts_known_label() {
		let json = serde_json::json!({ "intent": "debug" });

		assert_eq!(parse_classify_response(json).unwrap(), "debug");
	}
}
