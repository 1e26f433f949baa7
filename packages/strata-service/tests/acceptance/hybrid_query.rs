use strata_service::{entries, query};

use super::support;

async fn add_knowledge(service: &strata_service::StrataService, name: &str, content: &str) {
	entries::add(
		service,
		entries::AddEntryRequest {
			agent_id: "agent-1",
			kind: "knowledge",
			scope_type: "global",
			scope_id: None,
			name,
			category: None,
			priority: None,
			content,
			rationale: None,
			examples: None,
			parameters: None,
			created_by: Some("agent-1"),
		},
	)
	.await
	.expect("add knowledge");
}

/// S3: lexical search on a distinctive token ranks the entry containing that token first.
#[tokio::test]
async fn lexical_search_ranks_matching_term_first() {
	let Some(db) = support::test_db().await else {
		eprintln!("skipping: STRATA_PG_DSN not set");
		return;
	};

	let cfg = support::test_config(db.dsn().to_string(), 8);
	let service = support::build_service(cfg).await.expect("build service");

	add_knowledge(&service, "token-expiry", "tokens expire after 24 hours").await;
	add_knowledge(&service, "rate-limit", "1000 requests per minute").await;

	let response = query::execute(
		&service,
		"agent-1",
		query::QuerySpec {
			types: vec!["knowledge".to_string()],
			scope_type: "global".to_string(),
			scope_id: None,
			inherit: false,
			tags: query::TagFilter::default(),
			search: Some("token".to_string()),
			related_to: None,
			limit: 10,
			cursor: None,
			compact: false,
			include_inactive: false,
			include_versions: false,
		},
	)
	.await
	.expect("query");

	assert!(!response.results.is_empty());
	assert_eq!(response.results[0].entry.name, "token-expiry");

	db.cleanup().await.expect("cleanup");
}
