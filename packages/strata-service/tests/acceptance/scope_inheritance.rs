use strata_service::{entries, query, scopes};

use super::support;

/// S1: a guideline at `global` scope is visible from a nested session scope when `inherit=true`.
#[tokio::test]
async fn guideline_at_global_is_visible_from_session_with_inherit() {
	let Some(db) = support::test_db().await else {
		eprintln!("skipping: STRATA_PG_DSN not set");
		return;
	};

	let cfg = support::test_config(db.dsn().to_string(), 8);
	let service = support::build_service(cfg).await.expect("build service");

	let org = scopes::create_organization(&service, "acme").await.expect("create org");
	let project = scopes::create_project(&service, Some(org.id), "widgets", None, None).await.expect("create project");
	let session = scopes::start_session(&service, Some(project.id), None, None, Some("agent-1")).await.expect("start session");

	entries::add(
		&service,
		entries::AddEntryRequest {
			agent_id: "agent-1",
			kind: "guideline",
			scope_type: "global",
			scope_id: None,
			name: "use-tls",
			category: None,
			priority: None,
			content: "Always use TLS for outbound calls.",
			rationale: None,
			examples: None,
			parameters: None,
			created_by: Some("agent-1"),
		},
	)
	.await
	.expect("add guideline");

	let response = query::execute(
		&service,
		"agent-1",
		query::QuerySpec {
			types: vec!["guideline".to_string()],
			scope_type: "session".to_string(),
			scope_id: Some(session.id),
			inherit: true,
			tags: query::TagFilter::default(),
			search: None,
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

	assert!(response.results.iter().any(|item| item.entry.name == "use-tls" && item.entry.scope_type == "global"));

	db.cleanup().await.expect("cleanup");
}
