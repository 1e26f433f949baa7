use strata_service::{entries, query, tags};

use super::support;

/// S4: `tags.require` intersects, returning only the entry holding every required tag.
#[tokio::test]
async fn tag_require_filter_intersects_tag_sets() {
	let Some(db) = support::test_db().await else {
		eprintln!("skipping: STRATA_PG_DSN not set");
		return;
	};

	let cfg = support::test_config(db.dsn().to_string(), 8);
	let service = support::build_service(cfg).await.expect("build service");

	let (g1, _) = entries::add(
		&service,
		entries::AddEntryRequest {
			agent_id: "agent-1",
			kind: "guideline",
			scope_type: "global",
			scope_id: None,
			name: "g1",
			category: None,
			priority: None,
			content: "content g1",
			rationale: None,
			examples: None,
			parameters: None,
			created_by: Some("agent-1"),
		},
	)
	.await
	.expect("add g1");

	let (g2, _) = entries::add(
		&service,
		entries::AddEntryRequest {
			agent_id: "agent-1",
			kind: "guideline",
			scope_type: "global",
			scope_id: None,
			name: "g2",
			category: None,
			priority: None,
			content: "content g2",
			rationale: None,
			examples: None,
			parameters: None,
			created_by: Some("agent-1"),
		},
	)
	.await
	.expect("add g2");

	tags::attach(&service, "guideline", g1.id, "security", "domain").await.expect("attach security to g1");
	tags::attach(&service, "guideline", g1.id, "api", "domain").await.expect("attach api to g1");
	tags::attach(&service, "guideline", g2.id, "security", "domain").await.expect("attach security to g2");

	let response = query::execute(
		&service,
		"agent-1",
		query::QuerySpec {
			types: vec!["guideline".to_string()],
			scope_type: "global".to_string(),
			scope_id: None,
			inherit: false,
			tags: query::TagFilter { include: vec![], require: vec!["security".to_string(), "api".to_string()], exclude: vec![] },
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

	let names: Vec<&str> = response.results.iter().map(|item| item.entry.name.as_str()).collect();

	assert_eq!(names, vec!["g1"]);

	db.cleanup().await.expect("cleanup");
}

/// S4 (idempotency, §8 property 7): attaching the same tag twice yields one row; detaching an
/// unattached tag is a no-op.
#[tokio::test]
async fn tag_attach_is_idempotent() {
	let Some(db) = support::test_db().await else {
		eprintln!("skipping: STRATA_PG_DSN not set");
		return;
	};

	let cfg = support::test_config(db.dsn().to_string(), 8);
	let service = support::build_service(cfg).await.expect("build service");

	let (entry, _) = entries::add(
		&service,
		entries::AddEntryRequest {
			agent_id: "agent-1",
			kind: "guideline",
			scope_type: "global",
			scope_id: None,
			name: "g1",
			category: None,
			priority: None,
			content: "content",
			rationale: None,
			examples: None,
			parameters: None,
			created_by: Some("agent-1"),
		},
	)
	.await
	.expect("add entry");

	tags::attach(&service, "guideline", entry.id, "security", "domain").await.expect("attach 1");
	tags::attach(&service, "guideline", entry.id, "security", "domain").await.expect("attach 2");

	let attached = tags::for_entry(&service, "guideline", entry.id).await.expect("for_entry");

	assert_eq!(attached.len(), 1);

	tags::detach(&service, "guideline", entry.id, attached[0].id).await.expect("detach");
	tags::detach(&service, "guideline", entry.id, attached[0].id).await.expect("detach again is a no-op");

	let remaining = tags::for_entry(&service, "guideline", entry.id).await.expect("for_entry after detach");

	assert!(remaining.is_empty());

	db.cleanup().await.expect("cleanup");
}
