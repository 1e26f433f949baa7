use strata_service::entries;

use super::support;

/// S2: updating an entry's content appends a version; `history` is newest-first and `get` returns
/// the current content.
#[tokio::test]
async fn update_appends_version_and_history_is_newest_first() {
	let Some(db) = support::test_db().await else {
		eprintln!("skipping: STRATA_PG_DSN not set");
		return;
	};

	let cfg = support::test_config(db.dsn().to_string(), 8);
	let service = support::build_service(cfg).await.expect("build service");

	let (entry, v1) = entries::add(
		&service,
		entries::AddEntryRequest {
			agent_id: "agent-1",
			kind: "knowledge",
			scope_type: "global",
			scope_id: None,
			name: "retry-policy",
			category: None,
			priority: None,
			content: "v1",
			rationale: None,
			examples: None,
			parameters: None,
			created_by: Some("agent-1"),
		},
	)
	.await
	.expect("add entry");

	entries::update(
		&service,
		entries::UpdateEntryRequest {
			agent_id: "agent-1",
			kind: "knowledge",
			entry_id: entry.id,
			expected_version_id: v1.id,
			content: "v2",
			rationale: None,
			examples: None,
			parameters: None,
			change_reason: Some("clarify wording"),
			created_by: Some("agent-1"),
		},
	)
	.await
	.expect("update entry");

	let history = entries::history(&service, entry.id).await.expect("history");
	let version_nums: Vec<i32> = history.iter().map(|v| v.version_num).collect();

	assert_eq!(version_nums, vec![2, 1]);

	let current = entries::get(&service, entry.id).await.expect("get entry");

	assert_eq!(current.current_version_id, Some(history[0].id));

	let current_version = strata_storage::entries::get_current_version(&service.db, entry.id).await.expect("current version");

	assert_eq!(current_version.content, "v2");

	db.cleanup().await.expect("cleanup");
}
