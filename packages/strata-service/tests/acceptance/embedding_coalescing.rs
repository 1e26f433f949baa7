use strata_service::entries;

use super::support;

/// S6: three rapid updates on one entry enqueue a job each, but earlier pending jobs are marked
/// superseded as soon as a newer one lands — so draining the queue ever processes exactly one job,
/// and it references the latest version.
#[tokio::test]
async fn rapid_updates_coalesce_to_one_claimable_job() {
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
			name: "hot-entry",
			category: None,
			priority: None,
			content: "u1",
			rationale: None,
			examples: None,
			parameters: None,
			created_by: Some("agent-1"),
		},
	)
	.await
	.expect("add entry");

	let u2 = entries::update(
		&service,
		entries::UpdateEntryRequest {
			agent_id: "agent-1",
			kind: "knowledge",
			entry_id: entry.id,
			expected_version_id: v1.id,
			content: "u2",
			rationale: None,
			examples: None,
			parameters: None,
			change_reason: None,
			created_by: Some("agent-1"),
		},
	)
	.await
	.expect("update to u2");

	let (_, u2_version) = u2;

	let u3 = entries::update(
		&service,
		entries::UpdateEntryRequest {
			agent_id: "agent-1",
			kind: "knowledge",
			entry_id: entry.id,
			expected_version_id: u2_version.id,
			content: "u3",
			rationale: None,
			examples: None,
			parameters: None,
			change_reason: None,
			created_by: Some("agent-1"),
		},
	)
	.await
	.expect("update to u3");

	let (_, u3_version) = u3;

	let claimed = strata_storage::embedding_jobs::claim_batch(&service.db, 10, 30).await.expect("claim batch");

	assert_eq!(claimed.len(), 1);
	assert_eq!(claimed[0].version_id, u3_version.id);

	let vector = pgvector::Vector::from(vec![0.1_f32; 8]);
	let applied = strata_storage::vector::upsert_embedding_if_current(
		&service.db,
		"knowledge",
		entry.id,
		u3_version.id,
		&vector,
		"test-model",
		"test-provider",
	)
	.await
	.expect("upsert embedding");

	assert!(applied);

	strata_storage::embedding_jobs::mark_done(&service.db, claimed[0].id).await.expect("mark done");

	let again = strata_storage::embedding_jobs::claim_batch(&service.db, 10, 30).await.expect("claim batch again");

	assert!(again.is_empty());

	db.cleanup().await.expect("cleanup");
}
