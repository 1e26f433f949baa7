use strata_service::{Error, entries, relations};

use super::support;

async fn add_entry(service: &strata_service::StrataService, name: &str) -> uuid::Uuid {
	let (entry, _) = entries::add(
		service,
		entries::AddEntryRequest {
			agent_id: "agent-1",
			kind: "tool",
			scope_type: "global",
			scope_id: None,
			name,
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

	entry.id
}

/// §8 property 8: a relation that would close a cycle over a hierarchical type is rejected.
#[tokio::test]
async fn subtask_of_cycle_is_rejected() {
	let Some(db) = support::test_db().await else {
		eprintln!("skipping: STRATA_PG_DSN not set");
		return;
	};

	let cfg = support::test_config(db.dsn().to_string(), 8);
	let service = support::build_service(cfg).await.expect("build service");

	let a = add_entry(&service, "task-a").await;
	let b = add_entry(&service, "task-b").await;
	let c = add_entry(&service, "task-c").await;

	relations::create(&service, "tool", a, "tool", b, "subtask_of").await.expect("a subtask_of b");
	relations::create(&service, "tool", b, "tool", c, "subtask_of").await.expect("b subtask_of c");

	let result = relations::create(&service, "tool", c, "tool", a, "subtask_of").await;

	assert!(matches!(result, Err(Error::InvalidArgument(_))));

	db.cleanup().await.expect("cleanup");
}

/// §6 `relation.list`/`relation.delete`: a non-hierarchical relation shows up on both the source's
/// outgoing list and the target's incoming list, and disappears from both after deletion.
#[tokio::test]
async fn relation_appears_on_both_sides_and_is_removed_on_delete() {
	let Some(db) = support::test_db().await else {
		eprintln!("skipping: STRATA_PG_DSN not set");
		return;
	};

	let cfg = support::test_config(db.dsn().to_string(), 8);
	let service = support::build_service(cfg).await.expect("build service");

	let a = add_entry(&service, "task-a").await;
	let b = add_entry(&service, "task-b").await;

	let relation = relations::create(&service, "tool", a, "tool", b, "depends_on").await.expect("a depends_on b");

	let outgoing = relations::list_outgoing(&service, "tool", a).await.expect("list outgoing");
	let incoming = relations::list_incoming(&service, "tool", b).await.expect("list incoming");

	assert_eq!(outgoing.len(), 1);
	assert_eq!(outgoing[0].target_id, b);
	assert_eq!(incoming.len(), 1);
	assert_eq!(incoming[0].source_id, a);

	relations::delete(&service, relation.id).await.expect("delete relation");

	let outgoing_after = relations::list_outgoing(&service, "tool", a).await.expect("list outgoing after delete");
	let incoming_after = relations::list_incoming(&service, "tool", b).await.expect("list incoming after delete");

	assert!(outgoing_after.is_empty());
	assert!(incoming_after.is_empty());

	db.cleanup().await.expect("cleanup");
}
