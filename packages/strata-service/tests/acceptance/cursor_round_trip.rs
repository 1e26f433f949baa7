use strata_service::{Error, entries, query};

use super::support;

async fn add_knowledge(service: &strata_service::StrataService, name: &str) {
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
			content: "shared content for pagination",
			rationale: None,
			examples: None,
			parameters: None,
			created_by: Some("agent-1"),
		},
	)
	.await
	.expect("add knowledge");
}

fn spec(limit: u32, cursor: Option<String>) -> query::QuerySpec {
	query::QuerySpec {
		types: vec!["knowledge".to_string()],
		scope_type: "global".to_string(),
		scope_id: None,
		inherit: false,
		tags: query::TagFilter::default(),
		search: None,
		related_to: None,
		limit,
		cursor,
		compact: false,
		include_inactive: false,
		include_versions: false,
	}
}

/// S5: paginating 25 entries at limit=10 returns 10/10/5 across three cursor-chained calls, and a
/// tampered cursor is rejected as `CursorInvalid`.
#[tokio::test]
async fn cursor_paginates_and_rejects_tampering() {
	let Some(db) = support::test_db().await else {
		eprintln!("skipping: STRATA_PG_DSN not set");
		return;
	};

	let cfg = support::test_config(db.dsn().to_string(), 8);
	let service = support::build_service(cfg).await.expect("build service");

	for i in 0..25 {
		add_knowledge(&service, &format!("entry-{i:02}")).await;
	}

	let page1 = query::execute(&service, "agent-1", spec(10, None)).await.expect("page 1");

	assert_eq!(page1.results.len(), 10);
	assert!(page1.meta.has_more);
	let cursor1 = page1.meta.next_cursor.clone().expect("page 1 cursor");

	let page2 = query::execute(&service, "agent-1", spec(10, Some(cursor1))).await.expect("page 2");

	assert_eq!(page2.results.len(), 10);
	assert!(page2.meta.has_more);
	let cursor2 = page2.meta.next_cursor.clone().expect("page 2 cursor");

	let page3 = query::execute(&service, "agent-1", spec(10, Some(cursor2))).await.expect("page 3");

	assert_eq!(page3.results.len(), 5);
	assert!(!page3.meta.has_more);

	let cursor3 = page1.meta.next_cursor.clone().expect("reuse page 1 cursor for tampering");
	let mut tampered = cursor3.into_bytes();
	let last = tampered.len() - 1;
	tampered[last] = if tampered[last] == b'A' { b'B' } else { b'A' };
	let tampered = String::from_utf8(tampered).expect("tampered cursor is still valid utf8");

	let result = query::execute(&service, "agent-1", spec(10, Some(tampered))).await;

	assert!(matches!(result, Err(Error::CursorInvalid)));

	db.cleanup().await.expect("cleanup");
}
