use strata_service::{admin, entries};

use super::support;

/// §3 Lifecycle "Destroy": reset requires both the correct admin credential and an explicit
/// confirm flag; the wrong key, a missing confirm, and finally the right combination behave
/// exactly as the three-way guard in `admin::reset` implies.
#[tokio::test]
async fn reset_requires_admin_key_and_confirm() {
	let Some(db) = support::test_db().await else {
		eprintln!("skipping: STRATA_PG_DSN not set");
		return;
	};

	let cfg = support::test_config(db.dsn().to_string(), 8);
	let service = support::build_service(cfg).await.expect("build service");

	entries::add(
		&service,
		entries::AddEntryRequest {
			agent_id: "agent-1",
			kind: "knowledge",
			scope_type: "global",
			scope_id: None,
			name: "pre-reset",
			category: None,
			priority: None,
			content: "will be truncated",
			rationale: None,
			examples: None,
			parameters: None,
			created_by: Some("agent-1"),
		},
	)
	.await
	.expect("add entry");

	let wrong_key = admin::reset(&service, "not-the-admin-key", true).await;

	assert!(matches!(wrong_key, Err(strata_service::Error::PermissionDenied(_))));

	let missing_confirm = admin::reset(&service, "test-admin-key", false).await;

	assert!(matches!(missing_confirm, Err(strata_service::Error::InvalidArgument(_))));

	let before = admin::status(&service).await.expect("status before reset");

	assert_eq!(before.entry_count, 1);

	admin::reset(&service, "test-admin-key", true).await.expect("reset with valid credential and confirm");

	let after = admin::status(&service).await.expect("status after reset");

	assert_eq!(after.entry_count, 0);

	db.cleanup().await.expect("cleanup");
}
