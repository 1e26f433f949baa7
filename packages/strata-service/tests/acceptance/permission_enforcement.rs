use strata_service::{access, permissions};

use super::support;

/// §4.I: in strict mode an agent with no grant is denied, a grant at the exact scope allows it, and
/// revoking the grant denies it again.
#[tokio::test]
async fn strict_mode_denies_without_grant_and_allows_after() {
	let Some(db) = support::test_db().await else {
		eprintln!("skipping: STRATA_PG_DSN not set");
		return;
	};

	let mut cfg = support::test_config(db.dsn().to_string(), 8);
	cfg.security.permission_mode = "strict".to_string();
	let service = support::build_service(cfg).await.expect("build service");

	let denied = access::check(&service, "agent-1", "global", None, "knowledge", access::Level::Write).await;

	assert!(matches!(denied, Err(strata_service::Error::PermissionDenied(_))));

	let grant = permissions::grant(
		&service,
		permissions::GrantRequest {
			agent_id: "agent-1",
			scope_type: "global",
			scope_id: None,
			entry_type: None,
			level: "write",
			granted_by: Some("admin"),
			expires_at: None,
		},
	)
	.await
	.expect("grant permission");

	access::check(&service, "agent-1", "global", None, "knowledge", access::Level::Write).await.expect("now allowed");

	assert!(!permissions::check(&service, "agent-1", "global", None, "knowledge", "admin").await.expect("check admin level"));

	permissions::revoke(&service, grant.id).await.expect("revoke permission");

	let denied_again = access::check(&service, "agent-1", "global", None, "knowledge", access::Level::Write).await;

	assert!(matches!(denied_again, Err(strata_service::Error::PermissionDenied(_))));

	db.cleanup().await.expect("cleanup");
}

/// A grant scoped to one entry type does not cover a query against a different entry type.
#[tokio::test]
async fn grant_scoped_to_entry_type_does_not_leak_to_others() {
	let Some(db) = support::test_db().await else {
		eprintln!("skipping: STRATA_PG_DSN not set");
		return;
	};

	let mut cfg = support::test_config(db.dsn().to_string(), 8);
	cfg.security.permission_mode = "strict".to_string();
	let service = support::build_service(cfg).await.expect("build service");

	permissions::grant(
		&service,
		permissions::GrantRequest {
			agent_id: "agent-1",
			scope_type: "global",
			scope_id: None,
			entry_type: Some("knowledge"),
			level: "write",
			granted_by: Some("admin"),
			expires_at: None,
		},
	)
	.await
	.expect("grant permission");

	access::check(&service, "agent-1", "global", None, "knowledge", access::Level::Write).await.expect("covered type allowed");

	let other_type = access::check(&service, "agent-1", "global", None, "tool", access::Level::Write).await;

	assert!(matches!(other_type, Err(strata_service::Error::PermissionDenied(_))));

	db.cleanup().await.expect("cleanup");
}
