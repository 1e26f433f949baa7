use strata_service::{scopes, tags};

use super::support;

/// §6 `org.list`/`project.list`/`session.list`: each listing call returns only rows under the
/// given parent, and an absent parent filter returns everything.
#[tokio::test]
async fn org_project_session_listings_filter_by_parent() {
	let Some(db) = support::test_db().await else {
		eprintln!("skipping: STRATA_PG_DSN not set");
		return;
	};

	let cfg = support::test_config(db.dsn().to_string(), 8);
	let service = support::build_service(cfg).await.expect("build service");

	let org_a = scopes::create_organization(&service, "org-a").await.expect("create org-a");
	let org_b = scopes::create_organization(&service, "org-b").await.expect("create org-b");

	let project_a = scopes::create_project(&service, Some(org_a.id), "project-a", None, None).await.expect("create project-a");
	scopes::create_project(&service, Some(org_b.id), "project-b", None, None).await.expect("create project-b");

	scopes::start_session(&service, Some(project_a.id), Some("session-a"), None, None).await.expect("start session-a");
	scopes::start_session(&service, None, Some("session-orphan"), None, None).await.expect("start session-orphan");

	let all_orgs = scopes::list_organizations(&service).await.expect("list all orgs");

	assert_eq!(all_orgs.len(), 2);

	let projects_under_a = scopes::list_projects(&service, Some(org_a.id)).await.expect("list projects under org-a");

	assert_eq!(projects_under_a.len(), 1);
	assert_eq!(projects_under_a[0].name, "project-a");

	let all_projects = scopes::list_projects(&service, None).await.expect("list all projects");

	assert_eq!(all_projects.len(), 2);

	let sessions_under_a = scopes::list_sessions(&service, Some(project_a.id)).await.expect("list sessions under project-a");

	assert_eq!(sessions_under_a.len(), 1);
	assert_eq!(sessions_under_a[0].name.as_deref(), Some("session-a"));

	let all_sessions = scopes::list_sessions(&service, None).await.expect("list all sessions");

	assert_eq!(all_sessions.len(), 2);

	let renamed = scopes::update_organization(&service, org_a.id, "org-a-renamed").await.expect("rename org-a");

	assert_eq!(renamed.name, "org-a-renamed");

	db.cleanup().await.expect("cleanup");
}

/// §6 `tag.list`: lists every tag regardless of attachment, distinct from the query-time
/// tag-to-entry-id lookup used internally by the hybrid query pipeline.
#[tokio::test]
async fn tag_list_all_returns_every_created_tag() {
	let Some(db) = support::test_db().await else {
		eprintln!("skipping: STRATA_PG_DSN not set");
		return;
	};

	let cfg = support::test_config(db.dsn().to_string(), 8);
	let service = support::build_service(cfg).await.expect("build service");

	tags::create_tag(&service, "security", "domain").await.expect("create security tag");
	tags::create_tag(&service, "performance", "domain").await.expect("create performance tag");

	let all_tags = tags::list_all(&service).await.expect("list all tags");
	let names: Vec<&str> = all_tags.iter().map(|tag| tag.name.as_str()).collect();

	assert!(names.contains(&"security"));
	assert!(names.contains(&"performance"));

	db.cleanup().await.expect("cleanup");
}
