use uuid::Uuid;

use crate::{Error, Result, StrataService};

pub async fn create_organization(service: &StrataService, name: &str) -> Result<strata_storage::models::Organization> {
	if name.trim().is_empty() {
		return Err(Error::InvalidArgument("organization name must not be empty".to_string()));
	}

	Ok(strata_storage::scopes::create_organization(&service.db, name).await?)
}

pub async fn list_organizations(service: &StrataService) -> Result<Vec<strata_storage::models::Organization>> {
	Ok(strata_storage::scopes::list_organizations(&service.db).await?)
}

pub async fn update_organization(service: &StrataService, id: Uuid, name: &str) -> Result<strata_storage::models::Organization> {
	if name.trim().is_empty() {
		return Err(Error::InvalidArgument("organization name must not be empty".to_string()));
	}

	// Re-reading after an update keeps this handler forward-compatible with future
	// patchable fields without needing a separate storage-layer statement per field.
	sqlx::query("UPDATE organizations SET name = $1 WHERE id = $2")
		.bind(name)
		.bind(id)
		.execute(&service.db.pool)
		.await
		.map_err(strata_storage::Error::from)?;

	Ok(strata_storage::scopes::get_organization(&service.db, id).await?)
}

pub async fn create_project(
	service: &StrataService,
	org_id: Option<Uuid>,
	name: &str,
	description: Option<&str>,
	root_path: Option<&str>,
) -> Result<strata_storage::models::Project> {
	if name.trim().is_empty() {
		return Err(Error::InvalidArgument("project name must not be empty".to_string()));
	}

	if let Some(org_id) = org_id {
		strata_storage::scopes::get_organization(&service.db, org_id).await?;
	}

	Ok(strata_storage::scopes::create_project(&service.db, org_id, name, description, root_path).await?)
}

pub async fn get_project(service: &StrataService, id: Uuid) -> Result<strata_storage::models::Project> {
	Ok(strata_storage::scopes::get_project(&service.db, id).await?)
}

pub async fn list_projects(service: &StrataService, org_id: Option<Uuid>) -> Result<Vec<strata_storage::models::Project>> {
	Ok(strata_storage::scopes::list_projects(&service.db, org_id).await?)
}

pub async fn update_project(
	service: &StrataService,
	id: Uuid,
	description: Option<&str>,
	root_path: Option<&str>,
) -> Result<strata_storage::models::Project> {
	sqlx::query("UPDATE projects SET description = COALESCE($1, description), root_path = COALESCE($2, root_path) WHERE id = $3")
		.bind(description)
		.bind(root_path)
		.bind(id)
		.execute(&service.db.pool)
		.await
		.map_err(strata_storage::Error::from)?;

	Ok(strata_storage::scopes::get_project(&service.db, id).await?)
}

pub async fn start_session(
	service: &StrataService,
	project_id: Option<Uuid>,
	name: Option<&str>,
	purpose: Option<&str>,
	agent_id: Option<&str>,
) -> Result<strata_storage::models::Session> {
	if let Some(project_id) = project_id {
		strata_storage::scopes::get_project(&service.db, project_id).await?;
	}

	Ok(strata_storage::scopes::create_session(&service.db, project_id, name, purpose, agent_id).await?)
}

const SESSION_STATUSES: &[&str] = &["active", "paused", "completed", "discarded"];

pub async fn update_session_status(service: &StrataService, id: Uuid, status: &str) -> Result<strata_storage::models::Session> {
	if !SESSION_STATUSES.contains(&status) {
		return Err(Error::InvalidArgument(format!("unknown session status '{status}'")));
	}

	sqlx::query("UPDATE sessions SET status = $1 WHERE id = $2")
		.bind(status)
		.bind(id)
		.execute(&service.db.pool)
		.await
		.map_err(strata_storage::Error::from)?;

	Ok(strata_storage::scopes::get_session(&service.db, id).await?)
}

pub async fn end_session(service: &StrataService, id: Uuid) -> Result<strata_storage::models::Session> {
	sqlx::query("UPDATE sessions SET status = 'completed', ended_at = now() WHERE id = $1")
		.bind(id)
		.execute(&service.db.pool)
		.await
		.map_err(strata_storage::Error::from)?;

	Ok(strata_storage::scopes::get_session(&service.db, id).await?)
}

pub async fn get_session(service: &StrataService, id: Uuid) -> Result<strata_storage::models::Session> {
	Ok(strata_storage::scopes::get_session(&service.db, id).await?)
}

pub async fn list_sessions(service: &StrataService, project_id: Option<Uuid>) -> Result<Vec<strata_storage::models::Session>> {
	Ok(strata_storage::scopes::list_sessions(&service.db, project_id).await?)
}

/// Resolves the ancestor chain `[S, parent(S), ..., global]` used both for inheritance expansion
/// (§4.A) and permission checks (§4.I).
pub async fn ancestor_chain(
	service: &StrataService,
	scope_type: &str,
	scope_id: Option<Uuid>,
) -> Result<Vec<(String, Option<Uuid>)>> {
	match scope_id {
		Some(id) => Ok(strata_storage::scopes::ancestor_chain(&service.db, scope_type, id).await?),
		None => Ok(vec![("global".to_string(), None)]),
	}
}
