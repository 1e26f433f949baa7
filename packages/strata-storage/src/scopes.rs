use uuid::Uuid;

use crate::{Result, db::Db, error::Error, models::{Organization, Project, Session}};

pub async fn create_organization(db: &Db, name: &str) -> Result<Organization> {
	let row = sqlx::query_as("INSERT INTO organizations (name) VALUES ($1) RETURNING *")
		.bind(name)
		.fetch_one(&db.pool)
		.await?;

	Ok(row)
}

pub async fn create_project(
	db: &Db,
	org_id: Option<Uuid>,
	name: &str,
	description: Option<&str>,
	root_path: Option<&str>,
) -> Result<Project> {
	let row = sqlx::query_as(
		"INSERT INTO projects (org_id, name, description, root_path) VALUES ($1,$2,$3,$4) RETURNING *",
	)
	.bind(org_id)
	.bind(name)
	.bind(description)
	.bind(root_path)
	.fetch_one(&db.pool)
	.await?;

	Ok(row)
}

pub async fn create_session(
	db: &Db,
	project_id: Option<Uuid>,
	name: Option<&str>,
	purpose: Option<&str>,
	agent_id: Option<&str>,
) -> Result<Session> {
	let row = sqlx::query_as(
		"INSERT INTO sessions (project_id, name, purpose, agent_id) VALUES ($1,$2,$3,$4) RETURNING *",
	)
	.bind(project_id)
	.bind(name)
	.bind(purpose)
	.bind(agent_id)
	.fetch_one(&db.pool)
	.await?;

	Ok(row)
}

pub async fn list_organizations(db: &Db) -> Result<Vec<Organization>> {
	let rows = sqlx::query_as("SELECT * FROM organizations ORDER BY created_at DESC").fetch_all(&db.pool).await?;

	Ok(rows)
}

pub async fn list_projects(db: &Db, org_id: Option<Uuid>) -> Result<Vec<Project>> {
	let rows = match org_id {
		Some(org_id) => {
			sqlx::query_as("SELECT * FROM projects WHERE org_id = $1 ORDER BY created_at DESC").bind(org_id).fetch_all(&db.pool).await?
		},
		None => sqlx::query_as("SELECT * FROM projects ORDER BY created_at DESC").fetch_all(&db.pool).await?,
	};

	Ok(rows)
}

pub async fn list_sessions(db: &Db, project_id: Option<Uuid>) -> Result<Vec<Session>> {
	let rows = match project_id {
		Some(project_id) => {
			sqlx::query_as("SELECT * FROM sessions WHERE project_id = $1 ORDER BY started_at DESC")
				.bind(project_id)
				.fetch_all(&db.pool)
				.await?
		},
		None => sqlx::query_as("SELECT * FROM sessions ORDER BY started_at DESC").fetch_all(&db.pool).await?,
	};

	Ok(rows)
}

pub async fn get_organization(db: &Db, id: Uuid) -> Result<Organization> {
	sqlx::query_as("SELECT * FROM organizations WHERE id = $1")
		.bind(id)
		.fetch_optional(&db.pool)
		.await?
		.ok_or_else(|| Error::NotFound(format!("organization {id}")))
}

pub async fn get_project(db: &Db, id: Uuid) -> Result<Project> {
	sqlx::query_as("SELECT * FROM projects WHERE id = $1")
		.bind(id)
		.fetch_optional(&db.pool)
		.await?
		.ok_or_else(|| Error::NotFound(format!("project {id}")))
}

pub async fn get_session(db: &Db, id: Uuid) -> Result<Session> {
	sqlx::query_as("SELECT * FROM sessions WHERE id = $1")
		.bind(id)
		.fetch_optional(&db.pool)
		.await?
		.ok_or_else(|| Error::NotFound(format!("session {id}")))
}

/// Walks a session up to its project and organization, in that order, for scope-chain expansion.
pub async fn ancestor_chain(
	db: &Db,
	scope_type: &str,
	scope_id: Uuid,
) -> Result<Vec<(String, Option<Uuid>)>> {
	let mut chain = vec![(scope_type.to_string(), Some(scope_id))];

	match scope_type {
		"session" => {
			let session = get_session(db, scope_id).await?;

			if let Some(project_id) = session.project_id {
				chain.extend(ancestor_chain(db, "project", project_id).await?);
			} else {
				chain.push(("global".to_string(), None));
			}
		},
		"project" => {
			let project = get_project(db, scope_id).await?;

			if let Some(org_id) = project.org_id {
				chain.push(("org".to_string(), Some(org_id)));
				chain.push(("global".to_string(), None));
			} else {
				chain.push(("global".to_string(), None));
			}
		},
		"org" => chain.push(("global".to_string(), None)),
		_ => {},
	}

	Ok(chain)
}
