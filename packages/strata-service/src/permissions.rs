use uuid::Uuid;

use crate::{Error, Result, StrataService, access};

const LEVELS: &[&str] = &["read", "write", "admin"];

pub struct GrantRequest<'a> {
	pub agent_id: &'a str,
	pub scope_type: &'a str,
	pub scope_id: Option<Uuid>,
	pub entry_type: Option<&'a str>,
	pub level: &'a str,
	pub granted_by: Option<&'a str>,
	pub expires_at: Option<time::OffsetDateTime>,
}

pub async fn grant(service: &StrataService, request: GrantRequest<'_>) -> Result<strata_storage::models::PermissionGrant> {
	if !LEVELS.contains(&request.level) {
		return Err(Error::InvalidArgument(format!("unknown permission level '{}'", request.level)));
	}

	let grant = strata_storage::permissions::NewGrant {
		agent_id: request.agent_id,
		scope_type: request.scope_type,
		scope_id: request.scope_id,
		entry_type: request.entry_type,
		level: request.level,
		granted_by: request.granted_by,
		expires_at: request.expires_at,
	};

	Ok(strata_storage::permissions::create_grant(&service.db, grant).await?)
}

pub async fn revoke(service: &StrataService, id: Uuid) -> Result<()> {
	strata_storage::permissions::revoke_grant(&service.db, id).await?;

	Ok(())
}

pub async fn check(
	service: &StrataService,
	agent_id: &str,
	scope_type: &str,
	scope_id: Option<Uuid>,
	entry_type: &str,
	level: &str,
) -> Result<bool> {
	let Some(required) = parse_level(level) else {
		return Err(Error::InvalidArgument(format!("unknown permission level '{level}'")));
	};

	match access::check(service, agent_id, scope_type, scope_id, entry_type, required).await {
		Ok(()) => Ok(true),
		Err(Error::PermissionDenied(_)) => Ok(false),
		Err(other) => Err(other),
	}
}

pub async fn list(service: &StrataService, agent_id: &str) -> Result<Vec<strata_storage::models::PermissionGrant>> {
	let rows = sqlx::query_as("SELECT * FROM permission_grants WHERE agent_id = $1 ORDER BY created_at DESC")
		.bind(agent_id)
		.fetch_all(&service.db.pool)
		.await
		.map_err(strata_storage::Error::from)?;

	Ok(rows)
}

fn parse_level(value: &str) -> Option<access::Level> {
	match value {
		"read" => Some(access::Level::Read),
		"write" => Some(access::Level::Write),
		"admin" => Some(access::Level::Admin),
		_ => None,
	}
}
