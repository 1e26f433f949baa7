use uuid::Uuid;

use crate::{Result, db::Db, error::Error, models::PermissionGrant};

pub struct NewGrant<'a> {
	pub agent_id: &'a str,
	pub scope_type: &'a str,
	pub scope_id: Option<Uuid>,
	pub entry_type: Option<&'a str>,
	pub level: &'a str,
	pub granted_by: Option<&'a str>,
	pub expires_at: Option<time::OffsetDateTime>,
}

pub async fn create_grant(db: &Db, grant: NewGrant<'_>) -> Result<PermissionGrant> {
	let row = sqlx::query_as(
		"INSERT INTO permission_grants \
		 (agent_id, scope_type, scope_id, entry_type, level, granted_by, expires_at) \
		 VALUES ($1,$2,$3,$4,$5,$6,$7) RETURNING *",
	)
	.bind(grant.agent_id)
	.bind(grant.scope_type)
	.bind(grant.scope_id)
	.bind(grant.entry_type)
	.bind(grant.level)
	.bind(grant.granted_by)
	.bind(grant.expires_at)
	.fetch_one(&db.pool)
	.await?;

	Ok(row)
}

pub async fn revoke_grant(db: &Db, id: Uuid) -> Result<()> {
	let result = sqlx::query("DELETE FROM permission_grants WHERE id = $1").bind(id).execute(&db.pool).await?;

	if result.rows_affected() == 0 {
		return Err(Error::NotFound(format!("permission grant {id}")));
	}

	Ok(())
}

/// Grants covering any scope in `scope_chain` (including the global sentinel `None`) and not yet
/// expired. Callers intersect this with the requested entry type and access level.
pub async fn grants_for_agent(
	db: &Db,
	agent_id: &str,
	scope_chain: &[(String, Option<Uuid>)],
) -> Result<Vec<PermissionGrant>> {
	let mut grants = Vec::new();

	for (scope_type, scope_id) in scope_chain {
		let mut rows: Vec<PermissionGrant> = sqlx::query_as(
			"SELECT * FROM permission_grants \
			 WHERE agent_id = $1 AND scope_type = $2 AND scope_id IS NOT DISTINCT FROM $3 \
			 AND (expires_at IS NULL OR expires_at > now())",
		)
		.bind(agent_id)
		.bind(scope_type)
		.bind(scope_id)
		.fetch_all(&db.pool)
		.await?;

		grants.append(&mut rows);
	}

	Ok(grants)
}
