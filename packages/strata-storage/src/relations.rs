use uuid::Uuid;

use crate::{Result, db::Db, error::Error, models::EntryRelation};

/// Relation types that form a hierarchy and must stay acyclic and loop-free (§4.B, §8 property 8).
const HIERARCHICAL_TYPES: &[&str] = &["parent_task", "subtask_of"];

pub async fn create_relation(
	db: &Db,
	source_type: &str,
	source_id: Uuid,
	target_type: &str,
	target_id: Uuid,
	relation_type: &str,
) -> Result<EntryRelation> {
	if HIERARCHICAL_TYPES.contains(&relation_type)
		&& source_type == target_type
		&& source_id == target_id
	{
		return Err(Error::InvalidArgument("a relation cannot link an entry to itself".into()));
	}

	if HIERARCHICAL_TYPES.contains(&relation_type)
		&& would_create_cycle(db, source_id, target_id, relation_type).await?
	{
		return Err(Error::InvalidArgument(format!(
			"relation would create a {relation_type} cycle"
		)));
	}

	let row = sqlx::query_as(
		"INSERT INTO entry_relations (source_type, source_id, target_type, target_id, relation_type) \
		 VALUES ($1,$2,$3,$4,$5) RETURNING *",
	)
	.bind(source_type)
	.bind(source_id)
	.bind(target_type)
	.bind(target_id)
	.bind(relation_type)
	.fetch_one(&db.pool)
	.await?;

	Ok(row)
}

/// Follows `target_id -> ... -> source_id` through edges of the same relation type; if that path
/// exists, adding `source_id -> target_id` would close a cycle.
async fn would_create_cycle(
	db: &Db,
	source_id: Uuid,
	target_id: Uuid,
	relation_type: &str,
) -> Result<bool> {
	let hit: Option<(Uuid,)> = sqlx::query_as(
		"WITH RECURSIVE reachable(id) AS ( \
			SELECT $1::uuid \
			UNION \
			SELECT er.target_id FROM entry_relations er \
			JOIN reachable r ON er.source_id = r.id \
			WHERE er.relation_type = $2 \
		 ) \
		 SELECT id FROM reachable WHERE id = $3 LIMIT 1",
	)
	.bind(target_id)
	.bind(relation_type)
	.bind(source_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(hit.is_some())
}

pub async fn list_outgoing(db: &Db, source_type: &str, source_id: Uuid) -> Result<Vec<EntryRelation>> {
	let rows = sqlx::query_as(
		"SELECT * FROM entry_relations WHERE source_type = $1 AND source_id = $2",
	)
	.bind(source_type)
	.bind(source_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn list_incoming(db: &Db, target_type: &str, target_id: Uuid) -> Result<Vec<EntryRelation>> {
	let rows = sqlx::query_as(
		"SELECT * FROM entry_relations WHERE target_type = $1 AND target_id = $2",
	)
	.bind(target_type)
	.bind(target_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn delete_relation(db: &Db, id: Uuid) -> Result<()> {
	let result = sqlx::query("DELETE FROM entry_relations WHERE id = $1").bind(id).execute(&db.pool).await?;

	if result.rows_affected() == 0 {
		return Err(Error::NotFound(format!("relation {id}")));
	}

	Ok(())
}
