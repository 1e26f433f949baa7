use uuid::Uuid;

use crate::{Result, db::Db, models::FtsMatch};

/// Takes the entry's own write transaction so the FTS row never lags a committed version (§4.C).
pub async fn upsert_fts(
	tx: &mut sqlx::PgConnection,
	entry_type: &str,
	entry_id: Uuid,
	document: &str,
) -> Result<()> {
	sqlx::query(
		"INSERT INTO entry_fts (entry_type, entry_id, tsv, updated_at) \
		 VALUES ($1, $2, to_tsvector('simple', $3), now()) \
		 ON CONFLICT (entry_type, entry_id) DO UPDATE SET \
		 tsv = EXCLUDED.tsv, updated_at = EXCLUDED.updated_at",
	)
	.bind(entry_type)
	.bind(entry_id)
	.bind(document)
	.execute(&mut *tx)
	.await?;

	Ok(())
}

pub async fn delete_fts(tx: &mut sqlx::PgConnection, entry_type: &str, entry_id: Uuid) -> Result<()> {
	sqlx::query("DELETE FROM entry_fts WHERE entry_type = $1 AND entry_id = $2")
		.bind(entry_type)
		.bind(entry_id)
		.execute(&mut *tx)
		.await?;

	Ok(())
}

/// `tsquery` must already be a well-formed `to_tsquery` expression; callers build it from
/// tokenized, per-token-quoted terms so user input can never be interpreted as query syntax.
pub async fn search(
	db: &Db,
	entry_type: &str,
	tsquery: &str,
	scope_ids: &[Uuid],
	limit: i64,
) -> Result<Vec<FtsMatch>> {
	let rows = sqlx::query_as(
		"SELECT f.entry_id, ts_rank_cd(f.tsv, query) AS rank FROM entry_fts f \
		 JOIN entries en ON en.id = f.entry_id \
		 CROSS JOIN to_tsquery('simple', $2) AS query \
		 WHERE f.entry_type = $1 AND en.is_active AND f.tsv @@ query \
		 AND (cardinality($3::uuid[]) = 0 OR COALESCE(en.scope_id, '00000000-0000-0000-0000-000000000000'::uuid) = ANY($3)) \
		 ORDER BY rank DESC \
		 LIMIT $4",
	)
	.bind(entry_type)
	.bind(tsquery)
	.bind(scope_ids)
	.bind(limit)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}
