use uuid::Uuid;

use crate::{Result, db::Db, models::VectorMatch};

pub async fn upsert_embedding(
	db: &Db,
	entry_type: &str,
	entry_id: Uuid,
	version_id: Uuid,
	vector: &pgvector::Vector,
	model: &str,
	provider: &str,
) -> Result<()> {
	sqlx::query(
		"INSERT INTO embeddings (entry_type, entry_id, version_id, vector, model, provider) \
		 VALUES ($1,$2,$3,$4,$5,$6) \
		 ON CONFLICT (entry_type, entry_id) DO UPDATE SET \
		 version_id = EXCLUDED.version_id, vector = EXCLUDED.vector, \
		 model = EXCLUDED.model, provider = EXCLUDED.provider, created_at = now()",
	)
	.bind(entry_type)
	.bind(entry_id)
	.bind(version_id)
	.bind(vector)
	.bind(model)
	.bind(provider)
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// Only applies the write if `version_id` is still the entry's current version, which prevents a
/// late-arriving embedding job from overwriting a vector produced for a newer edit.
pub async fn upsert_embedding_if_current(
	db: &Db,
	entry_type: &str,
	entry_id: Uuid,
	version_id: Uuid,
	vector: &pgvector::Vector,
	model: &str,
	provider: &str,
) -> Result<bool> {
	let result = sqlx::query(
		"INSERT INTO embeddings (entry_type, entry_id, version_id, vector, model, provider) \
		 SELECT $1,$2,$3,$4,$5,$6 FROM entries WHERE id = $2 AND current_version_id = $3 \
		 ON CONFLICT (entry_type, entry_id) DO UPDATE SET \
		 version_id = EXCLUDED.version_id, vector = EXCLUDED.vector, \
		 model = EXCLUDED.model, provider = EXCLUDED.provider, created_at = now()",
	)
	.bind(entry_type)
	.bind(entry_id)
	.bind(version_id)
	.bind(vector)
	.bind(model)
	.bind(provider)
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn delete_embedding(
	tx: &mut sqlx::PgConnection,
	entry_type: &str,
	entry_id: Uuid,
) -> Result<()> {
	sqlx::query("DELETE FROM embeddings WHERE entry_type = $1 AND entry_id = $2")
		.bind(entry_type)
		.bind(entry_id)
		.execute(&mut *tx)
		.await?;

	Ok(())
}

/// Highest cosine similarity between `query` and the embeddings of the `exemplar_count` most
/// recently successful retrievals (§4.G context similarity boost). `0.0` if no entry has ever
/// recorded a success yet, which keeps the boost neutral rather than erroring.
pub async fn max_cosine_to_recent_successes(db: &Db, query: &pgvector::Vector, exemplar_count: i64) -> Result<f32> {
	let row: (Option<f64>,) = sqlx::query_as(
		"SELECT MIN(e.vector <=> $1) FROM ( \
		   SELECT entry_id FROM retrieval_outcomes \
		   WHERE last_success_at IS NOT NULL \
		   ORDER BY last_success_at DESC \
		   LIMIT $2 \
		 ) recent \
		 JOIN embeddings e ON e.entry_id = recent.entry_id",
	)
	.bind(query)
	.bind(exemplar_count)
	.fetch_one(&db.pool)
	.await?;

	Ok(row.0.map(|distance| (1.0 - distance as f32).clamp(-1.0, 1.0)).unwrap_or(0.0))
}

pub async fn knn_search(
	db: &Db,
	entry_type: &str,
	query: &pgvector::Vector,
	scope_ids: &[Uuid],
	limit: i64,
) -> Result<Vec<VectorMatch>> {
	let rows = sqlx::query_as(
		"SELECT e.entry_id, (e.vector <=> $2) AS distance FROM embeddings e \
		 JOIN entries en ON en.id = e.entry_id \
		 WHERE e.entry_type = $1 AND en.is_active \
		 AND (cardinality($3::uuid[]) = 0 OR COALESCE(en.scope_id, '00000000-0000-0000-0000-000000000000'::uuid) = ANY($3)) \
		 ORDER BY distance ASC \
		 LIMIT $4",
	)
	.bind(entry_type)
	.bind(query)
	.bind(scope_ids)
	.bind(limit)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}
