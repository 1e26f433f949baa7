use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{Result, db::Db, models::EmbeddingJob};

/// Enqueues a job and marks any still-pending job for the same entry as superseded, so only the
/// newest edit is ever embedded. Must run in the same transaction as the entry/version write.
pub async fn enqueue(
	tx: &mut sqlx::PgConnection,
	entry_type: &str,
	entry_id: Uuid,
	version_id: Uuid,
) -> Result<EmbeddingJob> {
	sqlx::query(
		"UPDATE embedding_jobs SET status = 'done', updated_at = now() \
		 WHERE entry_type = $1 AND entry_id = $2 AND status = 'pending'",
	)
	.bind(entry_type)
	.bind(entry_id)
	.execute(&mut *tx)
	.await?;

	let row = sqlx::query_as(
		"INSERT INTO embedding_jobs (entry_type, entry_id, version_id) VALUES ($1,$2,$3) RETURNING *",
	)
	.bind(entry_type)
	.bind(entry_id)
	.bind(version_id)
	.fetch_one(&mut *tx)
	.await?;

	Ok(row)
}

/// Claims up to `limit` pending, due jobs with `SELECT ... FOR UPDATE SKIP LOCKED` so concurrent
/// workers never double-claim, and sets a lease so a crashed worker's claim eventually expires.
pub async fn claim_batch(
	db: &Db,
	limit: i64,
	lease_seconds: i64,
) -> Result<Vec<EmbeddingJob>> {
	let now = OffsetDateTime::now_utc();
	let lease_expires_at = now + Duration::seconds(lease_seconds);

	let mut tx = db.pool.begin().await?;

	let claimable: Vec<EmbeddingJob> = sqlx::query_as(
		"SELECT * FROM embedding_jobs \
		 WHERE status = 'pending' AND next_attempt_at <= $1 \
		 ORDER BY created_at ASC \
		 LIMIT $2 FOR UPDATE SKIP LOCKED",
	)
	.bind(now)
	.bind(limit)
	.fetch_all(&mut *tx)
	.await?;

	let ids: Vec<Uuid> = claimable.iter().map(|job| job.id).collect();

	let claimed: Vec<EmbeddingJob> = sqlx::query_as(
		"UPDATE embedding_jobs SET status = 'in_progress', lease_expires_at = $1, updated_at = now() \
		 WHERE id = ANY($2) RETURNING *",
	)
	.bind(lease_expires_at)
	.bind(&ids)
	.fetch_all(&mut *tx)
	.await?;

	tx.commit().await?;

	Ok(claimed)
}

/// Purges pending jobs for a deactivated entry so the queue never processes an embedding for
/// content that is no longer searchable.
pub async fn cancel_pending_for_entry(
	tx: &mut sqlx::PgConnection,
	entry_type: &str,
	entry_id: Uuid,
) -> Result<()> {
	sqlx::query(
		"UPDATE embedding_jobs SET status = 'done', updated_at = now() \
		 WHERE entry_type = $1 AND entry_id = $2 AND status = 'pending'",
	)
	.bind(entry_type)
	.bind(entry_id)
	.execute(&mut *tx)
	.await?;

	Ok(())
}

pub async fn mark_done(db: &Db, job_id: Uuid) -> Result<()> {
	sqlx::query("UPDATE embedding_jobs SET status = 'done', updated_at = now() WHERE id = $1")
		.bind(job_id)
		.execute(&db.pool)
		.await?;

	Ok(())
}

/// Reschedules with exponential backoff, or marks the job permanently failed once `max_attempts`
/// is reached.
pub async fn mark_failed(
	db: &Db,
	job_id: Uuid,
	error: &str,
	base_backoff_ms: i64,
	max_backoff_ms: i64,
	max_attempts: i32,
) -> Result<()> {
	let job: EmbeddingJob = sqlx::query_as("SELECT * FROM embedding_jobs WHERE id = $1")
		.bind(job_id)
		.fetch_one(&db.pool)
		.await?;

	let attempts = job.attempts + 1;

	if attempts >= max_attempts {
		sqlx::query(
			"UPDATE embedding_jobs SET status = 'failed', attempts = $1, last_error = $2, \
			 updated_at = now() WHERE id = $3",
		)
		.bind(attempts)
		.bind(error)
		.bind(job_id)
		.execute(&db.pool)
		.await?;

		return Ok(());
	}

	let backoff_ms = (base_backoff_ms.saturating_mul(1i64 << attempts.min(30))).min(max_backoff_ms);
	let next_attempt_at = OffsetDateTime::now_utc() + Duration::milliseconds(backoff_ms);

	sqlx::query(
		"UPDATE embedding_jobs SET status = 'pending', attempts = $1, last_error = $2, \
		 next_attempt_at = $3, lease_expires_at = NULL, updated_at = now() WHERE id = $4",
	)
	.bind(attempts)
	.bind(error)
	.bind(next_attempt_at)
	.bind(job_id)
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// Returns leases abandoned by a crashed worker back to `pending` so another worker can claim them.
pub async fn reclaim_expired_leases(db: &Db) -> Result<u64> {
	let result = sqlx::query(
		"UPDATE embedding_jobs SET status = 'pending', lease_expires_at = NULL, updated_at = now() \
		 WHERE status = 'in_progress' AND lease_expires_at < now()",
	)
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected())
}
