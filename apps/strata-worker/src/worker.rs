use std::sync::Arc;

use color_eyre::{Result, eyre::eyre};
use pgvector::Vector;
use strata_storage::{db::Db, models::EmbeddingJob};
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{error, info, warn};
use uuid::Uuid;

pub struct WorkerState {
	pub db: Db,
	pub embedder: strata_config::ProviderConfig,
	pub vector_dim: u32,
	pub queue: strata_config::EmbeddingQueue,
}

/// Polls `embedding_jobs` for pending work, embeds each claimed job's version content, and writes
/// the vector back guarded by `upsert_embedding_if_current` so a superseded edit never clobbers a
/// fresher one. Claimed batches are processed concurrently, bounded by a semaphore sized from
/// `queue.concurrency` (§5), rather than one job at a time.
pub async fn run_worker(state: WorkerState) -> Result<()> {
	let state = Arc::new(state);
	let permits = Arc::new(Semaphore::new(state.queue.concurrency as usize));
	let mut since_reclaim = 0u32;

	loop {
		let claimed =
			strata_storage::embedding_jobs::claim_batch(&state.db, state.queue.concurrency as i64, state.queue.claim_lease_seconds)
				.await
				.map_err(|err| eyre!(err.to_string()))?;

		if claimed.is_empty() {
			tokio::time::sleep(std::time::Duration::from_millis(state.queue.poll_interval_ms)).await;
		} else {
			let mut tasks = JoinSet::new();

			for job in claimed {
				let state = Arc::clone(&state);
				let permits = Arc::clone(&permits);

				tasks.spawn(async move {
					let _permit = permits.acquire_owned().await.expect("worker semaphore is never closed");
					let result = process_job(&state, &job).await;

					(job, result)
				});
			}

			while let Some(outcome) = tasks.join_next().await {
				let (job, result) = outcome.map_err(|err| eyre!(err.to_string()))?;

				if let Err(err) = result {
					error!(error = %err, job_id = %job.id, "Embedding job failed.");
					strata_storage::embedding_jobs::mark_failed(
						&state.db,
						job.id,
						&err.to_string(),
						state.queue.base_backoff_ms as i64,
						state.queue.max_backoff_ms as i64,
						state.queue.max_attempts as i32,
					)
					.await
					.map_err(|err| eyre!(err.to_string()))?;
				} else {
					strata_storage::embedding_jobs::mark_done(&state.db, job.id)
						.await
						.map_err(|err| eyre!(err.to_string()))?;
				}
			}
		}

		since_reclaim += 1;
		if since_reclaim >= 20 {
			since_reclaim = 0;
			match strata_storage::embedding_jobs::reclaim_expired_leases(&state.db).await {
				Ok(count) if count > 0 => info!(count, "Reclaimed expired embedding job leases."),
				Ok(_) => {},
				Err(err) => warn!(error = %err, "Failed to reclaim expired embedding job leases."),
			}
		}
	}
}

async fn process_job(state: &WorkerState, job: &EmbeddingJob) -> Result<()> {
	let Some(content) = fetch_version_content(&state.db, job.version_id).await? else {
		info!(job_id = %job.id, version_id = %job.version_id, "Version missing for embedding job. Treating as done.");
		return Ok(());
	};

	let vectors = strata_providers::embedding::embed(&state.embedder, std::slice::from_ref(&content)).await?;
	let Some(raw_vector) = vectors.into_iter().next() else {
		return Err(eyre!("Embedding provider returned no vectors."));
	};

	if raw_vector.len() != state.vector_dim as usize {
		return Err(eyre!(
			"Embedding dimension {} does not match configured vector_dim {}.",
			raw_vector.len(),
			state.vector_dim
		));
	}

	let vector = Vector::from(raw_vector);

	let applied = strata_storage::vector::upsert_embedding_if_current(
		&state.db,
		&job.entry_type,
		job.entry_id,
		job.version_id,
		&vector,
		&state.embedder.model,
		&state.embedder.provider_id,
	)
	.await
	.map_err(|err| eyre!(err.to_string()))?;

	if !applied {
		info!(job_id = %job.id, entry_id = %job.entry_id, "Version superseded before embedding completed. Dropped.");
	}

	Ok(())
}

async fn fetch_version_content(db: &Db, version_id: Uuid) -> Result<Option<String>> {
	let row: Option<(String,)> = sqlx::query_as("SELECT content FROM entry_versions WHERE id = $1")
		.bind(version_id)
		.fetch_optional(&db.pool)
		.await?;

	Ok(row.map(|(content,)| content))
}
