use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Result, db::Db, error::Error, models::{Entry, EntryVersion}};

pub struct NewEntry<'a> {
	pub kind: &'a str,
	pub scope_type: &'a str,
	pub scope_id: Option<Uuid>,
	pub name: &'a str,
	pub category: Option<&'a str>,
	pub priority: Option<i32>,
}

pub struct NewVersion<'a> {
	pub content: &'a str,
	pub rationale: Option<&'a str>,
	pub examples: Option<serde_json::Value>,
	pub parameters: Option<serde_json::Value>,
	pub change_reason: Option<&'a str>,
	pub created_by: Option<&'a str>,
}

/// Inserts the entry row and its first version, then points `current_version_id` at it.
/// Callers must run this inside a transaction so the two-step write is atomic.
pub async fn create_entry(
	tx: &mut sqlx::PgConnection,
	entry: NewEntry<'_>,
	version: NewVersion<'_>,
) -> Result<(Entry, EntryVersion)> {
	let entry_row: Entry = sqlx::query_as(
		"INSERT INTO entries (kind, scope_type, scope_id, name, category, priority) \
		 VALUES ($1,$2,$3,$4,$5,$6) RETURNING *",
	)
	.bind(entry.kind)
	.bind(entry.scope_type)
	.bind(entry.scope_id)
	.bind(entry.name)
	.bind(entry.category)
	.bind(entry.priority)
	.fetch_one(&mut *tx)
	.await?;

	let version_row = insert_version(tx, entry_row.id, 1, version).await?;

	sqlx::query("UPDATE entries SET current_version_id = $1, updated_at = now() WHERE id = $2")
		.bind(version_row.id)
		.bind(entry_row.id)
		.execute(&mut *tx)
		.await?;

	let entry_row: Entry = sqlx::query_as("SELECT * FROM entries WHERE id = $1")
		.bind(entry_row.id)
		.fetch_one(&mut *tx)
		.await?;

	Ok((entry_row, version_row))
}

async fn insert_version(
	tx: &mut sqlx::PgConnection,
	entry_id: Uuid,
	version_num: i32,
	version: NewVersion<'_>,
) -> Result<EntryVersion> {
	let row: EntryVersion = sqlx::query_as(
		"INSERT INTO entry_versions \
		 (entry_id, version_num, content, rationale, examples, parameters, change_reason, created_by) \
		 VALUES ($1,$2,$3,$4,$5,$6,$7,$8) RETURNING *",
	)
	.bind(entry_id)
	.bind(version_num)
	.bind(version.content)
	.bind(version.rationale)
	.bind(version.examples)
	.bind(version.parameters)
	.bind(version.change_reason)
	.bind(version.created_by)
	.fetch_one(&mut *tx)
	.await?;

	Ok(row)
}

/// Appends a new version to an existing entry. `expected_version_id` implements optimistic
/// concurrency: the caller must have read `current_version_id` before composing the update, and
/// the write is rejected if another writer has already moved it.
pub async fn add_version(
	tx: &mut sqlx::PgConnection,
	entry_id: Uuid,
	expected_version_id: Uuid,
	version: NewVersion<'_>,
) -> Result<(Entry, EntryVersion)> {
	let entry_row: Entry = sqlx::query_as("SELECT * FROM entries WHERE id = $1 FOR UPDATE")
		.bind(entry_id)
		.fetch_optional(&mut *tx)
		.await?
		.ok_or_else(|| Error::NotFound(format!("entry {entry_id}")))?;

	let Some(current) = entry_row.current_version_id else {
		return Err(Error::Conflict(format!("entry {entry_id} has no current version")));
	};

	if current != expected_version_id {
		return Err(Error::Conflict(format!(
			"entry {entry_id} has moved past version {expected_version_id}"
		)));
	}

	let next_num: i32 = sqlx::query_scalar(
		"SELECT COALESCE(MAX(version_num), 0) + 1 FROM entry_versions WHERE entry_id = $1",
	)
	.bind(entry_id)
	.fetch_one(&mut *tx)
	.await?;

	let version_row = insert_version(tx, entry_id, next_num, version).await?;

	sqlx::query("UPDATE entries SET current_version_id = $1, updated_at = now() WHERE id = $2")
		.bind(version_row.id)
		.bind(entry_id)
		.execute(&mut *tx)
		.await?;

	let entry_row: Entry = sqlx::query_as("SELECT * FROM entries WHERE id = $1")
		.bind(entry_id)
		.fetch_one(&mut *tx)
		.await?;

	Ok((entry_row, version_row))
}

pub async fn get_entry(db: &Db, entry_id: Uuid) -> Result<Entry> {
	sqlx::query_as("SELECT * FROM entries WHERE id = $1")
		.bind(entry_id)
		.fetch_optional(&db.pool)
		.await?
		.ok_or_else(|| Error::NotFound(format!("entry {entry_id}")))
}

pub async fn get_current_version(db: &Db, entry_id: Uuid) -> Result<EntryVersion> {
	let entry = get_entry(db, entry_id).await?;
	let Some(version_id) = entry.current_version_id else {
		return Err(Error::NotFound(format!("entry {entry_id} has no current version")));
	};

	sqlx::query_as("SELECT * FROM entry_versions WHERE id = $1")
		.bind(version_id)
		.fetch_optional(&db.pool)
		.await?
		.ok_or_else(|| Error::NotFound(format!("version {version_id}")))
}

pub async fn get_history(db: &Db, entry_id: Uuid) -> Result<Vec<EntryVersion>> {
	let rows = sqlx::query_as(
		"SELECT * FROM entry_versions WHERE entry_id = $1 ORDER BY version_num ASC",
	)
	.bind(entry_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn find_active_by_name(
	db: &Db,
	kind: &str,
	scope_type: &str,
	scope_id: Option<Uuid>,
	name: &str,
) -> Result<Option<Entry>, Error> {
	let row = sqlx::query_as(
		"SELECT * FROM entries WHERE kind = $1 AND scope_type = $2 \
		 AND scope_id IS NOT DISTINCT FROM $3 AND name = $4 AND is_active",
	)
	.bind(kind)
	.bind(scope_type)
	.bind(scope_id)
	.bind(name)
	.fetch_optional(&db.pool)
	.await?;

	Ok(row)
}

/// Lists active entry ids of `entry_type` within `scope_ids` for browse-without-search queries
/// (§4.F): no relevance channel runs, but scope/type filtering still must narrow the result set.
/// An empty `scope_ids` means "no scope restriction," matching `fts::search`/`vector::knn_search`.
pub async fn list_candidate_ids(db: &Db, entry_type: &str, scope_ids: &[Uuid], limit: i64) -> Result<Vec<Uuid>> {
	let rows: Vec<(Uuid,)> = sqlx::query_as(
		"SELECT id FROM entries \
		 WHERE kind = $1 AND is_active \
		 AND (cardinality($2::uuid[]) = 0 OR COALESCE(scope_id, '00000000-0000-0000-0000-000000000000'::uuid) = ANY($2)) \
		 ORDER BY created_at DESC \
		 LIMIT $3",
	)
	.bind(entry_type)
	.bind(scope_ids)
	.bind(limit)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows.into_iter().map(|(id,)| id).collect())
}

pub struct EntryFilter<'a> {
	pub kind: Option<&'a str>,
	pub scope_type: Option<&'a str>,
	pub scope_id: Option<Uuid>,
	pub category: Option<&'a str>,
	pub is_active: Option<bool>,
}

pub async fn list_entries(db: &Db, filter: EntryFilter<'_>, limit: i64, offset: i64) -> Result<Vec<Entry>> {
	let rows = sqlx::query_as(
		"SELECT * FROM entries \
		 WHERE ($1::text IS NULL OR kind = $1) \
		 AND ($2::text IS NULL OR scope_type = $2) \
		 AND ($3::uuid IS NULL OR scope_id = $3) \
		 AND ($4::text IS NULL OR category = $4) \
		 AND ($5::boolean IS NULL OR is_active = $5) \
		 ORDER BY created_at DESC \
		 LIMIT $6 OFFSET $7",
	)
	.bind(filter.kind)
	.bind(filter.scope_type)
	.bind(filter.scope_id)
	.bind(filter.category)
	.bind(filter.is_active)
	.bind(limit)
	.bind(offset)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn set_active(db: &Db, entry_id: Uuid, is_active: bool) -> Result<()> {
	let result = sqlx::query("UPDATE entries SET is_active = $1, updated_at = now() WHERE id = $2")
		.bind(is_active)
		.bind(entry_id)
		.execute(&db.pool)
		.await?;

	if result.rows_affected() == 0 {
		return Err(Error::NotFound(format!("entry {entry_id}")));
	}

	Ok(())
}

pub async fn set_active_tx(
	tx: &mut sqlx::PgConnection,
	entry_id: Uuid,
	is_active: bool,
) -> Result<()> {
	let result = sqlx::query("UPDATE entries SET is_active = $1, updated_at = now() WHERE id = $2")
		.bind(is_active)
		.bind(entry_id)
		.execute(&mut *tx)
		.await?;

	if result.rows_affected() == 0 {
		return Err(Error::NotFound(format!("entry {entry_id}")));
	}

	Ok(())
}

pub async fn touch_access(db: &Db, entry_id: Uuid, now: OffsetDateTime) -> Result<()> {
	sqlx::query(
		"INSERT INTO retrieval_outcomes (entry_id, retrieval_count, last_access_at) \
		 VALUES ($1, 1, $2) \
		 ON CONFLICT (entry_id) DO UPDATE SET \
		 retrieval_count = retrieval_outcomes.retrieval_count + 1, last_access_at = $2",
	)
	.bind(entry_id)
	.bind(now)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn record_success(db: &Db, entry_id: Uuid, now: OffsetDateTime) -> Result<()> {
	sqlx::query(
		"INSERT INTO retrieval_outcomes (entry_id, success_count, last_success_at) \
		 VALUES ($1, 1, $2) \
		 ON CONFLICT (entry_id) DO UPDATE SET \
		 success_count = retrieval_outcomes.success_count + 1, last_success_at = $2",
	)
	.bind(entry_id)
	.bind(now)
	.execute(&db.pool)
	.await?;

	Ok(())
}
