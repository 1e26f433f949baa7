use uuid::Uuid;

use crate::{Result, db::Db, models::Tag};

pub async fn upsert_tag(db: &Db, name: &str, category: &str) -> Result<Tag> {
	let row = sqlx::query_as(
		"INSERT INTO tags (name, category) VALUES ($1, $2) \
		 ON CONFLICT (name) DO UPDATE SET name = tags.name \
		 RETURNING *",
	)
	.bind(name)
	.bind(category)
	.fetch_one(&db.pool)
	.await?;

	Ok(row)
}

pub async fn attach_tag(db: &Db, entry_type: &str, entry_id: Uuid, tag_id: Uuid) -> Result<()> {
	sqlx::query(
		"INSERT INTO entry_tags (entry_type, entry_id, tag_id) VALUES ($1,$2,$3) \
		 ON CONFLICT DO NOTHING",
	)
	.bind(entry_type)
	.bind(entry_id)
	.bind(tag_id)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn detach_tag(db: &Db, entry_type: &str, entry_id: Uuid, tag_id: Uuid) -> Result<()> {
	sqlx::query("DELETE FROM entry_tags WHERE entry_type = $1 AND entry_id = $2 AND tag_id = $3")
		.bind(entry_type)
		.bind(entry_id)
		.bind(tag_id)
		.execute(&db.pool)
		.await?;

	Ok(())
}

pub async fn list_tags_for_entry(db: &Db, entry_type: &str, entry_id: Uuid) -> Result<Vec<Tag>> {
	let rows = sqlx::query_as(
		"SELECT t.* FROM tags t \
		 JOIN entry_tags et ON et.tag_id = t.id \
		 WHERE et.entry_type = $1 AND et.entry_id = $2 \
		 ORDER BY t.name ASC",
	)
	.bind(entry_type)
	.bind(entry_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn list_all(db: &Db) -> Result<Vec<Tag>> {
	let rows = sqlx::query_as("SELECT * FROM tags ORDER BY name ASC").fetch_all(&db.pool).await?;

	Ok(rows)
}

pub async fn list_entry_ids_for_tags(db: &Db, tag_names: &[String]) -> Result<Vec<Uuid>> {
	let rows: Vec<(Uuid,)> = sqlx::query_as(
		"SELECT DISTINCT et.entry_id FROM entry_tags et \
		 JOIN tags t ON t.id = et.tag_id \
		 WHERE t.name = ANY($1)",
	)
	.bind(tag_names)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows.into_iter().map(|(id,)| id).collect())
}
