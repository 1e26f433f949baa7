use uuid::Uuid;

use crate::{Error, Result, StrataService};

const TAG_CATEGORIES: &[&str] = &["language", "domain", "category", "meta", "custom"];

pub async fn create_tag(service: &StrataService, name: &str, category: &str) -> Result<strata_storage::models::Tag> {
	if name.trim().is_empty() {
		return Err(Error::InvalidArgument("tag name must not be empty".to_string()));
	}

	if !TAG_CATEGORIES.contains(&category) {
		return Err(Error::InvalidArgument(format!("unknown tag category '{category}'")));
	}

	Ok(strata_storage::tags::upsert_tag(&service.db, name, category).await?)
}

/// Attaches a tag by name, upserting it first so attach is idempotent on a not-yet-created tag
/// (§4.B). Attaching an already-attached tag is a no-op, satisfying §8 property 7.
pub async fn attach(
	service: &StrataService,
	entry_type: &str,
	entry_id: Uuid,
	tag_name: &str,
	category: &str,
) -> Result<()> {
	let tag = strata_storage::tags::upsert_tag(&service.db, tag_name, category).await?;

	strata_storage::tags::attach_tag(&service.db, entry_type, entry_id, tag.id).await?;

	Ok(())
}

pub async fn detach(service: &StrataService, entry_type: &str, entry_id: Uuid, tag_id: Uuid) -> Result<()> {
	strata_storage::tags::detach_tag(&service.db, entry_type, entry_id, tag_id).await?;

	Ok(())
}

pub async fn for_entry(service: &StrataService, entry_type: &str, entry_id: Uuid) -> Result<Vec<strata_storage::models::Tag>> {
	Ok(strata_storage::tags::list_tags_for_entry(&service.db, entry_type, entry_id).await?)
}

pub async fn list_all(service: &StrataService) -> Result<Vec<strata_storage::models::Tag>> {
	Ok(strata_storage::tags::list_all(&service.db).await?)
}

pub async fn list_entry_ids_for_tags(service: &StrataService, tag_names: &[String]) -> Result<Vec<Uuid>> {
	Ok(strata_storage::tags::list_entry_ids_for_tags(&service.db, tag_names).await?)
}
