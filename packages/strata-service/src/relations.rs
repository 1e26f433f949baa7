use std::collections::HashSet;

use uuid::Uuid;

use crate::{Error, Result, StrataService};

const RELATION_TYPES: &[&str] =
	&["applies_to", "depends_on", "conflicts_with", "related_to", "parent_task", "subtask_of"];

/// Relation types that form a hierarchy and must stay acyclic (§8 property 8).
const HIERARCHICAL_TYPES: &[&str] = &["parent_task", "subtask_of"];

pub async fn create(
	service: &StrataService,
	source_type: &str,
	source_id: Uuid,
	target_type: &str,
	target_id: Uuid,
	relation_type: &str,
) -> Result<strata_storage::models::EntryRelation> {
	if !RELATION_TYPES.contains(&relation_type) {
		return Err(Error::InvalidArgument(format!("unknown relation type '{relation_type}'")));
	}

	if HIERARCHICAL_TYPES.contains(&relation_type)
		&& source_type == target_type
		&& (source_id == target_id || would_create_cycle(service, source_type, source_id, target_id, relation_type).await?)
	{
		return Err(Error::InvalidArgument(format!(
			"relation would create a cycle over '{relation_type}'"
		)));
	}

	Ok(strata_storage::relations::create_relation(
		&service.db,
		source_type,
		source_id,
		target_type,
		target_id,
		relation_type,
	)
	.await?)
}

/// Walks outgoing edges of `relation_type` from `target_id`; if that walk reaches `source_id`,
/// adding `source_id -> target_id` would close a cycle.
async fn would_create_cycle(
	service: &StrataService,
	entry_type: &str,
	source_id: Uuid,
	target_id: Uuid,
	relation_type: &str,
) -> Result<bool> {
	let mut visited = HashSet::new();
	let mut frontier = vec![target_id];

	while let Some(current) = frontier.pop() {
		if current == source_id {
			return Ok(true);
		}

		if !visited.insert(current) {
			continue;
		}

		let outgoing = strata_storage::relations::list_outgoing(&service.db, entry_type, current).await?;

		for relation in outgoing {
			if relation.relation_type == relation_type && relation.target_type == entry_type {
				frontier.push(relation.target_id);
			}
		}
	}

	Ok(false)
}

pub async fn list_outgoing(service: &StrataService, source_type: &str, source_id: Uuid) -> Result<Vec<strata_storage::models::EntryRelation>> {
	Ok(strata_storage::relations::list_outgoing(&service.db, source_type, source_id).await?)
}

pub async fn list_incoming(service: &StrataService, target_type: &str, target_id: Uuid) -> Result<Vec<strata_storage::models::EntryRelation>> {
	Ok(strata_storage::relations::list_incoming(&service.db, target_type, target_id).await?)
}

pub async fn delete(service: &StrataService, id: Uuid) -> Result<()> {
	strata_storage::relations::delete_relation(&service.db, id).await?;

	Ok(())
}
