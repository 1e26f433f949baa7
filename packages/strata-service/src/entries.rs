use uuid::Uuid;

use crate::{Error, Result, StrataService, access};

pub const KINDS: &[&str] = &["tool", "guideline", "knowledge", "experience"];

fn validate_kind(kind: &str) -> Result<()> {
	if KINDS.contains(&kind) {
		Ok(())
	} else {
		Err(Error::InvalidArgument(format!("unknown entry kind '{kind}'")))
	}
}

pub struct AddEntryRequest<'a> {
	pub agent_id: &'a str,
	pub kind: &'a str,
	pub scope_type: &'a str,
	pub scope_id: Option<&'a str>,
	pub name: &'a str,
	pub category: Option<&'a str>,
	/// Only meaningful for `kind = "guideline"`; ignored for other kinds.
	pub priority: Option<i32>,
	pub content: &'a str,
	pub rationale: Option<&'a str>,
	pub examples: Option<serde_json::Value>,
	pub parameters: Option<serde_json::Value>,
	pub created_by: Option<&'a str>,
}

/// Document indexed for lexical search: name/title plus content plus rationale, per §4.C.
fn fts_document(name: &str, content: &str, rationale: Option<&str>) -> String {
	match rationale {
		Some(rationale) => format!("{name}\n{content}\n{rationale}"),
		None => format!("{name}\n{content}"),
	}
}

/// Creates an Entry and its first EntryVersion, indexes it for lexical search, and enqueues an
/// embedding job — all inside one transaction (§3 Lifecycle, §4.A).
pub async fn add(service: &StrataService, request: AddEntryRequest<'_>) -> Result<(strata_storage::models::Entry, strata_storage::models::EntryVersion)> {
	validate_kind(request.kind)?;

	let scope_type = strata_domain::scope::ScopeType::parse(request.scope_type)?;
	let scope_id = strata_domain::scope::validate_scope(scope_type, request.scope_id)?;

	access::check(service, request.agent_id, request.scope_type, scope_id, request.kind, access::Level::Write).await?;

	if strata_storage::entries::find_active_by_name(&service.db, request.kind, request.scope_type, scope_id, request.name)
		.await?
		.is_some()
	{
		return Err(Error::DuplicateName(format!(
			"{} '{}' already exists in this scope",
			request.kind, request.name
		)));
	}

	let mut tx = service.db.pool.begin().await.map_err(strata_storage::Error::from)?;

	let (entry, version) = strata_storage::entries::create_entry(
		&mut tx,
		strata_storage::entries::NewEntry {
			kind: request.kind,
			scope_type: request.scope_type,
			scope_id,
			name: request.name,
			category: request.category,
			priority: if request.kind == "guideline" { request.priority } else { None },
		},
		strata_storage::entries::NewVersion {
			content: request.content,
			rationale: request.rationale,
			examples: request.examples,
			parameters: request.parameters,
			change_reason: None,
			created_by: request.created_by,
		},
	)
	.await?;

	let document = fts_document(&entry.name, &version.content, version.rationale.as_deref());

	strata_storage::fts::upsert_fts(&mut tx, request.kind, entry.id, &document).await?;
	strata_storage::embedding_jobs::enqueue(&mut tx, request.kind, entry.id, version.id).await?;

	tx.commit().await.map_err(strata_storage::Error::from)?;

	service.cache.invalidate_scope_chain(&[(request.scope_type.to_string(), scope_id)]);

	Ok((entry, version))
}

pub struct UpdateEntryRequest<'a> {
	pub agent_id: &'a str,
	pub kind: &'a str,
	pub entry_id: Uuid,
	pub expected_version_id: Uuid,
	pub content: &'a str,
	pub rationale: Option<&'a str>,
	pub examples: Option<serde_json::Value>,
	pub parameters: Option<serde_json::Value>,
	pub change_reason: Option<&'a str>,
	pub created_by: Option<&'a str>,
}

/// Appends a new version, repoints `currentVersionId`, and re-indexes — rejects with
/// `VersionConflict` if `expected_version_id` no longer matches (§4.A optimistic concurrency).
pub async fn update(service: &StrataService, request: UpdateEntryRequest<'_>) -> Result<(strata_storage::models::Entry, strata_storage::models::EntryVersion)> {
	validate_kind(request.kind)?;

	let entry = strata_storage::entries::get_entry(&service.db, request.entry_id).await?;

	access::check(service, request.agent_id, &entry.scope_type, entry.scope_id, request.kind, access::Level::Write).await?;

	let mut tx = service.db.pool.begin().await.map_err(strata_storage::Error::from)?;

	let (entry, version) = strata_storage::entries::add_version(
		&mut tx,
		request.entry_id,
		request.expected_version_id,
		strata_storage::entries::NewVersion {
			content: request.content,
			rationale: request.rationale,
			examples: request.examples,
			parameters: request.parameters,
			change_reason: request.change_reason,
			created_by: request.created_by,
		},
	)
	.await?;

	let document = fts_document(&entry.name, &version.content, version.rationale.as_deref());

	strata_storage::fts::upsert_fts(&mut tx, request.kind, entry.id, &document).await?;
	strata_storage::embedding_jobs::enqueue(&mut tx, request.kind, entry.id, version.id).await?;

	tx.commit().await.map_err(strata_storage::Error::from)?;

	service.cache.invalidate_scope_chain(&[(entry.scope_type.clone(), entry.scope_id)]);

	Ok((entry, version))
}

pub async fn get(service: &StrataService, entry_id: Uuid) -> Result<strata_storage::models::Entry> {
	Ok(strata_storage::entries::get_entry(&service.db, entry_id).await?)
}

pub async fn get_by_name(
	service: &StrataService,
	kind: &str,
	scope_type: &str,
	scope_id: Option<Uuid>,
	inherit: bool,
	name: &str,
) -> Result<Option<strata_storage::models::Entry>> {
	validate_kind(kind)?;

	let chain = if inherit {
		match scope_id {
			Some(id) => strata_storage::scopes::ancestor_chain(&service.db, scope_type, id).await?,
			None => vec![("global".to_string(), None)],
		}
	} else {
		vec![(scope_type.to_string(), scope_id)]
	};

	for (chain_scope_type, chain_scope_id) in chain {
		if let Some(entry) =
			strata_storage::entries::find_active_by_name(&service.db, kind, &chain_scope_type, chain_scope_id, name).await?
		{
			return Ok(Some(entry));
		}
	}

	Ok(None)
}

pub async fn get_current_version(service: &StrataService, entry_id: Uuid) -> Result<strata_storage::models::EntryVersion> {
	Ok(strata_storage::entries::get_current_version(&service.db, entry_id).await?)
}

pub struct ListFilter<'a> {
	pub kind: Option<&'a str>,
	pub scope_type: Option<&'a str>,
	pub scope_id: Option<Uuid>,
	pub category: Option<&'a str>,
	pub include_inactive: bool,
}

pub async fn list(service: &StrataService, filter: ListFilter<'_>, limit: i64, offset: i64) -> Result<Vec<strata_storage::models::Entry>> {
	let storage_filter = strata_storage::entries::EntryFilter {
		kind: filter.kind,
		scope_type: filter.scope_type,
		scope_id: filter.scope_id,
		category: filter.category,
		is_active: if filter.include_inactive { None } else { Some(true) },
	};

	Ok(strata_storage::entries::list_entries(&service.db, storage_filter, limit, offset).await?)
}

/// Newest first, per §4.A's `getHistory` contract.
pub async fn history(service: &StrataService, entry_id: Uuid) -> Result<Vec<strata_storage::models::EntryVersion>> {
	let mut versions = strata_storage::entries::get_history(&service.db, entry_id).await?;

	versions.reverse();

	Ok(versions)
}

/// Deactivates an entry and prunes its derived rows (FTS, Embedding, pending jobs) in one
/// transaction so neither can outlive the entry becoming inactive (§3 invariant 5, §4.E).
pub async fn deactivate(service: &StrataService, agent_id: &str, kind: &str, entry_id: Uuid) -> Result<()> {
	validate_kind(kind)?;

	let entry = strata_storage::entries::get_entry(&service.db, entry_id).await?;

	access::check(service, agent_id, &entry.scope_type, entry.scope_id, kind, access::Level::Write).await?;

	let mut tx = service.db.pool.begin().await.map_err(strata_storage::Error::from)?;

	strata_storage::entries::set_active_tx(&mut tx, entry_id, false).await?;
	strata_storage::fts::delete_fts(&mut tx, kind, entry_id).await?;
	strata_storage::vector::delete_embedding(&mut tx, kind, entry_id).await?;
	strata_storage::embedding_jobs::cancel_pending_for_entry(&mut tx, kind, entry_id).await?;

	tx.commit().await.map_err(strata_storage::Error::from)?;

	service.cache.invalidate_scope_chain(&[(entry.scope_type, entry.scope_id)]);

	Ok(())
}
