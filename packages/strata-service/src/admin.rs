use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, Result, StrataService, access, entries};

pub async fn init(service: &StrataService, admin_key: &str) -> Result<()> {
	access::require_admin(service, admin_key).await?;

	service.db.ensure_schema(service.cfg.storage.postgres.vector_dim).await?;

	Ok(())
}

pub struct Status {
	pub entry_count: i64,
	pub active_entry_count: i64,
	pub pending_embedding_jobs: i64,
	pub failed_embedding_jobs: i64,
}

pub async fn status(service: &StrataService) -> Result<Status> {
	let entry_count: (i64,) =
		sqlx::query_as("SELECT count(*) FROM entries").fetch_one(&service.db.pool).await.map_err(strata_storage::Error::from)?;
	let active_entry_count: (i64,) = sqlx::query_as("SELECT count(*) FROM entries WHERE is_active")
		.fetch_one(&service.db.pool)
		.await
		.map_err(strata_storage::Error::from)?;
	let pending: (i64,) = sqlx::query_as("SELECT count(*) FROM embedding_jobs WHERE status = 'pending'")
		.fetch_one(&service.db.pool)
		.await
		.map_err(strata_storage::Error::from)?;
	let failed: (i64,) = sqlx::query_as("SELECT count(*) FROM embedding_jobs WHERE status = 'failed'")
		.fetch_one(&service.db.pool)
		.await
		.map_err(strata_storage::Error::from)?;

	Ok(Status {
		entry_count: entry_count.0,
		active_entry_count: active_entry_count.0,
		pending_embedding_jobs: pending.0,
		failed_embedding_jobs: failed.0,
	})
}

const RESET_TABLES: &[&str] = &[
	"embedding_jobs",
	"embeddings",
	"entry_fts",
	"entry_relations",
	"entry_tags",
	"entry_versions",
	"entries",
	"retrieval_outcomes",
	"permission_grants",
	"sessions",
	"projects",
	"organizations",
];

/// Destructive reset reserved for administrative use (§3 Lifecycle "Destroy"); requires both the
/// admin credential and an explicit `confirm` flag so it can never be triggered accidentally.
pub async fn reset(service: &StrataService, admin_key: &str, confirm: bool) -> Result<()> {
	access::require_admin(service, admin_key).await?;

	if !confirm {
		return Err(Error::InvalidArgument("reset requires confirm=true".to_string()));
	}

	let mut tx = service.db.pool.begin().await.map_err(strata_storage::Error::from)?;

	for table in RESET_TABLES {
		sqlx::query(&format!("TRUNCATE TABLE {table} CASCADE"))
			.execute(&mut *tx)
			.await
			.map_err(strata_storage::Error::from)?;
	}

	tx.commit().await.map_err(strata_storage::Error::from)?;

	Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExportedEntry {
	#[serde(rename = "type")]
	pub kind: String,
	pub scope_type: String,
	pub scope_id: Option<Uuid>,
	pub name: String,
	pub category: Option<String>,
	pub priority: Option<i32>,
	pub content: String,
	pub rationale: Option<String>,
	pub examples: Option<serde_json::Value>,
	pub parameters: Option<serde_json::Value>,
	pub tags: Vec<String>,
	pub relations: Vec<ExportedRelation>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExportedRelation {
	pub target_type: String,
	pub target_id: Uuid,
	pub relation_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExportDocument {
	pub version: u32,
	#[serde(with = "crate::time_serde")]
	pub exported_at: OffsetDateTime,
	pub entries: Vec<ExportedEntry>,
}

pub async fn export(service: &StrataService, scope_type: Option<&str>, scope_id: Option<Uuid>) -> Result<ExportDocument> {
	let filter = entries::ListFilter { kind: None, scope_type, scope_id, category: None, include_inactive: false };
	let rows = entries::list(service, filter, 10_000, 0).await?;

	let mut exported = Vec::with_capacity(rows.len());

	for entry in rows {
		let version = strata_storage::entries::get_current_version(&service.db, entry.id).await?;
		let tags = strata_storage::tags::list_tags_for_entry(&service.db, &entry.kind, entry.id).await?;
		let relations = strata_storage::relations::list_outgoing(&service.db, &entry.kind, entry.id).await?;

		exported.push(ExportedEntry {
			kind: entry.kind,
			scope_type: entry.scope_type,
			scope_id: entry.scope_id,
			name: entry.name,
			category: entry.category,
			priority: entry.priority,
			content: version.content,
			rationale: version.rationale,
			examples: version.examples,
			parameters: version.parameters,
			tags: tags.into_iter().map(|t| t.name).collect(),
			relations: relations
				.into_iter()
				.map(|r| ExportedRelation { target_type: r.target_type, target_id: r.target_id, relation_type: r.relation_type })
				.collect(),
		});
	}

	Ok(ExportDocument { version: 1, exported_at: OffsetDateTime::now_utc(), entries: exported })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictStrategy {
	Skip,
	Update,
	Replace,
	Error,
}

impl ConflictStrategy {
	pub fn parse(value: &str) -> Result<Self> {
		match value {
			"skip" => Ok(Self::Skip),
			"update" => Ok(Self::Update),
			"replace" => Ok(Self::Replace),
			"error" => Ok(Self::Error),
			other => Err(Error::InvalidArgument(format!("unknown import conflict strategy '{other}'"))),
		}
	}
}

pub struct ImportReport {
	pub created: u32,
	pub updated: u32,
	pub skipped: u32,
}

/// Imports entries from an export document, applying `strategy` when an active entry of the same
/// kind/scope/name already exists (§6 Formats).
pub async fn import(
	service: &StrataService,
	agent_id: &str,
	document: &ExportDocument,
	strategy: ConflictStrategy,
) -> Result<ImportReport> {
	let mut report = ImportReport { created: 0, updated: 0, skipped: 0 };

	for item in &document.entries {
		let scope_id_str = item.scope_id.map(|id| id.to_string());
		let existing = entries::get_by_name(
			service,
			&item.kind,
			&item.scope_type,
			item.scope_id,
			false,
			&item.name,
		)
		.await?;

		match (existing, strategy) {
			(Some(_), ConflictStrategy::Skip) => report.skipped += 1,
			(Some(_), ConflictStrategy::Error) =>
				return Err(Error::DuplicateName(format!("entry '{}' already exists", item.name))),
			(Some(existing), ConflictStrategy::Update | ConflictStrategy::Replace) => {
				let current = strata_storage::entries::get_current_version(&service.db, existing.id).await?;

				entries::update(
					service,
					entries::UpdateEntryRequest {
						agent_id,
						kind: &item.kind,
						entry_id: existing.id,
						expected_version_id: current.id,
						content: &item.content,
						rationale: item.rationale.as_deref(),
						examples: item.examples.clone(),
						parameters: item.parameters.clone(),
						change_reason: Some("import"),
						created_by: Some(agent_id),
					},
				)
				.await?;

				report.updated += 1;
			},
			(None, _) => {
				entries::add(
					service,
					entries::AddEntryRequest {
						agent_id,
						kind: &item.kind,
						scope_type: &item.scope_type,
						scope_id: scope_id_str.as_deref(),
						name: &item.name,
						category: item.category.as_deref(),
						priority: item.priority,
						content: &item.content,
						rationale: item.rationale.as_deref(),
						examples: item.examples.clone(),
						parameters: item.parameters.clone(),
						created_by: Some(agent_id),
					},
				)
				.await?;

				report.created += 1;
			},
		}
	}

	Ok(report)
}
