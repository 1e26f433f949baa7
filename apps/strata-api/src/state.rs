use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<strata_service::StrataService>,
}

impl AppState {
	pub async fn new(config: strata_config::Config) -> color_eyre::Result<Self> {
		let db = strata_storage::db::Db::connect(&config.storage.postgres).await?;
		db.ensure_schema(config.storage.postgres.vector_dim).await?;
		let service = strata_service::StrataService::new(config, db);

		Ok(Self { service: Arc::new(service) })
	}
}

#[derive(Debug, Serialize)]
pub struct EntryDto {
	pub id: Uuid,
	pub kind: String,
	pub scope_type: String,
	pub scope_id: Option<Uuid>,
	pub name: String,
	pub category: Option<String>,
	pub priority: Option<i32>,
	pub is_active: bool,
	pub current_version_id: Option<Uuid>,
	#[serde(with = "strata_service::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "strata_service::time_serde")]
	pub updated_at: OffsetDateTime,
}

impl From<strata_storage::models::Entry> for EntryDto {
	fn from(entry: strata_storage::models::Entry) -> Self {
		Self {
			id: entry.id,
			kind: entry.kind,
			scope_type: entry.scope_type,
			scope_id: entry.scope_id,
			name: entry.name,
			category: entry.category,
			priority: entry.priority,
			is_active: entry.is_active,
			current_version_id: entry.current_version_id,
			created_at: entry.created_at,
			updated_at: entry.updated_at,
		}
	}
}

#[derive(Debug, Serialize)]
pub struct EntryVersionDto {
	pub id: Uuid,
	pub entry_id: Uuid,
	pub version_num: i32,
	pub content: String,
	pub rationale: Option<String>,
	pub examples: Option<serde_json::Value>,
	pub parameters: Option<serde_json::Value>,
	pub change_reason: Option<String>,
	pub created_by: Option<String>,
	#[serde(with = "strata_service::time_serde")]
	pub created_at: OffsetDateTime,
}

impl From<strata_storage::models::EntryVersion> for EntryVersionDto {
	fn from(version: strata_storage::models::EntryVersion) -> Self {
		Self {
			id: version.id,
			entry_id: version.entry_id,
			version_num: version.version_num,
			content: version.content,
			rationale: version.rationale,
			examples: version.examples,
			parameters: version.parameters,
			change_reason: version.change_reason,
			created_by: version.created_by,
			created_at: version.created_at,
		}
	}
}

#[derive(Debug, Serialize)]
pub struct TagDto {
	pub id: Uuid,
	pub name: String,
	pub category: String,
	pub is_predefined: bool,
}

impl From<strata_storage::models::Tag> for TagDto {
	fn from(tag: strata_storage::models::Tag) -> Self {
		Self { id: tag.id, name: tag.name, category: tag.category, is_predefined: tag.is_predefined }
	}
}

#[derive(Debug, Serialize)]
pub struct EntryRelationDto {
	pub id: Uuid,
	pub source_type: String,
	pub source_id: Uuid,
	pub target_type: String,
	pub target_id: Uuid,
	pub relation_type: String,
}

impl From<strata_storage::models::EntryRelation> for EntryRelationDto {
	fn from(relation: strata_storage::models::EntryRelation) -> Self {
		Self {
			id: relation.id,
			source_type: relation.source_type,
			source_id: relation.source_id,
			target_type: relation.target_type,
			target_id: relation.target_id,
			relation_type: relation.relation_type,
		}
	}
}

#[derive(Debug, Serialize)]
pub struct PermissionGrantDto {
	pub id: Uuid,
	pub agent_id: String,
	pub scope_type: String,
	pub scope_id: Option<Uuid>,
	pub entry_type: Option<String>,
	pub level: String,
	pub granted_by: Option<String>,
	#[serde(with = "strata_service::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "strata_service::time_serde::option")]
	pub expires_at: Option<OffsetDateTime>,
}

impl From<strata_storage::models::PermissionGrant> for PermissionGrantDto {
	fn from(grant: strata_storage::models::PermissionGrant) -> Self {
		Self {
			id: grant.id,
			agent_id: grant.agent_id,
			scope_type: grant.scope_type,
			scope_id: grant.scope_id,
			entry_type: grant.entry_type,
			level: grant.level,
			granted_by: grant.granted_by,
			created_at: grant.created_at,
			expires_at: grant.expires_at,
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct AddEntryRequest {
	pub agent_id: String,
	pub kind: String,
	pub scope_type: String,
	pub scope_id: Option<String>,
	pub name: String,
	pub category: Option<String>,
	pub priority: Option<i32>,
	pub content: String,
	pub rationale: Option<String>,
	pub examples: Option<serde_json::Value>,
	pub parameters: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct EntryWithVersion {
	pub entry: EntryDto,
	pub version: EntryVersionDto,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEntryRequest {
	pub agent_id: String,
	pub kind: String,
	pub expected_version_id: Uuid,
	pub content: String,
	pub rationale: Option<String>,
	pub examples: Option<serde_json::Value>,
	pub parameters: Option<serde_json::Value>,
	pub change_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListEntriesQuery {
	pub kind: Option<String>,
	pub scope_type: Option<String>,
	pub scope_id: Option<Uuid>,
	pub category: Option<String>,
	#[serde(default)]
	pub include_inactive: bool,
	pub limit: Option<i64>,
	pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct DeactivateRequest {
	pub agent_id: String,
	pub kind: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct TagFilterDto {
	#[serde(default)]
	pub include: Vec<String>,
	#[serde(default)]
	pub require: Vec<String>,
	#[serde(default)]
	pub exclude: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RelatedToDto {
	pub entry_type: String,
	pub entry_id: Uuid,
	pub relation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
	pub agent_id: String,
	pub types: Vec<String>,
	pub scope_type: String,
	pub scope_id: Option<Uuid>,
	#[serde(default)]
	pub inherit: bool,
	#[serde(default)]
	pub tags: TagFilterDto,
	pub search: Option<String>,
	pub related_to: Option<RelatedToDto>,
	#[serde(default)]
	pub limit: u32,
	pub cursor: Option<String>,
	#[serde(default)]
	pub compact: bool,
	#[serde(default)]
	pub include_inactive: bool,
	#[serde(default)]
	pub include_versions: bool,
}

#[derive(Debug, Serialize)]
pub struct ResultItemDto {
	pub entry: EntryDto,
	pub version: Option<EntryVersionDto>,
	pub history: Option<Vec<EntryVersionDto>>,
	pub tags: Vec<TagDto>,
	pub score: f32,
}

#[derive(Debug, Serialize)]
pub struct QueryMetaDto {
	pub returned_count: usize,
	pub total_count: usize,
	pub truncated: bool,
	pub has_more: bool,
	pub next_cursor: Option<String>,
	pub degraded: bool,
}

#[derive(Debug, Serialize)]
pub struct QueryResponseDto {
	pub results: Vec<ResultItemDto>,
	pub meta: QueryMetaDto,
}

impl From<strata_service::query::QueryResponse> for QueryResponseDto {
	fn from(response: strata_service::query::QueryResponse) -> Self {
		Self {
			results: response
				.results
				.into_iter()
				.map(|item| ResultItemDto {
					entry: item.entry.into(),
					version: item.version.map(Into::into),
					history: item.history.map(|rows| rows.into_iter().map(Into::into).collect()),
					tags: item.tags.into_iter().map(Into::into).collect(),
					score: item.score,
				})
				.collect(),
			meta: QueryMetaDto {
				returned_count: response.meta.returned_count,
				total_count: response.meta.total_count,
				truncated: response.meta.truncated,
				has_more: response.meta.has_more,
				next_cursor: response.meta.next_cursor,
				degraded: response.meta.degraded,
			},
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct ContextRequest {
	pub agent_id: String,
	pub scope_type: String,
	pub scope_id: Option<Uuid>,
	#[serde(default)]
	pub inherit: bool,
	#[serde(default)]
	pub compact: bool,
	#[serde(default = "default_limit_per_type")]
	pub limit_per_type: u32,
	#[serde(default)]
	pub hierarchical: bool,
}

fn default_limit_per_type() -> u32 {
	10
}

#[derive(Debug, Serialize)]
pub struct ScopeBundleDto {
	pub scope_type: String,
	pub scope_id: Option<Uuid>,
	pub by_kind: Vec<(String, Vec<EntryDto>)>,
}

#[derive(Debug, Serialize)]
pub struct ContextResponseDto {
	pub scopes: Vec<ScopeBundleDto>,
}

impl From<strata_service::context::ContextResponse> for ContextResponseDto {
	fn from(response: strata_service::context::ContextResponse) -> Self {
		Self {
			scopes: response
				.scopes
				.into_iter()
				.map(|bundle| ScopeBundleDto {
					scope_type: bundle.scope_type,
					scope_id: bundle.scope_id,
					by_kind: bundle
						.by_kind
						.into_iter()
						.map(|(kind, rows)| (kind, rows.into_iter().map(Into::into).collect()))
						.collect(),
				})
				.collect(),
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
	pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
	pub org_id: Option<Uuid>,
	pub name: String,
	pub description: Option<String>,
	pub root_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrganizationRequest {
	pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ListProjectsQuery {
	pub org_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
	pub description: Option<String>,
	pub root_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListSessionsQuery {
	pub project_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSessionStatusRequest {
	pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
	pub project_id: Option<Uuid>,
	pub name: Option<String>,
	pub purpose: Option<String>,
	pub agent_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrganizationDto {
	pub id: Uuid,
	pub name: String,
}

impl From<strata_storage::models::Organization> for OrganizationDto {
	fn from(org: strata_storage::models::Organization) -> Self {
		Self { id: org.id, name: org.name }
	}
}

#[derive(Debug, Serialize)]
pub struct ProjectDto {
	pub id: Uuid,
	pub org_id: Option<Uuid>,
	pub name: String,
	pub description: Option<String>,
	pub root_path: Option<String>,
}

impl From<strata_storage::models::Project> for ProjectDto {
	fn from(project: strata_storage::models::Project) -> Self {
		Self {
			id: project.id,
			org_id: project.org_id,
			name: project.name,
			description: project.description,
			root_path: project.root_path,
		}
	}
}

#[derive(Debug, Serialize)]
pub struct SessionDto {
	pub id: Uuid,
	pub project_id: Option<Uuid>,
	pub name: Option<String>,
	pub purpose: Option<String>,
	pub agent_id: Option<String>,
	pub status: String,
}

impl From<strata_storage::models::Session> for SessionDto {
	fn from(session: strata_storage::models::Session) -> Self {
		Self {
			id: session.id,
			project_id: session.project_id,
			name: session.name,
			purpose: session.purpose,
			agent_id: session.agent_id,
			status: session.status,
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct CreateTagRequest {
	pub name: String,
	pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct AttachTagRequest {
	pub entry_type: String,
	pub entry_id: Uuid,
	pub tag_name: String,
	pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct DetachTagQuery {
	pub entry_type: String,
	pub entry_id: Uuid,
	pub tag_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CreateRelationRequest {
	pub source_type: String,
	pub source_id: Uuid,
	pub target_type: String,
	pub target_id: Uuid,
	pub relation_type: String,
}

#[derive(Debug, Deserialize)]
pub struct RelationDirectionQuery {
	#[serde(default)]
	pub direction: RelationDirection,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RelationDirection {
	#[default]
	Outgoing,
	Incoming,
}

#[derive(Debug, Deserialize)]
pub struct GrantRequest {
	pub agent_id: String,
	pub scope_type: String,
	pub scope_id: Option<Uuid>,
	pub entry_type: Option<String>,
	pub level: String,
	pub granted_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PermissionCheckQuery {
	pub agent_id: String,
	pub scope_type: String,
	pub scope_id: Option<Uuid>,
	pub entry_type: String,
	pub level: String,
}

#[derive(Debug, Serialize)]
pub struct PermissionCheckResponse {
	pub allowed: bool,
}

#[derive(Debug, Deserialize)]
pub struct AdminActionRequest {
	pub admin_key: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
	pub admin_key: String,
	#[serde(default)]
	pub confirm: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
	pub entry_count: i64,
	pub active_entry_count: i64,
	pub pending_embedding_jobs: i64,
	pub failed_embedding_jobs: i64,
}

impl From<strata_service::admin::Status> for StatusResponse {
	fn from(status: strata_service::admin::Status) -> Self {
		Self {
			entry_count: status.entry_count,
			active_entry_count: status.active_entry_count,
			pending_embedding_jobs: status.pending_embedding_jobs,
			failed_embedding_jobs: status.failed_embedding_jobs,
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
	pub admin_key: String,
	pub agent_id: String,
	pub strategy: String,
	pub document: strata_service::admin::ExportDocument,
}

#[derive(Debug, Serialize)]
pub struct ImportReportDto {
	pub created: u32,
	pub updated: u32,
	pub skipped: u32,
}

impl From<strata_service::admin::ImportReport> for ImportReportDto {
	fn from(report: strata_service::admin::ImportReport) -> Self {
		Self { created: report.created, updated: report.updated, skipped: report.skipped }
	}
}
