use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Organization {
	pub id: Uuid,
	pub name: String,
	pub metadata: serde_json::Value,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Project {
	pub id: Uuid,
	pub org_id: Option<Uuid>,
	pub name: String,
	pub description: Option<String>,
	pub root_path: Option<String>,
	pub metadata: serde_json::Value,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
	pub id: Uuid,
	pub project_id: Option<Uuid>,
	pub name: Option<String>,
	pub purpose: Option<String>,
	pub agent_id: Option<String>,
	pub status: String,
	pub started_at: OffsetDateTime,
	pub ended_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Entry {
	pub id: Uuid,
	pub kind: String,
	pub scope_type: String,
	pub scope_id: Option<Uuid>,
	pub name: String,
	pub category: Option<String>,
	pub priority: Option<i32>,
	pub is_active: bool,
	pub current_version_id: Option<Uuid>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EntryVersion {
	pub id: Uuid,
	pub entry_id: Uuid,
	pub version_num: i32,
	pub content: String,
	pub rationale: Option<String>,
	pub examples: Option<serde_json::Value>,
	pub parameters: Option<serde_json::Value>,
	pub change_reason: Option<String>,
	pub created_by: Option<String>,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Tag {
	pub id: Uuid,
	pub name: String,
	pub category: String,
	pub is_predefined: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EntryTag {
	pub entry_type: String,
	pub entry_id: Uuid,
	pub tag_id: Uuid,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EntryRelation {
	pub id: Uuid,
	pub source_type: String,
	pub source_id: Uuid,
	pub target_type: String,
	pub target_id: Uuid,
	pub relation_type: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Embedding {
	pub entry_type: String,
	pub entry_id: Uuid,
	pub version_id: Uuid,
	pub vector: pgvector::Vector,
	pub model: String,
	pub provider: String,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RetrievalOutcome {
	pub entry_id: Uuid,
	pub retrieval_count: i64,
	pub success_count: i64,
	pub last_success_at: Option<OffsetDateTime>,
	pub last_access_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EmbeddingJob {
	pub id: Uuid,
	pub entry_type: String,
	pub entry_id: Uuid,
	pub version_id: Uuid,
	pub status: String,
	pub attempts: i32,
	pub next_attempt_at: OffsetDateTime,
	pub lease_expires_at: Option<OffsetDateTime>,
	pub last_error: Option<String>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PermissionGrant {
	pub id: Uuid,
	pub agent_id: String,
	pub scope_type: String,
	pub scope_id: Option<Uuid>,
	pub entry_type: Option<String>,
	pub level: String,
	pub granted_by: Option<String>,
	pub created_at: OffsetDateTime,
	pub expires_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct FtsMatch {
	pub entry_id: Uuid,
	pub rank: f32,
}

#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct VectorMatch {
	pub entry_id: Uuid,
	pub distance: f32,
}
