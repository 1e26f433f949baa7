use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use uuid::Uuid;

use crate::state::*;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/entries", post(add_entry).get(list_entries))
		.route("/v1/entries/{entry_id}", get(get_entry).put(update_entry).delete(deactivate_entry))
		.route("/v1/entries/{entry_id}/history", get(get_history))
		.route("/v1/query", post(query))
		.route("/v1/context", post(context))
		.route("/v1/organizations", post(create_organization).get(list_organizations))
		.route("/v1/organizations/{org_id}", put(update_organization))
		.route("/v1/projects", post(create_project).get(list_projects))
		.route("/v1/projects/{project_id}", get(get_project).put(update_project))
		.route("/v1/sessions", post(start_session).get(list_sessions))
		.route("/v1/sessions/{session_id}", put(update_session_status))
		.route("/v1/sessions/{session_id}/end", post(end_session))
		.route("/v1/tags", post(create_tag).get(list_tags).delete(detach_tag))
		.route("/v1/tags/attach", post(attach_tag))
		.route("/v1/tags/{entry_type}/{entry_id}", get(tags_for_entry))
		.route("/v1/relations", post(create_relation))
		.route("/v1/relations/{source_type}/{source_id}", get(list_relations))
		.route("/v1/relations/by-id/{relation_id}", delete(delete_relation))
		.route("/v1/permissions/check", get(check_permission))
		.route("/v1/permissions/grant", post(grant_permission))
		.route("/v1/permissions/revoke/{grant_id}", post(revoke_permission))
		.route("/v1/permissions/{agent_id}", get(list_permissions))
		.with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	Router::new()
		.route("/v1/admin/init", post(admin_init))
		.route("/v1/admin/status", get(admin_status))
		.route("/v1/admin/reset", post(admin_reset))
		.route("/v1/admin/export", get(admin_export))
		.route("/v1/admin/import", post(admin_import))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn add_entry(State(state): State<AppState>, Json(payload): Json<AddEntryRequest>) -> Result<Json<EntryWithVersion>, ApiError> {
	let (entry, version) = strata_service::entries::add(
		&state.service,
		strata_service::entries::AddEntryRequest {
			agent_id: &payload.agent_id,
			kind: &payload.kind,
			scope_type: &payload.scope_type,
			scope_id: payload.scope_id.as_deref(),
			name: &payload.name,
			category: payload.category.as_deref(),
			priority: payload.priority,
			content: &payload.content,
			rationale: payload.rationale.as_deref(),
			examples: payload.examples,
			parameters: payload.parameters,
			created_by: Some(&payload.agent_id),
		},
	)
	.await?;

	Ok(Json(EntryWithVersion { entry: entry.into(), version: version.into() }))
}

async fn get_entry(State(state): State<AppState>, Path(entry_id): Path<Uuid>) -> Result<Json<EntryDto>, ApiError> {
	let entry = strata_service::entries::get(&state.service, entry_id).await?;

	Ok(Json(entry.into()))
}

async fn get_history(State(state): State<AppState>, Path(entry_id): Path<Uuid>) -> Result<Json<Vec<EntryVersionDto>>, ApiError> {
	let versions = strata_service::entries::history(&state.service, entry_id).await?;

	Ok(Json(versions.into_iter().map(Into::into).collect()))
}

async fn list_entries(State(state): State<AppState>, Query(query): Query<ListEntriesQuery>) -> Result<Json<Vec<EntryDto>>, ApiError> {
	let filter = strata_service::entries::ListFilter {
		kind: query.kind.as_deref(),
		scope_type: query.scope_type.as_deref(),
		scope_id: query.scope_id,
		category: query.category.as_deref(),
		include_inactive: query.include_inactive,
	};

	let rows = strata_service::entries::list(&state.service, filter, query.limit.unwrap_or(50), query.offset.unwrap_or(0)).await?;

	Ok(Json(rows.into_iter().map(Into::into).collect()))
}

async fn update_entry(
	State(state): State<AppState>,
	Path(entry_id): Path<Uuid>,
	Json(payload): Json<UpdateEntryRequest>,
) -> Result<Json<EntryWithVersion>, ApiError> {
	let (entry, version) = strata_service::entries::update(
		&state.service,
		strata_service::entries::UpdateEntryRequest {
			agent_id: &payload.agent_id,
			kind: &payload.kind,
			entry_id,
			expected_version_id: payload.expected_version_id,
			content: &payload.content,
			rationale: payload.rationale.as_deref(),
			examples: payload.examples,
			parameters: payload.parameters,
			change_reason: payload.change_reason.as_deref(),
			created_by: Some(&payload.agent_id),
		},
	)
	.await?;

	Ok(Json(EntryWithVersion { entry: entry.into(), version: version.into() }))
}

async fn deactivate_entry(
	State(state): State<AppState>,
	Path(entry_id): Path<Uuid>,
	Json(payload): Json<DeactivateRequest>,
) -> Result<StatusCode, ApiError> {
	strata_service::entries::deactivate(&state.service, &payload.agent_id, &payload.kind, entry_id).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn query(State(state): State<AppState>, Json(payload): Json<QueryRequest>) -> Result<Json<QueryResponseDto>, ApiError> {
	let spec = strata_service::query::QuerySpec {
		types: payload.types,
		scope_type: payload.scope_type,
		scope_id: payload.scope_id,
		inherit: payload.inherit,
		tags: strata_service::query::TagFilter {
			include: payload.tags.include,
			require: payload.tags.require,
			exclude: payload.tags.exclude,
		},
		search: payload.search,
		related_to: payload.related_to.map(|r| strata_service::query::RelatedTo {
			entry_type: r.entry_type,
			entry_id: r.entry_id,
			relation: r.relation,
		}),
		limit: payload.limit,
		cursor: payload.cursor,
		compact: payload.compact,
		include_inactive: payload.include_inactive,
		include_versions: payload.include_versions,
	};

	let response = strata_service::query::execute(&state.service, &payload.agent_id, spec).await?;

	Ok(Json(response.into()))
}

async fn context(State(state): State<AppState>, Json(payload): Json<ContextRequest>) -> Result<Json<ContextResponseDto>, ApiError> {
	let response = strata_service::context::build(
		&state.service,
		strata_service::context::ContextRequest {
			agent_id: &payload.agent_id,
			scope_type: &payload.scope_type,
			scope_id: payload.scope_id,
			inherit: payload.inherit,
			compact: payload.compact,
			limit_per_type: payload.limit_per_type,
			hierarchical: payload.hierarchical,
		},
	)
	.await?;

	Ok(Json(response.into()))
}

async fn create_organization(State(state): State<AppState>, Json(payload): Json<CreateOrganizationRequest>) -> Result<Json<OrganizationDto>, ApiError> {
	let org = strata_service::scopes::create_organization(&state.service, &payload.name).await?;

	Ok(Json(org.into()))
}

async fn list_organizations(State(state): State<AppState>) -> Result<Json<Vec<OrganizationDto>>, ApiError> {
	let orgs = strata_service::scopes::list_organizations(&state.service).await?;

	Ok(Json(orgs.into_iter().map(Into::into).collect()))
}

async fn update_organization(
	State(state): State<AppState>,
	Path(org_id): Path<Uuid>,
	Json(payload): Json<UpdateOrganizationRequest>,
) -> Result<Json<OrganizationDto>, ApiError> {
	let org = strata_service::scopes::update_organization(&state.service, org_id, &payload.name).await?;

	Ok(Json(org.into()))
}

async fn create_project(State(state): State<AppState>, Json(payload): Json<CreateProjectRequest>) -> Result<Json<ProjectDto>, ApiError> {
	let project = strata_service::scopes::create_project(
		&state.service,
		payload.org_id,
		&payload.name,
		payload.description.as_deref(),
		payload.root_path.as_deref(),
	)
	.await?;

	Ok(Json(project.into()))
}

async fn list_projects(State(state): State<AppState>, Query(query): Query<ListProjectsQuery>) -> Result<Json<Vec<ProjectDto>>, ApiError> {
	let projects = strata_service::scopes::list_projects(&state.service, query.org_id).await?;

	Ok(Json(projects.into_iter().map(Into::into).collect()))
}

async fn get_project(State(state): State<AppState>, Path(project_id): Path<Uuid>) -> Result<Json<ProjectDto>, ApiError> {
	let project = strata_service::scopes::get_project(&state.service, project_id).await?;

	Ok(Json(project.into()))
}

async fn update_project(
	State(state): State<AppState>,
	Path(project_id): Path<Uuid>,
	Json(payload): Json<UpdateProjectRequest>,
) -> Result<Json<ProjectDto>, ApiError> {
	let project =
		strata_service::scopes::update_project(&state.service, project_id, payload.description.as_deref(), payload.root_path.as_deref())
			.await?;

	Ok(Json(project.into()))
}

async fn start_session(State(state): State<AppState>, Json(payload): Json<StartSessionRequest>) -> Result<Json<SessionDto>, ApiError> {
	let session = strata_service::scopes::start_session(
		&state.service,
		payload.project_id,
		payload.name.as_deref(),
		payload.purpose.as_deref(),
		payload.agent_id.as_deref(),
	)
	.await?;

	Ok(Json(session.into()))
}

async fn end_session(State(state): State<AppState>, Path(session_id): Path<Uuid>) -> Result<Json<SessionDto>, ApiError> {
	let session = strata_service::scopes::end_session(&state.service, session_id).await?;

	Ok(Json(session.into()))
}

async fn list_sessions(State(state): State<AppState>, Query(query): Query<ListSessionsQuery>) -> Result<Json<Vec<SessionDto>>, ApiError> {
	let sessions = strata_service::scopes::list_sessions(&state.service, query.project_id).await?;

	Ok(Json(sessions.into_iter().map(Into::into).collect()))
}

async fn update_session_status(
	State(state): State<AppState>,
	Path(session_id): Path<Uuid>,
	Json(payload): Json<UpdateSessionStatusRequest>,
) -> Result<Json<SessionDto>, ApiError> {
	let session = strata_service::scopes::update_session_status(&state.service, session_id, &payload.status).await?;

	Ok(Json(session.into()))
}

async fn create_tag(State(state): State<AppState>, Json(payload): Json<CreateTagRequest>) -> Result<Json<TagDto>, ApiError> {
	let tag = strata_service::tags::create_tag(&state.service, &payload.name, &payload.category).await?;

	Ok(Json(tag.into()))
}

async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<TagDto>>, ApiError> {
	let tags = strata_service::tags::list_all(&state.service).await?;

	Ok(Json(tags.into_iter().map(Into::into).collect()))
}

async fn attach_tag(State(state): State<AppState>, Json(payload): Json<AttachTagRequest>) -> Result<StatusCode, ApiError> {
	strata_service::tags::attach(&state.service, &payload.entry_type, payload.entry_id, &payload.tag_name, &payload.category).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn detach_tag(State(state): State<AppState>, Query(query): Query<DetachTagQuery>) -> Result<StatusCode, ApiError> {
	strata_service::tags::detach(&state.service, &query.entry_type, query.entry_id, query.tag_id).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn tags_for_entry(
	State(state): State<AppState>,
	Path((entry_type, entry_id)): Path<(String, Uuid)>,
) -> Result<Json<Vec<TagDto>>, ApiError> {
	let tags = strata_service::tags::for_entry(&state.service, &entry_type, entry_id).await?;

	Ok(Json(tags.into_iter().map(Into::into).collect()))
}

async fn create_relation(State(state): State<AppState>, Json(payload): Json<CreateRelationRequest>) -> Result<Json<EntryRelationDto>, ApiError> {
	let relation = strata_service::relations::create(
		&state.service,
		&payload.source_type,
		payload.source_id,
		&payload.target_type,
		payload.target_id,
		&payload.relation_type,
	)
	.await?;

	Ok(Json(relation.into()))
}

async fn list_relations(
	State(state): State<AppState>,
	Path((source_type, source_id)): Path<(String, Uuid)>,
	Query(query): Query<RelationDirectionQuery>,
) -> Result<Json<Vec<EntryRelationDto>>, ApiError> {
	let relations = match query.direction {
		RelationDirection::Outgoing => strata_service::relations::list_outgoing(&state.service, &source_type, source_id).await?,
		RelationDirection::Incoming => strata_service::relations::list_incoming(&state.service, &source_type, source_id).await?,
	};

	Ok(Json(relations.into_iter().map(Into::into).collect()))
}

async fn delete_relation(State(state): State<AppState>, Path(relation_id): Path<Uuid>) -> Result<StatusCode, ApiError> {
	strata_service::relations::delete(&state.service, relation_id).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn grant_permission(State(state): State<AppState>, Json(payload): Json<GrantRequest>) -> Result<Json<PermissionGrantDto>, ApiError> {
	let grant = strata_service::permissions::grant(
		&state.service,
		strata_service::permissions::GrantRequest {
			agent_id: &payload.agent_id,
			scope_type: &payload.scope_type,
			scope_id: payload.scope_id,
			entry_type: payload.entry_type.as_deref(),
			level: &payload.level,
			granted_by: payload.granted_by.as_deref(),
			expires_at: None,
		},
	)
	.await?;

	Ok(Json(grant.into()))
}

async fn check_permission(
	State(state): State<AppState>,
	Query(query): Query<PermissionCheckQuery>,
) -> Result<Json<PermissionCheckResponse>, ApiError> {
	let allowed = strata_service::permissions::check(
		&state.service,
		&query.agent_id,
		&query.scope_type,
		query.scope_id,
		&query.entry_type,
		&query.level,
	)
	.await?;

	Ok(Json(PermissionCheckResponse { allowed }))
}

async fn revoke_permission(State(state): State<AppState>, Path(grant_id): Path<Uuid>) -> Result<StatusCode, ApiError> {
	strata_service::permissions::revoke(&state.service, grant_id).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn list_permissions(State(state): State<AppState>, Path(agent_id): Path<String>) -> Result<Json<Vec<PermissionGrantDto>>, ApiError> {
	let rows = strata_service::permissions::list(&state.service, &agent_id).await?;

	Ok(Json(rows.into_iter().map(Into::into).collect()))
}

async fn admin_init(State(state): State<AppState>, Json(payload): Json<AdminActionRequest>) -> Result<StatusCode, ApiError> {
	strata_service::admin::init(&state.service, &payload.admin_key).await?;

	Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, serde::Deserialize)]
struct AdminKeyQuery {
	admin_key: Option<String>,
	scope_type: Option<String>,
	scope_id: Option<Uuid>,
}

async fn admin_status(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
	let status = strata_service::admin::status(&state.service).await?;

	Ok(Json(status.into()))
}

async fn admin_reset(State(state): State<AppState>, Json(payload): Json<ResetRequest>) -> Result<StatusCode, ApiError> {
	strata_service::admin::reset(&state.service, &payload.admin_key, payload.confirm).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn admin_export(
	State(state): State<AppState>,
	Query(query): Query<AdminKeyQuery>,
) -> Result<Json<strata_service::admin::ExportDocument>, ApiError> {
	let admin_key = query.admin_key.as_deref().unwrap_or_default();
	strata_service::access::require_admin(&state.service, admin_key).await?;

	let document = strata_service::admin::export(&state.service, query.scope_type.as_deref(), query.scope_id).await?;

	Ok(Json(document))
}

async fn admin_import(State(state): State<AppState>, Json(payload): Json<ImportRequest>) -> Result<Json<ImportReportDto>, ApiError> {
	strata_service::access::require_admin(&state.service, &payload.admin_key).await?;

	let strategy = strata_service::admin::ConflictStrategy::parse(&payload.strategy)?;
	let report = strata_service::admin::import(&state.service, &payload.agent_id, &payload.document, strategy).await?;

	Ok(Json(report.into()))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}

impl From<strata_service::Error> for ApiError {
	fn from(err: strata_service::Error) -> Self {
		let status = match &err {
			strata_service::Error::NotFound(_) => StatusCode::NOT_FOUND,
			strata_service::Error::InvalidArgument(_)
			| strata_service::Error::InvalidScope(_)
			| strata_service::Error::CursorInvalid
			| strata_service::Error::CursorExpired => StatusCode::BAD_REQUEST,
			strata_service::Error::DuplicateName(_) | strata_service::Error::VersionConflict(_) => StatusCode::CONFLICT,
			strata_service::Error::PermissionDenied(_) => StatusCode::FORBIDDEN,
			strata_service::Error::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
			strata_service::Error::CapabilityUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
			strata_service::Error::StorageFailure(_) | strata_service::Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
		};

		Self { status, error_code: err.kind().to_string(), message: err.to_string() }
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
