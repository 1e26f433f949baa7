use std::{net::SocketAddr, sync::Arc};

use rmcp::{
	ErrorData as McpError, ServerHandler,
	handler::server::{router::tool::ToolRouter, tool::Parameters},
	model::{CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
	tool, tool_handler, tool_router,
	transport::streamable_http_server::{StreamableHttpService, session::local::LocalSessionManager},
};
use schemars::JsonSchema;
use serde::Deserialize;
use uuid::Uuid;

use strata_service::StrataService;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddEntryArgs {
	pub agent_id: String,
	pub kind: String,
	pub scope_type: String,
	pub scope_id: Option<String>,
	pub name: String,
	pub category: Option<String>,
	pub content: String,
	pub rationale: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetEntryArgs {
	pub entry_id: Uuid,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListEntriesArgs {
	pub kind: Option<String>,
	pub scope_type: Option<String>,
	pub scope_id: Option<Uuid>,
	#[serde(default)]
	pub include_inactive: bool,
	pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct QueryArgs {
	pub agent_id: String,
	pub types: Vec<String>,
	pub scope_type: String,
	pub scope_id: Option<Uuid>,
	#[serde(default)]
	pub inherit: bool,
	pub search: Option<String>,
	#[serde(default)]
	pub limit: u32,
	pub cursor: Option<String>,
	#[serde(default)]
	pub compact: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ContextArgs {
	pub agent_id: String,
	pub scope_type: String,
	pub scope_id: Option<Uuid>,
	#[serde(default)]
	pub inherit: bool,
	#[serde(default)]
	pub compact: bool,
	#[serde(default = "default_limit_per_type")]
	pub limit_per_type: u32,
}

fn default_limit_per_type() -> u32 {
	10
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateEntryArgs {
	pub agent_id: String,
	pub kind: String,
	pub entry_id: Uuid,
	pub expected_version_id: Uuid,
	pub content: String,
	pub rationale: Option<String>,
	pub change_reason: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetHistoryArgs {
	pub entry_id: Uuid,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeactivateEntryArgs {
	pub agent_id: String,
	pub kind: String,
	pub entry_id: Uuid,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateOrganizationArgs {
	pub name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateProjectArgs {
	pub org_id: Option<Uuid>,
	pub name: String,
	pub description: Option<String>,
	pub root_path: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct StartSessionArgs {
	pub project_id: Option<Uuid>,
	pub name: Option<String>,
	pub purpose: Option<String>,
	pub agent_id: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct EndSessionArgs {
	pub session_id: Uuid,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateTagArgs {
	pub name: String,
	pub category: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AttachTagArgs {
	pub entry_type: String,
	pub entry_id: Uuid,
	pub tag_name: String,
	pub category: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateRelationArgs {
	pub source_type: String,
	pub source_id: Uuid,
	pub target_type: String,
	pub target_id: Uuid,
	pub relation_type: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GrantPermissionArgs {
	pub agent_id: String,
	pub scope_type: String,
	pub scope_id: Option<Uuid>,
	pub entry_type: Option<String>,
	pub level: String,
	pub granted_by: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RevokePermissionArgs {
	pub grant_id: Uuid,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListPermissionsArgs {
	pub agent_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AdminStatusArgs {}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AdminResetArgs {
	pub admin_key: String,
	pub confirm: bool,
}

/// Exposes the core memory operations as MCP tools over the `strata-service` module set, for
/// agents that connect over MCP instead of the REST surface.
#[derive(Clone)]
pub struct StrataMcp {
	service: Arc<StrataService>,
	tool_router: ToolRouter<StrataMcp>,
}

fn tool_error(err: strata_service::Error) -> McpError {
	McpError::internal_error(err.to_string(), None)
}

fn json_result<T: serde::Serialize>(value: &T) -> Result<CallToolResult, McpError> {
	let text = serde_json::to_string(value).map_err(|err| McpError::internal_error(err.to_string(), None))?;

	Ok(CallToolResult::success(vec![Content::text(text)]))
}

#[tool_router]
impl StrataMcp {
	pub fn new(service: Arc<StrataService>) -> Self {
		Self { service, tool_router: Self::tool_router() }
	}

	#[tool(description = "Create a new tool, guideline, knowledge, or experience entry in a scope.")]
	pub async fn add_entry(&self, Parameters(args): Parameters<AddEntryArgs>) -> Result<CallToolResult, McpError> {
		let (entry, version) = strata_service::entries::add(
			&self.service,
			strata_service::entries::AddEntryRequest {
				agent_id: &args.agent_id,
				kind: &args.kind,
				scope_type: &args.scope_type,
				scope_id: args.scope_id.as_deref(),
				name: &args.name,
				category: args.category.as_deref(),
				priority: None,
				content: &args.content,
				rationale: args.rationale.as_deref(),
				examples: None,
				parameters: None,
				created_by: Some(&args.agent_id),
			},
		)
		.await
		.map_err(tool_error)?;

		json_result(&(entry.id, version.id, version.version_num))
	}

	#[tool(description = "Fetch an entry by id.")]
	pub async fn get_entry(&self, Parameters(args): Parameters<GetEntryArgs>) -> Result<CallToolResult, McpError> {
		let entry = strata_service::entries::get(&self.service, args.entry_id).await.map_err(tool_error)?;

		json_result(&entry.name)
	}

	#[tool(description = "List active entries matching an optional kind/scope/category filter.")]
	pub async fn list_entries(&self, Parameters(args): Parameters<ListEntriesArgs>) -> Result<CallToolResult, McpError> {
		let filter = strata_service::entries::ListFilter {
			kind: args.kind.as_deref(),
			scope_type: args.scope_type.as_deref(),
			scope_id: args.scope_id,
			category: None,
			include_inactive: args.include_inactive,
		};

		let rows = strata_service::entries::list(&self.service, filter, args.limit.unwrap_or(50), 0).await.map_err(tool_error)?;
		let names: Vec<String> = rows.into_iter().map(|entry| entry.name).collect();

		json_result(&names)
	}

	#[tool(description = "Run the hybrid retrieval pipeline: lexical + semantic search, fused, reranked, and prioritized.")]
	pub async fn query(&self, Parameters(args): Parameters<QueryArgs>) -> Result<CallToolResult, McpError> {
		let spec = strata_service::query::QuerySpec {
			types: args.types,
			scope_type: args.scope_type,
			scope_id: args.scope_id,
			inherit: args.inherit,
			tags: strata_service::query::TagFilter::default(),
			search: args.search,
			related_to: None,
			limit: args.limit,
			cursor: args.cursor,
			compact: args.compact,
			include_inactive: false,
			include_versions: false,
		};

		let response = strata_service::query::execute(&self.service, &args.agent_id, spec).await.map_err(tool_error)?;
		let names: Vec<(String, f32)> = response.results.iter().map(|item| (item.entry.name.clone(), item.score)).collect();

		json_result(&names)
	}

	#[tool(description = "Aggregate active entries of every kind across a scope chain, for priming an agent's working context.")]
	pub async fn context(&self, Parameters(args): Parameters<ContextArgs>) -> Result<CallToolResult, McpError> {
		let response = strata_service::context::build(
			&self.service,
			strata_service::context::ContextRequest {
				agent_id: &args.agent_id,
				scope_type: &args.scope_type,
				scope_id: args.scope_id,
				inherit: args.inherit,
				compact: args.compact,
				limit_per_type: args.limit_per_type,
				hierarchical: false,
			},
		)
		.await
		.map_err(tool_error)?;

		let by_kind: Vec<(String, usize)> =
			response.scopes.into_iter().flat_map(|bundle| bundle.by_kind).map(|(kind, rows)| (kind, rows.len())).collect();

		json_result(&by_kind)
	}

	#[tool(description = "Update an entry's content, creating a new version guarded by optimistic concurrency.")]
	pub async fn update_entry(&self, Parameters(args): Parameters<UpdateEntryArgs>) -> Result<CallToolResult, McpError> {
		let (entry, version) = strata_service::entries::update(
			&self.service,
			strata_service::entries::UpdateEntryRequest {
				agent_id: &args.agent_id,
				kind: &args.kind,
				entry_id: args.entry_id,
				expected_version_id: args.expected_version_id,
				content: &args.content,
				rationale: args.rationale.as_deref(),
				examples: None,
				parameters: None,
				change_reason: args.change_reason.as_deref(),
				created_by: Some(&args.agent_id),
			},
		)
		.await
		.map_err(tool_error)?;

		json_result(&(entry.id, version.id, version.version_num))
	}

	#[tool(description = "Fetch the newest-first version history for an entry.")]
	pub async fn get_history(&self, Parameters(args): Parameters<GetHistoryArgs>) -> Result<CallToolResult, McpError> {
		let versions = strata_service::entries::history(&self.service, args.entry_id).await.map_err(tool_error)?;
		let nums: Vec<i32> = versions.into_iter().map(|v| v.version_num).collect();

		json_result(&nums)
	}

	#[tool(description = "Deactivate an entry and prune its derived index rows.")]
	pub async fn deactivate_entry(&self, Parameters(args): Parameters<DeactivateEntryArgs>) -> Result<CallToolResult, McpError> {
		strata_service::entries::deactivate(&self.service, &args.agent_id, &args.kind, args.entry_id).await.map_err(tool_error)?;

		json_result(&true)
	}

	#[tool(description = "Create an organization scope.")]
	pub async fn create_organization(&self, Parameters(args): Parameters<CreateOrganizationArgs>) -> Result<CallToolResult, McpError> {
		let org = strata_service::scopes::create_organization(&self.service, &args.name).await.map_err(tool_error)?;

		json_result(&org.id)
	}

	#[tool(description = "Create a project, optionally under an organization.")]
	pub async fn create_project(&self, Parameters(args): Parameters<CreateProjectArgs>) -> Result<CallToolResult, McpError> {
		let project = strata_service::scopes::create_project(
			&self.service,
			args.org_id,
			&args.name,
			args.description.as_deref(),
			args.root_path.as_deref(),
		)
		.await
		.map_err(tool_error)?;

		json_result(&project.id)
	}

	#[tool(description = "Start a session, optionally under a project.")]
	pub async fn start_session(&self, Parameters(args): Parameters<StartSessionArgs>) -> Result<CallToolResult, McpError> {
		let session = strata_service::scopes::start_session(
			&self.service,
			args.project_id,
			args.name.as_deref(),
			args.purpose.as_deref(),
			args.agent_id.as_deref(),
		)
		.await
		.map_err(tool_error)?;

		json_result(&session.id)
	}

	#[tool(description = "Mark a session completed.")]
	pub async fn end_session(&self, Parameters(args): Parameters<EndSessionArgs>) -> Result<CallToolResult, McpError> {
		let session = strata_service::scopes::end_session(&self.service, args.session_id).await.map_err(tool_error)?;

		json_result(&session.status)
	}

	#[tool(description = "Create or upsert a tag.")]
	pub async fn create_tag(&self, Parameters(args): Parameters<CreateTagArgs>) -> Result<CallToolResult, McpError> {
		let tag = strata_service::tags::create_tag(&self.service, &args.name, &args.category).await.map_err(tool_error)?;

		json_result(&tag.id)
	}

	#[tool(description = "Attach a tag (creating it if needed) to an entry.")]
	pub async fn attach_tag(&self, Parameters(args): Parameters<AttachTagArgs>) -> Result<CallToolResult, McpError> {
		strata_service::tags::attach(&self.service, &args.entry_type, args.entry_id, &args.tag_name, &args.category)
			.await
			.map_err(tool_error)?;

		json_result(&true)
	}

	#[tool(description = "Create a directed relation between two entries.")]
	pub async fn create_relation(&self, Parameters(args): Parameters<CreateRelationArgs>) -> Result<CallToolResult, McpError> {
		let relation = strata_service::relations::create(
			&self.service,
			&args.source_type,
			args.source_id,
			&args.target_type,
			args.target_id,
			&args.relation_type,
		)
		.await
		.map_err(tool_error)?;

		json_result(&relation.id)
	}

	#[tool(description = "Grant an agent a permission level over a scope, optionally restricted to one entry type.")]
	pub async fn grant_permission(&self, Parameters(args): Parameters<GrantPermissionArgs>) -> Result<CallToolResult, McpError> {
		let grant = strata_service::permissions::grant(
			&self.service,
			strata_service::permissions::GrantRequest {
				agent_id: &args.agent_id,
				scope_type: &args.scope_type,
				scope_id: args.scope_id,
				entry_type: args.entry_type.as_deref(),
				level: &args.level,
				granted_by: args.granted_by.as_deref(),
				expires_at: None,
			},
		)
		.await
		.map_err(tool_error)?;

		json_result(&grant.id)
	}

	#[tool(description = "Revoke a permission grant by id.")]
	pub async fn revoke_permission(&self, Parameters(args): Parameters<RevokePermissionArgs>) -> Result<CallToolResult, McpError> {
		strata_service::permissions::revoke(&self.service, args.grant_id).await.map_err(tool_error)?;

		json_result(&true)
	}

	#[tool(description = "List permission grants held by an agent.")]
	pub async fn list_permissions(&self, Parameters(args): Parameters<ListPermissionsArgs>) -> Result<CallToolResult, McpError> {
		let grants = strata_service::permissions::list(&self.service, &args.agent_id).await.map_err(tool_error)?;
		let ids: Vec<Uuid> = grants.into_iter().map(|g| g.id).collect();

		json_result(&ids)
	}

	#[tool(description = "Report entry and embedding-queue counts for operational visibility.")]
	pub async fn admin_status(&self, Parameters(_args): Parameters<AdminStatusArgs>) -> Result<CallToolResult, McpError> {
		let status = strata_service::admin::status(&self.service).await.map_err(tool_error)?;

		json_result(&(status.entry_count, status.active_entry_count, status.pending_embedding_jobs, status.failed_embedding_jobs))
	}

	#[tool(description = "Destructively truncate all memory tables. Requires the admin credential and an explicit confirm flag.")]
	pub async fn admin_reset(&self, Parameters(args): Parameters<AdminResetArgs>) -> Result<CallToolResult, McpError> {
		strata_service::admin::reset(&self.service, &args.admin_key, args.confirm).await.map_err(tool_error)?;

		json_result(&true)
	}
}

#[tool_handler]
impl ServerHandler for StrataMcp {
	fn get_info(&self) -> ServerInfo {
		ServerInfo {
			protocol_version: ProtocolVersion::LATEST,
			capabilities: ServerCapabilities::builder().enable_tools().build(),
			server_info: Implementation::from_build_env(),
			instructions: Some("Scoped, versioned, hybrid-retrievable memory store for autonomous agents.".to_string()),
		}
	}
}

pub async fn serve_mcp(bind: &str, service: Arc<StrataService>) -> color_eyre::Result<()> {
	let addr: SocketAddr = bind.parse()?;
	let mcp_service = StreamableHttpService::new(
		move || Ok(StrataMcp::new(service.clone())),
		LocalSessionManager::default().into(),
		Default::default(),
	);

	let router = axum::Router::new().nest_service("/mcp", mcp_service);
	let listener = tokio::net::TcpListener::bind(addr).await?;

	tracing::info!(%addr, "MCP server listening.");
	axum::serve(listener, router).await?;

	Ok(())
}
