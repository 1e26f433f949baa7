use uuid::Uuid;

use crate::{Error, Result, StrataService};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
	Read,
	Write,
	Admin,
}

impl Level {
	fn parse(value: &str) -> Option<Self> {
		match value {
			"read" => Some(Self::Read),
			"write" => Some(Self::Write),
			"admin" => Some(Self::Admin),
			_ => None,
		}
	}
}

/// `(agentId, scopeType, scopeId?, entryType?, level)`, checked against the ancestor chain so a
/// grant on an outer scope covers every scope nested under it (§4.I).
pub async fn check(
	service: &StrataService,
	agent_id: &str,
	scope_type: &str,
	scope_id: Option<Uuid>,
	entry_type: &str,
	required: Level,
) -> Result<()> {
	if let Err(limited) = service.rate_limiter.check(agent_id, time::OffsetDateTime::now_utc()) {
		return Err(Error::RateLimited(format!(
			"agent '{agent_id}' exceeded its request rate; retry after {}s",
			limited.retry_after_seconds
		)));
	}

	if service.cfg.security.permission_mode == "permissive" {
		return Ok(());
	}

	let chain = match scope_id {
		Some(id) => strata_storage::scopes::ancestor_chain(&service.db, scope_type, id).await?,
		None => vec![("global".to_string(), None)],
	};

	let grants = strata_storage::permissions::grants_for_agent(&service.db, agent_id, &chain).await?;

	let allowed = grants.iter().any(|grant| {
		let grant_level = Level::parse(&grant.level);
		let entry_matches = grant.entry_type.as_deref().map(|t| t == entry_type).unwrap_or(true);

		entry_matches && grant_level.map(|level| level >= required).unwrap_or(false)
	});

	if allowed {
		Ok(())
	} else {
		Err(Error::PermissionDenied(format!(
			"agent '{agent_id}' lacks {required:?} on {scope_type} scope for '{entry_type}'"
		)))
	}
}

pub async fn require_admin(service: &StrataService, admin_key: &str) -> Result<()> {
	match &service.cfg.security.admin_key {
		Some(expected) if expected == admin_key => Ok(()),
		_ => Err(Error::PermissionDenied("invalid admin credential".to_string())),
	}
}
