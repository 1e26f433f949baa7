use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeType {
	Global,
	Org,
	Project,
	Session,
}

impl ScopeType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Global => "global",
			Self::Org => "org",
			Self::Project => "project",
			Self::Session => "session",
		}
	}

	/// Lower is more specific: used as the scope-specificity tie-break factor in rank fusion.
	pub fn specificity(self) -> u8 {
		match self {
			Self::Session => 0,
			Self::Project => 1,
			Self::Org => 2,
			Self::Global => 3,
		}
	}

	pub fn parse(value: &str) -> Result<Self> {
		match value {
			"global" => Ok(Self::Global),
			"org" => Ok(Self::Org),
			"project" => Ok(Self::Project),
			"session" => Ok(Self::Session),
			other => Err(Error::InvalidArgument(format!("unknown scope type '{other}'"))),
		}
	}
}

/// Empty-string `scopeId` is never treated as "global" — only a null/absent value is. A
/// non-global scope type requires a present, non-empty id (`InvalidScope`); a global scope type
/// must not carry one (`InvalidArgument`).
pub fn validate_scope(scope_type: ScopeType, scope_id: Option<&str>) -> Result<Option<Uuid>> {
	match (scope_type, scope_id) {
		(ScopeType::Global, None) => Ok(None),
		(ScopeType::Global, Some(raw)) if raw.is_empty() => Ok(None),
		(ScopeType::Global, Some(_)) =>
			Err(Error::InvalidArgument("global scope must not carry a scopeId".into())),
		(_, None) => Err(Error::InvalidScope(format!(
			"{} scope requires a scopeId",
			scope_type.as_str()
		))),
		(_, Some(raw)) if raw.is_empty() =>
			Err(Error::InvalidScope(format!("{} scope requires a non-empty scopeId", scope_type.as_str()))),
		(_, Some(raw)) => Uuid::parse_str(raw)
			.map(Some)
			.map_err(|_| Error::InvalidScope(format!("scopeId '{raw}' is not a valid uuid"))),
	}
}
