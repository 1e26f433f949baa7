pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Terminal error kind surfaced to every transport. Each variant carries a human-readable message;
/// the transports map the variant itself to a status code / tool-call error kind.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Not found: {0}")]
	NotFound(String),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Invalid scope: {0}")]
	InvalidScope(String),
	#[error("Duplicate name: {0}")]
	DuplicateName(String),
	#[error("Version conflict: {0}")]
	VersionConflict(String),
	#[error("Permission denied: {0}")]
	PermissionDenied(String),
	#[error("Rate limited: {0}")]
	RateLimited(String),
	#[error("Cursor is invalid.")]
	CursorInvalid,
	#[error("Cursor has expired.")]
	CursorExpired,
	#[error("Capability unavailable: {0}")]
	CapabilityUnavailable(String),
	#[error("Storage failure: {0}")]
	StorageFailure(String),
	#[error("Internal error: {0}")]
	Internal(String),
}

impl Error {
	/// Machine-readable kind, matched 1:1 against §7's enumerated error kinds.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::NotFound(_) => "NotFound",
			Self::InvalidArgument(_) => "InvalidArgument",
			Self::InvalidScope(_) => "InvalidScope",
			Self::DuplicateName(_) => "DuplicateName",
			Self::VersionConflict(_) => "VersionConflict",
			Self::PermissionDenied(_) => "PermissionDenied",
			Self::RateLimited(_) => "RateLimited",
			Self::CursorInvalid => "CursorInvalid",
			Self::CursorExpired => "CursorExpired",
			Self::CapabilityUnavailable(_) => "CapabilityUnavailable",
			Self::StorageFailure(_) => "StorageFailure",
			Self::Internal(_) => "Internal",
		}
	}
}

impl From<strata_storage::Error> for Error {
	fn from(err: strata_storage::Error) -> Self {
		match err {
			strata_storage::Error::Sqlx(inner) => classify_sqlx_error(inner),
			strata_storage::Error::InvalidArgument(message) => Self::InvalidArgument(message),
			strata_storage::Error::NotFound(message) => Self::NotFound(message),
			strata_storage::Error::Conflict(message) => Self::VersionConflict(message),
		}
	}
}

impl From<strata_domain::Error> for Error {
	fn from(err: strata_domain::Error) -> Self {
		match err {
			strata_domain::Error::InvalidArgument(message) => Self::InvalidArgument(message),
			strata_domain::Error::InvalidScope(message) => Self::InvalidScope(message),
			strata_domain::Error::CursorInvalid => Self::CursorInvalid,
			strata_domain::Error::CursorExpired => Self::CursorExpired,
		}
	}
}

/// Distinguishes `RowNotFound` and constraint violations (by constraint name) from other database
/// errors, per §7's implementation strategy.
fn classify_sqlx_error(err: sqlx::Error) -> Error {
	if matches!(err, sqlx::Error::RowNotFound) {
		return Error::NotFound("row not found".to_string());
	}

	if let Some(db_err) = err.as_database_error() {
		let constraint = db_err.constraint().unwrap_or_default();

		if constraint.contains("unique_name_per_scope") || db_err.is_unique_violation() {
			return Error::DuplicateName(db_err.message().to_string());
		}
	}

	Error::StorageFailure(err.to_string())
}
