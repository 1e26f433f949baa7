#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Invalid scope: {0}")]
	InvalidScope(String),
	#[error("Cursor is invalid.")]
	CursorInvalid,
	#[error("Cursor has expired.")]
	CursorExpired,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
