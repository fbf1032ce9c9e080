use letter_db::StoreError;
use thiserror::Error;

/// Failure reasons returned by every core operation.
///
/// The `Display` text is the reason shown to callers; `Store` keeps the
/// underlying error as its source for logging only.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("invalid token")]
    Unauthorized,

    #[error("store failure")]
    Store(#[source] StoreError),

    #[error("request cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::NotFound(reason.into())
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict(reason.into())
    }
}

/// Generic translation; operations that care about which record collided
/// map `Duplicate` and `MissingReference` themselves first.
impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => Self::conflict("duplicate record"),
            StoreError::MissingReference | StoreError::NotFound => Self::not_found("record not found"),
            other => Self::Store(other),
        }
    }
}
