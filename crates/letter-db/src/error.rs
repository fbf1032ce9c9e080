use rusqlite::ffi;
use thiserror::Error;

/// Store failures, classified so callers can tell constraint violations
/// apart from everything else.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A UNIQUE or PRIMARY KEY constraint rejected the write.
    #[error("duplicate key")]
    Duplicate,

    /// A FOREIGN KEY constraint rejected the write.
    #[error("referenced record does not exist")]
    MissingReference,

    #[error("record not found")]
    NotFound,

    #[error("database lock poisoned")]
    Poisoned,

    #[error("sqlite error: {0}")]
    Sqlite(rusqlite::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if matches!(err, rusqlite::Error::QueryReturnedNoRows) {
            return Self::NotFound;
        }
        match err.sqlite_error().map(|code| code.extended_code) {
            Some(ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY) => Self::Duplicate,
            Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => Self::MissingReference,
            _ => Self::Sqlite(err),
        }
    }
}
