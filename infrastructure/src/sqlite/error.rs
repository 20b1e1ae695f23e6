//! Error types for the SQLite store

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Startup-time store failures. Per-query failures never use this type;
/// they become `QueryResult::Failure`.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Cannot open database {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Read pool lock poisoned")]
    Poisoned,

    #[error("No allowed table exists in the database (allowlist: {0})")]
    EmptySchema(String),
}
