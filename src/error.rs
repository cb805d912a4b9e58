use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures a query service can return to its caller. Cache trouble is
/// deliberately absent: the cache degrades to the backing store and is
/// never surfaced here.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A write referenced a user, account, or category that does not exist.
    #[error("referenced {0} does not exist")]
    Reference(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Store(#[from] sqlx::Error),
}

/// Migration failures. All of these are fatal to startup; the binary must
/// not serve requests over a partially migrated schema.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to read migrations directory {path}: {source}")]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The ledger table is an external precondition; the runner never
    /// creates it.
    #[error("migrations ledger table does not exist")]
    LedgerMissing,

    #[error("failed to read migration script {name}: {source}")]
    ScriptUnreadable {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("migration {name} failed: {source}")]
    ScriptExecution {
        name: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("ledger access failed: {0}")]
    Store(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct CacheError {
    message: String,
}

impl CacheError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
