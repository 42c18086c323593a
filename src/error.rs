//! Error taxonomy for the indexer.
//!
//! Mirrors the three-tier policy from the design: fatal errors abort the
//! process, operation-fatal errors abort the current reference's
//! reconciliation (but let the sweep still run), and record-level problems
//! are logged and skipped by the caller without a typed variant at all.

use thiserror::Error;

/// Failures that make the database unusable for the rest of the process.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to open database at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: turso::Error,
    },
    #[error("failed to apply migration {version} ({name}): {source}")]
    Migration {
        version: u32,
        name: String,
        #[source]
        source: turso::Error,
    },
    #[error("statement preparation failed: {0}")]
    Prepare(#[source] turso::Error),
    #[error("transaction control failed: {0}")]
    Transaction(#[source] turso::Error),
}

/// Failures talking to the version-control object layer.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("{path} is not a git repository")]
    NotARepository { path: String },
    #[error("could not derive a repository name from path {path}")]
    UnnamableRepository { path: String },
    #[error("failed to peel reference {name}: {source}")]
    Peel {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("failed to read repository config: {0}")]
    Config(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("`git log` subprocess failed to start: {0}")]
    SpawnLog(#[source] std::io::Error),
    #[error("`git log` exited with status {0}")]
    LogExitStatus(std::process::ExitStatus),
    #[error("`git log` produced a commit hash not previously inserted: {0}")]
    UnknownCommitInLog(String),
    #[error("first-parent walk exceeded the safety bound ({bound} commits) for reference {name}; likely a force-push with disjoint history")]
    WalkBoundExceeded { name: String, bound: usize },
}

/// Operation-fatal errors: abort the current reference, not the process.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Git(#[from] GitError),
    #[error("database operation failed: {0}")]
    Database(#[source] turso::Error),
}

/// Top-level error returned from `main`; its variant decides the exit code.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("fatal: {0}")]
    Schema(#[from] SchemaError),
    #[error("repository open/naming failed: {0}")]
    Naming(#[from] GitError),
    #[error("sync failed: {0}")]
    Sync(#[from] SyncError),
    #[error("repository {0:?} is not registered")]
    UnknownRepository(String),
}

impl From<turso::Error> for SyncError {
    fn from(e: turso::Error) -> Self {
        SyncError::Database(e)
    }
}
