//! # repo-index
//!
//! Incrementally indexes a bare git repository's commit graph, file-touch
//! relation, and reference set into an embedded relational database, so
//! that history browsing, file-level log, and ancestor queries can be
//! served without re-reading the repository's object database each time.
//!
//! The indexer is safe to re-run: a sync pass only does work for commits
//! and references that changed since the last pass.

pub mod cli;
pub mod commit;
pub mod config;
pub mod db;
pub mod enumerator;
pub mod error;
pub mod files;
pub mod git;
pub mod refs;
pub mod repository;
pub mod sync;
pub mod walker;

pub use error::IndexError;
pub use sync::{run_delete, run_sync, SyncContext};
