//! Sync-context orchestration: the single entry point each CLI action goes
//! through, replacing the global state the teacher keeps process-wide.

use crate::config::RuntimeConfig;
use crate::db::Database;
use crate::error::{IndexError, SyncError};
use crate::git::GitRepo;
use crate::{refs, repository};
use std::path::Path;
use tracing::info;

/// Bundles everything a sync pass needs, threaded explicitly rather than
/// held as process-wide globals.
pub struct SyncContext<'a> {
    pub db: &'a Database,
    pub repository_id: i64,
    pub git: GitRepo,
    pub git_dir: std::path::PathBuf,
    pub config: RuntimeConfig,
}

/// Sync the bare repository at `git_dir` into `db`, per spec.md §4's full
/// pipeline: registry upsert, then reference reconciliation for every
/// branch and tag.
pub async fn run_sync(db: &Database, git_dir: &Path, config: RuntimeConfig) -> Result<(), IndexError> {
    let git = GitRepo::open(git_dir)?;
    let name = git.derive_name(git_dir)?;
    let path_str = git_dir.to_string_lossy().to_string();

    let repository_id = repository::upsert(db, &name, &path_str, None)
        .await
        .map_err(SyncError::from)?;

    info!(repository = %name, %repository_id, "syncing repository");

    let ctx = SyncContext {
        db,
        repository_id,
        git,
        git_dir: git_dir.to_path_buf(),
        config,
    };

    refs::reconcile(ctx.db, &ctx.git, &ctx.git_dir, ctx.repository_id, &ctx.config).await?;

    info!(repository = %name, "sync complete");
    Ok(())
}

/// Delete the repository registered under `name`.
pub async fn run_delete(db: &Database, name: &str) -> Result<(), IndexError> {
    let removed = repository::delete(db, name).await.map_err(SyncError::from)?;
    if !removed {
        return Err(IndexError::UnknownRepository(name.to_string()));
    }
    info!(repository = %name, "repository deleted");
    Ok(())
}
