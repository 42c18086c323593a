//! Reference Reconciler: mark-and-sweep sync of branches and tags.

use crate::config::RuntimeConfig;
use crate::db::Database;
use crate::enumerator;
use crate::error::SyncError;
use crate::git::{show_name, GitRepo, RefKind};
use crate::walker::{self, CommitRange};
use std::path::Path;
use tracing::{info, warn};
use turso::Value;

/// Set `is_dirty = 1` on every reference row for this repository.
pub async fn mark(db: &Database, repository_id: i64) -> Result<(), turso::Error> {
    db.conn()
        .execute(
            "UPDATE refs SET is_dirty = 1 WHERE repository_id = ?",
            vec![Value::Integer(repository_id)],
        )
        .await?;
    Ok(())
}

/// Delete every reference row still marked dirty: references that were not
/// observed upstream during this pass.
pub async fn sweep(db: &Database, repository_id: i64) -> Result<u64, turso::Error> {
    db.conn()
        .execute(
            "DELETE FROM refs WHERE repository_id = ? AND is_dirty IS NOT NULL",
            vec![Value::Integer(repository_id)],
        )
        .await
}

async fn stored_commit_id(
    db: &Database,
    repository_id: i64,
    full_name: &str,
) -> Result<Option<i64>, turso::Error> {
    let mut stmt = db
        .conn()
        .prepare("SELECT commit_id FROM refs WHERE repository_id = ? AND full_name = ?")
        .await?;
    let mut rows = stmt
        .query(vec![
            Value::Integer(repository_id),
            Value::Text(full_name.to_string()),
        ])
        .await?;
    match rows.next().await? {
        Some(row) => match row.get_value(0)? {
            Value::Integer(id) => Ok(Some(id)),
            other => panic!("commit_id column held non-integer value: {other:?}"),
        },
        None => Ok(None),
    }
}

async fn clear_dirty(db: &Database, repository_id: i64, full_name: &str) -> Result<(), turso::Error> {
    db.conn()
        .execute(
            "UPDATE refs SET is_dirty = NULL WHERE repository_id = ? AND full_name = ?",
            vec![Value::Integer(repository_id), Value::Text(full_name.to_string())],
        )
        .await?;
    Ok(())
}

async fn upsert_ref(
    db: &Database,
    repository_id: i64,
    full_name: &str,
    kind: RefKind,
    commit_id: i64,
    ref_time: i64,
) -> Result<(), turso::Error> {
    db.conn()
        .execute(
            "INSERT INTO refs (repository_id, full_name, show_name, commit_id, ref_time, ref_type, is_dirty)
             VALUES (?, ?, ?, ?, ?, ?, NULL)
             ON CONFLICT(repository_id, full_name) DO UPDATE SET
                 show_name = excluded.show_name,
                 commit_id = excluded.commit_id,
                 ref_time = excluded.ref_time,
                 is_dirty = NULL",
            vec![
                Value::Integer(repository_id),
                Value::Text(full_name.to_string()),
                Value::Text(show_name(full_name)),
                Value::Integer(commit_id),
                Value::Integer(ref_time),
                Value::Text(kind.as_str().to_string()),
            ],
        )
        .await?;
    Ok(())
}

/// Run one full mark/scan/sweep pass over every `refs/heads/*` and
/// `refs/tags/*` reference in the repository.
pub async fn reconcile(
    db: &Database,
    git: &GitRepo,
    git_dir: &Path,
    repository_id: i64,
    config: &RuntimeConfig,
) -> Result<(), SyncError> {
    mark(db, repository_id).await?;

    for resolved in git.resolved_refs()? {
        let outcome = reconcile_one(db, git, git_dir, repository_id, config, &resolved).await;
        match outcome {
            Ok(()) => {}
            Err(err) => {
                // Record-level: skip this reference, leave its dirty bit set
                // so it is swept if it never clears by end of pass.
                warn!(reference = %resolved.full_name, error = %err, "skipping reference");
            }
        }
    }

    let deleted = sweep(db, repository_id).await?;
    if deleted > 0 {
        info!(count = deleted, "swept references absent upstream");
    }
    Ok(())
}

async fn reconcile_one(
    db: &Database,
    git: &GitRepo,
    git_dir: &Path,
    repository_id: i64,
    config: &RuntimeConfig,
    resolved: &crate::git::ResolvedRef,
) -> Result<(), SyncError> {
    if let Some(existing) = stored_commit_id(db, repository_id, &resolved.full_name).await? {
        let tip_id = crate::commit::get_commit_id(db, repository_id, &resolved.tip_hash).await?;
        if tip_id == Some(existing) {
            clear_dirty(db, repository_id, &resolved.full_name).await?;
            return Ok(());
        }
    }

    let range = walker::walk(db, git, repository_id, &resolved.tip_hash, config).await?;
    enumerator::enumerate(db, git_dir, repository_id, &range).await?;

    let commit_id = match &range {
        CommitRange::AlreadySynced => crate::commit::get_commit_id(db, repository_id, &resolved.tip_hash)
            .await?
            .expect("a commit reported already-synced must exist"),
        CommitRange::Bounded { new, .. } | CommitRange::FromRoot { new } => {
            crate::commit::get_commit_id(db, repository_id, new)
                .await?
                .expect("the walker just inserted this commit")
        }
    };

    let metadata = git.commit_metadata(&resolved.tip_hash)?;
    upsert_ref(
        db,
        repository_id,
        &resolved.full_name,
        resolved.kind,
        commit_id,
        metadata.ref_time,
    )
    .await?;

    Ok(())
}
