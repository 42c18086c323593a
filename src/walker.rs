//! Commit Walker: discovers commits reachable from a reference's tip that
//! aren't in the store yet, walking the first-parent chain backwards.

use crate::commit;
use crate::config::RuntimeConfig;
use crate::db::Database;
use crate::error::GitError;
use crate::git::GitRepo;

/// The suffix of newly-discovered history for a reference, to be enumerated
/// by the Change Enumerator.
pub enum CommitRange {
    /// `old` is the newest commit that was already present; everything
    /// strictly younger, down to and including `new`, is unseen.
    Bounded { old: String, new: String },
    /// No previously-known ancestor was found before reaching a root.
    FromRoot { new: String },
    /// `new` was already present; there is nothing to enumerate.
    AlreadySynced,
}

/// Walk `new_tip`'s first-parent chain, inserting every commit not already
/// present, stopping at the first already-known commit or at a root.
///
/// Per spec.md §4.3, this only inserts rows; it never assigns generations
/// (that happens in forward order, driven by the enumerator once it knows
/// the direction commits will be visited).
pub async fn walk(
    db: &Database,
    git: &GitRepo,
    repository_id: i64,
    new_tip: &str,
    config: &RuntimeConfig,
) -> Result<CommitRange, GitError> {
    if commit::get_commit_id(db, repository_id, new_tip)
        .await
        .map_err(|e| GitError::Peel {
            name: new_tip.to_string(),
            source: Box::new(e),
        })?
        .is_some()
    {
        return Ok(CommitRange::AlreadySynced);
    }

    let mut current = new_tip.to_string();
    let mut steps = 0usize;

    loop {
        if steps >= config.max_walk_commits {
            return Err(GitError::WalkBoundExceeded {
                name: new_tip.to_string(),
                bound: config.max_walk_commits,
            });
        }
        steps += 1;

        let metadata = git.commit_metadata(&current)?;

        let inserted = commit::insert_commit(
            db,
            repository_id,
            &current,
            metadata.parent_hash.as_deref(),
        )
        .await
        .map_err(|e| GitError::Peel {
            name: current.clone(),
            source: Box::new(e),
        })?;

        if inserted.is_none() {
            // Already present: this is C_old, the boundary of new history.
            return Ok(CommitRange::Bounded {
                old: current,
                new: new_tip.to_string(),
            });
        }

        match metadata.parent_hash {
            Some(parent) => current = parent,
            None => return Ok(CommitRange::FromRoot { new: new_tip.to_string() }),
        }
    }
}
