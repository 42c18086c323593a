//! Change Enumerator: spawns `git log` over a commit range and drives the
//! Generation Propagator and Change Store from its stdout stream.

use crate::commit;
use crate::error::GitError;
use crate::files;
use crate::walker::CommitRange;
use crate::db::Database;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command, Stdio};

fn range_argument(range: &CommitRange) -> Option<String> {
    match range {
        CommitRange::Bounded { old, new } => Some(format!("{old}..{new}")),
        CommitRange::FromRoot { new } => Some(new.clone()),
        CommitRange::AlreadySynced => None,
    }
}

/// Run the enumerator for `range`, applying generation propagation and
/// change rows commit-by-commit. A no-op if the range is already synced.
pub async fn enumerate(
    db: &Database,
    git_dir: &Path,
    repository_id: i64,
    range: &CommitRange,
) -> Result<(), GitError> {
    let Some(range_arg) = range_argument(range) else {
        return Ok(());
    };

    let mut child = Command::new("git")
        .env("GIT_DIR", git_dir)
        .arg("log")
        .arg("--pretty=format:%n%H")
        .arg("--name-only")
        .arg("--first-parent")
        .arg("--reverse")
        .arg(&range_arg)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(GitError::SpawnLog)?;

    let stdout = child.stdout.take().expect("stdout was piped");
    drive(db, repository_id, stdout).await?;

    let status = child.wait().map_err(GitError::SpawnLog)?;
    if !status.success() {
        return Err(GitError::LogExitStatus(status));
    }
    Ok(())
}

enum State {
    Between,
    InCommit { commit_id: i64 },
}

async fn drive<R: std::io::Read>(
    db: &Database,
    repository_id: i64,
    stdout: R,
) -> Result<(), GitError> {
    let mut reader = BufReader::new(stdout);
    let mut state = State::Between;
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).map_err(GitError::SpawnLog)?;
        let eof = bytes_read == 0;
        let content = line.trim_end_matches(['\n', '\r']);

        match &state {
            State::Between => {
                if eof {
                    break;
                }
                if content.is_empty() {
                    continue;
                }
                let commit_id = commit::get_commit_id(db, repository_id, content)
                    .await
                    .map_err(|e| GitError::Peel {
                        name: content.to_string(),
                        source: Box::new(e),
                    })?
                    .ok_or_else(|| GitError::UnknownCommitInLog(content.to_string()))?;

                db.begin().await.map_err(|e| GitError::Peel {
                    name: content.to_string(),
                    source: Box::new(e),
                })?;
                commit::propagate_generation(db, repository_id, commit_id)
                    .await
                    .map_err(|e| GitError::Peel {
                        name: content.to_string(),
                        source: Box::new(e),
                    })?;
                state = State::InCommit { commit_id };
            }
            State::InCommit { commit_id } => {
                if eof || content.is_empty() {
                    db.commit().await.map_err(|e| GitError::Peel {
                        name: "commit transaction".to_string(),
                        source: Box::new(e),
                    })?;
                    state = State::Between;
                    if eof {
                        break;
                    }
                    continue;
                }
                let commit_id = *commit_id;
                let file_id = files::get_file_id(db, content).await.map_err(|e| GitError::Peel {
                    name: content.to_string(),
                    source: Box::new(e),
                })?;
                files::insert_change(db, commit_id, file_id)
                    .await
                    .map_err(|e| GitError::Peel {
                        name: content.to_string(),
                        source: Box::new(e),
                    })?;
            }
        }
    }

    Ok(())
}
