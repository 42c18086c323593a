//! Version-control object access: repository discovery, name resolution,
//! and reference/commit reads via `gix`.
//!
//! This is the "library" half of spec.md's version-control collaborator;
//! the "subprocess" half (bulk per-commit path enumeration) lives in
//! [`crate::enumerator`].

use crate::error::GitError;
use std::path::Path;

/// The config key consulted for an explicit repository name, per spec.md
/// §6's "`<project>.name`" placeholder. This tool's own project namespace
/// is `index`.
const NAME_CONFIG_KEY: &str = "index.name";

pub struct GitRepo {
    repo: gix::Repository,
}

/// A reference resolved to its tip commit, ready for the Commit Walker.
pub struct ResolvedRef {
    pub full_name: String,
    pub kind: RefKind,
    pub tip_hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Branch,
    Tag,
}

impl RefKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RefKind::Branch => "branch",
            RefKind::Tag => "tag",
        }
    }
}

impl GitRepo {
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = gix::open(path).map_err(|_| GitError::NotARepository {
            path: path.display().to_string(),
        })?;
        Ok(Self { repo })
    }

    /// Derive the repository's logical name: the `index.name` config value
    /// if set and non-empty, otherwise the final path component after
    /// stripping a trailing `/.git` or `.git` suffix. Requires a leading
    /// `/` in the path (relative bare-repo paths have no stable identity).
    pub fn derive_name(&self, path: &Path) -> Result<String, GitError> {
        let snapshot = self.repo.config_snapshot();
        if let Some(name) = snapshot.string(NAME_CONFIG_KEY) {
            let name = name.to_string();
            if !name.is_empty() {
                return Ok(name);
            }
        }

        name_from_path(&path.to_string_lossy()).ok_or_else(|| GitError::UnnamableRepository {
            path: path.display().to_string(),
        })
    }

    /// Enumerate `refs/heads/*` and `refs/tags/*`, peeled to their tip
    /// commit hash. Anything else (notes, remote-tracking refs, ...) is
    /// filtered out, per spec.md §4.6.
    pub fn resolved_refs(&self) -> Result<Vec<ResolvedRef>, GitError> {
        let platform = self
            .repo
            .references()
            .map_err(|e| GitError::Config(Box::new(e)))?;
        let all = platform
            .all()
            .map_err(|e| GitError::Config(Box::new(e)))?;

        let mut out = Vec::new();
        for reference in all {
            let mut reference = reference.map_err(GitError::Config)?;
            let full_name = reference.name().as_bstr().to_string();

            let kind = if let Some(rest) = full_name.strip_prefix("refs/heads/") {
                let _ = rest;
                RefKind::Branch
            } else if full_name.starts_with("refs/tags/") {
                RefKind::Tag
            } else {
                continue;
            };

            let commit = reference
                .peel_to_id_in_place()
                .map_err(|e| GitError::Peel {
                    name: full_name.clone(),
                    source: Box::new(e),
                })?;

            out.push(ResolvedRef {
                full_name,
                kind,
                tip_hash: commit.to_string(),
            });
        }

        Ok(out)
    }

    /// First parent's hash (hex) and the commit's author/commit timestamp,
    /// in seconds since the epoch (offset already applied, per spec.md
    /// §4.6's `ref_time = author_or_commit_timestamp + offset_seconds`).
    pub fn commit_metadata(&self, hash: &str) -> Result<CommitMetadata, GitError> {
        let id = gix::ObjectId::from_hex(hash.as_bytes()).map_err(|e| GitError::Peel {
            name: hash.to_string(),
            source: Box::new(e),
        })?;
        let object = self.repo.find_object(id).map_err(|e| GitError::Peel {
            name: hash.to_string(),
            source: Box::new(e),
        })?;
        let commit = object.try_into_commit().map_err(|e| GitError::Peel {
            name: hash.to_string(),
            source: Box::new(e),
        })?;

        let parent_hash = commit.parent_ids().next().map(|id| id.to_string());
        let time = commit.time().map_err(|e| GitError::Peel {
            name: hash.to_string(),
            source: Box::new(e),
        })?;

        Ok(CommitMetadata {
            parent_hash,
            ref_time: time.seconds + i64::from(time.offset),
        })
    }
}

pub struct CommitMetadata {
    pub parent_hash: Option<String>,
    pub ref_time: i64,
}

/// `name_from_path("/x/y/repo.git") == "repo"`; handles the `.git`-suffix,
/// `/.git`-suffix, and suffix-less forms, and rejects relative paths.
pub fn name_from_path(path: &str) -> Option<String> {
    if !path.starts_with('/') {
        return None;
    }

    let trimmed = path.trim_end_matches('/');
    let trimmed = trimmed
        .strip_suffix("/.git")
        .or_else(|| trimmed.strip_suffix(".git"))
        .unwrap_or(trimmed);
    let trimmed = trimmed.trim_end_matches('/');

    let name = trimmed.rsplit('/').next().unwrap_or("");
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Strip the `refs/heads/` or `refs/tags/` prefix and replace remaining
/// `/` with `:`, per spec.md §3's `show_name` derivation.
pub fn show_name(full_name: &str) -> String {
    let stripped = full_name
        .strip_prefix("refs/heads/")
        .or_else(|| full_name.strip_prefix("refs/tags/"))
        .unwrap_or(full_name);
    stripped.replace('/', ":")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_from_path_matches_spec_table() {
        assert_eq!(name_from_path("/x/y/repo.git").as_deref(), Some("repo"));
        assert_eq!(name_from_path("/x/y/repo/.git").as_deref(), Some("repo"));
        assert_eq!(name_from_path("/x/y/repo").as_deref(), Some("repo"));
        assert_eq!(
            name_from_path("/x/y/user.repo.git").as_deref(),
            Some("user.repo")
        );
        assert_eq!(name_from_path("/.git"), None);
        assert_eq!(name_from_path("relative/repo.git"), None);
    }

    #[test]
    fn show_name_strips_prefix_and_rewrites_slashes() {
        assert_eq!(show_name("refs/heads/main"), "main");
        assert_eq!(show_name("refs/tags/release/1.0"), "release:1.0");
    }
}
