//! # Git Module
//!
//! Branch name and working tree state via the gix library.

use crate::models::git::GitInfo;
use std::path::Path;
use tracing::debug;

/// Branch shown when HEAD does not point at a branch.
pub const DETACHED_HEAD: &str = "HEAD";

/// Repository facts for the repository containing `start_dir`, or `None`
/// outside a repository.
pub fn read_git_info(start_dir: &Path) -> Option<GitInfo> {
    let repo = match gix::discover(start_dir) {
        Ok(repo) => repo,
        Err(err) => {
            debug!(dir = %start_dir.display(), error = %err, "not a git repository");
            return None;
        }
    };
    let mut info = GitInfo::default();

    let head = repo.head().ok()?;
    info.branch = Some(match head.referent_name() {
        Some(name) => name.shorten().to_string(),
        None => DETACHED_HEAD.to_string(),
    });

    // Index vs worktree; untracked files do not count
    match repo.is_dirty() {
        Ok(dirty) => info.is_clean = Some(!dirty),
        Err(err) => {
            debug!(error = %err, "could not determine git status");
            info.is_clean = None;
        }
    }
    Some(info)
}
