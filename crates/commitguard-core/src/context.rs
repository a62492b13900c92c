use std::path::{Path, PathBuf};

use crate::git::Git;

/// Immutable per-run inputs shared by every check.
#[derive(Debug, Clone)]
pub struct RunContext {
    repo_root: PathBuf,
    commit_range: String,
    git: Git,
}

impl RunContext {
    pub fn new(repo_root: impl Into<PathBuf>, commit_range: impl Into<String>) -> Self {
        let repo_root = repo_root.into();
        Self {
            git: Git::new(repo_root.clone()),
            repo_root,
            commit_range: commit_range.into(),
        }
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    pub fn commit_range(&self) -> &str {
        &self.commit_range
    }

    /// Version-control queries rooted at the repository top.
    pub fn git(&self) -> &Git {
        &self.git
    }
}
