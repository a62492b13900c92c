//! Throwaway git repositories for end-to-end tests.
//!
//! ```rust,ignore
//! let repo = TestRepo::new()?;
//! repo.write("README", "hello\n")?;
//! repo.commit("Add readme\n\nSigned-off-by: Test User <test@example.com>")?;
//! repo.write("README", "hello again\n")?;
//! let sha = repo.commit_as("Jane Doe", "jane@example.com", "Update readme")?;
//! ```

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use tempfile::TempDir;

pub const DEFAULT_NAME: &str = "Test User";
pub const DEFAULT_EMAIL: &str = "test@example.com";

/// A git repository in a temporary directory, removed on drop.
#[derive(Debug)]
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Initializes an empty repository with a fixed identity.
    pub fn new() -> Result<Self> {
        let dir = TempDir::new().context("create temp dir")?;
        let repo = Self { dir };
        repo.git(&["init", "-q"])?;
        repo.git(&["config", "user.name", DEFAULT_NAME])?;
        repo.git(&["config", "user.email", DEFAULT_EMAIL])?;
        repo.git(&["config", "commit.gpgsign", "false"])?;
        Ok(repo)
    }

    /// Initializes a repository holding `count` commits, each touching its
    /// own file and signed off by the default identity.
    pub fn with_commits(count: usize) -> Result<Self> {
        let repo = Self::new()?;
        for n in 0..count {
            repo.write(&format!("file{n}.txt"), &format!("content {n}\n"))?;
            repo.commit(&signed_off(&format!("Add file{n}"), DEFAULT_NAME, DEFAULT_EMAIL))?;
        }
        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Writes `contents` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, contents: &str) -> Result<()> {
        let path = self.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }
        std::fs::write(&path, contents).with_context(|| format!("write {}", path.display()))
    }

    /// Stages everything and commits as the default identity. Returns the new SHA.
    pub fn commit(&self, message: &str) -> Result<String> {
        self.git(&["add", "-A"])?;
        self.git(&["commit", "-q", "--allow-empty", "-m", message])?;
        self.head()
    }

    /// Stages everything and commits with `name <email>` as author and committer.
    pub fn commit_as(&self, name: &str, email: &str, message: &str) -> Result<String> {
        self.git(&["add", "-A"])?;
        let name_cfg = format!("user.name={name}");
        let email_cfg = format!("user.email={email}");
        self.git(&[
            "-c",
            &name_cfg,
            "-c",
            &email_cfg,
            "commit",
            "-q",
            "--allow-empty",
            "-m",
            message,
        ])?;
        self.head()
    }

    pub fn head(&self) -> Result<String> {
        self.git(&["rev-parse", "HEAD"])
    }

    /// Runs git in the repository and returns trimmed stdout.
    pub fn git(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.dir.path())
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))?;
        if !output.status.success() {
            bail!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// `subject` followed by a `Signed-off-by:` trailer for `name <email>`.
pub fn signed_off(subject: &str, name: &str, email: &str) -> String {
    format!("{subject}\n\nSigned-off-by: {name} <{email}>")
}
