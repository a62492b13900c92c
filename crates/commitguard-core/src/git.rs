//! Thin wrapper over the `git` command line.
//!
//! Every call is synchronous. A command that cannot be spawned, exits
//! non-zero, or writes anything to stderr is a [`GitError`]; the engine treats
//! those as fatal input errors rather than check results.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error(
        "'{command}' exited with status {status} and/or wrote to stderr.\n==stdout==\n{stdout}\n==stderr==\n{stderr}"
    )]
    Failed {
        command: String,
        status: String,
        stdout: String,
        stderr: String,
    },
}

#[derive(Debug, Clone)]
pub struct Git {
    top: PathBuf,
}

impl Git {
    pub fn new(top: impl Into<PathBuf>) -> Self {
        Self { top: top.into() }
    }

    /// Absolute path of the top-level directory of the repository containing `dir`.
    pub fn discover(dir: &Path) -> Result<PathBuf, GitError> {
        let out = run_git(dir, &["rev-parse", "--show-toplevel"])?;
        Ok(PathBuf::from(out))
    }

    pub fn top(&self) -> &Path {
        &self.top
    }

    /// Runs `git <args>` in the repository top and returns trimmed stdout.
    pub fn run(&self, args: &[&str]) -> Result<String, GitError> {
        run_git(&self.top, args)
    }

    /// Commit SHAs for `refspec`. A range (`a..b`) yields every commit in it,
    /// a single ref yields just that commit.
    pub fn shas(&self, refspec: &str) -> Result<Vec<String>, GitError> {
        let max_count = if refspec.contains('.') { "-1" } else { "1" };
        let out = self.run(&["rev-list", &format!("--max-count={max_count}"), refspec])?;
        Ok(out.split_whitespace().map(str::to_string).collect())
    }

    /// Paths changed in `range`, relative to the repository top.
    ///
    /// Entries that are not regular files on disk (submodule directories,
    /// deleted files) are dropped.
    pub fn changed_files(
        &self,
        range: &str,
        diff_filter: Option<&str>,
        paths: &[&str],
    ) -> Result<Vec<String>, GitError> {
        let filter_arg = diff_filter.map(|f| format!("--diff-filter={f}"));
        let mut args = vec!["diff", "--name-only"];
        if let Some(filter) = filter_arg.as_deref() {
            args.push(filter);
        }
        args.push(range);
        if !paths.is_empty() {
            args.push("--");
            args.extend_from_slice(paths);
        }

        let out = self.run(&args)?;
        Ok(out
            .lines()
            .filter(|file| {
                let keep = self.top.join(file).is_file();
                if !keep {
                    debug!("dropping non-file entry '{file}' from changed files");
                }
                keep
            })
            .map(str::to_string)
            .collect())
    }

    /// Full `git log` text (header, author, message) of one commit.
    pub fn commit_text(&self, sha: &str) -> Result<String, GitError> {
        self.run(&["log", "--decorate=short", "-n", "1", sha])
    }

    /// Unified diff of `range`.
    pub fn diff(&self, range: &str) -> Result<String, GitError> {
        self.run(&["diff", range])
    }

    /// Unified diff of `range`, byte for byte as git printed it.
    pub fn diff_raw(&self, range: &str) -> Result<Vec<u8>, GitError> {
        run_git_raw(&self.top, &["diff", range])
    }
}

fn run_git(dir: &Path, args: &[&str]) -> Result<String, GitError> {
    let stdout = run_git_raw(dir, args)?;
    Ok(String::from_utf8_lossy(&stdout).trim_end().to_string())
}

fn run_git_raw(dir: &Path, args: &[&str]) -> Result<Vec<u8>, GitError> {
    let mut argv = vec!["git"];
    argv.extend_from_slice(args);
    let command = cmd_to_string(&argv);
    debug!("running {command} in {}", dir.display());

    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|source| GitError::Spawn {
            command: command.clone(),
            source,
        })?;

    if !output.status.success() || !output.stderr.is_empty() {
        return Err(GitError::Failed {
            command,
            status: output
                .status
                .code()
                .map_or_else(|| "signal".to_string(), |c| c.to_string()),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(output.stdout)
}

/// Formats command-line words for messages, quoting where a shell would need it.
pub fn cmd_to_string(words: &[&str]) -> String {
    words
        .iter()
        .map(|word| {
            let plain = !word.is_empty()
                && word
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./-_~^".contains(c));
            if plain {
                word.to_string()
            } else {
                format!("'{}'", word.replace('\'', "'\"'\"'"))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cmd_to_string_quotes_only_when_needed() {
        assert_eq!(
            cmd_to_string(&["git", "log", "-n", "1", "HEAD~1..HEAD"]),
            "git log -n 1 HEAD~1..HEAD"
        );
        assert_eq!(cmd_to_string(&["echo", "a b"]), "echo 'a b'");
        assert_eq!(cmd_to_string(&["echo", ""]), "echo ''");
        assert_eq!(cmd_to_string(&["echo", "it's"]), "echo 'it'\"'\"'s'");
    }
}
