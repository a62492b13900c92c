//! Commit message style via `gitlint`.

use std::io;
use std::path::PathBuf;

use commitguard_core::{CaseRecorder, Check, CheckDescriptor, PathHint, RunContext};

use crate::process::run_tool;

pub const DESCRIPTOR: CheckDescriptor = CheckDescriptor {
    name: "Gitlint",
    path_hint: PathHint::RepoRoot,
    create,
};

fn create() -> Box<dyn Check> {
    Box::new(Gitlint::default())
}

/// Runs `gitlint --commits <range>` from the repository top, where gitlint
/// looks for its `.gitlint` configuration.
#[derive(Debug)]
pub struct Gitlint {
    program: PathBuf,
}

impl Default for Gitlint {
    fn default() -> Self {
        Self::with_program("gitlint")
    }
}

impl Gitlint {
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Check for Gitlint {
    fn run(&mut self, ctx: &RunContext, case: &mut CaseRecorder) -> anyhow::Result<()> {
        let tool = match run_tool(
            &self.program,
            &["--commits", ctx.commit_range()],
            ctx.repo_root(),
            None,
        ) {
            Ok(tool) => tool,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                case.failure(format!("{}: command not found", self.program.display()));
                return Ok(());
            }
            Err(err) => {
                return Ok(case.error(format!(
                    "failed to run {}: {err}",
                    self.program.display()
                ))?);
            }
        };

        if !tool.success {
            case.failure(tool.output);
        }
        Ok(())
    }
}
