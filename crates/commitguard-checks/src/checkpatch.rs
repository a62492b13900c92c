//! Runs the kernel-style `checkpatch.pl` over the diff of the commit range.

use std::path::{Path, PathBuf};

use commitguard_core::{CaseRecorder, Check, CheckDescriptor, PathHint, RunContext};
use commitguard_types::{FormattedFailure, Severity};
use regex::Regex;
use tracing::debug;

use crate::process::run_tool;

pub const DESCRIPTOR: CheckDescriptor = CheckDescriptor {
    name: "Checkpatch",
    path_hint: PathHint::RepoRoot,
    create,
};

const SCRIPT: &str = "scripts/checkpatch.pl";
const ARGS: &[&str] = &["--strict", "--codespell", "--no-tree", "-"];

/// One report block: the `file:N: LEVEL:TYPE: description` line followed by
/// its `#N: FILE: path:line:` locator.
const REPORT_BLOCK: &str = r"(?m)^\s*\S+:(\d+):\s*(ERROR|WARNING|CHECK):(.+?):(.+)(?:\n|\r\n?)+^\s*#(\d+):\s*FILE:\s*(.+):(\d+):";

fn create() -> Box<dyn Check> {
    Box::new(Checkpatch)
}

#[derive(Debug, Default)]
pub struct Checkpatch;

impl Check for Checkpatch {
    fn run(&mut self, ctx: &RunContext, case: &mut CaseRecorder) -> anyhow::Result<()> {
        let script = script_path(ctx.repo_root());
        if !script.exists() {
            return Ok(case.skip(format!("{} not found", script.display()))?);
        }

        let diff = ctx.git().diff_raw(ctx.commit_range())?;
        let tool = match run_tool(&script, ARGS, ctx.repo_root(), Some(diff.as_slice())) {
            Ok(tool) => tool,
            Err(err) => {
                return Ok(case.error(format!("failed to run {}: {err}", script.display()))?);
            }
        };
        if tool.success {
            return Ok(());
        }

        let failures = parse_report(&tool.output)?;
        debug!("checkpatch reported {} issue(s)", failures.len());
        if failures.is_empty() {
            case.failure(tool.output);
        }
        for failure in failures {
            case.formatted_failure(failure);
        }
        Ok(())
    }
}

pub fn script_path(repo_root: &Path) -> PathBuf {
    repo_root.join(SCRIPT)
}

/// Extracts addressed findings from checkpatch output.
pub fn parse_report(output: &str) -> Result<Vec<FormattedFailure>, regex::Error> {
    let re = Regex::new(REPORT_BLOCK)?;
    Ok(re
        .captures_iter(output)
        .map(|caps| {
            let severity = caps[2].parse().unwrap_or(Severity::Error);
            let mut failure = FormattedFailure::new(severity, caps[3].trim(), caps[6].trim())
                .description(caps[4].trim());
            if let Ok(line) = caps[7].parse() {
                failure = failure.line(line);
            }
            failure
        })
        .collect())
}
