//! One complete compliance run: load, execute, merge, persist, judge.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use commitguard_types::{FormattedFailure, Report};
use tracing::{error, info, warn};

use crate::context::RunContext;
use crate::engine::{Engine, EngineObserver, Selection, select};
use crate::git::GitError;
use crate::junit::{parse_junit, render_junit};
use crate::registry::CheckRegistry;
use crate::report::{CaseOutcome, case_artifact_text, case_outcome, statistics};

/// Input problems detected before any check runs.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("'{}' not found", path.display())]
    PreviousRunNotFound { path: PathBuf },

    #[error("bad commit range '{range}'")]
    BadCommitRange {
        range: String,
        #[source]
        source: GitError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub repo_root: PathBuf,
    pub commit_range: String,
    pub selection: Selection,
    /// JUnit report of an earlier run to merge into.
    pub previous_run: Option<PathBuf>,
    /// Where to write the merged JUnit report.
    pub output: Option<PathBuf>,
    /// Directory for per-check `<Name>.txt` artifacts; `None` disables them.
    pub case_output_dir: Option<PathBuf>,
}

#[derive(Debug)]
pub struct RunSummary {
    pub report: Report,
    pub executed: Vec<String>,
    pub formatted: Vec<FormattedFailure>,
    pub failed_cases: Vec<String>,
    pub artifacts: Vec<PathBuf>,
}

impl RunSummary {
    /// Number of failing cases; zero means the run passed.
    pub fn exit_status(&self) -> usize {
        self.failed_cases.len()
    }
}

pub fn run_session<O>(
    plan: &RunPlan,
    registry: &CheckRegistry,
    observer: &mut O,
) -> Result<RunSummary>
where
    O: EngineObserver + ?Sized,
{
    let ctx = RunContext::new(plan.repo_root.clone(), plan.commit_range.clone());
    info!("Running tests on commit range {}", ctx.commit_range());
    ctx.git()
        .shas(ctx.commit_range())
        .map_err(|source| SetupError::BadCommitRange {
            range: ctx.commit_range().to_string(),
            source,
        })?;

    let mut report = match &plan.previous_run {
        Some(path) => {
            info!("Loading previous results from {}", path.display());
            load_previous_report(path)?
        }
        None => Report::default(),
    };

    let selected = select(registry.discover(), &plan.selection);
    let execution = Engine::new(&ctx).execute(&selected, &mut report, observer)?;

    report.timestamp = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));

    if let Some(output) = &plan.output {
        write_report(output, &report)?;
        let stats = statistics(&report);
        info!(
            "Wrote {} case(s) to {} ({} failures, {} errors, {} skipped)",
            stats.tests,
            output.display(),
            stats.failures,
            stats.errors,
            stats.skipped
        );
    }

    let mut failed_cases = Vec::new();
    let mut artifacts = Vec::new();
    for case in &report.cases {
        match case_outcome(case) {
            CaseOutcome::Clean => info!("No JUnit result for {}", case.name),
            CaseOutcome::Skipped => warn!("Skipped {}", case.name),
            CaseOutcome::Failed => {
                for result in &case.results {
                    error!("Test {} failed: \n{}", case.name, result.text.trim());
                }
                if let Some(dir) = &plan.case_output_dir {
                    if is_safe_file_stem(&case.name) {
                        artifacts.push(write_case_artifact(
                            dir,
                            &case.name,
                            &case_artifact_text(case),
                        )?);
                    } else {
                        warn!("not writing an artifact for case name {:?}", case.name);
                    }
                }
                failed_cases.push(case.name.clone());
            }
        }
    }

    Ok(RunSummary {
        report,
        executed: execution.executed,
        formatted: execution.formatted,
        failed_cases,
        artifacts,
    })
}

/// Loads the report of an earlier run. A missing file is a setup error.
pub fn load_previous_report(path: &Path) -> Result<Report> {
    if !path.exists() {
        return Err(SetupError::PreviousRunNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }
    let xml =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_junit(&xml).with_context(|| format!("parse JUnit report {}", path.display()))
}

pub fn write_report(path: &Path, report: &Report) -> Result<()> {
    write_text(path, &render_junit(report))
}

/// Case names become file names; names read back from a JUnit file must not
/// leave the artifact directory.
fn is_safe_file_stem(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && !name.contains("..")
}

fn write_case_artifact(dir: &Path, name: &str, text: &str) -> Result<PathBuf> {
    let path = dir.join(format!("{name}.txt"));
    write_text(&path, text)?;
    Ok(path)
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }
    }

    std::fs::write(path, text).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_previous_run_is_a_setup_error() {
        let td = TempDir::new().expect("temp");
        let err = load_previous_report(&td.path().join("nope.xml")).unwrap_err();
        assert!(err.downcast_ref::<SetupError>().is_some());
        assert!(err.to_string().contains("nope.xml' not found"));
    }

    #[test]
    fn malformed_previous_run_is_reported() {
        let td = TempDir::new().expect("temp");
        let path = td.path().join("prev.xml");
        std::fs::write(&path, "<testsuites></testsuites>").expect("write");
        let err = load_previous_report(&path).unwrap_err();
        assert!(err.downcast_ref::<SetupError>().is_none());
        assert!(format!("{err:#}").contains("no <testsuite> element found"));
    }

    #[test]
    fn unsafe_case_names_are_rejected() {
        assert!(is_safe_file_stem("Checkpatch"));
        assert!(is_safe_file_stem("Dts.Bindings"));
        assert!(!is_safe_file_stem("../escape"));
        assert!(!is_safe_file_stem("nested/name"));
        assert!(!is_safe_file_stem("back\\slash"));
        assert!(!is_safe_file_stem(".."));
        assert!(!is_safe_file_stem(""));
    }

    #[test]
    fn write_report_creates_parent_dirs() {
        let td = TempDir::new().expect("temp");
        let path = td.path().join("out/nested/compliance.xml");
        write_report(&path, &Report::default()).expect("write");
        let loaded = load_previous_report(&path).expect("load");
        assert_eq!(loaded, Report::default());
    }
}
