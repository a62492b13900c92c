//! Check selection and execution.
//!
//! Checks run one at a time in discovery order. Each run gets a fresh check
//! instance and a fresh [`CaseRecorder`]; whatever the run leaves behind is
//! upserted into the report as that check's case, including when the check
//! ended early, returned an unexpected error, or panicked.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::time::Instant;

use commitguard_types::{Case, FormattedFailure, Report};
use tracing::{debug, info, warn};

use crate::check::CheckDescriptor;
use crate::context::RunContext;
use crate::git::GitError;
use crate::protocol::{CaseRecorder, EndCheck};
use crate::report::upsert_case;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("check '{check}' could not query git")]
    Git {
        check: String,
        #[source]
        source: GitError,
    },
}

/// Include/exclude filters, both matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Selection {
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self { include, exclude }
    }

    fn is_included(&self, name: &str) -> bool {
        self.include.is_empty() || self.include.iter().any(|i| i.eq_ignore_ascii_case(name))
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.exclude.iter().any(|e| e.eq_ignore_ascii_case(name))
    }
}

/// Whether a discovered check takes part in the run.
#[derive(Debug, Clone, Copy)]
pub enum Pick {
    Run(CheckDescriptor),
    /// Passed the include filter but was excluded.
    Excluded(CheckDescriptor),
}

/// Outcome of applying a [`Selection`] to the discovered checks, in
/// discovery order.
#[derive(Debug, Default)]
pub struct Selected {
    picks: Vec<Pick>,
}

impl Selected {
    pub fn picks(&self) -> &[Pick] {
        &self.picks
    }

    /// Checks to run.
    pub fn run(&self) -> impl Iterator<Item = &CheckDescriptor> {
        self.picks.iter().filter_map(|pick| match pick {
            Pick::Run(check) => Some(check),
            Pick::Excluded(_) => None,
        })
    }

    pub fn excluded(&self) -> impl Iterator<Item = &CheckDescriptor> {
        self.picks.iter().filter_map(|pick| match pick {
            Pick::Excluded(check) => Some(check),
            Pick::Run(_) => None,
        })
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.run().map(|d| d.name).collect()
    }
}

pub fn select(checks: Vec<CheckDescriptor>, selection: &Selection) -> Selected {
    let mut selected = Selected::default();
    for check in checks {
        if !selection.is_included(check.name) {
            debug!("'{}' not in include list", check.name);
            continue;
        }
        if selection.is_excluded(check.name) {
            selected.picks.push(Pick::Excluded(check));
        } else {
            selected.picks.push(Pick::Run(check));
        }
    }
    selected
}

/// Progress hooks invoked while the engine works.
pub trait EngineObserver {
    fn check_excluded(&mut self, _check: &CheckDescriptor) {}

    fn check_started(&mut self, _check: &CheckDescriptor, _path: &Path) {}

    fn check_finished(&mut self, _case: &Case, _formatted: &[FormattedFailure]) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default)]
pub struct SilentObserver;

impl EngineObserver for SilentObserver {}

/// How a single check run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// `run` returned normally.
    Completed,
    /// The check called `error` or `skip`.
    Ended,
    /// The check returned an unexpected error or panicked.
    Defect,
}

#[derive(Debug)]
pub struct CheckRun {
    pub case: Case,
    pub formatted: Vec<FormattedFailure>,
    pub termination: Termination,
}

/// Everything the engine produced for one batch of checks.
#[derive(Debug, Default)]
pub struct Execution {
    pub executed: Vec<String>,
    pub formatted: Vec<FormattedFailure>,
}

pub struct Engine<'a> {
    ctx: &'a RunContext,
}

impl<'a> Engine<'a> {
    pub fn new(ctx: &'a RunContext) -> Self {
        Self { ctx }
    }

    /// Runs every selected check once and upserts its case into `report`.
    ///
    /// Only a git failure stops the batch; every other problem stays local
    /// to the check that caused it.
    pub fn execute<O>(
        &self,
        selected: &Selected,
        report: &mut Report,
        observer: &mut O,
    ) -> Result<Execution, EngineError>
    where
        O: EngineObserver + ?Sized,
    {
        let mut execution = Execution::default();
        for pick in selected.picks() {
            let check = match pick {
                Pick::Run(check) => check,
                Pick::Excluded(check) => {
                    info!("skipping excluded check {}", check.name);
                    observer.check_excluded(check);
                    continue;
                }
            };

            observer.check_started(check, &check.path_hint.resolve(self.ctx));
            let run = self.run_check(check)?;
            observer.check_finished(&run.case, &run.formatted);

            execution.executed.push(check.name.to_string());
            execution.formatted.extend(run.formatted);
            upsert_case(report, run.case);
        }
        Ok(execution)
    }

    /// Instantiates and runs one check, containing anything it throws.
    pub fn run_check(&self, check: &CheckDescriptor) -> Result<CheckRun, EngineError> {
        let mut recorder = CaseRecorder::new(check.name);
        let started = Instant::now();
        debug!(
            "running {} on {} in {}",
            check.name,
            self.ctx.commit_range(),
            self.ctx.repo_root().display()
        );

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut instance = check.instantiate();
            instance.run(self.ctx, &mut recorder)
        }));

        let termination = match outcome {
            Ok(Ok(())) => Termination::Completed,
            Ok(Err(err)) if err.is::<EndCheck>() => Termination::Ended,
            Ok(Err(err)) => match err.downcast::<GitError>() {
                Ok(source) => {
                    return Err(EngineError::Git {
                        check: check.name.to_string(),
                        source,
                    });
                }
                Err(err) => {
                    warn!("check {} failed unexpectedly: {err:#}", check.name);
                    recorder.defect(format!("{err:#}"));
                    Termination::Defect
                }
            },
            Err(payload) => {
                let text = panic_payload_to_string(payload.as_ref());
                warn!("check {} panicked: {text}", check.name);
                recorder.defect(format!("check panicked: {text}"));
                Termination::Defect
            }
        };

        recorder.set_duration_ms(started.elapsed().as_millis().try_into().unwrap_or(u64::MAX));
        let (case, formatted) = recorder.into_parts();
        debug!(
            "{} finished ({:?}) with {} result(s)",
            case.name,
            termination,
            case.results.len()
        );

        Ok(CheckRun {
            case,
            formatted,
            termination,
        })
    }
}

fn panic_payload_to_string(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&'static str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
