//! Check protocol, registry, execution engine and JUnit report handling.

mod annotate;
mod check;
mod context;
mod engine;
mod git;
mod junit;
mod protocol;
mod registry;
mod report;
mod session;

pub use annotate::{render_annotation, render_annotations};
pub use check::{Check, CheckDescriptor, CheckFamily, PathHint};
pub use context::RunContext;
pub use engine::{
    CheckRun, Engine, EngineError, EngineObserver, Execution, Pick, Selected, Selection,
    SilentObserver, Termination, select,
};
pub use git::{Git, GitError, cmd_to_string};
pub use junit::{JunitError, parse_junit, render_junit};
pub use protocol::{CaseRecorder, CheckFlow, Details, EndCheck, formatted_message, formatted_text};
pub use registry::{CheckRegistry, list_checks};
pub use report::{
    CaseOutcome, case_artifact_text, case_outcome, exit_status, failed_cases, merge_reports,
    statistics, upsert_case,
};
pub use session::{
    RunPlan, RunSummary, SetupError, load_previous_report, run_session, write_report,
};
