//! Common test fixtures for commitguard.
//!
//! This module provides scripted checks with fixed behaviour, the check
//! families that bundle them, and sample reports and JUnit documents.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::bail;
use commitguard_core::{
    CaseRecorder, Check, CheckDescriptor, CheckFamily, PathHint, RunContext,
};
use commitguard_types::{FormattedFailure, Severity};

// =============================================================================
// Scripted checks
// =============================================================================

/// Records nothing.
pub struct AlwaysPass;

impl Check for AlwaysPass {
    fn run(&mut self, _ctx: &RunContext, _case: &mut CaseRecorder) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Records a single failure.
pub struct AlwaysFail;

impl Check for AlwaysFail {
    fn run(&mut self, _ctx: &RunContext, case: &mut CaseRecorder) -> anyhow::Result<()> {
        case.failure("always fails");
        Ok(())
    }
}

/// Number of failures recorded by [`ThreeFailures`].
pub const THREE: usize = 3;

/// Records [`THREE`] independent failures.
pub struct ThreeFailures;

impl Check for ThreeFailures {
    fn run(&mut self, _ctx: &RunContext, case: &mut CaseRecorder) -> anyhow::Result<()> {
        for n in 1..=THREE {
            case.failure(format!("violation {n}"));
        }
        Ok(())
    }
}

/// Skips, then tries to record a failure that must be ignored.
pub struct Skipping;

impl Check for Skipping {
    fn run(&mut self, _ctx: &RunContext, case: &mut CaseRecorder) -> anyhow::Result<()> {
        not_applicable(case)?;
        case.failure("recorded after skip");
        Ok(())
    }
}

fn not_applicable(case: &mut CaseRecorder) -> commitguard_core::CheckFlow {
    case.skip("nothing to check here")
}

/// Records a failure, then ends with an error.
pub struct FailThenError;

impl Check for FailThenError {
    fn run(&mut self, _ctx: &RunContext, case: &mut CaseRecorder) -> anyhow::Result<()> {
        case.failure("first problem");
        case.error::<()>("tool crashed")?;
        case.failure("never recorded");
        Ok(())
    }
}

/// Records one addressed failure.
pub struct Formatted;

impl Check for Formatted {
    fn run(&mut self, _ctx: &RunContext, case: &mut CaseRecorder) -> anyhow::Result<()> {
        case.formatted_failure(
            FormattedFailure::new(Severity::Warning, "LONG_LINE", "src/main.c")
                .line(10)
                .description("line too long"),
        );
        Ok(())
    }
}

/// Panics mid-run after recording a failure.
pub struct Panicking;

impl Check for Panicking {
    fn run(&mut self, _ctx: &RunContext, case: &mut CaseRecorder) -> anyhow::Result<()> {
        case.failure("before the panic");
        panic!("scripted panic");
    }
}

/// Returns an error that is not part of the check protocol.
pub struct Erroring;

impl Check for Erroring {
    fn run(&mut self, _ctx: &RunContext, _case: &mut CaseRecorder) -> anyhow::Result<()> {
        bail!("scripted failure");
    }
}

/// Asks git about a ref that does not exist.
pub struct BadRef;

impl Check for BadRef {
    fn run(&mut self, ctx: &RunContext, _case: &mut CaseRecorder) -> anyhow::Result<()> {
        ctx.git().shas("no-such-ref-anywhere")?;
        Ok(())
    }
}

static COUNTED_RUNS: AtomicUsize = AtomicUsize::new(0);

/// Counts its executions in a process-wide counter.
pub struct Counted;

impl Check for Counted {
    fn run(&mut self, _ctx: &RunContext, _case: &mut CaseRecorder) -> anyhow::Result<()> {
        COUNTED_RUNS.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// How many times any [`Counted`] check has run in this process.
pub fn counted_runs() -> usize {
    COUNTED_RUNS.load(Ordering::SeqCst)
}

// =============================================================================
// Families
// =============================================================================

/// Check families bundling the scripted checks.
pub mod families {
    use super::*;

    macro_rules! scripted {
        ($name:literal, $check:ident) => {
            CheckDescriptor {
                name: $name,
                path_hint: PathHint::RepoRoot,
                create: || -> Box<dyn Check> { Box::new($check) },
            }
        };
    }

    pub const ALWAYS_PASS: CheckDescriptor = scripted!("AlwaysPass", AlwaysPass);
    pub const ALWAYS_FAIL: CheckDescriptor = scripted!("AlwaysFail", AlwaysFail);

    /// `AlwaysPass` then `AlwaysFail`.
    pub static PASS_FAIL: CheckFamily = CheckFamily {
        name: "pass-fail",
        checks: &[ALWAYS_PASS, ALWAYS_FAIL],
        includes: &[],
    };

    /// A panicking and an erroring check followed by well-behaved ones.
    pub static MISBEHAVING: CheckFamily = CheckFamily {
        name: "misbehaving",
        checks: &[
            scripted!("Panicking", Panicking),
            scripted!("Erroring", Erroring),
            ALWAYS_FAIL,
            ALWAYS_PASS,
        ],
        includes: &[],
    };

    /// Checks that stop early or report several results.
    pub static PROTOCOL: CheckFamily = CheckFamily {
        name: "protocol",
        checks: &[
            scripted!("Skipping", Skipping),
            scripted!("FailThenError", FailThenError),
            scripted!("ThreeFailures", ThreeFailures),
            scripted!("Formatted", Formatted),
        ],
        includes: &[],
    };

    /// A check whose git query fails.
    pub static BAD_GIT: CheckFamily = CheckFamily {
        name: "bad-git",
        checks: &[scripted!("BadRef", BadRef), ALWAYS_PASS],
        includes: &[],
    };

    /// Five counting checks, reachable only through nested families.
    pub static COUNTED: CheckFamily = CheckFamily {
        name: "counted",
        checks: &[],
        includes: &[&COUNTED_LEFT, &COUNTED_RIGHT],
    };

    static COUNTED_LEFT: CheckFamily = CheckFamily {
        name: "counted-left",
        checks: &[
            scripted!("CountA", Counted),
            scripted!("CountB", Counted),
            scripted!("CountC", Counted),
        ],
        includes: &[&COUNTED_SHARED],
    };

    static COUNTED_RIGHT: CheckFamily = CheckFamily {
        name: "counted-right",
        checks: &[scripted!("CountD", Counted)],
        includes: &[&COUNTED_SHARED],
    };

    static COUNTED_SHARED: CheckFamily = CheckFamily {
        name: "counted-shared",
        checks: &[scripted!("CountE", Counted)],
        includes: &[],
    };
}

// =============================================================================
// Sample reports
// =============================================================================

/// Hand-written reports covering every result kind.
pub mod sample_reports {
    use commitguard_types::{Case, CaseResult, Report, ResultKind};

    fn result(kind: ResultKind, message: &str, category: &str, text: &str) -> CaseResult {
        CaseResult {
            kind,
            message: message.to_string(),
            category: category.to_string(),
            text: text.to_string(),
        }
    }

    /// One clean, one skipped, one failing and one erroring case.
    pub fn mixed() -> Report {
        let mut clean = Case::new("Identity");
        clean.duration_ms = 12;

        let mut skipped = Case::new("Checkpatch");
        skipped.results.push(result(
            ResultKind::Skipped,
            "Checkpatch skipped",
            "skip",
            "/repo/scripts/checkpatch.pl not found",
        ));

        let mut failing = Case::new("Gitlint");
        failing.duration_ms = 250;
        failing.results.push(result(
            ResultKind::Failure,
            "Gitlint issues",
            "failure",
            "1: T1 Title exceeds max length (90>72)",
        ));

        let mut erroring = Case::new("Kconfig");
        erroring.results.push(result(
            ResultKind::Error,
            "Kconfig error",
            "error",
            "kconfig parser crashed",
        ));

        Report {
            cases: vec![clean, skipped, failing, erroring],
            ..Report::default()
        }
    }
}

// =============================================================================
// Sample JUnit documents
// =============================================================================

/// JUnit documents in shapes other tools produce.
pub mod sample_junit {
    /// A bare `<testsuite>` root with stale statistics.
    pub const BARE_SUITE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuite name="Compliance" tests="9" failures="9" errors="0" skipped="0" time="1.0">
  <testcase classname="Guidelines" name="Gitlint" time="0.250">
    <failure message="Gitlint issues" type="failure">1: T1 Title exceeds max length</failure>
  </testcase>
  <testcase classname="Guidelines" name="Identity" time="0.012"/>
</testsuite>
"#;

    /// A `<testsuites>` root with two suites; only the first is read.
    pub const TWO_SUITES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuites>
  <testsuite name="Compliance">
    <testcase classname="Guidelines" name="Checkpatch" time="0">
      <skipped message="Checkpatch skipped" type="skip"><![CDATA[scripts/checkpatch.pl not found]]></skipped>
    </testcase>
  </testsuite>
  <testsuite name="Other">
    <testcase classname="Guidelines" name="Ignored" time="0"/>
  </testsuite>
</testsuites>
"#;
}
