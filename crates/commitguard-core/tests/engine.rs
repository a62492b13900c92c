//! Engine and session behaviour against scripted check families.

use commitguard_core::{
    CaseOutcome, CheckRegistry, Engine, EngineError, RunContext, RunPlan, Selection, SetupError,
    SilentObserver, Termination, case_outcome, exit_status, list_checks, load_previous_report,
    run_session, select,
};
use commitguard_testkit::fixtures::{self, families};
use commitguard_testkit::{TestRepo, sample_reports};
use commitguard_types::{
    CATEGORY_DEFECT, Case, CaseResult, DEFAULT_COMMIT_RANGE, Report, ResultKind,
};
use tempfile::TempDir;

fn plan(repo: &TestRepo, out: &TempDir) -> RunPlan {
    RunPlan {
        repo_root: repo.path().to_path_buf(),
        commit_range: DEFAULT_COMMIT_RANGE.to_string(),
        selection: Selection::default(),
        previous_run: None,
        output: Some(out.path().join("compliance.xml")),
        case_output_dir: Some(out.path().to_path_buf()),
    }
}

fn repo() -> TestRepo {
    TestRepo::with_commits(2).expect("repo")
}

fn case<'a>(report: &'a Report, name: &str) -> &'a Case {
    report
        .cases
        .iter()
        .find(|c| c.name == name)
        .unwrap_or_else(|| panic!("no case named {name}"))
}

#[test]
fn pass_and_fail_end_to_end() {
    let repo = repo();
    let out = TempDir::new().expect("temp");
    let registry = CheckRegistry::new().with_family(&families::PASS_FAIL);

    let summary = run_session(&plan(&repo, &out), &registry, &mut SilentObserver)
        .expect("session");

    assert_eq!(summary.exit_status(), 1);
    assert_eq!(summary.failed_cases, vec!["AlwaysFail"]);
    assert!(out.path().join("AlwaysFail.txt").is_file());
    assert!(!out.path().join("AlwaysPass.txt").exists());

    let artifact = std::fs::read_to_string(out.path().join("AlwaysFail.txt")).expect("read");
    assert_eq!(artifact, "\n always fails");

    let persisted = load_previous_report(&out.path().join("compliance.xml")).expect("load");
    assert_eq!(persisted.cases.len(), 2);
    assert!(persisted.timestamp.is_some());
    assert!(case(&persisted, "AlwaysPass").results.is_empty());
    assert_eq!(case(&persisted, "AlwaysFail").results.len(), 1);
}

#[test]
fn suppressed_artifacts_are_not_written() {
    let repo = repo();
    let out = TempDir::new().expect("temp");
    let registry = CheckRegistry::new().with_family(&families::PASS_FAIL);
    let mut plan = plan(&repo, &out);
    plan.case_output_dir = None;
    plan.output = None;

    let summary = run_session(&plan, &registry, &mut SilentObserver).expect("session");

    assert_eq!(summary.exit_status(), 1);
    assert!(summary.artifacts.is_empty());
    assert!(!out.path().join("AlwaysFail.txt").exists());
    assert!(!out.path().join("compliance.xml").exists());
}

#[test]
fn defects_are_contained_and_later_checks_run() {
    let ctx = RunContext::new(".", DEFAULT_COMMIT_RANGE);
    let registry = CheckRegistry::new().with_family(&families::MISBEHAVING);
    let selected = select(registry.discover(), &Selection::default());
    let mut report = Report::default();

    let execution = Engine::new(&ctx)
        .execute(&selected, &mut report, &mut SilentObserver)
        .expect("execute");

    assert_eq!(
        execution.executed,
        vec!["Panicking", "Erroring", "AlwaysFail", "AlwaysPass"]
    );

    let panicking = case(&report, "Panicking");
    assert_eq!(panicking.results.len(), 2);
    assert_eq!(panicking.results[0].kind, ResultKind::Failure);
    let defect = &panicking.results[1];
    assert_eq!(defect.kind, ResultKind::Error);
    assert_eq!(defect.message, "Panicking raised an unexpected error");
    assert_eq!(defect.category, CATEGORY_DEFECT);
    assert!(defect.text.contains("scripted panic"));

    let erroring = case(&report, "Erroring");
    assert_eq!(erroring.results.len(), 1);
    assert_eq!(erroring.results[0].message, "Erroring raised an unexpected error");
    assert!(erroring.results[0].text.contains("scripted failure"));

    assert_eq!(case(&report, "AlwaysFail").results.len(), 1);
    assert!(case(&report, "AlwaysPass").results.is_empty());
    assert_eq!(exit_status(&report), 3);
}

#[test]
fn early_stops_and_multiple_failures() {
    let ctx = RunContext::new(".", DEFAULT_COMMIT_RANGE);
    let engine = Engine::new(&ctx);
    let registry = CheckRegistry::new().with_family(&families::PROTOCOL);

    let skipping = registry.find("skipping").expect("skipping");
    let run = engine.run_check(&skipping).expect("run");
    assert_eq!(run.termination, Termination::Ended);
    assert_eq!(run.case.results.len(), 1);
    assert_eq!(case_outcome(&run.case), CaseOutcome::Skipped);

    let fail_then_error = registry.find("FailThenError").expect("fail then error");
    let run = engine.run_check(&fail_then_error).expect("run");
    assert_eq!(run.termination, Termination::Ended);
    let kinds: Vec<_> = run.case.results.iter().map(|r| r.kind).collect();
    assert_eq!(kinds, vec![ResultKind::Failure, ResultKind::Error]);

    let three = registry.find("ThreeFailures").expect("three");
    let run = engine.run_check(&three).expect("run");
    assert_eq!(run.termination, Termination::Completed);
    assert_eq!(run.case.results.len(), fixtures::THREE);

    let formatted = registry.find("Formatted").expect("formatted");
    let run = engine.run_check(&formatted).expect("run");
    assert_eq!(run.formatted.len(), 1);
    assert_eq!(run.case.results[0].message, "src/main.c:10 line too long");
}

#[test]
fn listing_does_not_run_checks() {
    let registry = CheckRegistry::new().with_family(&families::COUNTED);
    let mut out = Vec::new();

    let listed = list_checks(&registry, &mut out).expect("list");

    let text = String::from_utf8(out).expect("utf8");
    let mut lines: Vec<_> = text.lines().collect();
    lines.sort_unstable();
    assert_eq!(listed, 5);
    assert_eq!(lines, vec!["CountA", "CountB", "CountC", "CountD", "CountE"]);
    assert_eq!(fixtures::counted_runs(), 0);
}

#[test]
fn bad_commit_range_stops_before_checks() {
    let repo = repo();
    let out = TempDir::new().expect("temp");
    let registry = CheckRegistry::new().with_family(&families::COUNTED);
    let mut plan = plan(&repo, &out);
    plan.commit_range = "no-such-ref..HEAD".to_string();

    let err = run_session(&plan, &registry, &mut SilentObserver).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SetupError>(),
        Some(SetupError::BadCommitRange { range, .. }) if range == "no-such-ref..HEAD"
    ));
    assert_eq!(fixtures::counted_runs(), 0);
    assert!(!out.path().join("compliance.xml").exists());
}

#[test]
fn previous_case_names_cannot_escape_the_artifact_dir() {
    let repo = repo();
    let out = TempDir::new().expect("temp");
    let artifacts = out.path().join("artifacts");
    let previous = out.path().join("previous.xml");
    let mut earlier = Case::new("../escaped");
    earlier.results.push(CaseResult {
        kind: ResultKind::Failure,
        message: "escaped issues".to_string(),
        category: "failure".to_string(),
        text: "bad".to_string(),
    });
    let report = Report {
        cases: vec![earlier],
        ..Report::default()
    };
    commitguard_core::write_report(&previous, &report).expect("write");

    let registry = CheckRegistry::new().with_family(&families::PASS_FAIL);
    let mut plan = plan(&repo, &out);
    plan.previous_run = Some(previous);
    plan.case_output_dir = Some(artifacts.clone());

    let summary = run_session(&plan, &registry, &mut SilentObserver).expect("session");

    assert_eq!(summary.failed_cases, vec!["../escaped", "AlwaysFail"]);
    assert_eq!(summary.artifacts, vec![artifacts.join("AlwaysFail.txt")]);
    assert!(!out.path().join("escaped.txt").exists());
}

#[test]
fn include_and_exclude_filter_the_run() {
    let repo = repo();
    let out = TempDir::new().expect("temp");
    let registry = CheckRegistry::new().with_family(&families::PASS_FAIL);
    let mut plan = plan(&repo, &out);
    plan.selection = Selection::new(
        vec!["alwayspass".to_string(), "ALWAYSFAIL".to_string()],
        vec!["alwaysfail".to_string()],
    );

    let summary = run_session(&plan, &registry, &mut SilentObserver).expect("session");

    assert_eq!(summary.executed, vec!["AlwaysPass"]);
    assert_eq!(summary.exit_status(), 0);
    assert_eq!(summary.report.cases.len(), 1);
}

#[test]
fn previous_results_are_merged() {
    let repo = repo();
    let out = TempDir::new().expect("temp");
    let previous = out.path().join("previous.xml");
    commitguard_core::write_report(&previous, &sample_reports::mixed()).expect("write");

    let registry = CheckRegistry::new().with_family(&families::PASS_FAIL);
    let mut plan = plan(&repo, &out);
    plan.previous_run = Some(previous);

    let summary = run_session(&plan, &registry, &mut SilentObserver).expect("session");

    let names: Vec<_> = summary.report.cases.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Identity", "Checkpatch", "Gitlint", "Kconfig", "AlwaysPass", "AlwaysFail"]
    );
    // Gitlint and Kconfig from the earlier run still count.
    assert_eq!(summary.exit_status(), 3);
}

#[test]
fn missing_previous_run_stops_before_checks() {
    let repo = repo();
    let out = TempDir::new().expect("temp");
    let registry = CheckRegistry::new().with_family(&families::PASS_FAIL);
    let mut plan = plan(&repo, &out);
    plan.previous_run = Some(out.path().join("missing.xml"));

    let err = run_session(&plan, &registry, &mut SilentObserver).unwrap_err();

    assert!(err.to_string().contains("missing.xml' not found"));
    assert!(!out.path().join("compliance.xml").exists());
}

#[test]
fn git_failures_abort_the_run() {
    let repo = TestRepo::with_commits(2).expect("repo");
    let ctx = RunContext::new(repo.path(), DEFAULT_COMMIT_RANGE);
    let registry = CheckRegistry::new().with_family(&families::BAD_GIT);
    let selected = select(registry.discover(), &Selection::default());
    let mut report = Report::default();

    let err = Engine::new(&ctx)
        .execute(&selected, &mut report, &mut SilentObserver)
        .unwrap_err();

    assert!(matches!(err, EngineError::Git { ref check, .. } if check == "BadRef"));
    assert!(report.cases.is_empty());
}
