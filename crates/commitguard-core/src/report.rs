//! Report merging, statistics and verdicts.

use commitguard_types::{Case, Report, ResultKind, Statistics};

/// How a case bears on the overall verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseOutcome {
    /// Ran and recorded nothing.
    Clean,
    /// Every recorded result is a skip.
    Skipped,
    /// At least one result that is not a skip.
    Failed,
}

pub fn case_outcome(case: &Case) -> CaseOutcome {
    if case.results.is_empty() {
        CaseOutcome::Clean
    } else if case.results.iter().all(|r| r.kind == ResultKind::Skipped) {
        CaseOutcome::Skipped
    } else {
        CaseOutcome::Failed
    }
}

/// Inserts `case`, replacing a case of the same name in place.
pub fn upsert_case(report: &mut Report, case: Case) {
    match report.cases.iter_mut().find(|c| c.name == case.name) {
        Some(existing) => *existing = case,
        None => report.cases.push(case),
    }
}

/// Combines a previous report with a newer one, case by case.
///
/// Cases from `incoming` replace same-named cases from `existing`; cases only
/// in `existing` are kept. Suite name and timestamp come from `incoming`.
pub fn merge_reports(existing: &Report, incoming: &Report) -> Report {
    let mut merged = Report {
        name: incoming.name.clone(),
        timestamp: incoming.timestamp.clone(),
        cases: existing.cases.clone(),
    };
    for case in &incoming.cases {
        upsert_case(&mut merged, case.clone());
    }
    merged
}

/// Counts derived from the current cases; never read from a persisted file.
pub fn statistics(report: &Report) -> Statistics {
    let mut stats = Statistics::default();
    for case in &report.cases {
        stats.tests = stats.tests.saturating_add(1);
        stats.time_ms = stats.time_ms.saturating_add(case.duration_ms);
        for result in &case.results {
            match result.kind {
                ResultKind::Failure => stats.failures = stats.failures.saturating_add(1),
                ResultKind::Error => stats.errors = stats.errors.saturating_add(1),
                ResultKind::Skipped => stats.skipped = stats.skipped.saturating_add(1),
            }
        }
    }
    stats
}

pub fn failed_cases(report: &Report) -> Vec<&Case> {
    report
        .cases
        .iter()
        .filter(|c| case_outcome(c) == CaseOutcome::Failed)
        .collect()
}

/// Number of failing cases; zero means the run passed.
pub fn exit_status(report: &Report) -> usize {
    failed_cases(report).len()
}

/// Contents of the per-check artifact for a failing case.
pub fn case_artifact_text(case: &Case) -> String {
    let mut out = String::new();
    for result in &case.results {
        out.push_str("\n ");
        out.push_str(result.text.trim());
    }
    out
}
