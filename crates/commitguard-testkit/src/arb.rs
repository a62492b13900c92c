//! Proptest strategies for generating reports, cases and results.
//!
//! Generated values are already in the shape the engine produces: result
//! texts carry no trailing whitespace and case names are unique within a
//! report. Names are drawn partly from a small fixed pool so that two
//! independently generated reports overlap often enough to exercise merging.
//!
//! # Bounds
//!
//! - Max cases per report: 6
//! - Max results per case: 4
//! - Max text length: 120 bytes

use commitguard_types::{
    CASE_CLASSNAME, Case, CaseResult, DEFAULT_SUITE_NAME, Report, ResultKind, Severity,
};
use proptest::prelude::*;

/// Maximum number of cases in a generated report
pub const MAX_CASES: usize = 6;

/// Maximum number of results in a generated case
pub const MAX_RESULTS_PER_CASE: usize = 4;

/// Upper bound for generated case durations, in milliseconds
pub const MAX_DURATION_MS: u64 = 600_000;

const NAME_POOL: &[&str] = &["Checkpatch", "Gitlint", "Identity", "Kconfig", "Nits"];

pub fn arb_result_kind() -> impl Strategy<Value = ResultKind> {
    prop_oneof![
        Just(ResultKind::Error),
        Just(ResultKind::Skipped),
        Just(ResultKind::Failure),
    ]
}

pub fn arb_severity() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::Error),
        Just(Severity::Warning),
        Just(Severity::Check),
        Just(Severity::Notice),
    ]
}

/// Check names: mostly from the shared pool, sometimes fresh.
pub fn arb_case_name() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => prop::sample::select(NAME_POOL).prop_map(str::to_string),
        1 => "[A-Z][a-z]{3,10}",
    ]
}

/// Free text including XML metacharacters and line breaks, right-trimmed.
pub fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ,.:;()_<>&'\"%#\n-]{0,120}".prop_map(|s| s.trim_end().to_string())
}

fn arb_message() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ,.:()_<>&'\"-]{0,40}"
}

pub fn arb_case_result() -> impl Strategy<Value = CaseResult> {
    (arb_result_kind(), arb_message(), "[a-z]{1,10}", arb_text()).prop_map(
        |(kind, message, category, text)| CaseResult {
            kind,
            message,
            category,
            text,
        },
    )
}

fn arb_case_body() -> impl Strategy<Value = (u64, Vec<CaseResult>)> {
    (
        0..MAX_DURATION_MS,
        prop::collection::vec(arb_case_result(), 0..=MAX_RESULTS_PER_CASE),
    )
}

fn case_from(name: String, (duration_ms, results): (u64, Vec<CaseResult>)) -> Case {
    Case {
        name,
        classname: CASE_CLASSNAME.to_string(),
        duration_ms,
        results,
    }
}

pub fn arb_case() -> impl Strategy<Value = Case> {
    (arb_case_name(), arb_case_body()).prop_map(|(name, body)| case_from(name, body))
}

pub fn arb_timestamp() -> impl Strategy<Value = String> {
    (2000u32..2100, 1u32..=12, 1u32..=28, 0u32..24, 0u32..60, 0u32..60).prop_map(
        |(y, mo, d, h, mi, s)| format!("{y:04}-{mo:02}-{d:02}T{h:02}:{mi:02}:{s:02}Z"),
    )
}

/// Reports with unique case names.
pub fn arb_report() -> impl Strategy<Value = Report> {
    (
        prop::collection::btree_set(arb_case_name(), 0..=MAX_CASES),
        proptest::option::of(arb_timestamp()),
    )
        .prop_flat_map(|(names, timestamp)| {
            let names: Vec<String> = names.into_iter().collect();
            let bodies = prop::collection::vec(arb_case_body(), names.len());
            (Just(names), Just(timestamp), bodies)
        })
        .prop_map(|(names, timestamp, bodies)| Report {
            name: DEFAULT_SUITE_NAME.to_string(),
            timestamp,
            cases: names
                .into_iter()
                .zip(bodies)
                .map(|(name, body)| case_from(name, body))
                .collect(),
        })
}
