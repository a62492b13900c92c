//! The vocabulary a check uses to report its outcome.
//!
//! Every check run receives a [`CaseRecorder`]. `error` and `skip` end the
//! run: they record their result and hand back an [`EndCheck`] that the
//! check propagates with `?`, from however deep in its helpers it is.
//! `failure` records and returns, so one run can report every violation it
//! finds.

use commitguard_types::{
    CATEGORY_ERROR, CATEGORY_FAILURE, CATEGORY_SKIP, Case, CaseResult, FormattedFailure,
    ResultKind,
};
use tracing::debug;

/// Signal that ends the current check run early.
///
/// Recorded results stay on the case; the engine treats this as a normal stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("check ended early")]
pub struct EndCheck;

/// Result type for helpers that may end the check run.
pub type CheckFlow<T = ()> = Result<T, EndCheck>;

/// Optional message and category overriding the defaults of a result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Details {
    pub message: Option<String>,
    pub category: Option<String>,
}

impl Details {
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Accumulates the results of one check run.
#[derive(Debug)]
pub struct CaseRecorder {
    case: Case,
    formatted: Vec<FormattedFailure>,
    ended: bool,
}

impl CaseRecorder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            case: Case::new(name),
            formatted: Vec::new(),
            ended: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.case.name
    }

    pub fn results(&self) -> &[CaseResult] {
        &self.case.results
    }

    /// Whether `error` or `skip` has already ended this run.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Records an error (the check could not decide) and ends the run.
    pub fn error<T>(&mut self, text: impl Into<String>) -> CheckFlow<T> {
        self.error_with(text, Details::default())
    }

    pub fn error_with<T>(&mut self, text: impl Into<String>, details: Details) -> CheckFlow<T> {
        let message = format!("{} error", self.case.name);
        self.record(ResultKind::Error, message, CATEGORY_ERROR, text.into(), details);
        self.ended = true;
        Err(EndCheck)
    }

    /// Records that the check does not apply and ends the run.
    pub fn skip<T>(&mut self, text: impl Into<String>) -> CheckFlow<T> {
        self.skip_with(text, Details::default())
    }

    pub fn skip_with<T>(&mut self, text: impl Into<String>, details: Details) -> CheckFlow<T> {
        let message = format!("{} skipped", self.case.name);
        self.record(ResultKind::Skipped, message, CATEGORY_SKIP, text.into(), details);
        self.ended = true;
        Err(EndCheck)
    }

    /// Records a violation. May be called any number of times.
    pub fn failure(&mut self, text: impl Into<String>) {
        self.failure_with(text, Details::default());
    }

    pub fn failure_with(&mut self, text: impl Into<String>, details: Details) {
        let message = format!("{} issues", self.case.name);
        self.record(ResultKind::Failure, message, CATEGORY_FAILURE, text.into(), details);
    }

    /// Records a violation with file/line addressing, kept for annotations.
    pub fn formatted_failure(&mut self, failure: FormattedFailure) {
        if self.ended {
            debug!(check = %self.case.name, "ignoring formatted failure after end of run");
            return;
        }
        let details = Details::default()
            .message(formatted_message(&failure))
            .category(failure.severity.as_str());
        let text = formatted_text(&failure);
        self.record(
            ResultKind::Failure,
            String::new(),
            CATEGORY_FAILURE,
            text,
            details,
        );
        self.formatted.push(failure);
    }

    /// Appends an error result for a defect the engine contained. Bypasses
    /// the ended state since the defect is reported by the engine itself.
    pub(crate) fn defect(&mut self, text: String) {
        self.case.results.push(CaseResult {
            kind: ResultKind::Error,
            message: format!("{} raised an unexpected error", self.case.name),
            category: commitguard_types::CATEGORY_DEFECT.to_string(),
            text: text.trim_end().to_string(),
        });
    }

    pub(crate) fn set_duration_ms(&mut self, duration_ms: u64) {
        self.case.duration_ms = duration_ms;
    }

    pub fn into_parts(self) -> (Case, Vec<FormattedFailure>) {
        (self.case, self.formatted)
    }

    fn record(
        &mut self,
        kind: ResultKind,
        default_message: String,
        default_category: &str,
        text: String,
        details: Details,
    ) {
        if self.ended {
            debug!(
                check = %self.case.name,
                kind = kind.as_str(),
                "ignoring result recorded after end of run"
            );
            return;
        }
        self.case.results.push(CaseResult {
            kind,
            message: details.message.unwrap_or(default_message),
            category: details
                .category
                .unwrap_or_else(|| default_category.to_string()),
            text: text.trim_end().to_string(),
        });
    }
}

/// `file[:line] description-or-title`
pub fn formatted_message(failure: &FormattedFailure) -> String {
    let body = if failure.description.is_empty() {
        &failure.title
    } else {
        &failure.description
    };
    match failure.line {
        Some(line) => format!("{}:{} {}", failure.file, line, body),
        None => format!("{} {}", failure.file, body),
    }
}

/// Text body of a formatted failure: title line, optional description,
/// then `File:`, `Line:` and `Column:` lines.
pub fn formatted_text(failure: &FormattedFailure) -> String {
    let mut text = format!("\n{}", failure.title);
    if !failure.description.is_empty() {
        text.push(':');
        text.push_str(&failure.description);
    }
    text.push_str("\nFile:");
    text.push_str(&failure.file);
    if let Some(line) = failure.line {
        text.push_str(&format!("\nLine:{line}"));
    }
    if let Some(column) = failure.column {
        text.push_str(&format!("\nColumn:{column}"));
    }
    text.trim_end().to_string()
}
