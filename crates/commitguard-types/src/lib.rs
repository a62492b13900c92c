//! Data types (reports, cases, results, config) for commitguard.
//!
//! This crate is intentionally "dumb": pure DTOs with serde. Behaviour that
//! interprets these types (merging, statistics, verdicts) lives in
//! `commitguard-core`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── Frozen Vocabulary ──────────────────────────────────────────
pub const DEFAULT_SUITE_NAME: &str = "Compliance";
pub const CASE_CLASSNAME: &str = "Guidelines";
pub const DEFAULT_COMMIT_RANGE: &str = "HEAD~1..HEAD";
pub const DEFAULT_OUTPUT: &str = "compliance.xml";
pub const DEFAULT_CONFIG_FILE: &str = "commitguard.toml";

// Result categories (the JUnit `type` attribute)
pub const CATEGORY_ERROR: &str = "error";
pub const CATEGORY_SKIP: &str = "skip";
pub const CATEGORY_FAILURE: &str = "failure";
pub const CATEGORY_DEFECT: &str = "defect";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Error,
    Skipped,
    Failure,
}

impl ResultKind {
    /// The JUnit element name used for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            ResultKind::Error => "error",
            ResultKind::Skipped => "skipped",
            ResultKind::Failure => "failure",
        }
    }

    pub fn from_element(name: &str) -> Option<Self> {
        match name {
            "error" => Some(ResultKind::Error),
            "skipped" => Some(ResultKind::Skipped),
            "failure" => Some(ResultKind::Failure),
            _ => None,
        }
    }
}

/// Severity of a positionally addressable failure.
///
/// `Check` is the lowest checkpatch level; it is surfaced as a notice in CI
/// annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Check,
    Notice,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Check => "check",
            Severity::Notice => "notice",
        }
    }

    /// GitHub workflow command level for this severity.
    pub fn annotation_level(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Check | Severity::Notice => "notice",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSeverity(pub String);

impl fmt::Display for UnknownSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown severity '{}'", self.0)
    }
}

impl std::error::Error for UnknownSeverity {}

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" | "warn" => Ok(Severity::Warning),
            "check" => Ok(Severity::Check),
            "notice" | "info" => Ok(Severity::Notice),
            _ => Err(UnknownSeverity(s.to_string())),
        }
    }
}

/// One recorded outcome within a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseResult {
    pub kind: ResultKind,
    pub message: String,
    /// Free-form category, persisted as the JUnit `type` attribute.
    pub category: String,
    pub text: String,
}

/// A failure precise enough to be annotated inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedFailure {
    pub severity: Severity,
    pub title: String,
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl FormattedFailure {
    pub fn new(severity: Severity, title: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            file: file.into(),
            line: None,
            column: None,
            description: String::new(),
        }
    }

    pub fn line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn column(mut self, column: u32) -> Self {
        self.column = Some(column);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// The result record for one check's run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    pub name: String,
    pub classname: String,
    /// Wall-clock duration of the run in milliseconds.
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub results: Vec<CaseResult>,
}

impl Case {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            classname: CASE_CLASSNAME.to_string(),
            duration_ms: 0,
            results: Vec::new(),
        }
    }
}

/// Aggregate counts derived from a set of cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Statistics {
    pub tests: u32,
    pub failures: u32,
    pub errors: u32,
    pub skipped: u32,
    pub time_ms: u64,
}

/// A test suite of named cases. Case names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub cases: Vec<Case>,
}

impl Default for Report {
    fn default() -> Self {
        Self {
            name: DEFAULT_SUITE_NAME.to_string(),
            timestamp: None,
            cases: Vec::new(),
        }
    }
}

/// The on-disk configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Include other config files. Paths are relative to this config file's directory.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<String>,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub checks: CheckSelection,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commits: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_output_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_case_output: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotate: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckSelection {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}
