use std::path::PathBuf;

use crate::context::RunContext;
use crate::protocol::CaseRecorder;

/// A compliance rule run against the commit range of a [`RunContext`].
///
/// Outcomes go through the [`CaseRecorder`]. Returning `Err(EndCheck)` (as
/// produced by `error`/`skip`) is a normal early stop; any other error, or a
/// panic, is contained by the engine and recorded as a defect.
pub trait Check {
    fn run(&mut self, ctx: &RunContext, case: &mut CaseRecorder) -> anyhow::Result<()>;
}

/// Where a check runs. Informational only; shown in progress output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathHint {
    /// The top-level directory of the repository under review.
    RepoRoot,
    /// A path or description used verbatim.
    Literal(&'static str),
}

impl PathHint {
    pub fn resolve(self, ctx: &RunContext) -> PathBuf {
        match self {
            PathHint::RepoRoot => ctx.repo_root().to_path_buf(),
            PathHint::Literal(hint) => PathBuf::from(hint),
        }
    }

    /// Unresolved form, used where no run context exists (e.g. listing).
    pub fn as_str(self) -> &'static str {
        match self {
            PathHint::RepoRoot => "<git-top>",
            PathHint::Literal(hint) => hint,
        }
    }
}

/// Registration record for a check implementation.
#[derive(Debug, Clone, Copy)]
pub struct CheckDescriptor {
    pub name: &'static str,
    pub path_hint: PathHint,
    pub create: fn() -> Box<dyn Check>,
}

impl CheckDescriptor {
    pub fn instantiate(&self) -> Box<dyn Check> {
        (self.create)()
    }

    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// A group of checks declared next to their implementations.
///
/// Families may include other families; the registry expands them
/// transitively, so a plugin module registers itself just by declaring its
/// family and being included from a root.
#[derive(Debug)]
pub struct CheckFamily {
    pub name: &'static str,
    pub checks: &'static [CheckDescriptor],
    pub includes: &'static [&'static CheckFamily],
}
