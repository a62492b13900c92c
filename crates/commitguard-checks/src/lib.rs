//! Built-in compliance checks.
//!
//! Each check module declares a `DESCRIPTOR`; the families below group them
//! and [`BUILTIN`] is the root that makes all of them discoverable.

pub mod checkpatch;
pub mod gitlint;
pub mod identity;
mod process;

use commitguard_core::{CheckFamily, CheckRegistry};

pub use checkpatch::Checkpatch;
pub use gitlint::Gitlint;
pub use identity::Identity;
pub use process::{ToolOutput, run_tool};

/// Patch and commit-message style.
pub static STYLE: CheckFamily = CheckFamily {
    name: "style",
    checks: &[checkpatch::DESCRIPTOR, gitlint::DESCRIPTOR],
    includes: &[],
};

/// Commit metadata.
pub static METADATA: CheckFamily = CheckFamily {
    name: "metadata",
    checks: &[identity::DESCRIPTOR],
    includes: &[],
};

pub static BUILTIN: CheckFamily = CheckFamily {
    name: "builtin",
    checks: &[],
    includes: &[&STYLE, &METADATA],
};

/// A registry holding every built-in check.
pub fn builtin_registry() -> CheckRegistry {
    CheckRegistry::new().with_family(&BUILTIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_checks_in_order() {
        assert_eq!(
            builtin_registry().names(),
            vec!["Checkpatch", "Gitlint", "Identity"]
        );
    }
}
