//! Check registry - discovers every check reachable from the registered families.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::io::{self, Write};

use tracing::debug;

use crate::check::{CheckDescriptor, CheckFamily};

/// Registry of root check families.
#[derive(Debug, Default)]
pub struct CheckRegistry {
    roots: Vec<&'static CheckFamily>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a root family. Families it includes are picked up by [`discover`](Self::discover).
    pub fn with_family(mut self, family: &'static CheckFamily) -> Self {
        self.register(family);
        self
    }

    pub fn register(&mut self, family: &'static CheckFamily) {
        self.roots.push(family);
    }

    /// Every check reachable from the roots, each exactly once.
    ///
    /// Families are expanded with a worklist until no unvisited family is
    /// left; a family or check reachable along several paths is kept once.
    /// Families are told apart by address, checks by case-insensitive name.
    pub fn discover(&self) -> Vec<CheckDescriptor> {
        let mut work: VecDeque<&'static CheckFamily> = self.roots.iter().copied().collect();
        let mut visited_families: HashSet<*const CheckFamily> = HashSet::new();
        let mut seen_checks = BTreeSet::new();
        let mut found = Vec::new();

        while let Some(family) = work.pop_front() {
            if !visited_families.insert(std::ptr::from_ref(family)) {
                continue;
            }
            debug!("expanding check family '{}'", family.name);

            for check in family.checks {
                if seen_checks.insert(check.name.to_ascii_lowercase()) {
                    found.push(*check);
                } else {
                    debug!(
                        "skipping duplicate check '{}' in family '{}'",
                        check.name, family.name
                    );
                }
            }

            work.extend(family.includes.iter().copied());
        }

        found
    }

    /// Case-insensitive lookup by check name.
    pub fn find(&self, name: &str) -> Option<CheckDescriptor> {
        self.discover().into_iter().find(|d| d.matches(name))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.discover().into_iter().map(|d| d.name).collect()
    }
}

/// Writes the name of every discoverable check, one per line, without
/// instantiating any of them. Returns how many names were written.
pub fn list_checks<W: Write>(registry: &CheckRegistry, out: &mut W) -> io::Result<usize> {
    let names = registry.names();
    for name in &names {
        writeln!(out, "{name}")?;
    }
    Ok(names.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::{Check, PathHint};
    use crate::context::RunContext;
    use crate::protocol::CaseRecorder;

    struct Noop;

    impl Check for Noop {
        fn run(&mut self, _ctx: &RunContext, _case: &mut CaseRecorder) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn noop() -> Box<dyn Check> {
        Box::new(Noop)
    }

    const fn descriptor(name: &'static str) -> CheckDescriptor {
        CheckDescriptor {
            name,
            path_hint: PathHint::RepoRoot,
            create: noop,
        }
    }

    static LEAF: CheckFamily = CheckFamily {
        name: "leaf",
        checks: &[descriptor("Leaf")],
        includes: &[],
    };

    static LEFT: CheckFamily = CheckFamily {
        name: "left",
        checks: &[descriptor("Left")],
        includes: &[&LEAF],
    };

    static RIGHT: CheckFamily = CheckFamily {
        name: "right",
        checks: &[descriptor("Right"), descriptor("left")],
        includes: &[&LEAF],
    };

    static ROOT: CheckFamily = CheckFamily {
        name: "root",
        checks: &[],
        includes: &[&LEFT, &RIGHT],
    };

    #[test]
    fn discover_expands_nested_families_once() {
        let registry = CheckRegistry::new().with_family(&ROOT);
        let mut names = registry.names();
        names.sort_unstable();
        assert_eq!(names, vec!["Leaf", "Left", "Right"]);
    }

    #[test]
    fn registering_the_same_family_twice_is_harmless() {
        let registry = CheckRegistry::new().with_family(&LEFT).with_family(&LEFT);
        assert_eq!(registry.discover().len(), 2);
    }

    #[test]
    fn find_is_case_insensitive() {
        let registry = CheckRegistry::new().with_family(&ROOT);
        assert_eq!(registry.find("LEAF").map(|d| d.name), Some("Leaf"));
        assert!(registry.find("missing").is_none());
    }

    static STYLE_BUILTIN: CheckFamily = CheckFamily {
        name: "style",
        checks: &[descriptor("Checkpatch")],
        includes: &[],
    };

    static STYLE_PLUGIN: CheckFamily = CheckFamily {
        name: "Style",
        checks: &[descriptor("Codespell")],
        includes: &[],
    };

    #[test]
    fn families_sharing_a_name_are_both_expanded() {
        let registry = CheckRegistry::new()
            .with_family(&STYLE_BUILTIN)
            .with_family(&STYLE_PLUGIN);
        assert_eq!(registry.names(), vec!["Checkpatch", "Codespell"]);
    }

    #[test]
    fn list_checks_writes_one_name_per_line() {
        let registry = CheckRegistry::new().with_family(&ROOT);
        let mut out = Vec::new();
        let n = list_checks(&registry, &mut out).expect("write");
        assert_eq!(n, 3);
        assert_eq!(String::from_utf8(out).expect("utf8").lines().count(), 3);
    }

    #[test]
    fn empty_registry_discovers_nothing() {
        assert!(CheckRegistry::new().discover().is_empty());
    }
}
