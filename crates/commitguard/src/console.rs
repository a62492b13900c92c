//! Human-readable progress on stdout.

use std::path::Path;

use commitguard_core::{CheckDescriptor, EngineObserver, render_annotations};
use commitguard_types::{Case, FormattedFailure};

/// Prints progress lines and, when enabled, workflow annotations.
#[derive(Debug, Default)]
pub struct ConsoleObserver {
    annotate: bool,
}

impl ConsoleObserver {
    pub fn new(annotate: bool) -> Self {
        Self { annotate }
    }
}

impl EngineObserver for ConsoleObserver {
    fn check_excluded(&mut self, check: &CheckDescriptor) {
        println!("Skipping {}", check.name);
    }

    fn check_started(&mut self, check: &CheckDescriptor, path: &Path) {
        println!("{}", running_line(check.name, path));
    }

    fn check_finished(&mut self, _case: &Case, formatted: &[FormattedFailure]) {
        if self.annotate {
            for line in render_annotations(formatted) {
                println!("{line}");
            }
        }
    }
}

fn running_line(name: &str, path: &Path) -> String {
    format!("Running {name:16} tests in {} ...", path.display())
}
