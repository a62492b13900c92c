//! Shared test utilities for the commitguard workspace.
//!
//! This crate provides:
//! - **arb**: Proptest strategies for reports, cases and results
//! - **fixtures**: Scripted checks, check families and sample JUnit documents
//! - **test_repo**: Throwaway git repositories for end-to-end tests
//!
//! # Example
//!
//! ```rust,ignore
//! use commitguard_testkit::arb;
//! use proptest::prelude::*;
//!
//! proptest! {
//!     fn report_has_unique_names(report in arb::arb_report()) {
//!         // Use the generated report
//!     }
//! }
//! ```

pub mod arb;
pub mod fixtures;
pub mod test_repo;

pub use arb::{arb_case, arb_case_result, arb_report, arb_result_kind};
pub use fixtures::{families, sample_junit, sample_reports};
pub use test_repo::TestRepo;
