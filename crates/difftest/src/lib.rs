#![allow(
    clippy::missing_errors_doc, // every fallible API returns the crate-wide `Error`
    clippy::module_name_repetitions
)]

pub mod artifacts;
pub mod compare;
pub mod config;
pub mod diff;
pub mod discovery;
pub mod error;
pub mod harness;
pub mod pipeline;
pub mod process;
pub mod report;

/// Fake toolchains for driving the harness end to end in tests.
///
/// This module is only available when running tests or when the
/// `test-harness` feature is enabled, and only on Unix.
#[cfg(all(unix, any(test, feature = "test-harness")))]
pub mod test_harness;

pub use artifacts::RunRoot;
pub use compare::{ComparisonEngine, Verdict};
pub use config::{CandidateConfig, ExitPolicy, HarnessConfig, ReferenceConfig};
pub use discovery::{TestCase, discover};
pub use error::{Error, Result};
pub use harness::{Harness, Summary, run_with_config};
pub use pipeline::{CandidateToolchain, ReferenceToolchain, Side, Toolchain};
pub use report::Reporter;
