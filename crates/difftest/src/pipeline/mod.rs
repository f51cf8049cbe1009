//! Build-and-run pipelines for the two toolchains under comparison.

mod candidate;
mod reference;

use std::fmt;
use std::path::Path;

use crate::Result;

pub use candidate::{ASM_FILE, CandidateToolchain, OBJECT_FILE};
pub use reference::ReferenceToolchain;

/// Which toolchain a pipeline, workspace or failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The compiler under test.
    Candidate,
    /// The trusted compiler acting as oracle.
    Reference,
}

impl Side {
    /// Suffix appended to a case's file name to form its workspace name.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Side::Candidate => "mine",
            Side::Reference => "reference",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Candidate => f.write_str("Mine"),
            Side::Reference => f.write_str("Reference"),
        }
    }
}

/// A toolchain that can turn a source program into captured output.
///
/// Implementations own the whole build inside `workspace` and either return
/// the built program's standard output or the first failure. Partial output
/// is never returned.
pub trait Toolchain {
    fn side(&self) -> Side;

    fn build_and_run(&self, source: &Path, workspace: &Path) -> Result<String>;
}

/// File name of the executable every pipeline links into its workspace.
pub const EXECUTABLE_NAME: &str = "output";
