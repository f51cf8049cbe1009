//! Running both toolchains on one case and classifying the outcome.

use crate::Error;
use crate::artifacts::RunRoot;
use crate::diff::unified_diff;
use crate::discovery::TestCase;
use crate::pipeline::{Side, Toolchain};

/// A toolchain that did not produce output, and why.
#[derive(Debug)]
pub struct SideFailure {
    pub side: Side,
    pub error: Error,
}

/// Outcome of comparing the two toolchains on one test case.
#[derive(Debug)]
pub enum Verdict {
    Match,
    /// Outputs differ; `diff` is a unified diff from candidate to reference.
    Mismatch { diff: String },
    /// At least one toolchain failed, so nothing was compared.
    Inconclusive(Vec<SideFailure>),
}

impl Verdict {
    #[must_use]
    pub fn is_match(&self) -> bool {
        matches!(self, Verdict::Match)
    }

    /// Sides that failed; empty unless the verdict is inconclusive.
    #[must_use]
    pub fn failed_sides(&self) -> Vec<Side> {
        match self {
            Verdict::Inconclusive(failures) => failures.iter().map(|f| f.side).collect(),
            _ => Vec::new(),
        }
    }
}

/// Classify two pipeline results.
///
/// Any failure wins over comparison: a toolchain error is never reported as
/// an output mismatch.
#[must_use]
pub fn judge(candidate: Result<String, Error>, reference: Result<String, Error>) -> Verdict {
    match (candidate, reference) {
        (Ok(mine), Ok(theirs)) => {
            if mine == theirs {
                Verdict::Match
            } else {
                Verdict::Mismatch {
                    diff: unified_diff(
                        &mine,
                        &theirs,
                        Side::Candidate.suffix(),
                        Side::Reference.suffix(),
                    ),
                }
            }
        }
        (candidate, reference) => {
            let failures = [(Side::Candidate, candidate), (Side::Reference, reference)]
                .into_iter()
                .filter_map(|(side, result)| {
                    result.err().map(|error| SideFailure { side, error })
                })
                .collect();
            Verdict::Inconclusive(failures)
        }
    }
}

/// Runs the candidate and reference toolchains on a case and compares them.
pub struct ComparisonEngine<C, R> {
    candidate: C,
    reference: R,
}

impl<C: Toolchain, R: Toolchain> ComparisonEngine<C, R> {
    pub fn new(candidate: C, reference: R) -> Self {
        Self {
            candidate,
            reference,
        }
    }

    /// Build and run `case` with both toolchains inside `run_root`.
    ///
    /// The candidate always runs first and the reference always runs, even
    /// when the candidate failed, so both failures can be reported.
    pub fn compare(&self, case: &TestCase, run_root: &RunRoot) -> Verdict {
        let candidate = run_side(&self.candidate, case, run_root);
        let reference = run_side(&self.reference, case, run_root);
        judge(candidate, reference)
    }
}

fn run_side<T: Toolchain>(
    toolchain: &T,
    case: &TestCase,
    run_root: &RunRoot,
) -> Result<String, Error> {
    let side = toolchain.side();
    let workspace = run_root.case_workspace(case, side);
    let result = toolchain.build_and_run(case.path(), &workspace);
    if let Err(err) = &result {
        tracing::info!(
            case = %case.relative().display(),
            %side,
            error = %err,
            "pipeline failed"
        );
    }
    result
}
