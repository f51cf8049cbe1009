//! The discovery → compare → report loop.

use std::io::Write;
use std::path::Path;

use crate::artifacts::RunRoot;
use crate::compare::{ComparisonEngine, Verdict};
use crate::config::HarnessConfig;
use crate::discovery::discover;
use crate::pipeline::{CandidateToolchain, ReferenceToolchain, Toolchain};
use crate::report::Reporter;
use crate::{Error, Result};

/// Verdict counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub matched: usize,
    pub mismatched: usize,
    pub inconclusive: usize,
}

impl Summary {
    #[must_use]
    pub fn total(&self) -> usize {
        self.matched + self.mismatched + self.inconclusive
    }

    fn record(&mut self, verdict: &Verdict) {
        match verdict {
            Verdict::Match => self.matched += 1,
            Verdict::Mismatch { .. } => self.mismatched += 1,
            Verdict::Inconclusive(_) => self.inconclusive += 1,
        }
    }
}

/// Drives every discovered case through the comparison engine, one at a
/// time, and reports each verdict before moving on.
pub struct Harness<C, R, W> {
    engine: ComparisonEngine<C, R>,
    reporter: Reporter<W>,
    stop_on_mismatch: bool,
}

impl<C: Toolchain, R: Toolchain, W: Write> Harness<C, R, W> {
    pub fn new(engine: ComparisonEngine<C, R>, reporter: Reporter<W>) -> Self {
        Self {
            engine,
            reporter,
            stop_on_mismatch: false,
        }
    }

    #[must_use]
    pub fn stop_on_mismatch(mut self, stop: bool) -> Self {
        self.stop_on_mismatch = stop;
        self
    }

    /// Compare every regular file under `tests_root`, placing artifacts in
    /// `run_root`. Run roots found inside `tests_root`, this one included,
    /// are skipped.
    ///
    /// Individual toolchain failures never abort the loop; only a missing
    /// test root or a failure to write the report does.
    pub fn run(&mut self, tests_root: &Path, run_root: &RunRoot) -> Result<Summary> {
        if !tests_root.exists() {
            return Err(Error::MissingTestRoot(tests_root.to_path_buf()));
        }

        let mut summary = Summary::default();
        for case in discover(tests_root) {
            tracing::info!(case = %case.path().display(), "processing");
            let verdict = self.engine.compare(&case, run_root);
            summary.record(&verdict);
            self.reporter.case(&case, &verdict).map_err(Error::Report)?;

            if self.stop_on_mismatch && matches!(verdict, Verdict::Mismatch { .. }) {
                tracing::info!("stopping after first mismatch");
                break;
            }
        }

        self.reporter.summary(&summary).map_err(Error::Report)?;
        Ok(summary)
    }

    pub fn into_reporter(self) -> Reporter<W> {
        self.reporter
    }
}

/// Run the whole harness as configured: create a fresh run root, build both
/// toolchains from `config`, and report to `out`.
pub fn run_with_config<W: Write>(config: &HarnessConfig, out: W) -> Result<(RunRoot, Summary)> {
    let run_root = RunRoot::create(&config.runs_dir)?;
    let engine = ComparisonEngine::new(
        CandidateToolchain::new(&config.candidate),
        ReferenceToolchain::new(&config.reference),
    );
    let mut harness =
        Harness::new(engine, Reporter::new(out)).stop_on_mismatch(config.stop_on_mismatch);
    let summary = harness.run(&config.tests_root, &run_root)?;
    Ok((run_root, summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_each_verdict_kind() {
        let mut summary = Summary::default();
        summary.record(&Verdict::Match);
        summary.record(&Verdict::Match);
        summary.record(&Verdict::Mismatch {
            diff: "-a\n+b\n".to_string(),
        });
        summary.record(&Verdict::Inconclusive(Vec::new()));
        assert_eq!(
            summary,
            Summary {
                matched: 2,
                mismatched: 1,
                inconclusive: 1,
            }
        );
        assert_eq!(summary.total(), 4);
    }
}
