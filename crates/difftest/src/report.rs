//! Console report of per-case verdicts.

use std::io::{self, Write};

use crate::compare::Verdict;
use crate::discovery::TestCase;
use crate::harness::Summary;

const SEPARATOR: &str = "------------------------";

/// Writes the human-readable report. Each case's lines are written and
/// flushed together so a case's diff is never split.
pub struct Reporter<W> {
    out: W,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn case(&mut self, case: &TestCase, verdict: &Verdict) -> io::Result<()> {
        let mut text = format!("Processing file: {}\n", case.path().display());
        match verdict {
            Verdict::Match => text.push_str("Outputs match\n"),
            Verdict::Mismatch { diff } => {
                text.push_str("Outputs differ\nDiff:\n");
                text.push_str(diff);
                if !diff.ends_with('\n') {
                    text.push('\n');
                }
            }
            Verdict::Inconclusive(failures) => {
                for failure in failures {
                    text.push_str(&format!("{} failed: {}\n", failure.side, failure.error));
                }
            }
        }
        text.push_str(SEPARATOR);
        text.push('\n');

        self.out.write_all(text.as_bytes())?;
        self.out.flush()
    }

    pub fn summary(&mut self, summary: &Summary) -> io::Result<()> {
        writeln!(
            self.out,
            "{} cases: {} match, {} differ, {} inconclusive",
            summary.total(),
            summary.matched,
            summary.mismatched,
            summary.inconclusive
        )?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::compare::SideFailure;
    use crate::pipeline::Side;

    fn render(verdict: &Verdict) -> String {
        let mut reporter = Reporter::new(Vec::new());
        let case = TestCase::new("examples/begin.scm", "begin.scm");
        reporter.case(&case, verdict).unwrap();
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn match_line() {
        assert_eq!(
            render(&Verdict::Match),
            "Processing file: examples/begin.scm\nOutputs match\n------------------------\n"
        );
    }

    #[test]
    fn mismatch_includes_diff() {
        let text = render(&Verdict::Mismatch {
            diff: "--- mine\n+++ reference\n@@ -1 +1 @@\n-2\n+3\n".to_string(),
        });
        assert!(text.contains("Outputs differ\nDiff:\n--- mine\n"), "{text}");
        assert!(text.contains("-2\n+3\n------------------------\n"), "{text}");
    }

    #[test]
    fn inconclusive_names_failed_side() {
        let text = render(&Verdict::Inconclusive(vec![SideFailure {
            side: Side::Candidate,
            error: Error::ExitStatus {
                command: "out/begin.scm-mine/output".to_string(),
                code: Some(139),
                stderr: String::new(),
            },
        }]));
        assert!(
            text.contains("Mine failed: `out/begin.scm-mine/output` failed with exit code 139\n"),
            "{text}"
        );
        assert!(!text.contains("Reference failed"));
    }

    #[test]
    fn summary_line() {
        let mut reporter = Reporter::new(Vec::new());
        reporter
            .summary(&Summary {
                matched: 3,
                mismatched: 1,
                inconclusive: 2,
            })
            .unwrap();
        let text = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(text, "6 cases: 3 match, 1 differ, 2 inconclusive\n");
    }
}
