//! Run-scoped artifact directories.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;

use crate::discovery::TestCase;
use crate::pipeline::Side;
use crate::{Error, Result};

/// Name of the captured-output file written into each successful workspace.
pub const STDOUT_FILE: &str = "stdout.txt";

/// Empty file marking a directory as a run root. Discovery never descends
/// into a directory holding it, so runs placed inside the test tree are not
/// picked up as test programs.
pub const RUN_MARKER: &str = ".difftest-run";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S-%6f";
const CREATE_ATTEMPTS: u32 = 8;

/// Top-level directory owning every artifact of one harness invocation.
///
/// Created once and handed by reference to everything that needs a
/// workspace. Never removed by the harness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRoot {
    path: PathBuf,
}

impl RunRoot {
    /// Create a fresh, timestamp-named run root inside `base`.
    ///
    /// `base` is created if missing. If the timestamped name is already
    /// taken the clock is read again, so two runs started within the same
    /// microsecond still get distinct roots.
    pub fn create(base: impl AsRef<Path>) -> Result<Self> {
        let base = base.as_ref();
        std::fs::create_dir_all(base).map_err(|e| Error::io(base, e))?;

        let mut attempt = 0;
        loop {
            let path = base.join(Local::now().format(TIMESTAMP_FORMAT).to_string());
            match Self::create_at(&path) {
                Err(Error::RunRootExists(_)) if attempt + 1 < CREATE_ATTEMPTS => {
                    attempt += 1;
                    tracing::debug!(path = %path.display(), "run root taken, retrying");
                    std::thread::sleep(Duration::from_micros(1));
                }
                other => return other,
            }
        }
    }

    /// Create a run root at exactly `path`, which must not exist yet.
    pub fn create_at(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        match std::fs::create_dir(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(Error::RunRootExists(path));
            }
            Err(e) => return Err(Error::io(path, e)),
        }

        let marker = path.join(RUN_MARKER);
        std::fs::write(&marker, "").map_err(|e| Error::io(marker, e))?;
        tracing::info!(path = %path.display(), "created run root");
        Ok(Self { path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Workspace directory for one case built by one toolchain.
    ///
    /// The case's relative directory is mirrored below the root so files
    /// sharing a name in different directories stay apart. Nothing is
    /// created on disk.
    #[must_use]
    pub fn case_workspace(&self, case: &TestCase, side: Side) -> PathBuf {
        let mut name = case.file_name().to_os_string();
        name.push("-");
        name.push(side.suffix());
        self.path.join(case.dir()).join(name)
    }
}

/// Write the captured output of a successful pipeline into its workspace.
pub(crate) fn persist_stdout(workspace: &Path, output: &str) -> Result<()> {
    let path = workspace.join(STDOUT_FILE);
    std::fs::write(&path, output).map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_roots_are_distinct() {
        let base = tempfile::tempdir().unwrap();
        let first = RunRoot::create(base.path()).unwrap();
        let second = RunRoot::create(base.path()).unwrap();
        assert_ne!(first.path(), second.path());
        assert!(first.path().is_dir());
        assert!(second.path().is_dir());
    }

    #[test]
    fn run_root_name_has_microseconds() {
        let base = tempfile::tempdir().unwrap();
        let root = RunRoot::create(base.path()).unwrap();
        let name = root.path().file_name().unwrap().to_string_lossy().into_owned();
        // 2026-10-19_14-03-59-123456
        assert_eq!(name.len(), 26, "{name}");
        let micros = name.rsplit('-').next().unwrap();
        assert_eq!(micros.len(), 6);
        assert!(micros.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn create_creates_missing_base() {
        let base = tempfile::tempdir().unwrap();
        let nested = base.path().join("runs/deeper");
        let root = RunRoot::create(&nested).unwrap();
        assert!(root.path().starts_with(&nested));
    }

    #[test]
    fn run_roots_carry_the_marker() {
        let base = tempfile::tempdir().unwrap();
        let root = RunRoot::create(base.path()).unwrap();
        assert!(root.path().join(RUN_MARKER).is_file());
    }

    #[test]
    fn create_at_refuses_existing_directory() {
        let base = tempfile::tempdir().unwrap();
        let path = base.path().join("fixed");
        RunRoot::create_at(&path).unwrap();
        let err = RunRoot::create_at(&path).unwrap_err();
        assert!(matches!(err, Error::RunRootExists(p) if p == path));
    }

    #[test]
    fn workspaces_are_tagged_per_side() {
        let root = RunRoot {
            path: PathBuf::from("/runs/now"),
        };
        let case = TestCase::new("/t/begin.scm", "begin.scm");
        assert_eq!(
            root.case_workspace(&case, Side::Candidate),
            Path::new("/runs/now/begin.scm-mine")
        );
        assert_eq!(
            root.case_workspace(&case, Side::Reference),
            Path::new("/runs/now/begin.scm-reference")
        );
    }

    #[test]
    fn workspaces_mirror_relative_directories() {
        let root = RunRoot {
            path: PathBuf::from("/runs/now"),
        };
        let top = TestCase::new("/t/let.scm", "let.scm");
        let nested = TestCase::new("/t/nested/let.scm", "nested/let.scm");
        assert_eq!(
            root.case_workspace(&nested, Side::Candidate),
            Path::new("/runs/now/nested/let.scm-mine")
        );
        assert_ne!(
            root.case_workspace(&top, Side::Candidate),
            root.case_workspace(&nested, Side::Candidate)
        );
    }

    #[test]
    fn persist_writes_stdout_file() {
        let dir = tempfile::tempdir().unwrap();
        persist_stdout(dir.path(), "hello\n").unwrap();
        let saved = std::fs::read_to_string(dir.path().join(STDOUT_FILE)).unwrap();
        assert_eq!(saved, "hello\n");
    }
}
