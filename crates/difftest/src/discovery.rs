//! Recursive test-program discovery.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::artifacts::RUN_MARKER;

/// A single test program found under a discovery root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestCase {
    path: PathBuf,
    relative: PathBuf,
}

impl TestCase {
    /// Build a case from its full path and its path relative to the root.
    pub fn new(path: impl Into<PathBuf>, relative: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            relative: relative.into(),
        }
    }

    /// Path used to hand the program to the toolchains.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path relative to the discovery root.
    #[must_use]
    pub fn relative(&self) -> &Path {
        &self.relative
    }

    /// Directory of the case, relative to the discovery root.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.relative.parent().unwrap_or(Path::new(""))
    }

    #[must_use]
    pub fn file_name(&self) -> &std::ffi::OsStr {
        self.relative
            .file_name()
            .unwrap_or(self.relative.as_os_str())
    }
}

/// Lazy walk over every regular file below a root.
///
/// Symbolic links are followed. Directories, special files and entries that
/// cannot be read are skipped; the latter are logged. Run roots (directories
/// holding [`RUN_MARKER`]) are not descended into. Ordering is whatever the
/// filesystem returns.
pub struct Discovery {
    root: PathBuf,
    walker: walkdir::IntoIter,
}

#[must_use]
pub fn discover(root: impl AsRef<Path>) -> Discovery {
    let root = root.as_ref().to_path_buf();
    let walker = WalkDir::new(&root).follow_links(true).into_iter();
    Discovery { root, walker }
}

impl Iterator for Discovery {
    type Item = TestCase;

    fn next(&mut self) -> Option<TestCase> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(
                        root = %self.root.display(),
                        error = %err,
                        "skipping unreadable entry"
                    );
                    continue;
                }
            };

            if entry.file_type().is_dir() && entry.path().join(RUN_MARKER).is_file() {
                tracing::debug!(path = %entry.path().display(), "skipping run root");
                self.walker.skip_current_dir();
                continue;
            }
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = match entry.path().strip_prefix(&self.root) {
                Ok(rel) if !rel.as_os_str().is_empty() => rel.to_path_buf(),
                // The root itself is a file.
                _ => PathBuf::from(entry.file_name()),
            };
            return Some(TestCase::new(entry.into_path(), relative));
        }
    }
}
