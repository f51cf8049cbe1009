//! Reference pipeline: compile straight to an executable, run.

use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{EXECUTABLE_NAME, Side, Toolchain};
use crate::artifacts::persist_stdout;
use crate::config::ReferenceConfig;
use crate::{Error, Result, process};

/// Trusted compiler: a single compile-and-link step, then run.
#[derive(Debug, Clone)]
pub struct ReferenceToolchain {
    compiler: PathBuf,
}

impl ReferenceToolchain {
    #[must_use]
    pub fn new(config: &ReferenceConfig) -> Self {
        Self {
            compiler: config.compiler.clone(),
        }
    }
}

impl Toolchain for ReferenceToolchain {
    fn side(&self) -> Side {
        Side::Reference
    }

    /// The workspace must not exist beforehand; an existing directory fails
    /// this pipeline with [`Error::WorkspaceExists`].
    fn build_and_run(&self, source: &Path, workspace: &Path) -> Result<String> {
        if let Some(parent) = workspace.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        match std::fs::create_dir(workspace) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(Error::WorkspaceExists(workspace.to_path_buf()));
            }
            Err(e) => return Err(Error::io(workspace, e)),
        }
        tracing::debug!(workspace = %workspace.display(), "reference workspace ready");

        let executable = workspace.join(EXECUTABLE_NAME);
        process::run(
            &self.compiler,
            [source.as_os_str(), OsStr::new("-o"), executable.as_os_str()],
        )?;

        let output = process::run(executable, std::iter::empty::<&OsStr>())?;
        persist_stdout(workspace, &output)?;
        Ok(output)
    }
}
