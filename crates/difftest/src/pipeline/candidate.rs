//! Candidate pipeline: compile to assembly, assemble, link against the runtime, run.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use super::{EXECUTABLE_NAME, Side, Toolchain};
use crate::artifacts::persist_stdout;
use crate::config::CandidateConfig;
use crate::{Error, Result, process};

/// Assembly file the compiler under test is expected to emit.
pub const ASM_FILE: &str = "output.nasm";
pub const OBJECT_FILE: &str = "output.o";

/// Compiler under test: compile to assembly, assemble, link against the
/// runtime support object, then run.
#[derive(Debug, Clone)]
pub struct CandidateToolchain {
    compiler: PathBuf,
    assembler: PathBuf,
    asm_format: String,
    linker: PathBuf,
    runtime_object: PathBuf,
}

impl CandidateToolchain {
    #[must_use]
    pub fn new(config: &CandidateConfig) -> Self {
        Self {
            compiler: config.compiler.clone(),
            assembler: config.assembler.clone(),
            asm_format: config.asm_format.clone(),
            linker: config.linker.clone(),
            runtime_object: config.runtime_object.clone(),
        }
    }
}

impl Toolchain for CandidateToolchain {
    fn side(&self) -> Side {
        Side::Candidate
    }

    fn build_and_run(&self, source: &Path, workspace: &Path) -> Result<String> {
        std::fs::create_dir_all(workspace).map_err(|e| Error::io(workspace, e))?;
        tracing::debug!(workspace = %workspace.display(), "candidate workspace ready");

        let asm = workspace.join(ASM_FILE);
        let object = workspace.join(OBJECT_FILE);
        let executable = workspace.join(EXECUTABLE_NAME);

        process::run(&self.compiler, [source.as_os_str(), workspace.as_os_str()])?;
        process::run(
            &self.assembler,
            [
                OsStr::new("-f"),
                OsStr::new(&self.asm_format),
                asm.as_os_str(),
                OsStr::new("-o"),
                object.as_os_str(),
            ],
        )?;
        process::run(
            &self.linker,
            [
                object.as_os_str(),
                self.runtime_object.as_os_str(),
                OsStr::new("-o"),
                executable.as_os_str(),
            ],
        )?;

        let output = process::run(executable, std::iter::empty::<&OsStr>())?;
        persist_stdout(workspace, &output)?;
        Ok(output)
    }
}
