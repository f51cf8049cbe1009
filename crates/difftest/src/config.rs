//! Harness configuration.
//!
//! Defaults reproduce the layout of a compiler checkout built in `./build`
//! with NASM, `ld` and CHICKEN Scheme as the reference compiler.

use std::path::PathBuf;

use crate::harness::Summary;

/// Toolchain under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateConfig {
    /// Invoked as `compiler <source> <output dir>`.
    pub compiler: PathBuf,
    /// Invoked as `assembler -f <asm_format> <asm> -o <object>`.
    pub assembler: PathBuf,
    pub asm_format: String,
    /// Invoked as `linker <object> <runtime_object> -o <executable>`.
    pub linker: PathBuf,
    /// Prebuilt runtime support object linked into every program.
    pub runtime_object: PathBuf,
}

impl Default for CandidateConfig {
    fn default() -> Self {
        Self {
            compiler: PathBuf::from("./build/compiler_output"),
            assembler: PathBuf::from("nasm"),
            asm_format: "elf64".to_string(),
            linker: PathBuf::from("ld"),
            runtime_object: PathBuf::from("./build/src/std/CMakeFiles/std.dir/std.asm.o"),
        }
    }
}

/// Oracle toolchain, invoked as `compiler <source> -o <executable>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceConfig {
    pub compiler: PathBuf,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            compiler: PathBuf::from("chicken-csc"),
        }
    }
}

/// When a finished run should be reported as failed to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExitPolicy {
    /// Always succeed; verdicts are only printed.
    #[default]
    Never,
    /// Fail if any case produced differing output.
    Mismatch,
    /// Fail on any mismatch or inconclusive case.
    Any,
}

impl ExitPolicy {
    #[must_use]
    pub fn fails(self, summary: &Summary) -> bool {
        match self {
            ExitPolicy::Never => false,
            ExitPolicy::Mismatch => summary.mismatched > 0,
            ExitPolicy::Any => summary.mismatched > 0 || summary.inconclusive > 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Directory tree searched for test programs.
    pub tests_root: PathBuf,
    /// Directory in which the per-run, timestamp-named root is created.
    pub runs_dir: PathBuf,
    pub candidate: CandidateConfig,
    pub reference: ReferenceConfig,
    pub exit_policy: ExitPolicy,
    /// Stop after the first case whose outputs differ.
    pub stop_on_mismatch: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            tests_root: PathBuf::from("examples"),
            runs_dir: PathBuf::from("."),
            candidate: CandidateConfig::default(),
            reference: ReferenceConfig::default(),
            exit_policy: ExitPolicy::default(),
            stop_on_mismatch: false,
        }
    }
}
