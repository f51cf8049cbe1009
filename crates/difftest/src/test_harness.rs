//! Test harness for difftest integration tests
//!
//! Installs a pair of fake toolchains made of small shell scripts so the
//! whole pipeline (spawning, workspaces, persistence, comparison) can run
//! without a real compiler. A "program" is a text file whose lines are
//! printed by the built executable, filtered per toolchain:
//!
//! - `mine:<text>` lines are only printed by the candidate build,
//! - `ref:<text>` lines are only printed by the reference build,
//! - lines starting with `#` are directives and never printed:
//!   `#compile-error` makes the candidate compiler fail,
//!   `#crash` makes the candidate executable exit with status 1,
//!   `#reject` makes the reference compiler fail.
//!
//! # Example
//!
//! ```rust,no_run
//! use difftest::test_harness::*;
//!
//! let tests = tempfile::tempdir().unwrap();
//! write_program(tests.path(), "hello.scm", "hello\n");
//!
//! let run = run_fakes(tests.path());
//! assert_eq!(run.summary.matched, 1);
//! ```

#![allow(
    clippy::must_use_candidate,
    clippy::missing_panics_doc,
    clippy::manual_assert
)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tempfile::TempDir;

use crate::config::{CandidateConfig, HarnessConfig, ReferenceConfig};
use crate::{
    CandidateToolchain, ComparisonEngine, Harness, ReferenceToolchain, Reporter, RunRoot, Summary,
};

const COMPILER: &str = r#"#!/bin/sh
if grep -qx '#compile-error' "$1"; then
    echo "compile error in $1" >&2
    exit 1
fi
cp "$1" "$2/output.nasm"
"#;

const ASSEMBLER: &str = r#"#!/bin/sh
[ "$1" = "-f" ] && [ "$4" = "-o" ] || { echo "usage: $0 -f FMT IN -o OUT" >&2; exit 2; }
cp "$3" "$5"
"#;

const LINKER: &str = r#"#!/bin/sh
[ "$3" = "-o" ] || { echo "usage: $0 OBJ RUNTIME -o OUT" >&2; exit 2; }
[ -f "$2" ] || { echo "missing runtime object $2" >&2; exit 1; }
{
    echo '#!/bin/sh'
    echo "if grep -qx '#crash' '$1'; then echo boom >&2; exit 1; fi"
    echo "sed -e '/^#/d' -e '/^ref:/d' -e 's/^mine://' '$1'"
} > "$4"
chmod +x "$4"
"#;

const REFERENCE: &str = r#"#!/bin/sh
[ "$2" = "-o" ] || { echo "usage: $0 SRC -o OUT" >&2; exit 2; }
if grep -qx '#reject' "$1"; then
    echo "rejected $1" >&2
    exit 1
fi
{
    echo '#!/bin/sh'
    echo "sed -e '/^#/d' -e '/^mine:/d' -e 's/^ref://' '$1'"
} > "$3"
chmod +x "$3"
"#;

/// Installed fake toolchain scripts.
pub struct FakeToolchains {
    _dir: TempDir,
    pub candidate: CandidateConfig,
    pub reference: ReferenceConfig,
}

impl FakeToolchains {
    /// Process-wide fakes, written exactly once.
    ///
    /// Sharing one installation means no test thread is still writing a
    /// script while another spawns processes, which would otherwise make
    /// `exec` fail with "text file busy".
    pub fn shared() -> &'static FakeToolchains {
        static FAKES: OnceLock<FakeToolchains> = OnceLock::new();
        FAKES.get_or_init(FakeToolchains::install)
    }

    fn install() -> Self {
        let dir = tempfile::Builder::new()
            .prefix("difftest-fakes")
            .tempdir()
            .unwrap_or_else(|e| panic!("create fake toolchain dir: {e}"));

        let runtime_object = dir.path().join("runtime.o");
        fs::write(&runtime_object, b"").unwrap_or_else(|e| panic!("write runtime: {e}"));

        Self {
            candidate: CandidateConfig {
                compiler: write_script(dir.path(), "compiler", COMPILER),
                assembler: write_script(dir.path(), "assembler", ASSEMBLER),
                asm_format: "elf64".to_string(),
                linker: write_script(dir.path(), "linker", LINKER),
                runtime_object,
            },
            reference: ReferenceConfig {
                compiler: write_script(dir.path(), "reference", REFERENCE),
            },
            _dir: dir,
        }
    }

    pub fn engine(&self) -> ComparisonEngine<CandidateToolchain, ReferenceToolchain> {
        ComparisonEngine::new(
            CandidateToolchain::new(&self.candidate),
            ReferenceToolchain::new(&self.reference),
        )
    }

    /// Configuration pointing the harness at these fakes.
    pub fn config(&self, tests_root: &Path, runs_dir: &Path) -> HarnessConfig {
        HarnessConfig {
            tests_root: tests_root.to_path_buf(),
            runs_dir: runs_dir.to_path_buf(),
            candidate: self.candidate.clone(),
            reference: self.reference.clone(),
            ..HarnessConfig::default()
        }
    }
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap_or_else(|e| panic!("write {}: {e}", path.display()));
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
        .unwrap_or_else(|e| panic!("chmod {}: {e}", path.display()));
    path
}

/// Write a test program at `root/relative`, creating parent directories.
pub fn write_program(root: &Path, relative: &str, body: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap_or_else(|e| panic!("mkdir {}: {e}", parent.display()));
    }
    fs::write(&path, body).unwrap_or_else(|e| panic!("write {}: {e}", path.display()));
    path
}

/// Everything observable about one harness run over fake toolchains.
pub struct FakeRun {
    /// Keeps the run root alive for inspection.
    pub runs_dir: TempDir,
    pub run_root: RunRoot,
    pub summary: Summary,
    pub report: String,
}

/// Run the harness over `tests_root` with the shared fakes.
pub fn run_fakes(tests_root: &Path) -> FakeRun {
    run_fakes_with(tests_root, false)
}

pub fn run_fakes_with(tests_root: &Path, stop_on_mismatch: bool) -> FakeRun {
    let runs_dir = tempfile::tempdir().unwrap_or_else(|e| panic!("create runs dir: {e}"));
    let run_root = RunRoot::create(runs_dir.path()).unwrap_or_else(|e| panic!("run root: {e}"));

    let mut harness = Harness::new(FakeToolchains::shared().engine(), Reporter::new(Vec::new()))
        .stop_on_mismatch(stop_on_mismatch);
    let summary = harness
        .run(tests_root, &run_root)
        .unwrap_or_else(|e| panic!("harness run failed: {e}"));
    let report = String::from_utf8(harness.into_reporter().into_inner())
        .unwrap_or_else(|e| panic!("report is not UTF-8: {e}"));

    FakeRun {
        runs_dir,
        run_root,
        summary,
        report,
    }
}
