use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use difftest::{CandidateConfig, ExitPolicy, HarnessConfig, ReferenceConfig};

#[derive(Parser)]
#[command(name = "difftest")]
#[command(about = "Compare a compiler under test against a reference compiler")]
struct Cli {
    #[arg(help = "Directory tree of test programs", default_value = "examples")]
    tests_root: PathBuf,

    #[arg(
        long,
        help = "Directory in which the timestamped run root is created",
        default_value = "."
    )]
    runs_dir: PathBuf,

    #[arg(
        long,
        help = "Compiler under test, invoked as `compiler SRC OUTDIR`",
        default_value = "./build/compiler_output"
    )]
    compiler: PathBuf,

    #[arg(long, help = "Assembler for the emitted assembly", default_value = "nasm")]
    assembler: PathBuf,

    #[arg(long, help = "Object format passed to the assembler", default_value = "elf64")]
    asm_format: String,

    #[arg(long, help = "Linker for the assembled object", default_value = "ld")]
    linker: PathBuf,

    #[arg(
        long,
        help = "Runtime support object linked into every program",
        default_value = "./build/src/std/CMakeFiles/std.dir/std.asm.o"
    )]
    runtime: PathBuf,

    #[arg(
        long,
        help = "Reference compiler, invoked as `reference SRC -o EXE`",
        default_value = "chicken-csc"
    )]
    reference: PathBuf,

    #[arg(
        long,
        value_enum,
        help = "When to exit with a failure status",
        default_value_t = Policy::Never
    )]
    exit_policy: Policy,

    #[arg(long, help = "Stop after the first case whose outputs differ")]
    stop_on_mismatch: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Policy {
    /// Always exit successfully
    Never,
    /// Fail if any outputs differ
    Mismatch,
    /// Fail if any outputs differ or any toolchain failed
    Any,
}

impl From<Policy> for ExitPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Never => ExitPolicy::Never,
            Policy::Mismatch => ExitPolicy::Mismatch,
            Policy::Any => ExitPolicy::Any,
        }
    }
}

impl From<Cli> for HarnessConfig {
    fn from(cli: Cli) -> Self {
        HarnessConfig {
            tests_root: cli.tests_root,
            runs_dir: cli.runs_dir,
            candidate: CandidateConfig {
                compiler: cli.compiler,
                assembler: cli.assembler,
                asm_format: cli.asm_format,
                linker: cli.linker,
                runtime_object: cli.runtime,
            },
            reference: ReferenceConfig {
                compiler: cli.reference,
            },
            exit_policy: cli.exit_policy.into(),
            stop_on_mismatch: cli.stop_on_mismatch,
        }
    }
}

fn main() -> Result<ExitCode> {
    // The report goes to stdout; keep diagnostics out of it.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let config = HarnessConfig::from(Cli::parse());

    let (run_root, summary) = difftest::run_with_config(&config, io::stdout().lock())
        .with_context(|| format!("Harness run over {} failed", config.tests_root.display()))?;
    tracing::info!(
        run_root = %run_root.path().display(),
        total = summary.total(),
        "run finished"
    );

    if config.exit_policy.fails(&summary) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
