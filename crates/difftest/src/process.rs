//! Synchronous execution of external programs with captured output.

use std::ffi::{OsStr, OsString};
use std::process::{Command, Stdio};

use crate::{Error, Result};

/// Run `program` with `args`, wait for it, and return its standard output.
///
/// Exit code zero is success. Spawn failures, non-zero exits, deaths by
/// signal and non-UTF-8 output are all failures; each is logged with the
/// full command line before being returned. There is no timeout.
pub fn run<P, I, S>(program: P, args: I) -> Result<String>
where
    P: AsRef<OsStr>,
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let program = program.as_ref();
    let args: Vec<OsString> = args.into_iter().map(|a| a.as_ref().to_owned()).collect();
    let command = command_line(program, &args);

    let result = capture(program, &args, &command);
    if let Err(err) = &result {
        tracing::warn!(%command, error = %err, "process failed");
        if let Error::ExitStatus { stderr, .. } = err {
            tracing::debug!(%command, %stderr, "captured stderr");
        }
    }
    result
}

fn capture(program: &OsStr, args: &[OsString], command: &str) -> Result<String> {
    tracing::debug!(%command, "spawning");

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| Error::Spawn {
            command: command.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(Error::ExitStatus {
            command: command.to_string(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    String::from_utf8(output.stdout).map_err(|_| Error::NonUtf8Output {
        command: command.to_string(),
    })
}

/// Render a program and its arguments as a single shell-like line for logs.
fn command_line(program: &OsStr, args: &[OsString]) -> String {
    let mut line = program.to_string_lossy().into_owned();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.to_string_lossy());
    }
    line
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout_on_success() {
        let out = run("sh", ["-c", "printf 'hello\\n'"]).expect("sh should run");
        assert_eq!(out, "hello\n");
    }

    #[test]
    fn nonzero_exit_is_failure() {
        let err = run("sh", ["-c", "echo oops >&2; exit 3"]).unwrap_err();
        match err {
            Error::ExitStatus { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "oops\n");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_program_is_spawn_failure() {
        let err = run("./definitely-not-a-real-program", ["x"]).unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }), "got {err}");
        assert!(err.to_string().contains("definitely-not-a-real-program x"));
    }

    #[test]
    fn non_utf8_output_is_failure() {
        let err = run("sh", ["-c", "printf '\\377\\376'"]).unwrap_err();
        assert!(matches!(err, Error::NonUtf8Output { .. }), "got {err}");
    }

    #[test]
    fn command_line_joins_arguments() {
        let line = command_line(
            OsStr::new("nasm"),
            &["-f".into(), "elf64".into(), "a.nasm".into()],
        );
        assert_eq!(line, "nasm -f elf64 a.nasm");
    }
}
