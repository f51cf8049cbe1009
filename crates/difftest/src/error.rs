use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error(
        "`{command}` failed with {}",
        .code.map_or_else(|| "a signal".to_string(), |c| format!("exit code {c}"))
    )]
    ExitStatus {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("`{command}` wrote non-UTF-8 output")]
    NonUtf8Output { command: String },

    #[error("Workspace {} already exists", .0.display())]
    WorkspaceExists(PathBuf),

    #[error("Run root {} already exists", .0.display())]
    RunRootExists(PathBuf),

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Test root {} does not exist", .0.display())]
    MissingTestRoot(PathBuf),

    #[error("Failed to write report: {0}")]
    Report(#[source] std::io::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
