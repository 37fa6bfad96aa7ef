use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The command ran but exited non-zero.
    #[error("`{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("{program} could not be found")]
    ToolNotFound { program: String },

    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not determine the user configuration directory")]
    NoConfigDir,
}

impl Error {
    /// Classifies a spawn failure, keeping a missing binary distinct from other errors.
    pub fn spawn(program: &str, command: String, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Error::ToolNotFound {
                program: program.to_string(),
            }
        } else {
            Error::Spawn { command, source }
        }
    }

    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// Text shown to the user: the captured stderr for command failures,
    /// the path and cause for I/O errors, the full message otherwise.
    pub fn detail(&self) -> String {
        match self {
            Error::CommandFailed { stderr, .. } if !stderr.trim().is_empty() => {
                stderr.trim().to_string()
            }
            Error::Io { path, source, .. } => format!("{}: {source}", path.display()),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
