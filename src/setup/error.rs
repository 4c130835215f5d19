use crate::process::ProcessError;
use crate::template::TemplateError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SetupError {
    /// The child could not be started, or waiting on it failed at OS level.
    #[error(transparent)]
    Process(ProcessError),

    #[error("`{command}` failed with exit code {exit_code}")]
    NonZeroExit {
        command: String,
        exit_code: i32,
        /// Filtered stderr
        stderr: String,
    },

    #[error("no toolchain for architecture '{architecture}' (expected {})", .path.display())]
    ToolchainUnavailable {
        architecture: String,
        path: PathBuf,
    },

    /// A command template was rendered with a placeholder left unbound.
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("{what} '{value}' cannot be used in a build directory name")]
    UnsafeValue { what: &'static str, value: String },

    #[error("setup was cancelled")]
    Interrupted,

    #[error("failed to schedule setup task: {0}")]
    Schedule(#[source] io::Error),
}

impl SetupError {
    /// Diagnostics to show the user alongside the message, if any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            SetupError::NonZeroExit { stderr, .. } if !stderr.is_empty() => Some(stderr),
            _ => None,
        }
    }
}

impl From<ProcessError> for SetupError {
    fn from(e: ProcessError) -> Self {
        match e {
            ProcessError::Interrupted { .. } => SetupError::Interrupted,
            other => SetupError::Process(other),
        }
    }
}
