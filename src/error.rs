use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::redirect::StdStream;

/// Exit codes the `procrun` binary uses for outcomes that are not the child's
/// own exit code, following the convention shared by shells and timeout(1).
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnCode {
    NoError = 0,
    /// The child outlived its deadline and was killed.
    Timeout = 124,
    /// procrun itself failed: bad usage, or a redirection file could not be
    /// opened.
    RunnerFailure = 125,
    /// The program was found but could not be executed.
    NotExecutable = 126,
    /// The program could not be found.
    NotFound = 127,
}

impl ReturnCode {
    pub fn as_exit_code(self) -> i32 {
        self as i32
    }
}

/// Main error type for runner operations.
///
/// Only failures that prevent a spawn attempt from being made (or prevent the
/// runner from observing its result) are errors. Everything that happens to
/// the child once a spawn has been attempted is data, reported through
/// [`Termination`](crate::status::Termination) so callers branch on an
/// explicit tag instead of catching disjoint error types.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// A file named in the redirection plan could not be opened. Raised
    /// before any child process is created.
    #[error("Cannot open '{}' for {stream}: {source}", path.display())]
    Redirect {
        stream: StdStream,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to wait for child process: {0}")]
    Wait(#[source] io::Error),
}

impl RunnerError {
    /// Convert the error to the binary's return code.
    pub fn to_return_code(&self) -> ReturnCode {
        match self {
            RunnerError::InvalidArguments(_) => ReturnCode::RunnerFailure,
            RunnerError::Redirect { .. } => ReturnCode::RunnerFailure,
            RunnerError::Wait(_) => ReturnCode::RunnerFailure,
        }
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        self.to_return_code().as_exit_code()
    }
}

/// Result type alias for runner operations.
pub type Result<T> = std::result::Result<T, RunnerError>;
