use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::command::CommandSpec;
use crate::error::{Result, RunnerError};
use crate::redirect::{StreamRedirection, StreamTarget};

/// procrun - run one external command and classify the outcome
///
/// Spawns a single child process, optionally rebinding its standard streams
/// to files or in-memory captures, and exits with a code that faithfully
/// reflects how the child ended: its own exit code, 128+N for a signal
/// death, 124 for a deadline kill, 125/126/127 for runner, permission and
/// lookup failures.
#[derive(Parser, Debug)]
#[command(
    name = "procrun",
    version,
    about = "Run one external command and classify the outcome",
    long_about = "Runs a single child process with the requested stream redirections and reports a classified result.\n\
                  Without --shell the command is executed directly from its pre-split arguments.\n\
                  With --shell the command line is handed to /bin/sh -c, including every hazard that implies for untrusted input."
)]
pub struct Cli {
    /// Hand the command line to /bin/sh -c instead of executing it directly
    #[arg(short = 's', long = "shell")]
    pub shell: bool,

    /// Bind the child's stdin to a file
    #[arg(
        short = 'i',
        long = "stdin-file",
        value_name = "path",
        conflicts_with = "input"
    )]
    pub stdin_file: Option<PathBuf>,

    /// Bind the child's stdout to a file (created or truncated)
    #[arg(short = 'o', long = "stdout-file", value_name = "path")]
    pub stdout_file: Option<PathBuf>,

    /// Bind the child's stderr to a file (created or truncated)
    #[arg(short = 'e', long = "stderr-file", value_name = "path")]
    pub stderr_file: Option<PathBuf>,

    /// Capture stdout/stderr in memory and echo them once the child is done
    #[arg(short = 'c', long = "capture")]
    pub capture: bool,

    /// Write this text to the child's stdin through a pipe
    #[arg(long = "input", value_name = "text")]
    pub input: Option<String>,

    /// Kill the child if it is still running after this many seconds
    #[arg(short = 't', long = "timeout", value_name = "seconds")]
    pub timeout: Option<f64>,

    /// Treat a non-empty captured stderr as failure even on exit code 0
    #[arg(long = "fail-on-stderr", requires = "capture")]
    pub fail_on_stderr: bool,

    /// Leave inherited signal dispositions untouched (by default SIGPIPE is
    /// reset to terminate-by-default in the child)
    #[arg(long = "no-signal-reset")]
    pub no_signal_reset: bool,

    /// Be verbose about what is being run
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Command and its arguments to execute
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "command"
    )]
    pub command: Vec<String>,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<()> {
        if self.command.is_empty() {
            return Err(RunnerError::InvalidArguments(
                "no command specified".to_string(),
            ));
        }

        if let Some(seconds) = self.timeout {
            if !seconds.is_finite() || seconds <= 0.0 {
                return Err(RunnerError::InvalidArguments(format!(
                    "timeout must be a positive number of seconds, got {}",
                    seconds
                )));
            }
        }

        Ok(())
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose > 0
    }

    /// Build the command spec from the parsed arguments.
    ///
    /// In shell mode the command words are joined with spaces into one
    /// command line, the same construction the thin wrapper scripts this
    /// tool replaces used to do by hand, hazards included.
    pub fn command_spec(&self) -> Result<CommandSpec> {
        let mut spec = if self.shell {
            CommandSpec::shell(self.command.join(" "))
        } else {
            CommandSpec::argv(self.command.iter().cloned())?
        };

        if let Some(seconds) = self.timeout {
            spec = spec.timeout(Duration::from_secs_f64(seconds));
        }
        if self.no_signal_reset {
            spec = spec.reset_signals([]);
        }

        Ok(spec)
    }

    /// Build the redirection plan from the parsed arguments.
    ///
    /// A per-stream file binding wins over --capture for that stream.
    pub fn redirection(&self) -> StreamRedirection {
        let stdin = if self.input.is_some() {
            StreamTarget::Pipe
        } else {
            file_or(&self.stdin_file, StreamTarget::Inherit)
        };
        let fallback = if self.capture {
            StreamTarget::Pipe
        } else {
            StreamTarget::Inherit
        };

        StreamRedirection {
            stdin,
            stdout: file_or(&self.stdout_file, fallback.clone()),
            stderr: file_or(&self.stderr_file, fallback),
        }
    }
}

fn file_or(path: &Option<PathBuf>, fallback: StreamTarget) -> StreamTarget {
    match path {
        Some(path) => StreamTarget::File(path.clone()),
        None => fallback,
    }
}
