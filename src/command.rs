use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use nix::sys::signal::Signal;

use crate::error::{Result, RunnerError};

/// What to execute: a pre-split argv vector, or a single command line handed
/// to `/bin/sh -c`.
///
/// In argv mode no shell metacharacter interpretation happens; the program is
/// resolved on `PATH` (or taken as a literal path) and receives the arguments
/// exactly as given.
///
/// # Security
///
/// Shell mode runs whatever the command line says, word splitting, globbing,
/// pipes and all. Building that line from untrusted input is an injection
/// hazard this crate does not mitigate; it is the caller's responsibility to
/// only hand over trusted strings, or to use argv mode instead.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub(crate) program: String,
    pub(crate) args: Vec<String>,
    pub(crate) shell: bool,
    pub(crate) env: Vec<(String, String)>,
    pub(crate) cwd: Option<PathBuf>,
    pub(crate) reset_signals: Vec<Signal>,
    pub(crate) timeout: Option<Duration>,
}

impl CommandSpec {
    /// Direct execution of a pre-split argv vector. The first element is the
    /// program, the rest its arguments.
    pub fn argv<I, S>(argv: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut words = argv.into_iter().map(Into::into);
        let program = words
            .next()
            .ok_or_else(|| RunnerError::InvalidArguments("empty argv".to_string()))?;
        Ok(Self::new(program, words.collect(), false))
    }

    /// Shell-interposed execution: `command_line` is handed verbatim to
    /// `/bin/sh -c`. See the type-level security note.
    pub fn shell(command_line: impl Into<String>) -> Self {
        Self::new(command_line.into(), Vec::new(), true)
    }

    fn new(program: String, args: Vec<String>, shell: bool) -> Self {
        Self {
            program,
            args,
            shell,
            env: Vec::new(),
            cwd: None,
            // The Rust runtime, like several others, leaves SIGPIPE ignored
            // in the parent; children inherit that disposition and a
            // downstream `head` then no longer terminates an upstream
            // producer. Default-restore it.
            reset_signals: vec![Signal::SIGPIPE],
            timeout: None,
        }
    }

    /// Append one argument. In shell mode the extra arguments become the
    /// shell's positional parameters (`$0`, `$1`, ...).
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set one environment variable for the child, on top of the environment
    /// it inherits from the caller.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Run the child in `dir` instead of the caller's working directory.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Replace the set of signals restored to their default disposition in
    /// the child between fork and exec. Defaults to `{SIGPIPE}`; pass an
    /// empty set to let the child inherit every disposition unchanged.
    pub fn reset_signals<I>(mut self, signals: I) -> Self
    where
        I: IntoIterator<Item = Signal>,
    {
        self.reset_signals = signals.into_iter().collect();
        self
    }

    /// Kill the child and report a timed-out termination if it is still
    /// running after `limit`.
    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// The program in argv mode, or the whole command line in shell mode.
    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn is_shell(&self) -> bool {
        self.shell
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.shell {
            write!(f, "sh -c '{}'", self.program)?;
        } else {
            f.write_str(&self.program)?;
        }
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
