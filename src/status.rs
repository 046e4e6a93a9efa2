use std::borrow::Cow;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

/// Terminal status of one child-process invocation.
///
/// Exactly one of these is produced per [`run`](crate::runner::run) call.
#[derive(Debug)]
pub enum Termination {
    /// The child ran and terminated normally with an exit code.
    Exited(i32),
    /// The child was killed by a signal. Authoritative: taken from the wait
    /// status, never decoded from a 128+N exit code.
    Signaled(i32),
    /// The OS could not create the child process at all: executable missing
    /// (argv mode), permission denied on the executable, resource
    /// exhaustion. In shell mode this means the shell itself failed to
    /// start; a missing target program inside a healthy shell comes back as
    /// `Exited(127)` instead.
    SpawnFailed(io::Error),
    /// The child outlived the configured deadline and was forcibly
    /// terminated.
    TimedOut,
}

impl Termination {
    /// Conventional success: a normal exit with code 0.
    pub fn success(&self) -> bool {
        matches!(self, Termination::Exited(0))
    }

    /// The exit code, if the child exited normally.
    pub fn code(&self) -> Option<i32> {
        match self {
            Termination::Exited(code) => Some(*code),
            _ => None,
        }
    }

    /// The killing signal, if the child died to one.
    pub fn signal(&self) -> Option<i32> {
        match self {
            Termination::Signaled(signal) => Some(*signal),
            _ => None,
        }
    }

    /// Read the termination through the shell exit-code convention.
    ///
    /// Codes 0-125 are ordinary program exit statuses; 126 means "found but
    /// not executable"; 127 means "command not found" (meaningful when a
    /// shell is interposed); 128 and above conventionally encode
    /// "terminated by signal (128+N)". The 128+N encoding is shell- and
    /// platform-dependent, so it is surfaced as
    /// [`ExitClass::LikelySignaled`] — advisory, never authoritative.
    pub fn classify(&self) -> ExitClass {
        match self {
            Termination::Exited(0) => ExitClass::Success,
            Termination::Exited(code @ 1..=125) => ExitClass::Failure(*code),
            Termination::Exited(126) => ExitClass::NotExecutable,
            Termination::Exited(127) => ExitClass::CommandNotFound,
            Termination::Exited(code) if *code >= 128 => ExitClass::LikelySignaled(*code - 128),
            // Out-of-range codes can't come from a POSIX wait status, but
            // the type doesn't forbid them.
            Termination::Exited(code) => ExitClass::Failure(*code),
            Termination::Signaled(signal) => ExitClass::Signaled(*signal),
            Termination::SpawnFailed(_) => ExitClass::SpawnFailed,
            Termination::TimedOut => ExitClass::TimedOut,
        }
    }
}

impl From<ExitStatus> for Termination {
    fn from(status: ExitStatus) -> Self {
        // Check the signal first so a signal death is never misread as an
        // exit code.
        if let Some(signal) = status.signal() {
            Termination::Signaled(signal)
        } else if let Some(code) = status.code() {
            Termination::Exited(code)
        } else {
            // Stopped/continued statuses never come out of a blocking wait.
            Termination::Exited(status.into_raw())
        }
    }
}

/// Classified reading of a [`Termination`], one branch per distinct way a
/// run can end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitClass {
    Success,
    /// Ordinary nonzero exit, code 1-125.
    Failure(i32),
    /// Exit code 126: the program exists but could not be executed.
    NotExecutable,
    /// Exit code 127: the command was not found. Only meaningful when a
    /// shell was interposed.
    CommandNotFound,
    /// Exit code 128+N: conventionally a signal death reported by an
    /// interposed shell. Advisory; the encoding is not portable.
    LikelySignaled(i32),
    /// Authoritative signal death from the wait status.
    Signaled(i32),
    SpawnFailed,
    TimedOut,
}

/// Outcome of a single run: the terminal status plus whatever bytes the
/// piped streams produced.
///
/// `stdout`/`stderr` are `Some` exactly when the corresponding stream was
/// piped, so zero bytes of legitimate output (`Some(vec![])`) stays
/// distinguishable from "not captured" (`None`).
///
/// Captured stderr is exposed even on a zero exit code: some external
/// programs report failure only there, and a caller that wants the
/// "non-empty stderr implies failure" heuristic applies it to these bytes.
/// The runner itself never does.
#[derive(Debug)]
pub struct ExecutionResult {
    pub status: Termination,
    pub stdout: Option<Vec<u8>>,
    pub stderr: Option<Vec<u8>>,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Captured stdout as text, lossily decoded; empty when not piped.
    pub fn stdout_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.stdout.as_deref().unwrap_or_default())
    }

    /// Captured stderr as text, lossily decoded; empty when not piped.
    pub fn stderr_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.stderr.as_deref().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_classify_per_the_shell_convention() {
        assert_eq!(Termination::Exited(0).classify(), ExitClass::Success);
        assert_eq!(Termination::Exited(13).classify(), ExitClass::Failure(13));
        assert_eq!(Termination::Exited(125).classify(), ExitClass::Failure(125));
        assert_eq!(Termination::Exited(126).classify(), ExitClass::NotExecutable);
        assert_eq!(Termination::Exited(127).classify(), ExitClass::CommandNotFound);
    }

    #[test]
    fn high_exit_codes_are_advisory_signals() {
        // 130 = 128 + SIGINT, as a shell would report it.
        assert_eq!(
            Termination::Exited(130).classify(),
            ExitClass::LikelySignaled(2)
        );
        assert_eq!(
            Termination::Exited(137).classify(),
            ExitClass::LikelySignaled(9)
        );
    }

    #[test]
    fn wait_status_signals_are_authoritative() {
        assert_eq!(Termination::Signaled(9).classify(), ExitClass::Signaled(9));
        assert_eq!(Termination::Signaled(9).signal(), Some(9));
        assert_eq!(Termination::Signaled(9).code(), None);
    }

    #[test]
    fn only_a_zero_exit_is_success() {
        assert!(Termination::Exited(0).success());
        assert!(!Termination::Exited(1).success());
        assert!(!Termination::Signaled(15).success());
        assert!(!Termination::TimedOut.success());
        assert!(!Termination::SpawnFailed(io::Error::from(io::ErrorKind::NotFound)).success());
    }

    #[test]
    fn wait_status_round_trips_exit_codes() {
        // Raw wait status encoding: exit code in the high byte.
        let status = ExitStatus::from_raw(13 << 8);
        assert_eq!(Termination::from(status).code(), Some(13));

        // Low bits carry the killing signal.
        let status = ExitStatus::from_raw(9);
        assert_eq!(Termination::from(status).signal(), Some(9));
    }

    #[test]
    fn empty_capture_is_not_absence() {
        let captured = ExecutionResult {
            status: Termination::Exited(0),
            stdout: Some(Vec::new()),
            stderr: None,
        };
        assert!(captured.stdout.is_some());
        assert_eq!(captured.stdout_str(), "");
        assert_eq!(captured.stderr_str(), "");
    }
}
