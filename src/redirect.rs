use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::process::Stdio;

use crate::error::{Result, RunnerError};

/// One of the three standard streams of a child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdStream {
    Stdin,
    Stdout,
    Stderr,
}

impl fmt::Display for StdStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StdStream::Stdin => "stdin",
            StdStream::Stdout => "stdout",
            StdStream::Stderr => "stderr",
        };
        f.write_str(name)
    }
}

/// Where one standard stream of the child is connected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StreamTarget {
    /// Share the caller's descriptor.
    #[default]
    Inherit,
    /// Exchange bytes with the parent through an OS pipe; piped output ends
    /// up in the [`ExecutionResult`](crate::status::ExecutionResult).
    Pipe,
    /// Bind the stream to a named file: opened for reading when used as
    /// stdin, created and truncated when used as stdout or stderr.
    File(PathBuf),
}

/// Redirection plan for all three standard streams of one invocation.
///
/// The plan holds paths, not handles. Files are opened by the runner
/// immediately before spawning, so an unopenable file is reported as a
/// [`RunnerError::Redirect`] without any child process being created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamRedirection {
    pub stdin: StreamTarget,
    pub stdout: StreamTarget,
    pub stderr: StreamTarget,
}

impl StreamRedirection {
    /// All three streams shared with the caller.
    pub fn inherit() -> Self {
        Self::default()
    }

    /// Pipe stdout and stderr into memory buffers; stdin stays inherited.
    pub fn capture() -> Self {
        Self {
            stdin: StreamTarget::Inherit,
            stdout: StreamTarget::Pipe,
            stderr: StreamTarget::Pipe,
        }
    }

    pub fn stdin(mut self, target: StreamTarget) -> Self {
        self.stdin = target;
        self
    }

    pub fn stdout(mut self, target: StreamTarget) -> Self {
        self.stdout = target;
        self
    }

    pub fn stderr(mut self, target: StreamTarget) -> Self {
        self.stderr = target;
        self
    }

    /// Open every file named in the plan and produce the stream bindings for
    /// a spawn attempt.
    ///
    /// Fails fast on the first unopenable file. Handles already opened for
    /// earlier streams are dropped (closed) on that path, so a partial
    /// resolution never leaks a descriptor.
    pub(crate) fn resolve(&self) -> Result<ResolvedStreams> {
        let stdin = match &self.stdin {
            StreamTarget::Inherit => Stdio::inherit(),
            StreamTarget::Pipe => Stdio::piped(),
            StreamTarget::File(path) => Stdio::from(open_input(path)?),
        };
        let stdout = resolve_output(StdStream::Stdout, &self.stdout)?;
        let stderr = resolve_output(StdStream::Stderr, &self.stderr)?;

        Ok(ResolvedStreams {
            stdin,
            stdout,
            stderr,
        })
    }
}

/// Stream bindings with every file handle already open, ready to hand to a
/// spawn attempt. Owned by the single `run` invocation that resolved them.
pub(crate) struct ResolvedStreams {
    pub stdin: Stdio,
    pub stdout: Stdio,
    pub stderr: Stdio,
}

fn open_input(path: &PathBuf) -> Result<File> {
    File::open(path).map_err(|source| RunnerError::Redirect {
        stream: StdStream::Stdin,
        path: path.clone(),
        source,
    })
}

fn resolve_output(stream: StdStream, target: &StreamTarget) -> Result<Stdio> {
    match target {
        StreamTarget::Inherit => Ok(Stdio::inherit()),
        StreamTarget::Pipe => Ok(Stdio::piped()),
        StreamTarget::File(path) => OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map(Stdio::from)
            .map_err(|source| RunnerError::Redirect {
                stream,
                path: path.clone(),
                source,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_input_file_is_a_stdin_redirect_error() {
        let plan = StreamRedirection::inherit()
            .stdin(StreamTarget::File(PathBuf::from("/no/such/input/file")));

        match plan.resolve() {
            Err(RunnerError::Redirect { stream, path, .. }) => {
                assert_eq!(stream, StdStream::Stdin);
                assert_eq!(path, PathBuf::from("/no/such/input/file"));
            }
            other => panic!("expected a stdin redirect error, got {:?}", other.err()),
        }
    }

    #[test]
    fn unwritable_output_file_is_a_stdout_redirect_error() {
        let plan = StreamRedirection::inherit()
            .stdout(StreamTarget::File(PathBuf::from("/no/such/dir/out.txt")));

        match plan.resolve() {
            Err(RunnerError::Redirect { stream, .. }) => {
                assert_eq!(stream, StdStream::Stdout);
            }
            other => panic!("expected a stdout redirect error, got {:?}", other.err()),
        }
    }

    #[test]
    fn resolving_truncates_existing_output_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.txt");
        let mut existing = File::create(&path).expect("create");
        existing.write_all(b"stale contents").expect("write");
        drop(existing);

        let plan = StreamRedirection::inherit().stdout(StreamTarget::File(path.clone()));
        let resolved = plan.resolve().expect("resolve");
        drop(resolved);

        let metadata = std::fs::metadata(&path).expect("metadata");
        assert_eq!(metadata.len(), 0, "open-for-write should truncate");
    }

    #[test]
    fn default_plan_inherits_everything() {
        let plan = StreamRedirection::inherit();
        assert_eq!(plan.stdin, StreamTarget::Inherit);
        assert_eq!(plan.stdout, StreamTarget::Inherit);
        assert_eq!(plan.stderr, StreamTarget::Inherit);
    }

    #[test]
    fn capture_pipes_both_output_streams() {
        let plan = StreamRedirection::capture();
        assert_eq!(plan.stdin, StreamTarget::Inherit);
        assert_eq!(plan.stdout, StreamTarget::Pipe);
        assert_eq!(plan.stderr, StreamTarget::Pipe);
    }
}
