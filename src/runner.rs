use std::io::{Read, Write};
use std::os::unix::process::CommandExt;
use std::process::{Child, Command};
use std::thread;
use std::time::{Duration, Instant};

use crate::command::CommandSpec;
use crate::error::{Result, RunnerError};
use crate::redirect::{StreamRedirection, StreamTarget};
use crate::status::{ExecutionResult, Termination};

/// The interpreter used for shell-interposed execution.
pub const SHELL: &str = "/bin/sh";

/// Poll interval while waiting on a child with a deadline.
const WAIT_POLL: Duration = Duration::from_millis(1);

/// Execute one external command synchronously and report a fully classified
/// outcome.
///
/// Redirection files are opened first; an unopenable file fails the call with
/// [`RunnerError::Redirect`] before any child exists. A failed spawn is not
/// an error but a [`Termination::SpawnFailed`] status, so every call that
/// reaches a spawn attempt yields exactly one terminal [`ExecutionResult`].
///
/// `input` requires `redirection.stdin` to be [`StreamTarget::Pipe`]. The
/// bytes are fed from a dedicated thread, concurrent with the threads
/// draining piped stdout/stderr: a child blocked on a full stdout pipe must
/// not deadlock against a parent still blocked writing its stdin. A piped
/// stdin with no `input` is closed immediately so the child sees EOF.
///
/// No file handle, pipe, or process table entry outlives the call: handles
/// are scoped to the invocation, helper threads are joined, and a child that
/// runs past `spec`'s deadline is killed and reaped before
/// [`Termination::TimedOut`] is returned.
pub fn run(
    spec: &CommandSpec,
    redirection: &StreamRedirection,
    input: Option<&[u8]>,
) -> Result<ExecutionResult> {
    if input.is_some() && redirection.stdin != StreamTarget::Pipe {
        return Err(RunnerError::InvalidArguments(
            "input bytes require a piped stdin".to_string(),
        ));
    }

    let streams = redirection.resolve()?;

    let mut command = build_command(spec);
    command
        .stdin(streams.stdin)
        .stdout(streams.stdout)
        .stderr(streams.stderr);

    let mut child = match command.spawn() {
        Ok(child) => child,
        // Files opened for redirection are dropped here, before returning.
        Err(cause) => {
            return Ok(ExecutionResult {
                status: Termination::SpawnFailed(cause),
                stdout: None,
                stderr: None,
            })
        }
    };

    let stdin_writer = match (child.stdin.take(), input) {
        (Some(mut pipe), Some(bytes)) => {
            let bytes = bytes.to_vec();
            Some(thread::spawn(move || {
                // EPIPE here means the child stopped reading early; that is
                // the child's business, not a runner failure.
                let _ = pipe.write_all(&bytes);
            }))
        }
        (pipe, _) => {
            drop(pipe);
            None
        }
    };

    let stdout_reader = child.stdout.take().map(drain);
    let stderr_reader = child.stderr.take().map(drain);

    let status = wait_child(&mut child, spec.timeout)?;

    if let Some(writer) = stdin_writer {
        // The child is gone, so a blocked write has already failed with
        // EPIPE and the thread is finishing.
        let _ = writer.join();
    }

    Ok(ExecutionResult {
        status,
        stdout: stdout_reader.map(collect),
        stderr: stderr_reader.map(collect),
    })
}

/// Translate a [`CommandSpec`] into a ready-to-spawn [`Command`].
fn build_command(spec: &CommandSpec) -> Command {
    let mut command = if spec.is_shell() {
        let mut command = Command::new(SHELL);
        command.arg("-c").arg(spec.program());
        // Extra arguments become the shell's positional parameters.
        command.args(&spec.args);
        command
    } else {
        let mut command = Command::new(spec.program());
        command.args(&spec.args);
        command
    };

    for (key, value) in &spec.env {
        command.env(key, value);
    }
    if let Some(dir) = &spec.cwd {
        command.current_dir(dir);
    }

    if !spec.reset_signals.is_empty() {
        let raw: Vec<libc::c_int> = spec
            .reset_signals
            .iter()
            .map(|signal| *signal as libc::c_int)
            .collect();
        // Runs in the child between fork and exec; only async-signal-safe
        // calls are allowed, which is why this uses libc::signal directly
        // on a pre-collected list.
        unsafe {
            command.pre_exec(move || {
                for &signal in &raw {
                    libc::signal(signal, libc::SIG_DFL);
                }
                Ok(())
            });
        }
    }

    command
}

/// Wait for the child, enforcing the deadline if one is set.
fn wait_child(child: &mut Child, deadline: Option<Duration>) -> Result<Termination> {
    let Some(limit) = deadline else {
        let status = child.wait().map_err(RunnerError::Wait)?;
        return Ok(status.into());
    };

    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait().map_err(RunnerError::Wait)? {
            return Ok(status.into());
        }
        if started.elapsed() >= limit {
            // SIGKILL, then reap; the child's pipe ends close and the drain
            // threads run to completion.
            let _ = child.kill();
            child.wait().map_err(RunnerError::Wait)?;
            return Ok(Termination::TimedOut);
        }
        thread::sleep(WAIT_POLL);
    }
}

fn drain<R>(mut stream: R) -> thread::JoinHandle<Vec<u8>>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buffer = Vec::new();
        // A read error mid-stream keeps whatever arrived before it.
        let _ = stream.read_to_end(&mut buffer);
        buffer
    })
}

fn collect(reader: thread::JoinHandle<Vec<u8>>) -> Vec<u8> {
    reader.join().unwrap_or_default()
}
