use std::io::{self, Write};

use procrun::cli::Cli;
use procrun::error::ReturnCode;
use procrun::runner;
use procrun::status::{ExecutionResult, Termination};

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let args = Cli::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("procrun: {}", e);
        eprintln!("Use \"procrun --help\" to get help");
        return e.exit_code();
    }

    let spec = match args.command_spec() {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("procrun: {}", e);
            return e.exit_code();
        }
    };
    let redirection = args.redirection();
    let verbose = args.is_verbose();

    if verbose {
        eprintln!("procrun: running {}", spec);
    }

    let input = args.input.as_deref().map(str::as_bytes);
    let result = match runner::run(&spec, &redirection, input) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("procrun: {}", e);
            return e.exit_code();
        }
    };

    echo_captures(&result);
    exit_code_for(&result, &args, verbose)
}

/// Replay in-memory captures onto our own streams once the child is done.
fn echo_captures(result: &ExecutionResult) {
    if let Some(bytes) = &result.stdout {
        let mut stdout = io::stdout();
        let _ = stdout.write_all(bytes);
        let _ = stdout.flush();
    }
    if let Some(bytes) = &result.stderr {
        let _ = io::stderr().write_all(bytes);
    }
}

/// Map a classified result onto the documented exit-code contract.
fn exit_code_for(result: &ExecutionResult, args: &Cli, verbose: bool) -> i32 {
    match &result.status {
        Termination::Exited(0) if args.fail_on_stderr && stderr_nonempty(result) => {
            eprintln!("procrun: exit code 0 but stderr is not empty, treating as failure");
            1
        }
        Termination::Exited(code) => {
            if verbose {
                eprintln!("procrun: child exited with code {}", code);
            }
            *code
        }
        Termination::Signaled(signal) => {
            eprintln!("procrun: child killed by signal {}", signal);
            128 + *signal
        }
        Termination::SpawnFailed(cause) => {
            eprintln!("procrun: failed to run command: {}", cause);
            spawn_failure_code(cause).as_exit_code()
        }
        Termination::TimedOut => {
            eprintln!("procrun: child ran past its deadline and was killed");
            ReturnCode::Timeout.as_exit_code()
        }
    }
}

fn stderr_nonempty(result: &ExecutionResult) -> bool {
    result
        .stderr
        .as_deref()
        .is_some_and(|bytes| !bytes.is_empty())
}

/// A spawn failure maps onto the same lookup codes a shell would report.
fn spawn_failure_code(cause: &io::Error) -> ReturnCode {
    match cause.kind() {
        io::ErrorKind::NotFound => ReturnCode::NotFound,
        io::ErrorKind::PermissionDenied => ReturnCode::NotExecutable,
        _ => ReturnCode::RunnerFailure,
    }
}
