// Platform-specific compilation guard
#[cfg(not(unix))]
compile_error!("procrun requires a Unix-like operating system: signal-aware \
                exit classification relies on POSIX wait semantics.");

#[cfg(unix)]
pub mod cli;
#[cfg(unix)]
pub mod command;
#[cfg(unix)]
pub mod error;
#[cfg(unix)]
pub mod redirect;
#[cfg(unix)]
pub mod runner;
#[cfg(unix)]
pub mod status;
