//! Entry point for the Hearth desktop host.
//!
//! The binary delegates to [`hearth_boot::run_host`], which runs the
//! pre-ready bootstrap against the headless host and prints the resolved
//! launch summary.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    hearth_boot::run_host(std::env::args_os(), &mut stdout, &mut stderr)
}
