//! Shared command helpers

use std::fmt;

/// Requests a specific process exit code.
///
/// Commands return `Err(ExitCode(N).into())` instead of calling
/// `std::process::exit(N)` so destructors run before the process ends.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Not a user-facing error; main maps it to the exit status.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}
