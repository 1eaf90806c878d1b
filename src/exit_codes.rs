//! Exit codes for the fbcli application
//!
//! The login flow reports its failures with the plain `1`/`2` codes that
//! scripts wrapping the tool already expect. Everything else follows the BSD
//! sysexits.h conventions.

/// Process exit codes used by fbcli
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// General failure (1) - Login rejected, timed out or could not start
    Failure = 1,

    /// Finalization failure (2) - The pairing result could not be consumed
    FinalizeError = 2,

    /// Command line usage error (64) - User input error
    UsageError = exitcode::USAGE as isize,

    /// Internal software error (70) - Unexpected application error
    SoftwareError = exitcode::SOFTWARE as isize,

    /// I/O error (74) - Local state could not be read or written
    IoError = exitcode::IOERR as isize,

    /// Configuration error (78) - Application configuration issue
    ConfigError = exitcode::CONFIG as isize,
}

impl ExitCode {
    /// Convert to numeric exit code
    pub fn code(&self) -> i32 {
        *self as i32
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.code()
    }
}
