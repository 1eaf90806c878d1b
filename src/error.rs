use thiserror::Error;

use crate::{
    configstore::ConfigStoreError, configuration::ConfigurationError, exit_codes::ExitCode,
    login::LoginError, realtime::RealtimeError,
};

/// Error types that can occur during CLI command execution
#[derive(Debug, Error)]
pub enum CliError {
    /// Error when an unsupported or undefined subcommand is encountered
    #[error("Undefined or unsupported subcommand: {0}")]
    UnsupportedSubcommand(String),
    /// Error related to configuration loading or management
    #[error("Configuration error: {0}")]
    ConfigurationError(#[from] ConfigurationError),
    /// Error reading or writing local session state
    #[error("Configuration store error: {0}")]
    ConfigStoreError(#[from] ConfigStoreError),
    /// Error setting up the realtime database client
    #[error("Realtime database error: {0}")]
    RealtimeError(#[from] RealtimeError),
    /// Error raised by the login flow
    #[error("{0}")]
    LoginError(#[from] LoginError),
}

impl CliError {
    /// Get the appropriate exit code for this error
    ///
    /// Login failures carry their own code; see [`LoginError::exit_code`].
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::UnsupportedSubcommand(_) => ExitCode::UsageError,
            CliError::ConfigurationError(_) => ExitCode::ConfigError,
            CliError::ConfigStoreError(_) => ExitCode::IoError,
            CliError::LoginError(e) => e.exit_code(),
            _ => ExitCode::SoftwareError,
        }
    }
}
