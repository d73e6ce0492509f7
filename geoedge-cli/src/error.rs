//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use geoedge::config::ConfigFileError;
use geoedge::engine::EngineError;
use geoedge::service::PipelineError;
use std::fmt;
use std::process;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to read an input file
    FileRead { path: String, error: std::io::Error },
    /// Request document or flags could not be turned into a request
    InvalidRequest(String),
    /// Failed to set up the engine client
    EngineSetup(EngineError),
    /// Failed to create the async runtime
    Runtime(String),
    /// The composite pipeline failed
    Composite(PipelineError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Composite(PipelineError::EngineTimeout(_)) => {
                eprintln!();
                eprintln!("The engine did not answer in time. The request can be retried,");
                eprintln!("or the deadline raised with 'timeout' in the [engine] section.");
            }
            CliError::Composite(PipelineError::EngineFailure(EngineError::Request(_))) => {
                eprintln!();
                eprintln!("Check that the engine URL in the [engine] section is reachable");
                eprintln!("and that GEOEDGE_ACCESS_TOKEN holds a valid session token.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::FileRead { path, error } => {
                write!(f, "Failed to read file '{}': {}", path, error)
            }
            CliError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            CliError::EngineSetup(e) => write!(f, "Failed to set up engine client: {}", e),
            CliError::Runtime(msg) => write!(f, "Failed to start async runtime: {}", msg),
            CliError::Composite(e) => write!(f, "Composite failed: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::FileRead { error, .. } => Some(error),
            CliError::EngineSetup(e) => Some(e),
            CliError::Composite(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<PipelineError> for CliError {
    fn from(e: PipelineError) -> Self {
        CliError::Composite(e)
    }
}
