//! Error types for the gmenv crate

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the gmenv crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("failed to load program '{}': {reason}", program.display())]
    EngineLoad { program: PathBuf, reason: String },

    #[error("action {action} is not in the legal action set {legal:?}")]
    IllegalAction { action: usize, legal: Vec<usize> },

    #[error("environment is closed")]
    ClosedEnvironment,

    #[error("engine did not answer '{operation}' within {timeout_ms} ms")]
    EngineTimeout { operation: String, timeout_ms: u64 },

    #[error("engine process failed during '{operation}': {message}")]
    EngineCrash { operation: String, message: String },

    #[error("malformed engine reply to '{operation}': {message}")]
    EngineProtocol { operation: String, message: String },

    #[error("engine rejected '{operation}': {message}")]
    EngineRejected { operation: String, message: String },

    #[error("non-terminal configuration {observation:?} has no legal actions")]
    NoActionsAvailable { observation: Vec<f64> },

    #[error("usage error: {message}")]
    Usage { message: String },

    #[error("training aborted: {message}")]
    Training {
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("invalid learning algorithm '{input}'. Expected one of: {expected}")]
    ParseAlgorithm { input: String, expected: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to {operation}: {message}")]
    SerializationContext { operation: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },
}

impl Error {
    /// True for failures of the engine process itself (as opposed to
    /// contract violations by the caller).
    pub fn is_engine_failure(&self) -> bool {
        matches!(
            self,
            Error::EngineTimeout { .. }
                | Error::EngineCrash { .. }
                | Error::EngineProtocol { .. }
                | Error::EngineRejected { .. }
        )
    }

    pub(crate) fn usage(message: impl Into<String>) -> Self {
        Error::Usage {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfiguration {
            message: message.into(),
        }
    }

    pub(crate) fn training(message: impl Into<String>, source: Error) -> Self {
        Error::Training {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}
