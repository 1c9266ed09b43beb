//! Runtime errors.

use chatbot_core::MarshalError;
use chatbot_framework::ConfigurationError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::logging::LoggingError;

/// Errors raised while assembling or refreshing a [`ChatbotRuntime`](crate::ChatbotRuntime).
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("logging setup failed: {0}")]
    Logging(#[from] LoggingError),

    /// The record schema references a type that does not resolve.
    #[error("record schema is inconsistent: {0}")]
    Schema(#[from] MarshalError),

    /// A bot's handler source is unknown or its chain is malformed.
    #[error(transparent)]
    Handlers(#[from] ConfigurationError),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
