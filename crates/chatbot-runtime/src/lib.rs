//! # Chatbot Runtime
//!
//! Turns a configuration file into a running [`ChatbotRuntime`]:
//!
//! - Layered configuration with figment ([`config`])
//! - `tracing-subscriber` setup driven by that configuration ([`logging`])
//! - Startup checks for the record schema and every bot's handler chain,
//!   then a shared [`Dispatcher`](chatbot_framework::Dispatcher) ([`runtime`])
//!
//! ```rust,ignore
//! use chatbot_runtime::ChatbotRuntime;
//!
//! let runtime = ChatbotRuntime::builder().build()?;
//! let outcome = runtime.dispatch(&payload, "s3cr3t-slug").await?;
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{BotConfig, ChatbotConfig, ConfigError, ConfigLoader, ConfigResult};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, LoggingError, SpanEvents};
pub use runtime::{ChatbotRuntime, RuntimeBuilder, RuntimeStats};

pub use tracing;
pub use tracing_subscriber;

/// Logging macros for handler code.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
