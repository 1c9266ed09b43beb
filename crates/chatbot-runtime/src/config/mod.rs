//! Runtime configuration: bots to serve and logging.
//!
//! ```toml
//! [logging]
//! level = "info"
//!
//! [[bots]]
//! slug = "s3cr3t-slug"
//! name = "NoteBot"
//! handlers = "notes.handlers"
//! ```

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, load_config, load_config_from_file};
pub use schema::{
    BotConfig, ChatbotConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig,
    SpanEventConfig,
};
pub use validation::validate_config;
