//! Error types for the dispatch framework.

use chatbot_core::MarshalError;
use thiserror::Error;

/// Error type returned by handler actions and forms.
///
/// Collaborator errors are never inspected; the dispatcher hands them back
/// to the caller unchanged.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for handler actions and forms.
pub type HandlerResult<T = ()> = Result<T, HandlerError>;

/// A bot's handler source cannot be turned into a valid handler chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// No source is registered under the reference.
    #[error("bot '{bot}': unknown handler source '{reference}'")]
    UnknownSource { bot: String, reference: String },

    /// The source produced a chain that cannot be dispatched.
    #[error("bot '{bot}': malformed handler chain from '{reference}': {reason}")]
    Malformed {
        bot: String,
        reference: String,
        reason: String,
    },
}

impl ConfigurationError {
    /// The slug of the bot whose configuration is broken.
    pub fn bot(&self) -> &str {
        match self {
            Self::UnknownSource { bot, .. } | Self::Malformed { bot, .. } => bot,
        }
    }
}

/// Errors that abort a dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No bot is known under the slug.
    #[error("no bot with slug '{slug}'")]
    NotFound { slug: String },

    /// The payload is structurally invalid.
    #[error(transparent)]
    Validation(MarshalError),

    /// A nested field names an unregistered type.
    #[error(transparent)]
    TypeResolution(MarshalError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The update store refused to bind the update.
    #[error(transparent)]
    Store(HandlerError),

    /// A form failed while advancing. The form is closed.
    #[error(transparent)]
    Form(HandlerError),

    /// The matched handler's action failed.
    #[error(transparent)]
    Handler(HandlerError),
}

impl DispatchError {
    pub fn not_found(slug: impl Into<String>) -> Self {
        Self::NotFound { slug: slug.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<MarshalError> for DispatchError {
    fn from(err: MarshalError) -> Self {
        if err.is_type_resolution() {
            Self::TypeResolution(err)
        } else {
            Self::Validation(err)
        }
    }
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marshal_error_is_split_by_kind() {
        let err: DispatchError = MarshalError::missing("Update", "update_id").into();
        assert!(err.is_validation());

        let err: DispatchError = MarshalError::TypeResolution {
            record: "Message",
            field: "sticker",
            type_name: "Sticker",
        }
        .into();
        assert!(matches!(err, DispatchError::TypeResolution(_)));
    }

    #[test]
    fn test_configuration_error_display() {
        let err = ConfigurationError::UnknownSource {
            bot: "demo".into(),
            reference: "handlers::missing".into(),
        };
        assert_eq!(err.bot(), "demo");
        assert_eq!(
            DispatchError::from(err).to_string(),
            "bot 'demo': unknown handler source 'handlers::missing'"
        );
    }
}
