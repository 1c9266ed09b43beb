//! Configuration validation utilities.

use std::collections::HashSet;

use super::error::{ConfigError, ConfigResult};
use super::schema::{BotConfig, ChatbotConfig, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &ChatbotConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_bots_config(&config.bots)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    Ok(())
}

/// Validates all bot configurations.
fn validate_bots_config(bots: &[BotConfig]) -> ConfigResult<()> {
    let mut seen_slugs = HashSet::new();

    for bot in bots {
        validate_bot_config(bot)?;

        if !seen_slugs.insert(bot.slug.as_str()) {
            return Err(ConfigError::DuplicateBotSlug(bot.slug.clone()));
        }
    }

    Ok(())
}

/// Validates a single bot configuration.
fn validate_bot_config(bot: &BotConfig) -> ConfigResult<()> {
    if bot.slug.is_empty() {
        return Err(ConfigError::missing_field("bots.slug"));
    }

    // Slugs end up in webhook URLs.
    if let Some(bad) = bot
        .slug
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':')))
    {
        return Err(ConfigError::validation(format!(
            "Bot slug '{}' contains invalid character '{bad}'",
            bot.slug
        )));
    }

    if bot.handlers.trim().is_empty() {
        return Err(ConfigError::missing_field(format!("bots.{}.handlers", bot.slug)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_empty_config() {
        assert!(validate_config(&ChatbotConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_duplicate_slug() {
        let bot = BotConfig::new("abc", "demo.handlers");
        let config = ChatbotConfig {
            bots: vec![bot.clone(), bot],
            ..Default::default()
        };

        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::DuplicateBotSlug(slug)) if slug == "abc"));
    }

    #[test]
    fn test_validate_empty_slug_and_handlers() {
        let config = ChatbotConfig {
            bots: vec![BotConfig::new("", "demo.handlers")],
            ..Default::default()
        };
        assert!(matches!(validate_config(&config), Err(ConfigError::MissingField { .. })));

        let config = ChatbotConfig {
            bots: vec![BotConfig::new("abc", "  ")],
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert_eq!(err.to_string(), "Missing required configuration field: bots.abc.handlers");
    }

    #[test]
    fn test_validate_slug_characters() {
        let config = ChatbotConfig {
            bots: vec![BotConfig::new("a/b", "demo.handlers")],
            ..Default::default()
        };
        assert!(matches!(validate_config(&config), Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn test_validate_file_output_needs_path() {
        let mut config = ChatbotConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());
    }
}
