//! Layered configuration loading on top of figment.
//!
//! Sources, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. Profile file (`chatbot.{profile}.toml`), then the main file (`chatbot.toml`)
//! 3. Environment variables (`CHATBOT_*`, `__` separates nesting levels)
//! 4. Values merged programmatically
//!
//! `CHATBOT_LOGGING__LEVEL=debug` maps to `logging.level = "debug"`.
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: searches `chatbot.toml` and `config.toml`
//! - `yaml-config`: searches `chatbot.yaml`, `chatbot.yml`, `config.yaml` and `config.yml`
//!
//! ```rust,ignore
//! use chatbot_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .file("./deploy/chatbot.toml")
//!     .profile("production")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::ChatbotConfig;

const ENV_PREFIX: &str = "CHATBOT_";
const PROFILE_VAR: &str = "CHATBOT_PROFILE";
const DEFAULT_PROFILE: &str = "development";

/// Normalizes the short profile aliases.
fn normalize_profile(profile: &str) -> String {
    match profile.to_lowercase().as_str() {
        "prod" | "production" => "production".to_string(),
        "dev" | "development" => "development".to_string(),
        other => other.to_string(),
    }
}

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    profile: String,
    search_paths: Vec<PathBuf>,
    config_file: Option<PathBuf>,
    load_env: bool,
    overrides: Figment,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// A loader for the profile named by `CHATBOT_PROFILE` (default `development`).
    pub fn new() -> Self {
        let profile = std::env::var(PROFILE_VAR)
            .map(|p| normalize_profile(&p))
            .unwrap_or_else(|_| DEFAULT_PROFILE.to_string());
        Self {
            profile,
            search_paths: Vec::new(),
            config_file: None,
            load_env: true,
            overrides: Figment::new(),
        }
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = normalize_profile(profile.as_ref());
        self
    }

    pub fn profile_name(&self) -> &str {
        &self.profile
    }

    /// Adds a directory to search for configuration files.
    ///
    /// Without any search path the current directory and the user config
    /// directory (`~/.config/chatbot` on Linux) are searched.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Loads exactly this file instead of searching.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges a full configuration over every other source.
    pub fn merge(mut self, config: ChatbotConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Merges an inline TOML document over every other source.
    #[cfg(feature = "toml-config")]
    pub fn merge_toml_str(mut self, toml: &str) -> Self {
        self.overrides = self.overrides.merge(Toml::string(toml));
        self
    }

    /// Loads and returns the configuration.
    pub fn load(self) -> ConfigResult<ChatbotConfig> {
        let profile = self.profile.clone();
        let config: ChatbotConfig = self.build_figment()?.extract()?;

        debug!(
            profile = %profile,
            bots = config.bots.len(),
            logging_level = %config.logging.level,
            "Configuration loaded"
        );
        Ok(config)
    }

    fn build_figment(self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(ChatbotConfig::default()));

        if let Some(path) = &self.config_file {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = merge_config_file(figment, path)?;
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!(prefix = ENV_PREFIX, "Loading environment variables");
            figment = figment.merge(
                Env::prefixed(ENV_PREFIX)
                    .ignore(&["PROFILE"])
                    .split("__"),
            );
        }

        Ok(figment.merge(self.overrides))
    }

    #[cfg(any(feature = "toml-config", feature = "yaml-config"))]
    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("chatbot"));
        }
        paths
    }

    /// Finds the first directory holding one of `base_names` and merges the
    /// profile variant before the base file.
    #[cfg(any(feature = "toml-config", feature = "yaml-config"))]
    fn load_format_files(
        &self,
        mut figment: Figment,
        search_paths: &[PathBuf],
        base_names: &[&str],
    ) -> (Figment, bool) {
        for search_path in search_paths {
            for base_name in base_names {
                let Some((stem, ext)) = base_name.rsplit_once('.') else {
                    continue;
                };

                let profile_path = search_path.join(format!("{stem}.{}.{ext}", self.profile));
                if profile_path.exists() {
                    debug!(path = %profile_path.display(), "Loading profile configuration");
                    figment = merge_by_extension(figment, &profile_path, ext);
                }

                let base_path = search_path.join(base_name);
                if base_path.exists() {
                    info!(path = %base_path.display(), "Loading configuration file");
                    return (merge_by_extension(figment, &base_path, ext), true);
                }
            }
        }
        (figment, false)
    }

    fn load_config_files(&self, figment: Figment) -> Figment {
        #[cfg(any(feature = "toml-config", feature = "yaml-config"))]
        let search_paths = self.resolve_search_paths();
        #[allow(unused_mut)]
        let mut figment = figment;
        #[allow(unused_mut)]
        let mut found = false;

        #[cfg(feature = "toml-config")]
        {
            let (f, ok) =
                self.load_format_files(figment, &search_paths, &["chatbot.toml", "config.toml"]);
            figment = f;
            found |= ok;
        }

        #[cfg(feature = "yaml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["chatbot.yaml", "chatbot.yml", "config.yaml", "config.yml"],
            );
            figment = f;
            found |= ok;
        }

        if !found {
            warn!("No configuration file found, using defaults");
        }
        figment
    }
}

#[cfg(any(feature = "toml-config", feature = "yaml-config"))]
fn merge_by_extension(figment: Figment, path: &Path, ext: &str) -> Figment {
    match ext {
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => figment.merge(Yaml::file(path)),
        #[cfg(feature = "toml-config")]
        _ => figment.merge(Toml::file(path)),
        #[cfg(not(feature = "toml-config"))]
        _ => figment,
    }
}

/// Merges one file, choosing the format from its extension.
fn merge_config_file(
    #[cfg_attr(
        not(any(feature = "toml-config", feature = "yaml-config")),
        allow(unused_variables)
    )]
    figment: Figment,
    path: &Path,
) -> ConfigResult<Figment> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(figment.merge(Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
    }
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigResult<ChatbotConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from one file, with environment overrides.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<ChatbotConfig> {
    ConfigLoader::new().file(path).load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use figment::Jail;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_without_files() {
        Jail::expect_with(|jail| {
            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .load()
                .unwrap();
            assert_eq!(config, ChatbotConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_profile_file_is_overridden_by_main_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "chatbot.toml",
                r#"
                [logging]
                level = "warn"

                [[bots]]
                slug = "alpha"
                handlers = "demo.handlers"
                "#,
            )?;
            jail.create_file(
                "chatbot.production.toml",
                r#"
                [logging]
                level = "debug"
                thread_ids = true
                "#,
            )?;

            let config = ConfigLoader::new()
                .profile("prod")
                .search_path(jail.directory())
                .without_env()
                .load()
                .unwrap();

            assert_eq!(config.logging.level, LogLevel::Warn);
            assert!(config.logging.thread_ids);
            assert_eq!(config.bots.len(), 1);
            assert!(config.bots[0].enabled);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("chatbot.toml", "[logging]\nlevel = \"warn\"\n")?;
            jail.set_env("CHATBOT_LOGGING__LEVEL", "error");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .load()
                .unwrap();
            assert_eq!(config.logging.level, LogLevel::Error);
            Ok(())
        });
    }

    #[test]
    fn test_inline_toml_wins() {
        Jail::expect_with(|jail| {
            jail.set_env("CHATBOT_LOGGING__LEVEL", "error");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .merge_toml_str("[logging]\nlevel = \"trace\"\n")
                .load()
                .unwrap();
            assert_eq!(config.logging.level, LogLevel::Trace);
            Ok(())
        });
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::new()
            .file("/nonexistent/chatbot.toml")
            .without_env()
            .load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        Jail::expect_with(|jail| {
            jail.create_file("chatbot.ini", "level=debug")?;
            let result = ConfigLoader::new().file("chatbot.ini").without_env().load();
            assert!(matches!(result, Err(ConfigError::UnsupportedFormat(ext)) if ext == "ini"));
            Ok(())
        });
    }

    #[test]
    fn test_profile_alias() {
        assert_eq!(ConfigLoader::new().profile("PROD").profile_name(), "production");
        assert_eq!(ConfigLoader::new().profile("staging").profile_name(), "staging");
    }
}
