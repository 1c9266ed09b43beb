//! Assembles configuration, logging, bots and handlers into a ready dispatcher.
//!
//! ```rust,ignore
//! use chatbot_runtime::ChatbotRuntime;
//!
//! let runtime = ChatbotRuntime::builder()
//!     .config_file("deploy/chatbot.toml")
//!     .profile("production")
//!     .build()?;
//!
//! // From the webhook endpoint of `bot_slug`:
//! runtime.dispatch(&payload, bot_slug).await?;
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use tracing::{debug, info, warn};

use chatbot_core::TypeResolver;
use chatbot_framework::{
    BotIdentity, BotResolver, DispatchOutcome, DispatchResult, Dispatcher, FormStore,
    HandlerCatalog, HandlerLoader, HandlerRegistry, StaticBotResolver, UpdateStore,
};

use crate::config::{ChatbotConfig, ConfigLoader, validate_config};
use crate::error::RuntimeResult;
use crate::logging;

/// Dispatch counters since the runtime was built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    /// Enabled bots.
    pub bots: usize,
    /// Handler chains currently cached.
    pub loaded_chains: usize,
    pub dispatched: u64,
    pub handled: u64,
    pub form_advanced: u64,
    pub dropped: u64,
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    dispatched: AtomicU64,
    handled: AtomicU64,
    form_advanced: AtomicU64,
    dropped: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    fn record(&self, result: &DispatchResult<DispatchOutcome>) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        let counter = match result {
            Ok(DispatchOutcome::Handled { .. }) => &self.handled,
            Ok(DispatchOutcome::FormAdvanced { .. }) => &self.form_advanced,
            Ok(DispatchOutcome::Dropped) => &self.dropped,
            Err(_) => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// A configured set of bots behind one [`Dispatcher`].
pub struct ChatbotRuntime {
    config: ChatbotConfig,
    bots: Vec<BotIdentity>,
    dispatcher: Dispatcher,
    counters: Counters,
}

impl ChatbotRuntime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub fn config(&self) -> &ChatbotConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Identities of the enabled bots, in configuration order.
    pub fn bots(&self) -> &[BotIdentity] {
        &self.bots
    }

    /// Dispatches one update payload received for `bot_slug`.
    pub async fn dispatch(&self, payload: &Value, bot_slug: &str) -> DispatchResult<DispatchOutcome> {
        let result = self.dispatcher.dispatch(payload, bot_slug).await;
        self.counters.record(&result);
        if let Err(err) = &result {
            warn!(bot = bot_slug, error = %err, "Dispatch failed");
        }
        result
    }

    /// Drops every cached handler chain and loads all bots again.
    ///
    /// Returns the number of chains loaded.
    pub fn refresh_handlers(&self) -> RuntimeResult<usize> {
        let loaded = self.dispatcher.registry().refresh(&self.bots)?;
        info!(chains = loaded, "Handler chains refreshed");
        Ok(loaded)
    }

    pub fn stats(&self) -> RuntimeStats {
        RuntimeStats {
            bots: self.bots.len(),
            loaded_chains: self.dispatcher.registry().len(),
            dispatched: self.counters.dispatched.load(Ordering::Relaxed),
            handled: self.counters.handled.load(Ordering::Relaxed),
            form_advanced: self.counters.form_advanced.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for ChatbotRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatbotRuntime")
            .field("bots", &self.bots.len())
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ChatbotRuntime`].
///
/// Without [`config`](Self::config) the configuration is loaded through
/// [`ConfigLoader`] using the file, profile and search paths given here.
pub struct RuntimeBuilder {
    config: Option<ChatbotConfig>,
    config_file: Option<PathBuf>,
    profile: Option<String>,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    loader: Option<Arc<dyn HandlerLoader>>,
    forms: Option<Arc<dyn FormStore>>,
    updates: Option<Arc<dyn UpdateStore>>,
    init_logging: bool,
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            config_file: None,
            profile: None,
            search_paths: Vec::new(),
            load_env: true,
            loader: None,
            forms: None,
            updates: None,
            init_logging: true,
        }
    }

    /// Uses this configuration instead of loading one.
    pub fn config(mut self, config: ChatbotConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Where handler sources are looked up. Defaults to [`HandlerCatalog::linked`].
    pub fn catalog(mut self, loader: impl HandlerLoader + 'static) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    pub fn form_store(mut self, forms: Arc<dyn FormStore>) -> Self {
        self.forms = Some(forms);
        self
    }

    pub fn update_store(mut self, updates: Arc<dyn UpdateStore>) -> Self {
        self.updates = Some(updates);
        self
    }

    /// Whether `build` installs the global tracing subscriber (default `true`).
    pub fn init_logging(mut self, enabled: bool) -> Self {
        self.init_logging = enabled;
        self
    }

    fn load_config(&mut self) -> RuntimeResult<ChatbotConfig> {
        if let Some(config) = self.config.take() {
            return Ok(config);
        }
        let mut loader = ConfigLoader::new();
        if let Some(profile) = &self.profile {
            loader = loader.profile(profile);
        }
        if let Some(path) = &self.config_file {
            loader = loader.file(path);
        }
        for path in &self.search_paths {
            loader = loader.search_path(path);
        }
        if !self.load_env {
            loader = loader.without_env();
        }
        Ok(loader.load()?)
    }

    /// Validates everything and preloads every enabled bot's handler chain.
    pub fn build(mut self) -> RuntimeResult<ChatbotRuntime> {
        let config = self.load_config()?;
        validate_config(&config)?;

        if self.init_logging && !logging::init_from_config(&config.logging)? {
            debug!("A global subscriber is already installed, keeping it");
        }

        TypeResolver::validate_schema()?;

        let bots: Vec<BotIdentity> = config.enabled_bots().map(|bot| bot.identity()).collect();
        let resolver: StaticBotResolver = bots.iter().cloned().collect();

        let loader = self
            .loader
            .take()
            .unwrap_or_else(|| Arc::new(HandlerCatalog::linked()));
        let registry = Arc::new(HandlerRegistry::from_arc(loader));
        let chains = registry.load_all(&bots)?;

        let mut dispatcher = Dispatcher::new(Arc::new(resolver) as Arc<dyn BotResolver>, registry);
        if let Some(forms) = self.forms.take() {
            dispatcher = dispatcher.with_forms(forms);
        }
        if let Some(updates) = self.updates.take() {
            dispatcher = dispatcher.with_update_store(updates);
        }

        info!(
            bots = bots.len(),
            disabled = config.bots.len() - bots.len(),
            chains,
            log_level = %config.logging.level,
            "Runtime ready"
        );

        Ok(ChatbotRuntime {
            config,
            bots,
            dispatcher,
            counters: Counters::default(),
        })
    }
}
