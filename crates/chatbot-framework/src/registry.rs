//! Per-bot handler chains.
//!
//! Each bot names a *handler source*. A [`HandlerLoader`] turns that reference
//! into handlers, the registry validates them into a [`HandlerChain`] and
//! caches it until invalidated.
//!
//! # Handler sources
//!
//! [`HandlerCatalog`] is the shipped loader. Sources are registered either
//! programmatically or at link time through the [`HANDLER_SOURCES`]
//! distributed slice:
//!
//! ```rust,ignore
//! use chatbot_framework::{BoxedHandler, handler_source};
//!
//! fn demo_handlers() -> Vec<BoxedHandler> {
//!     vec![/* … */]
//! }
//!
//! handler_source!(DEMO = "demo.handlers" => demo_handlers);
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use linkme::distributed_slice;
use parking_lot::RwLock;
use tracing::{debug, info, trace};

use crate::bot::BotIdentity;
use crate::context::UpdateContext;
use crate::error::ConfigurationError;
use crate::handler::BoxedHandler;

// =============================================================================
// Sources
// =============================================================================

/// Builds a fresh handler list.
pub type BuildFn = fn() -> Vec<BoxedHandler>;

/// A link-time registered handler source.
#[derive(Debug, Clone, Copy)]
pub struct HandlerSource {
    pub reference: &'static str,
    pub build: BuildFn,
}

impl HandlerSource {
    pub const fn new(reference: &'static str, build: BuildFn) -> Self {
        Self { reference, build }
    }
}

/// Handler sources contributed by any crate linked into the binary.
#[distributed_slice]
pub static HANDLER_SOURCES: [HandlerSource];

/// Registers a function as a link-time handler source.
#[macro_export]
macro_rules! handler_source {
    ($name:ident = $reference:literal => $build:path) => {
        #[$crate::linkme::distributed_slice($crate::registry::HANDLER_SOURCES)]
        #[linkme(crate = $crate::linkme)]
        static $name: $crate::registry::HandlerSource =
            $crate::registry::HandlerSource::new($reference, $build);
    };
}

/// Resolves a bot's handler-source reference into handlers.
pub trait HandlerLoader: Send + Sync {
    fn load(&self, bot: &BotIdentity) -> Result<Vec<BoxedHandler>, ConfigurationError>;
}

type Builder = Arc<dyn Fn() -> Vec<BoxedHandler> + Send + Sync>;

/// A table of handler sources keyed by reference.
#[derive(Clone, Default)]
pub struct HandlerCatalog {
    sources: HashMap<String, Builder>,
}

impl HandlerCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog holding every entry of [`HANDLER_SOURCES`].
    pub fn linked() -> Self {
        let mut catalog = Self::new();
        for source in HANDLER_SOURCES {
            catalog.register(source.reference, source.build);
        }
        debug!(sources = catalog.len(), "Linked handler sources collected");
        catalog
    }

    /// Registers `build` under `reference`, replacing any previous source.
    pub fn register<F>(&mut self, reference: impl Into<String>, build: F)
    where
        F: Fn() -> Vec<BoxedHandler> + Send + Sync + 'static,
    {
        self.sources.insert(reference.into(), Arc::new(build));
    }

    /// Registers a source (builder pattern).
    pub fn with<F>(mut self, reference: impl Into<String>, build: F) -> Self
    where
        F: Fn() -> Vec<BoxedHandler> + Send + Sync + 'static,
    {
        self.register(reference, build);
        self
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.sources.contains_key(reference)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl fmt::Debug for HandlerCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut references: Vec<_> = self.sources.keys().collect();
        references.sort();
        f.debug_struct("HandlerCatalog")
            .field("sources", &references)
            .finish()
    }
}

impl HandlerLoader for HandlerCatalog {
    fn load(&self, bot: &BotIdentity) -> Result<Vec<BoxedHandler>, ConfigurationError> {
        let build = self.sources.get(&bot.handler_source).ok_or_else(|| {
            ConfigurationError::UnknownSource {
                bot: bot.slug.clone(),
                reference: bot.handler_source.clone(),
            }
        })?;
        Ok(build())
    }
}

// =============================================================================
// HandlerChain
// =============================================================================

/// A validated, ordered handler sequence.
///
/// Names are unique and a fallback handler, if any, comes last.
#[derive(Debug, Default)]
pub struct HandlerChain {
    handlers: Vec<BoxedHandler>,
}

impl HandlerChain {
    /// Validates `handlers` loaded for `bot`.
    pub fn new(bot: &BotIdentity, handlers: Vec<BoxedHandler>) -> Result<Self, ConfigurationError> {
        let malformed = |reason: String| ConfigurationError::Malformed {
            bot: bot.slug.clone(),
            reference: bot.handler_source.clone(),
            reason,
        };

        let mut names = HashSet::new();
        for (position, handler) in handlers.iter().enumerate() {
            if !names.insert(handler.name()) {
                return Err(malformed(format!("duplicate handler name '{}'", handler.name())));
            }
            if handler.is_fallback() && position + 1 < handlers.len() {
                return Err(malformed(format!(
                    "fallback handler '{}' is followed by {} more",
                    handler.name(),
                    handlers.len() - position - 1
                )));
            }
        }
        Ok(Self { handlers })
    }

    /// The first handler matching `ctx`.
    pub fn find(&self, ctx: &UpdateContext) -> Option<&BoxedHandler> {
        self.handlers.iter().find(|handler| {
            let matched = handler.matches(ctx);
            trace!(handler = handler.name(), matched, "Handler evaluated");
            matched
        })
    }

    pub fn names(&self) -> Vec<&str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoxedHandler> {
        self.handlers.iter()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

// =============================================================================
// HandlerRegistry
// =============================================================================

/// Cache of handler chains keyed by bot slug.
///
/// A chain is built at most once per bot until [`invalidate`](Self::invalidate)
/// or [`clear`](Self::clear). Reads share a read lock and clone an `Arc`;
/// loading runs outside the lock and the first chain published for a slug wins.
pub struct HandlerRegistry {
    loader: Arc<dyn HandlerLoader>,
    chains: RwLock<HashMap<String, Arc<HandlerChain>>>,
}

impl HandlerRegistry {
    pub fn new(loader: impl HandlerLoader + 'static) -> Self {
        Self::from_arc(Arc::new(loader))
    }

    pub fn from_arc(loader: Arc<dyn HandlerLoader>) -> Self {
        Self {
            loader,
            chains: RwLock::new(HashMap::new()),
        }
    }

    /// The chain of `bot`, loading it on first access.
    pub fn handlers_for(&self, bot: &BotIdentity) -> Result<Arc<HandlerChain>, ConfigurationError> {
        if let Some(chain) = self.chains.read().get(&bot.slug) {
            return Ok(Arc::clone(chain));
        }

        let chain = Arc::new(HandlerChain::new(bot, self.loader.load(bot)?)?);
        let published = Arc::clone(
            self.chains
                .write()
                .entry(bot.slug.clone())
                .or_insert_with(|| {
                    info!(
                        bot = %bot.slug,
                        source = %bot.handler_source,
                        handlers = chain.len(),
                        "Handler chain loaded"
                    );
                    Arc::clone(&chain)
                }),
        );
        Ok(published)
    }

    /// Loads every bot not yet cached. Stops at the first broken bot.
    pub fn load_all<'a, I>(&self, bots: I) -> Result<usize, ConfigurationError>
    where
        I: IntoIterator<Item = &'a BotIdentity>,
    {
        let mut loaded = 0;
        for bot in bots {
            self.handlers_for(bot)?;
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Drops the cached chain of `slug`. Returns whether one was cached.
    pub fn invalidate(&self, slug: &str) -> bool {
        let removed = self.chains.write().remove(slug).is_some();
        if removed {
            debug!(bot = slug, "Handler chain invalidated");
        }
        removed
    }

    /// Drops every cached chain.
    pub fn clear(&self) {
        self.chains.write().clear();
    }

    /// Drops every cached chain and loads `bots` again.
    pub fn refresh<'a, I>(&self, bots: I) -> Result<usize, ConfigurationError>
    where
        I: IntoIterator<Item = &'a BotIdentity>,
    {
        self.clear();
        self.load_all(bots)
    }

    pub fn is_loaded(&self, slug: &str) -> bool {
        self.chains.read().contains_key(slug)
    }

    /// Number of cached chains.
    pub fn len(&self) -> usize {
        self.chains.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.read().is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("loaded", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{CommandHandler, DefaultHandler};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn bot(slug: &str, source: &str) -> BotIdentity {
        BotIdentity::new(slug, slug, source)
    }

    fn counting_catalog(builds: Arc<AtomicUsize>) -> HandlerCatalog {
        HandlerCatalog::new().with("demo", move || {
            builds.fetch_add(1, Ordering::SeqCst);
            vec![
                CommandHandler::new("start", "/start").boxed(),
                DefaultHandler::new("default").boxed(),
            ]
        })
    }

    #[test]
    fn test_chain_is_memoized() {
        let builds = Arc::new(AtomicUsize::new(0));
        let registry = HandlerRegistry::new(counting_catalog(Arc::clone(&builds)));
        let demo = bot("d1", "demo");

        let first = registry.handlers_for(&demo).unwrap();
        let second = registry.handlers_for(&demo).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.names(), vec!["start", "default"]);
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_first_load_publishes_one_chain() {
        let builds = Arc::new(AtomicUsize::new(0));
        let registry = HandlerRegistry::new(counting_catalog(Arc::clone(&builds)));
        let demo = bot("d1", "demo");
        let barrier = std::sync::Barrier::new(8);

        let chains: Vec<Arc<HandlerChain>> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        registry.handlers_for(&demo).unwrap()
                    })
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        let cached = registry.handlers_for(&demo).unwrap();
        for chain in &chains {
            assert!(Arc::ptr_eq(chain, &cached));
        }
        assert_eq!(cached.names(), vec!["start", "default"]);
        assert_eq!(registry.len(), 1);
        // Racing loads may build more than once, but only one is published.
        let built = builds.load(Ordering::SeqCst);
        assert!((1..=8).contains(&built));
    }

    #[test]
    fn test_invalidate_reloads() {
        let builds = Arc::new(AtomicUsize::new(0));
        let registry = HandlerRegistry::new(counting_catalog(Arc::clone(&builds)));
        let demo = bot("d1", "demo");

        registry.handlers_for(&demo).unwrap();
        assert!(registry.invalidate("d1"));
        assert!(!registry.is_loaded("d1"));
        assert!(!registry.invalidate("d1"));
        registry.handlers_for(&demo).unwrap();

        assert_eq!(builds.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_refresh_reloads_every_bot() {
        let builds = Arc::new(AtomicUsize::new(0));
        let registry = HandlerRegistry::new(counting_catalog(Arc::clone(&builds)));
        let bots = [bot("a", "demo"), bot("b", "demo")];

        assert_eq!(registry.load_all(&bots).unwrap(), 2);
        assert_eq!(registry.refresh(&bots).unwrap(), 2);
        assert_eq!(registry.len(), 2);
        assert_eq!(builds.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_unknown_source_is_an_error() {
        let registry = HandlerRegistry::new(HandlerCatalog::new());
        let err = registry.handlers_for(&bot("x", "nowhere")).unwrap_err();

        assert_eq!(
            err,
            ConfigurationError::UnknownSource {
                bot: "x".into(),
                reference: "nowhere".into(),
            }
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_names_are_malformed() {
        let catalog = HandlerCatalog::new().with("dup", || {
            vec![
                CommandHandler::new("start", "/start").boxed(),
                CommandHandler::new("start", "/begin").boxed(),
            ]
        });
        let err = HandlerRegistry::new(catalog)
            .handlers_for(&bot("x", "dup"))
            .unwrap_err();
        assert!(err.to_string().contains("duplicate handler name 'start'"));
    }

    #[test]
    fn test_handler_after_fallback_is_malformed() {
        let catalog = HandlerCatalog::new().with("late", || {
            vec![
                DefaultHandler::new("default").boxed(),
                CommandHandler::new("help", "/help").boxed(),
            ]
        });
        let err = HandlerRegistry::new(catalog)
            .handlers_for(&bot("x", "late"))
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::Malformed { .. }));
    }

    #[test]
    fn test_empty_chain_is_valid() {
        let catalog = HandlerCatalog::new().with("empty", Vec::new);
        let chain = HandlerRegistry::new(catalog)
            .handlers_for(&bot("x", "empty"))
            .unwrap();
        assert!(chain.is_empty());
    }
}
