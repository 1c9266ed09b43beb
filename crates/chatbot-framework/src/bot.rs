//! Bot identities and slug resolution.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{DispatchError, DispatchResult};

/// A configured bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    /// Opaque routing key, usually the last path segment of the webhook URL.
    pub slug: String,
    pub name: String,
    /// Reference resolved by the handler loader.
    pub handler_source: String,
}

impl BotIdentity {
    pub fn new(
        slug: impl Into<String>,
        name: impl Into<String>,
        handler_source: impl Into<String>,
    ) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            handler_source: handler_source.into(),
        }
    }
}

/// Looks up bots by slug.
pub trait BotResolver: Send + Sync {
    /// Resolves a slug, [`DispatchError::NotFound`] when unknown.
    fn resolve(&self, slug: &str) -> DispatchResult<Arc<BotIdentity>>;

    /// Every known bot.
    fn bots(&self) -> Vec<Arc<BotIdentity>>;
}

/// A fixed set of bots, typically built from configuration.
#[derive(Debug, Default, Clone)]
pub struct StaticBotResolver {
    bots: HashMap<String, Arc<BotIdentity>>,
    order: Vec<String>,
}

impl StaticBotResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a bot. A later bot with the same slug replaces the earlier one.
    pub fn insert(&mut self, bot: BotIdentity) {
        if !self.bots.contains_key(&bot.slug) {
            self.order.push(bot.slug.clone());
        }
        self.bots.insert(bot.slug.clone(), Arc::new(bot));
    }

    /// Adds a bot (builder pattern).
    pub fn with(mut self, bot: BotIdentity) -> Self {
        self.insert(bot);
        self
    }

    pub fn len(&self) -> usize {
        self.bots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bots.is_empty()
    }
}

impl FromIterator<BotIdentity> for StaticBotResolver {
    fn from_iter<I: IntoIterator<Item = BotIdentity>>(iter: I) -> Self {
        let mut resolver = Self::new();
        for bot in iter {
            resolver.insert(bot);
        }
        resolver
    }
}

impl BotResolver for StaticBotResolver {
    fn resolve(&self, slug: &str) -> DispatchResult<Arc<BotIdentity>> {
        self.bots
            .get(slug)
            .cloned()
            .ok_or_else(|| DispatchError::not_found(slug))
    }

    fn bots(&self) -> Vec<Arc<BotIdentity>> {
        self.order
            .iter()
            .filter_map(|slug| self.bots.get(slug).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_and_unknown() {
        let resolver: StaticBotResolver = [
            BotIdentity::new("a1", "Alpha", "alpha"),
            BotIdentity::new("b2", "Beta", "beta"),
        ]
        .into_iter()
        .collect();

        assert_eq!(resolver.resolve("b2").unwrap().name, "Beta");
        assert!(resolver.resolve("zz").unwrap_err().is_not_found());
    }

    #[test]
    fn test_bots_keep_insertion_order() {
        let resolver = StaticBotResolver::new()
            .with(BotIdentity::new("z", "Z", "z"))
            .with(BotIdentity::new("a", "A", "a"))
            .with(BotIdentity::new("z", "Z2", "z"));

        let slugs: Vec<_> = resolver.bots().iter().map(|b| b.slug.clone()).collect();
        assert_eq!(slugs, vec!["z", "a"]);
        assert_eq!(resolver.resolve("z").unwrap().name, "Z2");
        assert_eq!(resolver.len(), 2);
    }
}
