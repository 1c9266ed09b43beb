//! Update persistence hook.
//!
//! Every parsed update is bound to its bot before any handler runs. Hosts that
//! persist updates plug their storage in here; the framework itself keeps
//! nothing.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use chatbot_core::Update;

use crate::bot::BotIdentity;
use crate::error::HandlerResult;

/// Records updates against the bot they arrived for.
#[async_trait]
pub trait UpdateStore: Send + Sync {
    async fn bind(&self, bot: &BotIdentity, update: &Update) -> HandlerResult<()>;
}

/// Discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullUpdateStore;

#[async_trait]
impl UpdateStore for NullUpdateStore {
    async fn bind(&self, _bot: &BotIdentity, _update: &Update) -> HandlerResult<()> {
        Ok(())
    }
}

/// Keeps updates in memory, grouped by bot slug in arrival order.
#[derive(Debug, Default)]
pub struct MemoryUpdateStore {
    updates: RwLock<HashMap<String, Vec<Update>>>,
}

impl MemoryUpdateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates bound to `slug`, oldest first.
    pub fn updates(&self, slug: &str) -> Vec<Update> {
        self.updates.read().get(slug).cloned().unwrap_or_default()
    }

    /// Total number of bound updates.
    pub fn len(&self) -> usize {
        self.updates.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UpdateStore for MemoryUpdateStore {
    async fn bind(&self, bot: &BotIdentity, update: &Update) -> HandlerResult<()> {
        let mut updates = self.updates.write();
        let seen = updates.entry(bot.slug.clone()).or_default();
        if seen.iter().any(|u| u.update_id == update.update_id) {
            return Err(format!("update {} already bound to '{}'", update.update_id, bot.slug).into());
        }
        seen.push(update.clone());
        Ok(())
    }
}
