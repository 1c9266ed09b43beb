//! Per-update dispatch context.

use std::fmt;
use std::sync::Arc;

use chatbot_core::{Chat, Message, Update, User};

use crate::bot::BotIdentity;
use crate::form::{Conversation, FormStore};

/// Everything a handler or form sees about one update.
///
/// Created once per dispatch and shared behind an `Arc`; dropped when the
/// dispatch finishes.
pub struct UpdateContext {
    bot: Arc<BotIdentity>,
    update: Update,
    forms: Arc<dyn FormStore>,
}

impl UpdateContext {
    pub fn new(bot: Arc<BotIdentity>, update: Update, forms: Arc<dyn FormStore>) -> Self {
        Self { bot, update, forms }
    }

    pub fn bot(&self) -> &BotIdentity {
        &self.bot
    }

    pub fn update(&self) -> &Update {
        &self.update
    }

    /// The form store, for callbacks that open or close forms themselves.
    pub fn forms(&self) -> &Arc<dyn FormStore> {
        &self.forms
    }

    pub fn conversation(&self) -> Option<Conversation> {
        Conversation::of(&self.bot.slug, &self.update)
    }

    pub fn effective_user(&self) -> Option<&User> {
        self.update.effective_user()
    }

    pub fn effective_message(&self) -> Option<&Message> {
        self.update.effective_message()
    }

    pub fn effective_chat(&self) -> Option<&Chat> {
        self.update.effective_chat()
    }

    /// Text of the effective message.
    pub fn text(&self) -> Option<&str> {
        self.effective_message()?.text.as_deref()
    }
}

impl fmt::Debug for UpdateContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateContext")
            .field("bot", &self.bot.slug)
            .field("update_id", &self.update.update_id)
            .field("kind", &self.update.kind())
            .finish()
    }
}
