use std::sync::Arc;

use tracing::trace;

use super::{Action, BoxedHandler, Callback, Handler};
use crate::context::UpdateContext;
use crate::form::FormFactory;

/// Matches when the effective message's text equals `command` exactly.
///
/// `"/start"` matches `/start` only; `/start now` and `/start@bot` do not.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    name: String,
    command: String,
    action: Action,
}

impl CommandHandler {
    /// Creates a handler that swallows its command until an action is set.
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            action: Action::Ignore,
        }
    }

    pub fn callback(mut self, callback: Callback) -> Self {
        self.action = Action::Callback(callback);
        self
    }

    pub fn form(mut self, factory: Arc<dyn FormFactory>) -> Self {
        self.action = Action::OpenForm(factory);
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn boxed(self) -> BoxedHandler {
        Arc::new(self)
    }
}

impl Handler for CommandHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, ctx: &UpdateContext) -> bool {
        let matched = ctx.text() == Some(self.command.as_str());
        trace!(handler = %self.name, command = %self.command, matched, "Command check");
        matched
    }

    fn action(&self) -> &Action {
        &self.action
    }
}
