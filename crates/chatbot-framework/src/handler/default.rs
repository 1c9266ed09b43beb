use std::sync::Arc;

use super::{Action, BoxedHandler, Callback, Handler};
use crate::context::UpdateContext;
use crate::form::FormFactory;

/// Matches every update. Only valid as the last handler of a chain.
#[derive(Debug, Clone)]
pub struct DefaultHandler {
    name: String,
    action: Action,
}

impl DefaultHandler {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
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

    pub fn boxed(self) -> BoxedHandler {
        Arc::new(self)
    }
}

impl Handler for DefaultHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, _ctx: &UpdateContext) -> bool {
        true
    }

    fn action(&self) -> &Action {
        &self.action
    }

    fn is_fallback(&self) -> bool {
        true
    }
}
