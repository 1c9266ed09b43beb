//! Multi-step forms.
//!
//! A form captures every update of one [`Conversation`] until it reports
//! [`FormStep::Complete`]. While a form is open the handler chain is not
//! consulted at all for that conversation.
//!
//! The form's internal state machine is the form's own business; the
//! framework only drives it through [`Form::advance`] and tracks open forms
//! in a [`FormStore`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use chatbot_core::Update;

use crate::context::UpdateContext;
use crate::error::{DispatchError, DispatchResult, HandlerResult};

/// The key an open form is tracked under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Conversation {
    pub bot: String,
    pub chat_id: i64,
}

impl Conversation {
    pub fn new(bot: impl Into<String>, chat_id: i64) -> Self {
        Self {
            bot: bot.into(),
            chat_id,
        }
    }

    /// The conversation an update belongs to, `None` when it carries no chat
    /// (inline queries, poll answers).
    pub fn of(bot: &str, update: &Update) -> Option<Self> {
        update
            .effective_chat()
            .map(|chat| Self::new(bot, chat.id))
    }
}

impl fmt::Display for Conversation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bot, self.chat_id)
    }
}

/// What a form reports after consuming an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormStep {
    /// Keep capturing this conversation.
    Continue,
    /// The form is done and can be closed.
    Complete,
}

/// One running form instance.
#[async_trait]
pub trait Form: Send {
    /// Consumes one update.
    async fn advance(&mut self, ctx: &UpdateContext) -> HandlerResult<FormStep>;
}

/// Creates form instances for a form-opening handler.
pub trait FormFactory: Send + Sync {
    fn name(&self) -> &str;

    fn create(&self, conversation: &Conversation) -> Box<dyn Form>;
}

/// A form shared between the store and the dispatch advancing it.
pub type SharedForm = Arc<Mutex<Box<dyn Form>>>;

/// Tracks open forms per conversation.
#[async_trait]
pub trait FormStore: Send + Sync {
    /// The open form of `conversation`, if any.
    async fn active(&self, conversation: &Conversation) -> Option<SharedForm>;

    /// Registers `form` as the open form of `conversation`, replacing any
    /// previous one.
    async fn open(&self, conversation: Conversation, form: Box<dyn Form>) -> SharedForm;

    /// Closes the open form of `conversation`. Closing nothing is a no-op.
    async fn close(&self, conversation: &Conversation);
}

/// Process-local [`FormStore`].
#[derive(Default)]
pub struct InMemoryFormStore {
    forms: RwLock<HashMap<Conversation, SharedForm>>,
}

impl InMemoryFormStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open forms.
    pub fn len(&self) -> usize {
        self.forms.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.read().is_empty()
    }

    pub fn is_open(&self, conversation: &Conversation) -> bool {
        self.forms.read().contains_key(conversation)
    }
}

impl fmt::Debug for InMemoryFormStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryFormStore")
            .field("open", &self.len())
            .finish()
    }
}

#[async_trait]
impl FormStore for InMemoryFormStore {
    async fn active(&self, conversation: &Conversation) -> Option<SharedForm> {
        self.forms.read().get(conversation).cloned()
    }

    async fn open(&self, conversation: Conversation, form: Box<dyn Form>) -> SharedForm {
        let shared: SharedForm = Arc::new(Mutex::new(form));
        debug!(conversation = %conversation, "Form opened");
        self.forms.write().insert(conversation, Arc::clone(&shared));
        shared
    }

    async fn close(&self, conversation: &Conversation) {
        if self.forms.write().remove(conversation).is_some() {
            debug!(conversation = %conversation, "Form closed");
        }
    }
}

/// Advances `form` once with `ctx`, closing it when it completes or fails.
pub(crate) async fn advance_form(
    forms: &dyn FormStore,
    conversation: &Conversation,
    form: &SharedForm,
    ctx: &UpdateContext,
) -> DispatchResult<FormStep> {
    let result = form.lock().await.advance(ctx).await;
    match result {
        Ok(FormStep::Continue) => Ok(FormStep::Continue),
        Ok(FormStep::Complete) => {
            forms.close(conversation).await;
            Ok(FormStep::Complete)
        }
        Err(err) => {
            warn!(
                conversation = %conversation,
                chat_id = conversation.chat_id,
                error = %err,
                "Form failed, closing it"
            );
            forms.close(conversation).await;
            Err(DispatchError::Form(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[async_trait]
    impl Form for Noop {
        async fn advance(&mut self, _ctx: &UpdateContext) -> HandlerResult<FormStep> {
            Ok(FormStep::Complete)
        }
    }

    #[tokio::test]
    async fn test_open_and_close() {
        let store = InMemoryFormStore::new();
        let conversation = Conversation::new("demo", 42);

        assert!(store.active(&conversation).await.is_none());
        store.open(conversation.clone(), Box::new(Noop)).await;
        assert!(store.is_open(&conversation));
        assert!(store.active(&Conversation::new("other", 42)).await.is_none());

        store.close(&conversation).await;
        store.close(&conversation).await;
        assert!(store.is_empty());
    }

    #[test]
    fn test_reopen_replaces_form() {
        tokio_test::block_on(async {
            let store = InMemoryFormStore::new();
            let conversation = Conversation::new("demo", 1);

            store.open(conversation.clone(), Box::new(Noop)).await;
            let first = store.active(&conversation).await.unwrap();
            store.open(conversation.clone(), Box::new(Noop)).await;
            let second = store.active(&conversation).await.unwrap();

            assert_eq!(store.len(), 1);
            assert!(!Arc::ptr_eq(&first, &second));
        });
    }

    #[test]
    fn test_conversation_display() {
        assert_eq!(Conversation::new("demo", -7).to_string(), "demo/-7");
    }
}
