//! Handlers: a match predicate plus an action.
//!
//! A bot's handlers form an ordered chain. For every update not captured by
//! an open form, the dispatcher invokes the action of the first handler whose
//! [`matches`](Handler::matches) returns `true`, and nothing else.
//!
//! # Variants
//!
//! - [`CommandHandler`]: exact text match against a command token.
//! - [`DefaultHandler`]: catch-all, must be the last in its chain.
//!
//! Either one runs a [`Callback`] or opens a form:
//!
//! ```rust,ignore
//! use chatbot_framework::{CommandHandler, DefaultHandler, callback};
//!
//! let handlers = vec![
//!     CommandHandler::new("start", "/start").callback(callback(start)).boxed(),
//!     CommandHandler::new("add", "/add").form(AddNoteForm::factory()).boxed(),
//!     DefaultHandler::new("default").callback(callback(echo)).boxed(),
//! ];
//! ```

pub mod command;
pub mod default;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::context::UpdateContext;
use crate::error::{DispatchError, DispatchResult, HandlerResult};
use crate::form::{FormFactory, advance_form};

pub use command::CommandHandler;
pub use default::DefaultHandler;

/// A type-erased handler callback.
pub type Callback =
    Arc<dyn Fn(Arc<UpdateContext>) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Wraps an async function as a [`Callback`].
pub fn callback<F, Fut>(f: F) -> Callback
where
    F: Fn(Arc<UpdateContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |ctx| f(ctx).boxed())
}

/// What a handler does once it matched.
#[derive(Clone)]
pub enum Action {
    /// Run a callback.
    Callback(Callback),
    /// Open a new form for the conversation and feed it the triggering update.
    OpenForm(Arc<dyn FormFactory>),
    /// Do nothing; the update is swallowed.
    Ignore,
}

impl Action {
    /// Runs the action for `ctx`.
    pub async fn run(&self, ctx: Arc<UpdateContext>) -> DispatchResult<()> {
        match self {
            Self::Callback(callback) => callback(ctx).await.map_err(DispatchError::Handler),
            Self::OpenForm(factory) => open_form(factory.as_ref(), ctx).await,
            Self::Ignore => Ok(()),
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callback(_) => f.write_str("Callback"),
            Self::OpenForm(factory) => f.debug_tuple("OpenForm").field(&factory.name()).finish(),
            Self::Ignore => f.write_str("Ignore"),
        }
    }
}

async fn open_form(factory: &dyn FormFactory, ctx: Arc<UpdateContext>) -> DispatchResult<()> {
    let Some(conversation) = ctx.conversation() else {
        warn!(
            form = factory.name(),
            update_id = ctx.update().update_id,
            "Update has no chat, form not opened"
        );
        return Ok(());
    };

    let form = factory.create(&conversation);
    let shared = ctx.forms().open(conversation.clone(), form).await;
    debug!(
        form = factory.name(),
        conversation = %conversation,
        chat_id = conversation.chat_id,
        "Advancing new form"
    );

    advance_form(ctx.forms().as_ref(), &conversation, &shared, &ctx).await?;
    Ok(())
}

/// One entry of a bot's handler chain.
pub trait Handler: Send + Sync {
    /// Unique name within the chain.
    fn name(&self) -> &str;

    /// Whether this handler takes the update.
    fn matches(&self, ctx: &UpdateContext) -> bool;

    fn action(&self) -> &Action;

    /// `true` for catch-all handlers, which must close their chain.
    fn is_fallback(&self) -> bool {
        false
    }
}

/// A shared, type-erased handler.
pub type BoxedHandler = Arc<dyn Handler>;

impl fmt::Debug for dyn Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name())
            .field("action", self.action())
            .field("fallback", &self.is_fallback())
            .finish()
    }
}
