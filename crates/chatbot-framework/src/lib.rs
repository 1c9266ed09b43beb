//! # Chatbot Framework
//!
//! Routes typed updates to per-bot handler chains and multi-step forms.
//!
//! This layer provides:
//! - Bot identities and slug resolution ([`BotResolver`])
//! - Handlers: command, default and form-opening ([`Handler`], [`Action`])
//! - Form contract and in-memory form tracking ([`Form`], [`FormStore`])
//! - Cached, validated handler chains per bot ([`HandlerRegistry`])
//! - The dispatcher, usable directly or as a tower service ([`Dispatcher`])
//!
//! ```text
//! payload ──▶ Dispatcher ──▶ open Form?  ──yes──▶ Form::advance
//!                               │ no
//!                               ▼
//!                         HandlerChain ──first match──▶ Action::run
//! ```

pub mod bot;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod form;
pub mod handler;
pub mod registry;
pub mod store;

pub use linkme;

pub use bot::{BotIdentity, BotResolver, StaticBotResolver};
pub use context::UpdateContext;
pub use dispatcher::{DispatchOutcome, DispatchRequest, Dispatcher};
pub use error::{
    ConfigurationError, DispatchError, DispatchResult, HandlerError, HandlerResult,
};
pub use form::{
    Conversation, Form, FormFactory, FormStep, FormStore, InMemoryFormStore, SharedForm,
};
pub use handler::{
    Action, BoxedHandler, Callback, CommandHandler, DefaultHandler, Handler, callback,
};
pub use registry::{
    HANDLER_SOURCES, HandlerCatalog, HandlerChain, HandlerLoader, HandlerRegistry, HandlerSource,
};
pub use store::{MemoryUpdateStore, NullUpdateStore, UpdateStore};
