//! # Chatbot
//!
//! Typed update records and per-bot handler dispatch for webhook chat bots.
//!
//! ```text
//! ┌──────────────┐  payload  ┌────────────┐  Update  ┌──────────────┐
//! │   webhook    │──────────▶│  Runtime   │─────────▶│  Dispatcher  │──▶ open form
//! │ /hook/{slug} │           │ (config,   │          │  (per-bot    │──▶ first matching
//! └──────────────┘           │  logging)  │          │   chains)    │    handler
//!                            └────────────┘          └──────────────┘
//! ```
//!
//! - [`core`]: records, descriptors and the marshalling engine
//! - [`framework`]: bots, handlers, forms, registries and the dispatcher
//! - [`runtime`]: configuration, logging and startup
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use chatbot::prelude::*;
//!
//! async fn start(ctx: Arc<UpdateContext>) -> HandlerResult {
//!     info!(chat = ?ctx.effective_chat().map(|c| c.id), "greeting");
//!     Ok(())
//! }
//!
//! fn handlers() -> Vec<BoxedHandler> {
//!     vec![CommandHandler::new("start", "/start").callback(callback(start)).boxed()]
//! }
//!
//! handler_source!(NOTES = "notes.handlers" => handlers);
//!
//! let runtime = ChatbotRuntime::builder().build()?;
//! runtime.dispatch(&payload, "s3cr3t-slug").await?;
//! ```

pub use chatbot_core as core;
pub use chatbot_framework as framework;
pub use chatbot_runtime as runtime;

pub use chatbot_framework::handler_source;

pub mod prelude {
    pub use std::sync::Arc;

    pub use chatbot_runtime::{ChatbotConfig, ChatbotRuntime, RuntimeError};

    pub use chatbot_core::{
        CallbackQuery, Chat, InlineKeyboardButton, InlineKeyboardMarkup, InlineQuery,
        MarshalError, Message, Record, Update, UpdateKind, User,
    };

    pub use chatbot_framework::{
        Action, BotIdentity, BoxedHandler, CommandHandler, Conversation, DefaultHandler,
        DispatchError, DispatchOutcome, Dispatcher, Form, FormFactory, FormStep, Handler,
        HandlerCatalog, HandlerError, HandlerResult, UpdateContext, callback, handler_source,
    };

    pub use chatbot_runtime::prelude::*;
}
