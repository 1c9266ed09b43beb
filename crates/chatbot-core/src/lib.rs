//! # Chatbot Core
//!
//! Typed update records and the bidirectional payload marshalling engine.
//!
//! ## Layers
//!
//! - **Marshalling** ([`marshal`]): descriptor-driven `payload ⇄ record`
//!   conversion with nested records, lists, lists of lists, forward-referenced
//!   types and epoch-second timestamps.
//! - **Records** ([`types`]): the shipped subset of the platform schema, rooted
//!   at [`Update`], plus the closed [`RecordKind`] registry.
//!
//! ## Example
//!
//! ```rust,ignore
//! use chatbot_core::{Record, Update};
//! use serde_json::json;
//!
//! let update = Update::from_payload(&json!({
//!     "update_id": 1,
//!     "message": {
//!         "message_id": 1,
//!         "date": 1441645532,
//!         "chat": {"id": 1, "type": "private"},
//!         "text": "/start",
//!     },
//! }))?;
//!
//! assert_eq!(update.effective_message().and_then(|m| m.text.as_deref()), Some("/start"));
//! ```

pub mod error;
pub mod marshal;
pub mod types;

pub use error::{MarshalError, MarshalResult};

pub use marshal::{
    FieldDescriptor, FieldKind, FieldValue, Presence, Record, Strategy, TimestampCodec, TypeRef,
    TypeResolver, from_payload, to_payload,
};

pub use types::{
    AnyRecord, CallbackQuery, Chat, ChosenInlineResult, Contact, Document, InlineKeyboardButton,
    InlineKeyboardMarkup, InlineQuery, Location, Message, MessageEntity, PhotoSize, Poll,
    PollAnswer, PollOption, RecordKind, Update, UpdateKind, User,
};
