//! Typed records of the messaging platform schema.
//!
//! Every record is a plain struct with an `impl_record!` descriptor table.
//! The closed set of records is listed once in `registry!` below, which
//! generates [`RecordKind`] (the tag used for type resolution) and
//! [`AnyRecord`] (the matching sum of decoded values).

pub mod keyboard;
pub mod message;
pub mod poll;
pub mod query;
pub mod update;
pub mod user;

use serde_json::{Map, Value};

pub use keyboard::{InlineKeyboardButton, InlineKeyboardMarkup};
pub use message::{Contact, Document, Location, Message, MessageEntity, PhotoSize};
pub use poll::{Poll, PollAnswer, PollOption};
pub use query::{CallbackQuery, ChosenInlineResult, InlineQuery};
pub use update::{Update, UpdateKind};
pub use user::{Chat, User};

use crate::error::MarshalResult;
use crate::marshal::{
    FieldDescriptor, FieldValue, FromFieldValue, IntoFieldValue, Record, decode_record,
    encode_record,
};

macro_rules! registry {
    ($($kind:ident),* $(,)?) => {
        /// Tag of every registered record type.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum RecordKind {
            $($kind,)*
        }

        impl RecordKind {
            /// Every registered kind, in declaration order.
            pub const ALL: &'static [RecordKind] = &[$(RecordKind::$kind,)*];

            /// The type name used by forward references.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$kind => stringify!($kind),)*
                }
            }

            /// Looks up a kind by type name.
            pub fn from_name(name: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|kind| kind.name() == name)
            }

            /// The descriptor table of this kind.
            pub fn descriptors(self) -> &'static [FieldDescriptor] {
                match self {
                    $(Self::$kind => <$kind as Record>::descriptors(),)*
                }
            }

            /// Decodes a payload object as this kind.
            pub fn decode(self, object: &Map<String, Value>) -> MarshalResult<AnyRecord> {
                match self {
                    $(Self::$kind => {
                        decode_record::<$kind>(object).map(|record| AnyRecord::$kind(Box::new(record)))
                    })*
                }
            }
        }

        /// A decoded record of any registered kind.
        #[derive(Debug, Clone, PartialEq)]
        pub enum AnyRecord {
            $($kind(Box<$kind>),)*
        }

        impl AnyRecord {
            pub fn kind(&self) -> RecordKind {
                match self {
                    $(Self::$kind(_) => RecordKind::$kind,)*
                }
            }

            pub fn to_payload(&self) -> Value {
                match self {
                    $(Self::$kind(record) => record.to_payload(),)*
                }
            }
        }

        $(
            impl FromFieldValue for $kind {
                fn from_field_value(value: FieldValue) -> Result<Self, String> {
                    match value {
                        FieldValue::Record(AnyRecord::$kind(record)) => Ok(*record),
                        FieldValue::Scalar(Value::Object(object)) => {
                            decode_record(&object).map_err(|e| e.to_string())
                        }
                        other => Err(format!(
                            "expected a {} record, found {}",
                            stringify!($kind),
                            other.describe()
                        )),
                    }
                }
            }

            impl FromFieldValue for Box<$kind> {
                fn from_field_value(value: FieldValue) -> Result<Self, String> {
                    <$kind>::from_field_value(value).map(Box::new)
                }
            }

            impl IntoFieldValue for $kind {
                fn into_field_value(&self) -> FieldValue {
                    FieldValue::Object(encode_record(self))
                }
            }

            impl IntoFieldValue for Box<$kind> {
                fn into_field_value(&self) -> FieldValue {
                    FieldValue::Object(encode_record(self.as_ref()))
                }
            }

            impl From<$kind> for AnyRecord {
                fn from(record: $kind) -> Self {
                    Self::$kind(Box::new(record))
                }
            }
        )*
    };
}

registry! {
    User,
    Chat,
    Message,
    MessageEntity,
    PhotoSize,
    Document,
    Location,
    Contact,
    InlineKeyboardButton,
    InlineKeyboardMarkup,
    CallbackQuery,
    InlineQuery,
    ChosenInlineResult,
    Poll,
    PollOption,
    PollAnswer,
    Update,
}
