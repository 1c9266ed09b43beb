//! The payload marshalling engine.
//!
//! Every typed record carries a static table of [`FieldDescriptor`]s. The
//! engine walks that table in both directions:
//!
//! ```text
//! payload ──from_payload──▶ FieldReader ──Record::read_fields──▶ record
//! record  ──Record::write_fields──▶ FieldWriter ──to_payload──▶ payload
//! ```
//!
//! Conversion rules per [`FieldKind`]:
//!
//! - `Scalar`: the raw JSON value is passed through.
//! - `Timestamp`: integer epoch seconds ⇄ `DateTime<Utc>` via [`TimestampCodec`].
//! - `Nested` / `List` / `ListOfLists`: the sub-mapping (or array of them, one
//!   or two levels deep) is converted recursively into the target record.
//!
//! Absent and `null` keys leave a field unset; unknown keys are ignored; unset
//! fields are omitted from encoded payloads. The engine holds no state and
//! only ever borrows the source payload.

pub mod resolver;
pub mod timestamp;
pub mod value;

use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Value};

pub use resolver::{Strategy, TypeResolver};
pub use timestamp::TimestampCodec;
pub use value::{FieldValue, FromFieldValue, IntoFieldValue};

use crate::error::{MarshalError, MarshalResult};
use crate::types::RecordKind;

// ============================================================================
// Descriptors
// ============================================================================

/// The record type a nested field points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRef {
    /// A concrete registered record.
    Kind(RecordKind),
    /// A forward reference by type name, resolved on use.
    Named(&'static str),
}

/// How a field is converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    Timestamp,
    Nested(TypeRef),
    List(TypeRef),
    ListOfLists(TypeRef),
}

impl FieldKind {
    /// The nested target, if this kind has one.
    pub fn target(&self) -> Option<TypeRef> {
        match *self {
            Self::Nested(target) | Self::List(target) | Self::ListOfLists(target) => Some(target),
            Self::Scalar | Self::Timestamp => None,
        }
    }

    /// Array nesting depth around the target record.
    pub fn depth(&self) -> usize {
        match self {
            Self::List(_) => 1,
            Self::ListOfLists(_) => 2,
            _ => 0,
        }
    }
}

/// Whether a payload must carry a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

/// One entry in a record's descriptor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Payload key.
    pub name: &'static str,
    pub kind: FieldKind,
    pub presence: Presence,
}

impl FieldDescriptor {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            presence: Presence::Required,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            presence: Presence::Optional,
        }
    }

    pub fn is_required(&self) -> bool {
        self.presence == Presence::Required
    }
}

// ============================================================================
// Record trait
// ============================================================================

/// A typed value object convertible to and from a payload mapping.
///
/// Implementations are generated by `impl_record!` from a descriptor table;
/// the struct definition itself stays a plain Rust struct.
pub trait Record: Sized + Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// The registered kind of this record.
    const KIND: RecordKind;

    /// The static descriptor table, in payload order.
    fn descriptors() -> &'static [FieldDescriptor];

    /// Builds the record from decoded field values.
    fn read_fields(fields: &mut FieldReader) -> MarshalResult<Self>;

    /// Emits every set field.
    fn write_fields(&self, fields: &mut FieldWriter);

    /// Decodes a payload. See [`from_payload`].
    fn from_payload(source: &Value) -> MarshalResult<Self> {
        from_payload(source)
    }

    /// Encodes to a payload. See [`to_payload`].
    fn to_payload(&self) -> Value {
        to_payload(self)
    }

    /// Parses JSON text and decodes it.
    fn from_json_str(text: &str) -> MarshalResult<Self> {
        let source: Value = serde_json::from_str(text)
            .map_err(|e| MarshalError::payload(Self::KIND.name(), e.to_string()))?;
        from_payload(&source)
    }

    /// Encodes to compact JSON text.
    fn to_json_string(&self) -> String {
        to_payload(self).to_string()
    }
}

// ============================================================================
// Field reader / writer
// ============================================================================

/// Decoded values for one record, keyed by payload name.
#[derive(Debug)]
pub struct FieldReader {
    record: &'static str,
    values: HashMap<&'static str, FieldValue>,
}

impl FieldReader {
    fn new(record: &'static str) -> Self {
        Self {
            record,
            values: HashMap::new(),
        }
    }

    /// Takes a required field; absence is a validation error.
    pub fn required<T: FromFieldValue>(&mut self, key: &'static str) -> MarshalResult<T> {
        self.optional(key)?
            .ok_or_else(|| MarshalError::missing(self.record, key))
    }

    /// Takes an optional field.
    pub fn optional<T: FromFieldValue>(&mut self, key: &'static str) -> MarshalResult<Option<T>> {
        self.values
            .remove(key)
            .map(|value| {
                T::from_field_value(value)
                    .map_err(|reason| MarshalError::validation(self.record, key, reason))
            })
            .transpose()
    }
}

/// Values emitted by a record during encoding.
#[derive(Debug, Default)]
pub struct FieldWriter {
    values: HashMap<&'static str, FieldValue>,
}

impl FieldWriter {
    pub fn required<T: IntoFieldValue>(&mut self, key: &'static str, value: &T) {
        self.values.insert(key, value.into_field_value());
    }

    pub fn optional<T: IntoFieldValue>(&mut self, key: &'static str, value: &Option<T>) {
        if let Some(value) = value {
            self.values.insert(key, value.into_field_value());
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Decodes `source` into record `R`.
///
/// Fails with [`MarshalError::Payload`] when `source` is not an object, with
/// [`MarshalError::Validation`] when a required field is missing or a value
/// has the wrong shape, and with [`MarshalError::TypeResolution`] when a
/// present nested field names an unregistered type.
pub fn from_payload<R: Record>(source: &Value) -> MarshalResult<R> {
    let object = source.as_object().ok_or_else(|| {
        MarshalError::payload(
            R::KIND.name(),
            format!("expected an object, found {}", json_type(source)),
        )
    })?;
    decode_record(object)
}

/// Encodes `record` into a payload object.
pub fn to_payload<R: Record>(record: &R) -> Value {
    Value::Object(encode_record(record))
}

pub(crate) fn decode_record<R: Record>(object: &Map<String, Value>) -> MarshalResult<R> {
    let record = R::KIND.name();
    let mut reader = FieldReader::new(record);
    for descriptor in R::descriptors() {
        match object.get(descriptor.name) {
            None | Some(Value::Null) => {}
            Some(raw) => {
                let value = decode_field(record, descriptor, raw)?;
                reader.values.insert(descriptor.name, value);
            }
        }
    }
    R::read_fields(&mut reader)
}

pub(crate) fn encode_record<R: Record>(record: &R) -> Map<String, Value> {
    let mut writer = FieldWriter::default();
    record.write_fields(&mut writer);

    let mut out = Map::new();
    for descriptor in R::descriptors() {
        if let Some(value) = writer.values.remove(descriptor.name) {
            out.insert(descriptor.name.to_owned(), value.into_payload());
        }
    }
    out
}

fn decode_field(
    record: &'static str,
    descriptor: &FieldDescriptor,
    raw: &Value,
) -> MarshalResult<FieldValue> {
    let field = descriptor.name;
    match descriptor.kind {
        FieldKind::Scalar => Ok(FieldValue::Scalar(raw.clone())),
        FieldKind::Timestamp => TimestampCodec::decode(raw)
            .map(FieldValue::Timestamp)
            .map_err(|reason| MarshalError::validation(record, field, reason)),
        FieldKind::Nested(target) | FieldKind::List(target) | FieldKind::ListOfLists(target) => {
            match TypeResolver::resolve(record, field, target)? {
                Strategy::Passthrough => Ok(FieldValue::Scalar(raw.clone())),
                Strategy::Record(kind) => {
                    decode_nested(record, field, kind, raw, descriptor.kind.depth())
                }
            }
        }
    }
}

fn decode_nested(
    record: &'static str,
    field: &'static str,
    kind: RecordKind,
    raw: &Value,
    depth: usize,
) -> MarshalResult<FieldValue> {
    if depth == 0 {
        let object = raw.as_object().ok_or_else(|| {
            MarshalError::validation(
                record,
                field,
                format!("expected a {} object, found {}", kind.name(), json_type(raw)),
            )
        })?;
        return kind.decode(object).map(FieldValue::Record);
    }

    let items = raw.as_array().ok_or_else(|| {
        MarshalError::validation(
            record,
            field,
            format!("expected an array, found {}", json_type(raw)),
        )
    })?;
    items
        .iter()
        .map(|item| decode_nested(record, field, kind, item, depth - 1))
        .collect::<MarshalResult<Vec<_>>>()
        .map(FieldValue::List)
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// impl_record!
// ============================================================================

/// Implements [`Record`] for a struct from its descriptor table.
///
/// ```rust,ignore
/// impl_record! {
///     Chat {
///         id: required "id" => scalar,
///         chat_type: required "type" => scalar,
///         pinned: optional "pinned_message" => nested("Message"),
///         photos: optional "photo" => list(PhotoSize),
///     }
/// }
/// ```
///
/// Kinds: `scalar`, `timestamp`, `nested(T)`, `list(T)`, `list_of_lists(T)`,
/// where `T` is a registered record ident or a quoted forward reference.
macro_rules! impl_record {
    (@kind scalar) => { $crate::marshal::FieldKind::Scalar };
    (@kind timestamp) => { $crate::marshal::FieldKind::Timestamp };
    (@kind $kind:ident ($target:ident)) => {
        $crate::marshal::impl_record!(@wrap $kind
            $crate::marshal::TypeRef::Kind($crate::types::RecordKind::$target))
    };
    (@kind $kind:ident ($target:literal)) => {
        $crate::marshal::impl_record!(@wrap $kind $crate::marshal::TypeRef::Named($target))
    };
    (@wrap nested $target:expr) => { $crate::marshal::FieldKind::Nested($target) };
    (@wrap list $target:expr) => { $crate::marshal::FieldKind::List($target) };
    (@wrap list_of_lists $target:expr) => { $crate::marshal::FieldKind::ListOfLists($target) };
    (
        $record:ident {
            $( $field:ident : $presence:ident $key:literal => $kind:ident $( ( $target:tt ) )? ),*
            $(,)?
        }
    ) => {
        impl $crate::marshal::Record for $record {
            const KIND: $crate::types::RecordKind = $crate::types::RecordKind::$record;

            fn descriptors() -> &'static [$crate::marshal::FieldDescriptor] {
                const FIELDS: &[$crate::marshal::FieldDescriptor] = &[
                    $(
                        $crate::marshal::FieldDescriptor::$presence(
                            $key,
                            $crate::marshal::impl_record!(@kind $kind $( ($target) )?),
                        ),
                    )*
                ];
                FIELDS
            }

            fn read_fields(
                fields: &mut $crate::marshal::FieldReader,
            ) -> $crate::error::MarshalResult<Self> {
                Ok(Self {
                    $( $field: fields.$presence($key)?, )*
                })
            }

            fn write_fields(&self, fields: &mut $crate::marshal::FieldWriter) {
                $( fields.$presence($key, &self.$field); )*
            }
        }
    };
}

pub(crate) use impl_record;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnyRecord, PhotoSize};
    use serde_json::json;

    #[test]
    fn test_decode_two_level_list() {
        let raw = json!([
            [{"file_id": "a", "width": 1, "height": 1}],
            [],
            [{"file_id": "b", "width": 2, "height": 2}, {"file_id": "c", "width": 3, "height": 3}],
        ]);
        let descriptor = FieldDescriptor::optional(
            "sizes",
            FieldKind::ListOfLists(TypeRef::Kind(RecordKind::PhotoSize)),
        );
        let value = decode_field("Album", &descriptor, &raw).unwrap();

        let grid = Vec::<Vec<PhotoSize>>::from_field_value(value.clone()).unwrap();
        let shape: Vec<usize> = grid.iter().map(Vec::len).collect();
        assert_eq!(shape, vec![1, 0, 2]);
        assert_eq!(grid[2][1].file_id, "c");
        assert_eq!(value.into_payload(), raw);
    }

    #[test]
    fn test_unresolvable_nested_type_is_an_error() {
        let descriptor = FieldDescriptor::optional("sticker", FieldKind::Nested(TypeRef::Named("Sticker")));
        let err = decode_field("Message", &descriptor, &json!({"file_id": "x"})).unwrap_err();
        assert!(err.is_type_resolution());
    }

    #[test]
    fn test_scalar_forward_reference_passes_through() {
        let descriptor = FieldDescriptor::optional("score", FieldKind::Nested(TypeRef::Named("int")));
        let value = decode_field("Game", &descriptor, &json!(42)).unwrap();
        assert_eq!(value, FieldValue::Scalar(json!(42)));
    }

    #[test]
    fn test_nested_shape_mismatch() {
        let descriptor = FieldDescriptor::required("user", FieldKind::Nested(TypeRef::Kind(RecordKind::User)));
        let err = decode_field("Poll", &descriptor, &json!("nobody")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid Poll payload: field 'user' expected a User object, found a string"
        );
    }

    #[test]
    fn test_decoded_record_value() {
        let value = RecordKind::Location
            .decode(json!({"longitude": 1.0, "latitude": 2.0}).as_object().unwrap())
            .unwrap();
        assert_eq!(value.kind(), RecordKind::Location);
        assert!(matches!(value, AnyRecord::Location(_)));
    }
}
