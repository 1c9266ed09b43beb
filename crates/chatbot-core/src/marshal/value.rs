//! Intermediate field values shared by the decoder and the encoder.
//!
//! The engine turns each payload entry into a [`FieldValue`] according to the
//! field's descriptor, and records pull typed values out of it through
//! [`FromFieldValue`]. Encoding runs the other way through [`IntoFieldValue`].

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::timestamp::TimestampCodec;
use crate::types::AnyRecord;

/// A decoded (or about-to-be-encoded) field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Raw JSON passed through unchanged.
    Scalar(Value),
    /// A decoded temporal field.
    Timestamp(DateTime<Utc>),
    /// A decoded nested record.
    Record(AnyRecord),
    /// A nested record already encoded back to a payload mapping.
    Object(Map<String, Value>),
    /// A list of values, one level of nesting per `List`.
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// Short description used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "a scalar",
            Self::Timestamp(_) => "a timestamp",
            Self::Record(any) => any.kind().name(),
            Self::Object(_) => "an encoded record",
            Self::List(_) => "a list",
        }
    }

    /// Converts this value to its payload form.
    pub fn into_payload(self) -> Value {
        match self {
            Self::Scalar(raw) => raw,
            Self::Timestamp(ts) => TimestampCodec::encode(&ts),
            Self::Record(any) => any.to_payload(),
            Self::Object(map) => Value::Object(map),
            Self::List(items) => Value::Array(items.into_iter().map(Self::into_payload).collect()),
        }
    }
}

/// Extracts a typed value from a [`FieldValue`].
///
/// The error is a bare reason; the caller attaches record and field names.
pub trait FromFieldValue: Sized {
    fn from_field_value(value: FieldValue) -> Result<Self, String>;
}

/// Produces a [`FieldValue`] from a typed value.
pub trait IntoFieldValue {
    fn into_field_value(&self) -> FieldValue;
}

macro_rules! scalar_field {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromFieldValue for $ty {
                fn from_field_value(value: FieldValue) -> Result<Self, String> {
                    match value {
                        FieldValue::Scalar(raw) => {
                            serde_json::from_value(raw).map_err(|e| e.to_string())
                        }
                        other => Err(format!("expected a scalar, found {}", other.describe())),
                    }
                }
            }

            impl IntoFieldValue for $ty {
                fn into_field_value(&self) -> FieldValue {
                    FieldValue::Scalar(Value::from(self.to_owned()))
                }
            }
        )*
    };
}

scalar_field!(i64, i32, f64, bool, String);

impl FromFieldValue for Value {
    fn from_field_value(value: FieldValue) -> Result<Self, String> {
        Ok(value.into_payload())
    }
}

impl IntoFieldValue for Value {
    fn into_field_value(&self) -> FieldValue {
        FieldValue::Scalar(self.clone())
    }
}

impl FromFieldValue for DateTime<Utc> {
    fn from_field_value(value: FieldValue) -> Result<Self, String> {
        match value {
            FieldValue::Timestamp(ts) => Ok(ts),
            FieldValue::Scalar(raw) => TimestampCodec::decode(&raw),
            other => Err(format!("expected a timestamp, found {}", other.describe())),
        }
    }
}

impl IntoFieldValue for DateTime<Utc> {
    fn into_field_value(&self) -> FieldValue {
        FieldValue::Timestamp(*self)
    }
}

impl<T: FromFieldValue> FromFieldValue for Vec<T> {
    fn from_field_value(value: FieldValue) -> Result<Self, String> {
        match value {
            FieldValue::List(items) => items.into_iter().map(T::from_field_value).collect(),
            // Lists of plain scalars stay raw JSON arrays after decoding.
            FieldValue::Scalar(Value::Array(items)) => items
                .into_iter()
                .map(|item| T::from_field_value(FieldValue::Scalar(item)))
                .collect(),
            other => Err(format!("expected a list, found {}", other.describe())),
        }
    }
}

impl<T: IntoFieldValue> IntoFieldValue for Vec<T> {
    fn into_field_value(&self) -> FieldValue {
        FieldValue::List(self.iter().map(IntoFieldValue::into_field_value).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_extraction() {
        let n = i64::from_field_value(FieldValue::Scalar(json!(42))).unwrap();
        assert_eq!(n, 42);

        let err = i64::from_field_value(FieldValue::Scalar(json!("42"))).unwrap_err();
        assert!(err.contains("invalid type"));
    }

    #[test]
    fn test_scalar_list_from_raw_array() {
        let words = Vec::<String>::from_field_value(FieldValue::Scalar(json!(["a", "b"]))).unwrap();
        assert_eq!(words, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_list_into_payload() {
        let value = vec![1i64, 2, 3].into_field_value();
        assert_eq!(value.into_payload(), json!([1, 2, 3]));
    }
}
