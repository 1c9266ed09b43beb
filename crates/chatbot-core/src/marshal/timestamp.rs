//! Epoch-seconds ⇄ UTC timestamp conversion for temporal fields.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::json_type;

/// Codec for fields declared with [`FieldKind::Timestamp`](super::FieldKind::Timestamp).
///
/// The platform sends dates as integer Unix seconds; records hold them as
/// `DateTime<Utc>`. Encoding truncates to whole seconds, which is lossless for
/// every value the decoder produces.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampCodec;

impl TimestampCodec {
    /// Converts epoch seconds to a UTC timestamp, `None` when out of range.
    pub fn from_epoch(seconds: i64) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(seconds, 0)
    }

    /// Converts a UTC timestamp back to epoch seconds.
    pub fn to_epoch(timestamp: &DateTime<Utc>) -> i64 {
        timestamp.timestamp()
    }

    /// Decodes a raw payload value.
    pub fn decode(raw: &Value) -> Result<DateTime<Utc>, String> {
        let seconds = raw
            .as_i64()
            .ok_or_else(|| format!("expected integer epoch seconds, found {}", json_type(raw)))?;
        Self::from_epoch(seconds).ok_or_else(|| format!("epoch {seconds} is out of range"))
    }

    /// Encodes a timestamp as a payload integer.
    pub fn encode(timestamp: &DateTime<Utc>) -> Value {
        Value::from(Self::to_epoch(timestamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_epoch_to_utc() {
        let ts = TimestampCodec::from_epoch(1441645532).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2015, 9, 7, 17, 5, 32).unwrap());
        assert_eq!(ts.to_rfc3339(), "2015-09-07T17:05:32+00:00");
    }

    #[test]
    fn test_utc_to_epoch() {
        let ts = Utc.with_ymd_and_hms(2015, 9, 7, 17, 5, 32).unwrap();
        assert_eq!(TimestampCodec::to_epoch(&ts), 1441645532);
        assert_eq!(TimestampCodec::encode(&ts), json!(1441645532));
    }

    #[test]
    fn test_decode_rejects_non_integers() {
        assert!(TimestampCodec::decode(&json!("1441645532")).is_err());
        assert!(TimestampCodec::decode(&json!(1.5)).is_err());
    }

    #[test]
    fn test_decode_rejects_out_of_range() {
        let err = TimestampCodec::decode(&json!(i64::MAX)).unwrap_err();
        assert!(err.contains("out of range"));
    }
}
