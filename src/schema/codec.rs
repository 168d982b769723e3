//! Text codec for scalar property values.
//!
//! Every scalar kind has one canonical wire form: lowercase booleans,
//! decimal integers, shortest round-trip doubles, standard base64 and
//! RFC 3339 UTC date-times.

use crate::common::error::{Error, Result};
use crate::property::value::ScalarValue;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Declared type of a scalar property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Boolean,
    /// 32-bit signed integer
    Integer,
    /// 64-bit signed integer
    Long,
    Double,
    String,
    /// Byte array, base64 on the wire
    Base64,
    DateTime,
    /// One of a fixed set of names
    Enum(&'static [&'static str]),
}

impl ScalarKind {
    /// Short name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Boolean => "boolean",
            ScalarKind::Integer => "integer",
            ScalarKind::Long => "long",
            ScalarKind::Double => "double",
            ScalarKind::String => "string",
            ScalarKind::Base64 => "base64",
            ScalarKind::DateTime => "date-time",
            ScalarKind::Enum(_) => "enumeration",
        }
    }

    /// True when `value` has this kind.
    pub fn accepts(self, value: &ScalarValue) -> bool {
        match (self, value) {
            (ScalarKind::Enum(names), ScalarValue::Enum(name)) => names.contains(&name.as_str()),
            (ScalarKind::Boolean, ScalarValue::Bool(_))
            | (ScalarKind::Integer, ScalarValue::Int(_))
            | (ScalarKind::Long, ScalarValue::Long(_))
            | (ScalarKind::Double, ScalarValue::Double(_))
            | (ScalarKind::String, ScalarValue::String(_))
            | (ScalarKind::Base64, ScalarValue::Bytes(_))
            | (ScalarKind::DateTime, ScalarValue::DateTime(_)) => true,
            _ => false,
        }
    }

    /// Parse wire text into a value of this kind.
    pub fn parse(self, text: &str) -> Result<ScalarValue> {
        match self {
            ScalarKind::Boolean => parse_bool(text).map(ScalarValue::Bool),
            ScalarKind::Integer => atoi_simd::parse::<i32, false, false>(text.trim().as_bytes())
                .map(ScalarValue::Int)
                .map_err(|_| malformed(self, text)),
            ScalarKind::Long => atoi_simd::parse::<i64, false, false>(text.trim().as_bytes())
                .map(ScalarValue::Long)
                .map_err(|_| malformed(self, text)),
            ScalarKind::Double => parse_double(text).map(ScalarValue::Double),
            ScalarKind::String => Ok(ScalarValue::String(text.to_string())),
            ScalarKind::Base64 => {
                let compact: String = text.split_ascii_whitespace().collect();
                Ok(ScalarValue::Bytes(STANDARD.decode(compact)?))
            },
            ScalarKind::DateTime => parse_date_time(text).map(ScalarValue::DateTime),
            ScalarKind::Enum(names) => {
                let trimmed = text.trim();
                names
                    .iter()
                    .find(|name| **name == trimmed)
                    .map(|name| ScalarValue::Enum((*name).to_string()))
                    .ok_or_else(|| malformed(self, text))
            },
        }
    }

    /// Format a value of this kind into its wire text.
    pub fn format(self, value: &ScalarValue) -> Result<String> {
        if !self.accepts(value) {
            return Err(Error::Validation(format!(
                "Expected a {} value but got {:?}",
                self.name(),
                value
            )));
        }
        Ok(match value {
            ScalarValue::Bool(b) => if *b { "true" } else { "false" }.to_string(),
            ScalarValue::Int(i) => itoa::Buffer::new().format(*i).to_string(),
            ScalarValue::Long(l) => itoa::Buffer::new().format(*l).to_string(),
            ScalarValue::Double(d) => format_double(*d),
            ScalarValue::String(s) | ScalarValue::Enum(s) => s.clone(),
            ScalarValue::Bytes(bytes) => STANDARD.encode(bytes),
            ScalarValue::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        })
    }
}

fn malformed(kind: ScalarKind, text: &str) -> Error {
    Error::Deserialization(format!("'{}' is not a valid {} value", text, kind.name()))
}

fn parse_bool(text: &str) -> Result<bool> {
    match text.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(malformed(ScalarKind::Boolean, text)),
    }
}

fn parse_double(text: &str) -> Result<f64> {
    match text.trim() {
        "INF" => Ok(f64::INFINITY),
        "-INF" => Ok(f64::NEG_INFINITY),
        "NaN" => Ok(f64::NAN),
        trimmed => {
            fast_float2::parse::<f64, _>(trimmed).map_err(|_| malformed(ScalarKind::Double, text))
        },
    }
}

fn format_double(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "INF" } else { "-INF" }.to_string()
    } else {
        ryu::Buffer::new().format_finite(value).to_string()
    }
}

fn parse_date_time(text: &str) -> Result<DateTime<Utc>> {
    let trimmed = text.trim();
    match DateTime::parse_from_rfc3339(trimmed) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        // Some servers omit the offset; those values are UTC
        Err(err) => NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|_| Error::from(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    const IMPORTANCE: ScalarKind = ScalarKind::Enum(&["Low", "Normal", "High"]);

    #[test]
    fn test_wire_representations() {
        assert_eq!(ScalarKind::Boolean.format(&ScalarValue::Bool(true)).unwrap(), "true");
        assert_eq!(ScalarKind::Boolean.format(&ScalarValue::Bool(false)).unwrap(), "false");
        assert_eq!(
            ScalarKind::Base64
                .format(&ScalarValue::Bytes(b"hello".to_vec()))
                .unwrap(),
            "aGVsbG8="
        );
        let dt = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        assert_eq!(
            ScalarKind::DateTime.format(&ScalarValue::DateTime(dt)).unwrap(),
            "2024-03-09T14:05:00Z"
        );
        assert_eq!(ScalarKind::Double.format(&ScalarValue::Double(1.5)).unwrap(), "1.5");
        assert_eq!(
            ScalarKind::Double
                .format(&ScalarValue::Double(f64::NEG_INFINITY))
                .unwrap(),
            "-INF"
        );
    }

    #[test]
    fn test_malformed_text_is_deserialization_error() {
        for (kind, text) in [
            (ScalarKind::Boolean, "yes"),
            (ScalarKind::Boolean, ""),
            (ScalarKind::Integer, "2147483648"),
            (ScalarKind::Integer, "12a"),
            (ScalarKind::Long, ""),
            (ScalarKind::Double, "one"),
            (ScalarKind::Base64, "@@@"),
            (ScalarKind::DateTime, "yesterday"),
            (IMPORTANCE, "Urgent"),
        ] {
            let err = kind.parse(text).unwrap_err();
            assert!(
                matches!(err, Error::Deserialization(_)),
                "{:?} accepted {:?}",
                kind,
                text
            );
        }
    }

    #[test]
    fn test_lenient_forms() {
        assert_eq!(ScalarKind::Boolean.parse("1").unwrap(), ScalarValue::Bool(true));
        assert_eq!(ScalarKind::Integer.parse(" 42 ").unwrap(), ScalarValue::Int(42));
        assert_eq!(
            ScalarKind::DateTime.parse("2024-03-09T14:05:00").unwrap(),
            ScalarValue::DateTime(Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap())
        );
        assert_eq!(
            ScalarKind::DateTime.parse("2024-03-09T16:05:00+02:00").unwrap(),
            ScalarValue::DateTime(Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap())
        );
    }

    #[test]
    fn test_format_rejects_wrong_kind() {
        assert!(ScalarKind::Integer.format(&ScalarValue::Bool(true)).is_err());
        assert!(
            IMPORTANCE
                .format(&ScalarValue::Enum("Urgent".to_string()))
                .is_err()
        );
    }

    proptest! {
        #[test]
        fn prop_integer_round_trip(v in any::<i32>()) {
            let text = ScalarKind::Integer.format(&ScalarValue::Int(v)).unwrap();
            prop_assert_eq!(ScalarKind::Integer.parse(&text).unwrap(), ScalarValue::Int(v));
        }

        #[test]
        fn prop_long_round_trip(v in any::<i64>()) {
            let text = ScalarKind::Long.format(&ScalarValue::Long(v)).unwrap();
            prop_assert_eq!(ScalarKind::Long.parse(&text).unwrap(), ScalarValue::Long(v));
        }

        #[test]
        fn prop_double_round_trip(v in any::<f64>().prop_filter("finite", |v| v.is_finite())) {
            let text = ScalarKind::Double.format(&ScalarValue::Double(v)).unwrap();
            prop_assert_eq!(ScalarKind::Double.parse(&text).unwrap(), ScalarValue::Double(v));
        }

        #[test]
        fn prop_bytes_round_trip(v in proptest::collection::vec(any::<u8>(), 0..64)) {
            let text = ScalarKind::Base64.format(&ScalarValue::Bytes(v.clone())).unwrap();
            prop_assert_eq!(ScalarKind::Base64.parse(&text).unwrap(), ScalarValue::Bytes(v));
        }

        #[test]
        fn prop_string_round_trip(v in ".*") {
            let text = ScalarKind::String.format(&ScalarValue::String(v.clone())).unwrap();
            prop_assert_eq!(ScalarKind::String.parse(&text).unwrap(), ScalarValue::String(v));
        }

        #[test]
        fn prop_date_time_round_trip(secs in 0i64..4_102_444_800, nanos in 0u32..1_000_000_000) {
            let dt = Utc.timestamp_opt(secs, nanos).unwrap();
            let text = ScalarKind::DateTime.format(&ScalarValue::DateTime(dt)).unwrap();
            prop_assert_eq!(ScalarKind::DateTime.parse(&text).unwrap(), ScalarValue::DateTime(dt));
        }

        #[test]
        fn prop_bool_round_trip(v in any::<bool>()) {
            let text = ScalarKind::Boolean.format(&ScalarValue::Bool(v)).unwrap();
            prop_assert_eq!(ScalarKind::Boolean.parse(&text).unwrap(), ScalarValue::Bool(v));
        }
    }
}
