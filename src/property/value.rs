//! Values stored in a property bag.

use crate::property::complex::ComplexProperty;
use chrono::{DateTime, Utc};
use std::fmt;

/// A typed scalar value.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    DateTime(DateTime<Utc>),
    /// Name of an enumeration member
    Enum(String),
}

impl ScalarValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScalarValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            ScalarValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ScalarValue::Long(l) => Some(*l),
            ScalarValue::Int(i) => Some(i64::from(*i)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// String or enumeration text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::String(s) | ScalarValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ScalarValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_date_time(&self) -> Option<DateTime<Utc>> {
        match self {
            ScalarValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

/// Current value of one property.
///
/// `Null` means the property is known to have no value, which is different
/// from the property never having been loaded.
pub enum PropertyValue {
    Null,
    Scalar(ScalarValue),
    Complex(Box<dyn ComplexProperty>),
}

impl PropertyValue {
    /// Wrap a complex value.
    pub fn complex<T: ComplexProperty + 'static>(value: T) -> Self {
        PropertyValue::Complex(Box::new(value))
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            PropertyValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<&dyn ComplexProperty> {
        match self {
            PropertyValue::Complex(c) => Some(c.as_ref()),
            _ => None,
        }
    }

    /// Downcast a complex value to its concrete type.
    pub fn downcast_ref<T: ComplexProperty + 'static>(&self) -> Option<&T> {
        self.as_complex()
            .and_then(|c| c.as_any().downcast_ref::<T>())
    }
}

impl Clone for PropertyValue {
    fn clone(&self) -> Self {
        match self {
            PropertyValue::Null => PropertyValue::Null,
            PropertyValue::Scalar(s) => PropertyValue::Scalar(s.clone()),
            PropertyValue::Complex(c) => PropertyValue::Complex(c.clone_box()),
        }
    }
}

impl fmt::Debug for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Null => f.write_str("Null"),
            PropertyValue::Scalar(s) => f.debug_tuple("Scalar").field(s).finish(),
            PropertyValue::Complex(c) => f.debug_tuple("Complex").field(c).finish(),
        }
    }
}

impl From<ScalarValue> for PropertyValue {
    fn from(value: ScalarValue) -> Self {
        PropertyValue::Scalar(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Scalar(ScalarValue::Bool(value))
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::Scalar(ScalarValue::Int(value))
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Scalar(ScalarValue::Long(value))
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Scalar(ScalarValue::Double(value))
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Scalar(ScalarValue::String(value.to_string()))
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Scalar(ScalarValue::String(value))
    }
}

impl From<Vec<u8>> for PropertyValue {
    fn from(value: Vec<u8>) -> Self {
        PropertyValue::Scalar(ScalarValue::Bytes(value))
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(value: DateTime<Utc>) -> Self {
        PropertyValue::Scalar(ScalarValue::DateTime(value))
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(PropertyValue::Null, Into::into)
    }
}

/// Result of looking up a property in a bag.
#[derive(Debug, Clone, Copy)]
pub enum PropertyLookup<'a> {
    /// Never loaded nor assigned
    Unset,
    Value(&'a PropertyValue),
}

impl<'a> PropertyLookup<'a> {
    pub fn is_unset(&self) -> bool {
        matches!(self, PropertyLookup::Unset)
    }

    pub fn value(self) -> Option<&'a PropertyValue> {
        match self {
            PropertyLookup::Unset => None,
            PropertyLookup::Value(v) => Some(v),
        }
    }
}
