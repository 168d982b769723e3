//! Error conversion implementations.
//!
//! This module contains From trait implementations to convert errors from
//! the XML, encoding and date-time crates into the unified Error type.

use super::types::Error;

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlError(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlError(format!("Malformed attribute: {}", err))
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Self {
        Error::Deserialization(format!("Invalid UTF-8: {}", err))
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Error::XmlError(format!("Invalid UTF-8 in generated XML: {}", err))
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::Deserialization(format!("Invalid base64 value: {}", err))
    }
}

impl From<chrono::ParseError> for Error {
    fn from(err: chrono::ParseError) -> Self {
        Error::Deserialization(format!("Invalid date-time value: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_errors_are_deserialization_errors() {
        use base64::Engine;
        let err = base64::engine::general_purpose::STANDARD
            .decode("!!!")
            .unwrap_err();
        assert!(matches!(Error::from(err), Error::Deserialization(_)));
    }

    #[test]
    fn test_chrono_errors_are_deserialization_errors() {
        let err = chrono::DateTime::parse_from_rfc3339("yesterday").unwrap_err();
        let converted = Error::from(err);
        assert!(matches!(converted, Error::Deserialization(_)));
        assert!(!converted.is_version_mismatch());
    }
}
