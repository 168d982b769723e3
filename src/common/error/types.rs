//! Unified error types for the EWS binding.
//!
//! Local failures (validation, deserialization, version gating) are kept
//! apart from remote failures reported by the server so callers can react
//! to each kind differently.
use crate::common::version::ExchangeVersion;
use crate::schema::FieldReference;
use std::fmt;
use thiserror::Error;

/// Main error type for EWS binding operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// XML reading or writing error
    #[error("XML error: {0}")]
    XmlError(String),

    /// Local validation failure, never sent to the server
    #[error("Validation error: {0}")]
    Validation(String),

    /// A typed accessor read a property that was never loaded or assigned
    #[error("Property '{0}' has not been loaded or assigned")]
    PropertyNotLoaded(String),

    /// Malformed wire data for a declared type, or an unexpected node
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// A property or request needs a newer server version than negotiated
    #[error("'{property}' requires {required} or later, but the service uses {current}")]
    VersionMismatch {
        property: String,
        required: ExchangeVersion,
        current: ExchangeVersion,
    },

    /// Error reported by the server (SOAP fault or EWS response code)
    #[error("Service error: {0}")]
    Service(Box<ServiceError>),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure in the transport collaborator
    #[error("Transport error: {0}")]
    Transport(String),

    /// The request was cancelled before a response arrived
    #[error("Request cancelled")]
    Cancelled,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a version mismatch error for a named property or request.
    pub fn version_mismatch(
        property: impl Into<String>,
        required: ExchangeVersion,
        current: ExchangeVersion,
    ) -> Self {
        Error::VersionMismatch {
            property: property.into(),
            required,
            current,
        }
    }

    /// True for local version gating failures.
    pub fn is_version_mismatch(&self) -> bool {
        matches!(self, Error::VersionMismatch { .. })
    }

    /// True for errors reported by the server.
    pub fn is_service_error(&self) -> bool {
        matches!(self, Error::Service(_))
    }

    /// True for local validation failures.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::PropertyNotLoaded(_))
    }

    /// The server error, if this is one.
    pub fn service_error(&self) -> Option<&ServiceError> {
        match self {
            Error::Service(err) => Some(err),
            _ => None,
        }
    }
}

/// Where a remote error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorSource {
    /// A SOAP fault replaced the whole response
    SoapFault,
    /// A single response message had `ResponseClass="Error"`
    ResponseMessage,
}

/// Error reported by the Exchange server.
#[derive(Debug, Clone)]
pub struct ServiceError {
    /// EWS response code, e.g. `ErrorItemNotFound`
    pub code: String,
    /// Human readable message text sent by the server
    pub message: String,
    /// How the server reported it
    pub source: ServiceErrorSource,
    /// Property the server blamed, when the payload referenced one
    pub field: Option<FieldReference>,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(field) = &self.field {
            write!(f, " (field {})", field)?;
        }
        Ok(())
    }
}

impl From<ServiceError> for Error {
    fn from(err: ServiceError) -> Self {
        Error::Service(Box::new(err))
    }
}

/// Result type for EWS binding operations.
pub type Result<T> = std::result::Result<T, Error>;
