//! Common types and utilities shared across the binding.
//!
//! This module holds the error type, server versions, client configuration
//! and the XML reader/writer wrappers every other layer builds on.

// Submodule declarations
pub mod config;
pub mod error;
pub mod version;
pub mod xml;

// Re-exports for convenience
pub use config::ServiceConfig;
pub use error::{Error, Result, ServiceError, ServiceErrorSource};
pub use version::ExchangeVersion;
pub use xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace};
