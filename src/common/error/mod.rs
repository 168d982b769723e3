//! Unified error types for the EWS binding.
//!
//! This module provides a single error type covering local validation,
//! deserialization, version gating and remote service failures.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, Result, ServiceError, ServiceErrorSource};
