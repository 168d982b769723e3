//! HTTP plumbing boundary.
//!
//! The binding produces and consumes SOAP text only. Whatever sends it,
//! an HTTP client, a test double or a recorded session, implements
//! [`Transport`].

use crate::common::error::Result;
use std::time::Duration;

/// One outgoing SOAP call.
#[derive(Debug, Clone)]
pub struct TransportRequest<'a> {
    pub url: &'a str,
    pub user_agent: &'a str,
    pub timeout: Duration,
    /// Complete SOAP envelope
    pub body: &'a str,
}

/// Sends a request body and returns the response body.
///
/// HTTP-level failures map to [`Error::Transport`](crate::Error::Transport).
/// A SOAP fault is a normal response and must be returned as text.
pub trait Transport: Send + Sync {
    fn post(&self, request: &TransportRequest<'_>) -> Result<String>;
}

impl<F> Transport for F
where
    F: Fn(&TransportRequest<'_>) -> Result<String> + Send + Sync,
{
    fn post(&self, request: &TransportRequest<'_>) -> Result<String> {
        self(request)
    }
}
