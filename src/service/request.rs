//! The request side of a service call.

use crate::common::error::{Error, Result};
use crate::common::version::ExchangeVersion;
use crate::common::xml::{EwsXmlReader, EwsXmlWriter};
use crate::schema::SchemaRegistry;
use crate::service::response::ResponseMessage;

/// What a response reader may consult while parsing.
#[derive(Debug, Clone, Copy)]
pub struct ResponseContext<'a> {
    /// Version the request was written for
    pub version: ExchangeVersion,
    pub registry: &'a SchemaRegistry,
}

/// One EWS operation.
///
/// The request writes its own body element content and reads the
/// operation-specific children of each response message. Envelope
/// handling, faults and response classes are dealt with by the caller.
pub trait ServiceRequest: Sized {
    type Response;

    /// Body element, e.g. `GetItem`
    const ELEMENT: &'static str;
    /// Response element, e.g. `GetItemResponse`
    const RESPONSE_ELEMENT: &'static str;
    /// Response message element, e.g. `GetItemResponseMessage`
    const RESPONSE_MESSAGE_ELEMENT: &'static str;

    fn minimum_version(&self) -> ExchangeVersion {
        ExchangeVersion::Exchange2007Sp1
    }

    /// Check the request before anything is written.
    fn validate(&self, _version: ExchangeVersion) -> Result<()> {
        Ok(())
    }

    fn write_attributes(&self, _writer: &mut EwsXmlWriter) -> Result<()> {
        Ok(())
    }

    fn write_elements(&self, writer: &mut EwsXmlWriter) -> Result<()>;

    /// Number of response messages the server must return.
    fn expected_message_count(&self) -> usize;

    /// Read one operation-specific child of response message `index`.
    ///
    /// Returns false for elements the request does not know; the caller
    /// skips them.
    fn read_message_element(
        &mut self,
        index: usize,
        reader: &mut EwsXmlReader<'_>,
        context: &ResponseContext<'_>,
    ) -> Result<bool>;

    /// Turn the parsed messages into the result of the call.
    ///
    /// Only called when every message succeeded. Objects owned by the
    /// request must stay untouched until then.
    fn finish(&mut self, messages: Vec<ResponseMessage>) -> Result<Self::Response>;
}

/// Fail when a request built for more objects than the server answered.
pub(crate) fn ensure_message_count(expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::Deserialization(format!(
            "Expected {} response messages but received {}",
            expected, actual
        )))
    }
}
