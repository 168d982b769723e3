//! SOAP response reading.
//!
//! A response is either a SOAP fault, which fails the whole call, or a
//! list of response messages, one per object in the request. Message
//! classes are surfaced as data here; the service decides what an
//! `Error` class means for the caller.

use crate::common::error::{Error, Result, ServiceError, ServiceErrorSource};
use crate::common::xml::{EwsXmlReader, XmlNamespace, XmlNodeType};
use crate::schema::{FieldReference, SchemaRegistry};
use crate::service::request::{ResponseContext, ServiceRequest};
use std::str::FromStr;
use tracing::trace;

/// `ResponseClass` attribute of a response message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    Success,
    Warning,
    Error,
}

impl FromStr for ResponseClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Success" => Ok(ResponseClass::Success),
            "Warning" => Ok(ResponseClass::Warning),
            "Error" => Ok(ResponseClass::Error),
            other => Err(Error::Deserialization(format!(
                "Unknown response class '{}'",
                other
            ))),
        }
    }
}

/// Common part of every `*ResponseMessage` element.
#[derive(Debug, Clone)]
pub struct ResponseMessage {
    pub class: ResponseClass,
    /// `NoError` on success
    pub code: String,
    pub message_text: Option<String>,
    pub descriptive_link_key: Option<i32>,
    /// Property named in `MessageXml`, if any
    pub field: Option<FieldReference>,
}

impl ResponseMessage {
    fn new(class: ResponseClass) -> Self {
        Self {
            class,
            code: String::new(),
            message_text: None,
            descriptive_link_key: None,
            field: None,
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.class == ResponseClass::Success
    }

    pub fn to_error(&self) -> ServiceError {
        ServiceError {
            code: self.code.clone(),
            message: self.message_text.clone().unwrap_or_default(),
            source: ServiceErrorSource::ResponseMessage,
            field: self.field.clone(),
        }
    }
}

/// `ServerVersionInfo` from the SOAP header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerVersionInfo {
    pub major_version: u32,
    pub minor_version: u32,
    pub major_build_number: u32,
    pub minor_build_number: u32,
    /// Schema version name, e.g. `V2_23`
    pub version: Option<String>,
}

impl ServerVersionInfo {
    fn read_attributes(reader: &EwsXmlReader<'_>) -> Self {
        let number = |name: &str| {
            reader
                .attribute(name)
                .and_then(|value| {
                    atoi_simd::parse::<u32, false, false>(value.trim().as_bytes()).ok()
                })
                .unwrap_or_default()
        };
        Self {
            major_version: number("MajorVersion"),
            minor_version: number("MinorVersion"),
            major_build_number: number("MajorBuildNumber"),
            minor_build_number: number("MinorBuildNumber"),
            version: reader.attribute("Version").map(str::to_string),
        }
    }
}

/// Parsed envelope of a successful call.
#[derive(Debug)]
pub struct SoapResponse {
    pub server_info: Option<ServerVersionInfo>,
    pub messages: Vec<ResponseMessage>,
}

/// Read the next child of the current element.
///
/// Returns true on a child start tag, false on the parent's end tag.
fn next_child(reader: &mut EwsXmlReader<'_>, owner: &str) -> Result<bool> {
    loop {
        reader.read_significant()?;
        match reader.node_type() {
            XmlNodeType::StartElement => return Ok(true),
            XmlNodeType::EndElement => return Ok(false),
            XmlNodeType::Text => {},
            XmlNodeType::EndOfDocument | XmlNodeType::None => {
                return Err(Error::Deserialization(format!(
                    "Unexpected end of document inside <{}>",
                    owner
                )));
            },
        }
    }
}

fn is_soap_element(reader: &EwsXmlReader<'_>, name: &str) -> bool {
    reader.node_type() == XmlNodeType::StartElement
        && reader.namespace().is_soap()
        && reader.local_name() == name
}

/// Parse `xml` as the response to `request`.
///
/// Operation-specific message content is handed to the request as it is
/// encountered. A SOAP fault is returned as [`Error::Service`].
pub fn read_response<R: ServiceRequest>(
    xml: &str,
    request: &mut R,
    context: &ResponseContext<'_>,
) -> Result<SoapResponse> {
    let mut reader = EwsXmlReader::new(xml);
    reader.read_significant()?;
    if !is_soap_element(&reader, "Envelope") {
        return Err(Error::Deserialization(
            "Response is not a SOAP envelope".to_string(),
        ));
    }

    let mut server_info = None;
    loop {
        if !next_child(&mut reader, "Envelope")? {
            return Err(Error::Deserialization(
                "SOAP envelope has no body".to_string(),
            ));
        }
        if is_soap_element(&reader, "Header") {
            server_info = read_header(&mut reader)?;
        } else if is_soap_element(&reader, "Body") {
            break;
        } else {
            reader.skip_current_element()?;
        }
    }

    if !next_child(&mut reader, "Body")? {
        return Err(Error::Deserialization("SOAP body is empty".to_string()));
    }
    if is_soap_element(&reader, "Fault") {
        return Err(read_fault(&mut reader, context.registry)?.into());
    }

    reader.ensure_current_node_is_start_element(XmlNamespace::Messages, R::RESPONSE_ELEMENT)?;
    reader.read_start_element(XmlNamespace::Messages, "ResponseMessages")?;
    let mut messages = Vec::new();
    while next_child(&mut reader, "ResponseMessages")? {
        reader.ensure_current_node_is_start_element(
            XmlNamespace::Messages,
            R::RESPONSE_MESSAGE_ELEMENT,
        )?;
        let message = read_message(&mut reader, messages.len(), request, context)?;
        messages.push(message);
    }
    reader.read_end_element(XmlNamespace::Messages, R::RESPONSE_ELEMENT)?;

    Ok(SoapResponse {
        server_info,
        messages,
    })
}

fn read_header(reader: &mut EwsXmlReader<'_>) -> Result<Option<ServerVersionInfo>> {
    let mut info = None;
    while next_child(reader, "Header")? {
        if reader.is_start_element(XmlNamespace::Types, "ServerVersionInfo") {
            info = Some(ServerVersionInfo::read_attributes(reader));
        }
        reader.skip_current_element()?;
    }
    Ok(info)
}

fn read_message<R: ServiceRequest>(
    reader: &mut EwsXmlReader<'_>,
    index: usize,
    request: &mut R,
    context: &ResponseContext<'_>,
) -> Result<ResponseMessage> {
    let class = reader
        .attribute("ResponseClass")
        .ok_or_else(|| {
            Error::Deserialization(format!(
                "<{}> without ResponseClass",
                R::RESPONSE_MESSAGE_ELEMENT
            ))
        })?
        .parse::<ResponseClass>()?;
    let mut message = ResponseMessage::new(class);

    while next_child(reader, R::RESPONSE_MESSAGE_ELEMENT)? {
        let in_messages = reader.namespace() == XmlNamespace::Messages;
        let name = reader.local_name().to_string();
        match name.as_str() {
            "MessageText" if in_messages => message.message_text = Some(reader.read_value()?),
            "ResponseCode" if in_messages => message.code = reader.read_value()?,
            "DescriptiveLinkKey" if in_messages => {
                let text = reader.read_value()?;
                message.descriptive_link_key =
                    atoi_simd::parse::<i32, false, false>(text.trim().as_bytes()).ok();
            },
            "MessageXml" if in_messages => {
                message.field = read_message_xml(reader, context.registry)?;
            },
            _ => {
                if !request.read_message_element(index, reader, context)? {
                    trace!(
                        message = R::RESPONSE_MESSAGE_ELEMENT,
                        element = %name,
                        "skipping unrecognized element"
                    );
                    reader.skip_current_element()?;
                }
            },
        }
    }
    Ok(message)
}

/// First field path inside `MessageXml`; other content is skipped.
fn read_message_xml(
    reader: &mut EwsXmlReader<'_>,
    registry: &SchemaRegistry,
) -> Result<Option<FieldReference>> {
    let mut field = None;
    while next_child(reader, "MessageXml")? {
        if field.is_none() {
            field = FieldReference::read_from_xml(reader, registry)?;
        } else {
            reader.skip_current_element()?;
        }
    }
    Ok(field)
}

fn read_fault(reader: &mut EwsXmlReader<'_>, registry: &SchemaRegistry) -> Result<ServiceError> {
    let mut fault_code = None;
    let mut fault_string = None;
    let mut code = None;
    let mut message = None;
    let mut field = None;

    while next_child(reader, "Fault")? {
        let name = reader.local_name().to_string();
        match name.as_str() {
            "faultcode" => fault_code = Some(reader.read_value()?),
            "faultstring" => fault_string = Some(reader.read_value()?),
            "detail" => {
                while next_child(reader, "detail")? {
                    let in_errors = reader.namespace() == XmlNamespace::Errors;
                    let name = reader.local_name().to_string();
                    match name.as_str() {
                        "ResponseCode" if in_errors => code = Some(reader.read_value()?),
                        "Message" if in_errors => message = Some(reader.read_value()?),
                        "MessageXml" => field = read_message_xml(reader, registry)?,
                        _ => reader.skip_current_element()?,
                    }
                }
            },
            _ => reader.skip_current_element()?,
        }
    }

    Ok(ServiceError {
        code: code
            .or(fault_code)
            .unwrap_or_else(|| "ErrorInternalServerError".to_string()),
        message: message.or(fault_string).unwrap_or_default(),
        source: ServiceErrorSource::SoapFault,
        field,
    })
}
