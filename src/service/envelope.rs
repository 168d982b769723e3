//! SOAP envelope writing.

use crate::common::error::{Error, Result};
use crate::common::version::ExchangeVersion;
use crate::common::xml::{EwsXmlWriter, XmlNamespace};
use crate::service::request::ServiceRequest;

/// Serialize `request` into a complete SOAP document.
///
/// The header always carries `RequestServerVersion`; an impersonated SMTP
/// address adds `ExchangeImpersonation`.
pub fn write_request<R: ServiceRequest>(
    request: &R,
    version: ExchangeVersion,
    impersonation: Option<&str>,
) -> Result<String> {
    let minimum = request.minimum_version();
    if !version.supports(minimum) {
        return Err(Error::VersionMismatch {
            property: R::ELEMENT.to_string(),
            required: minimum,
            current: version,
        });
    }
    request.validate(version)?;

    let mut writer = EwsXmlWriter::new(version);
    writer.write_declaration()?;
    writer.write_start_element(XmlNamespace::Soap, "Envelope");
    writer.write_namespace_declaration(XmlNamespace::Soap)?;
    writer.write_namespace_declaration(XmlNamespace::Messages)?;
    writer.write_namespace_declaration(XmlNamespace::Types)?;

    writer.write_start_element(XmlNamespace::Soap, "Header");
    writer.write_start_element(XmlNamespace::Types, "RequestServerVersion");
    writer.write_attribute("Version", version.as_str())?;
    writer.write_end_element()?;
    if let Some(smtp_address) = impersonation {
        writer.write_start_element(XmlNamespace::Types, "ExchangeImpersonation");
        writer.write_start_element(XmlNamespace::Types, "ConnectingSID");
        writer.write_element_value(XmlNamespace::Types, "PrimarySmtpAddress", smtp_address)?;
        writer.write_end_element()?;
        writer.write_end_element()?;
    }
    writer.write_end_element()?;

    writer.write_start_element(XmlNamespace::Soap, "Body");
    writer.write_start_element(XmlNamespace::Messages, R::ELEMENT);
    request.write_attributes(&mut writer)?;
    request.write_elements(&mut writer)?;
    writer.write_end_element()?;
    writer.write_end_element()?;

    writer.write_end_element()?;
    writer.into_string()
}
