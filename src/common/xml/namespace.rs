//! XML namespaces used on the EWS wire.

use phf::phf_map;
use std::fmt;

/// Namespace URI for EWS message elements.
pub const EWS_MESSAGES_NS: &str = "http://schemas.microsoft.com/exchange/services/2006/messages";
/// Namespace URI for EWS type elements.
pub const EWS_TYPES_NS: &str = "http://schemas.microsoft.com/exchange/services/2006/types";
/// Namespace URI for EWS error details.
pub const EWS_ERRORS_NS: &str = "http://schemas.microsoft.com/exchange/services/2006/errors";
/// SOAP 1.1 envelope namespace.
pub const SOAP_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
/// SOAP 1.2 envelope namespace.
pub const SOAP12_NS: &str = "http://www.w3.org/2003/05/soap-envelope";
/// XML schema instance namespace (`xsi:nil`, `xsi:type`).
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
/// Autodiscover namespace.
pub const AUTODISCOVER_NS: &str = "http://schemas.microsoft.com/exchange/2010/Autodiscover";

/// A namespace known to the binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XmlNamespace {
    /// No namespace, or one the binding does not know
    NotSpecified,
    /// EWS messages (`m`)
    Messages,
    /// EWS types (`t`)
    Types,
    /// EWS errors (`e`)
    Errors,
    /// SOAP 1.1 envelope (`soap`)
    Soap,
    /// SOAP 1.2 envelope (`soap`)
    Soap12,
    /// XML schema instance (`xsi`)
    XmlSchemaInstance,
    /// Autodiscover (`a`)
    Autodiscover,
}

static NAMESPACES_BY_URI: phf::Map<&'static str, XmlNamespace> = phf_map! {
    "http://schemas.microsoft.com/exchange/services/2006/messages" => XmlNamespace::Messages,
    "http://schemas.microsoft.com/exchange/services/2006/types" => XmlNamespace::Types,
    "http://schemas.microsoft.com/exchange/services/2006/errors" => XmlNamespace::Errors,
    "http://schemas.xmlsoap.org/soap/envelope/" => XmlNamespace::Soap,
    "http://www.w3.org/2003/05/soap-envelope" => XmlNamespace::Soap12,
    "http://www.w3.org/2001/XMLSchema-instance" => XmlNamespace::XmlSchemaInstance,
    "http://schemas.microsoft.com/exchange/2010/Autodiscover" => XmlNamespace::Autodiscover,
};

impl XmlNamespace {
    /// Prefix the writer uses for this namespace.
    pub const fn prefix(self) -> &'static str {
        match self {
            XmlNamespace::NotSpecified => "",
            XmlNamespace::Messages => "m",
            XmlNamespace::Types => "t",
            XmlNamespace::Errors => "e",
            XmlNamespace::Soap | XmlNamespace::Soap12 => "soap",
            XmlNamespace::XmlSchemaInstance => "xsi",
            XmlNamespace::Autodiscover => "a",
        }
    }

    /// Namespace URI.
    pub const fn uri(self) -> &'static str {
        match self {
            XmlNamespace::NotSpecified => "",
            XmlNamespace::Messages => EWS_MESSAGES_NS,
            XmlNamespace::Types => EWS_TYPES_NS,
            XmlNamespace::Errors => EWS_ERRORS_NS,
            XmlNamespace::Soap => SOAP_NS,
            XmlNamespace::Soap12 => SOAP12_NS,
            XmlNamespace::XmlSchemaInstance => XSI_NS,
            XmlNamespace::Autodiscover => AUTODISCOVER_NS,
        }
    }

    /// Map a namespace URI back to a known namespace.
    pub fn from_uri(uri: &str) -> XmlNamespace {
        NAMESPACES_BY_URI
            .get(uri)
            .copied()
            .unwrap_or(XmlNamespace::NotSpecified)
    }

    /// True for either SOAP envelope version.
    pub fn is_soap(self) -> bool {
        matches!(self, XmlNamespace::Soap | XmlNamespace::Soap12)
    }
}

impl fmt::Display for XmlNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uri())
    }
}
