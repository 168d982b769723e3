//! ews-binding - Schema-driven property binding for Exchange Web Services
//!
//! This library maps Exchange items and folders to and from the EWS
//! SOAP/XML wire format. Every object type is described by a schema of
//! static property definitions; values live in a property bag that tracks
//! what changed since the object was loaded, so an update sends exactly
//! the fields that differ.
//!
//! # Features
//!
//! - **Declarative schemas**: item, message, contact and folder properties
//!   with wire order, field URIs, capability flags and version gates
//! - **Change tracking**: set, append and delete instructions computed
//!   from the change log, including indexed dictionary entries and
//!   extended MAPI properties
//! - **Version gating**: properties newer than the negotiated server
//!   version fail fast on read, write and serialization
//! - **Forward compatible reading**: unknown response elements are skipped
//! - **Pluggable transport**: the binding produces and consumes SOAP text;
//!   any HTTP client can carry it
//!
//! # Example - Creating a message
//!
//! ```no_run
//! use ews_binding::{
//!     CreateItem, EmailAddress, ExchangeService, MessageBody, MessageDisposition, ServiceConfig,
//!     TransportRequest,
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> ews_binding::Result<()> {
//! let transport = |request: &TransportRequest<'_>| -> ews_binding::Result<String> {
//!     // Hand request.body to an HTTP client and return the response body
//! #   let _ = request;
//!     unimplemented!()
//! };
//! let service = ExchangeService::new(
//!     ServiceConfig::new("https://mail.contoso.com/EWS/Exchange.asmx"),
//!     Arc::new(transport),
//! )?;
//!
//! let mut message = service.new_message();
//! message.set_subject("Quarterly report")?;
//! message.set_body(MessageBody::text("Numbers attached."))?;
//! message.to_recipients_mut()?.add(EmailAddress::new("ann@contoso.com"));
//!
//! let mut request =
//!     CreateItem::new(vec![message]).with_disposition(MessageDisposition::SaveOnly);
//! let saved = service.execute(&mut request)?;
//! println!("Created {:?}", saved[0].id());
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Updating only what changed
//!
//! ```no_run
//! use ews_binding::{ExchangeService, GetItem, MessageDisposition, PropertySet, ServiceId, UpdateItem};
//!
//! # fn run(service: &ExchangeService) -> ews_binding::Result<()> {
//! let mut items = service.execute(&mut GetItem::new(
//!     vec![ServiceId::new("AAMkAD...")],
//!     PropertySet::first_class_properties(),
//! ))?;
//! items[0].set_is_read(true)?;
//!
//! // Sends a single SetItemField for message:IsRead
//! let mut update = UpdateItem::new(items).with_disposition(MessageDisposition::SaveOnly);
//! service.execute(&mut update)?;
//! # Ok(())
//! # }
//! ```

/// Errors, versions, configuration and XML plumbing
pub mod common;

/// Property definitions, schemas, field paths and property sets
///
/// Definitions are statics compared by address; schemas are built once
/// and shared through an immutable [`SchemaRegistry`].
pub mod schema;

/// Property bags, change tracking and complex property types
pub mod property;

/// Service objects, requests and their execution
pub mod service;

// Re-export commonly used types for convenience
pub use common::{
    Error, ExchangeVersion, EwsXmlReader, EwsXmlWriter, Result, ServiceConfig, ServiceError,
    ServiceErrorSource, XmlNamespace,
};
pub use property::types::{
    BodyType, EmailAddress, EmailAddressKey, ImAddressKey, MailboxType, MessageBody,
    PhoneNumberKey, PhysicalAddressEntry, PhysicalAddressKey, ServiceId, StringList,
};
pub use property::{PropertyBag, PropertyValue, ScalarValue};
pub use schema::{
    BasePropertySet, ExtendedPropertyDefinition, MapiPropertyType, PropertyDefinition,
    PropertySet, Schema, SchemaRegistry,
};
#[cfg(feature = "async")]
pub use service::PendingRequest;
pub use service::{
    ConflictResolutionMode, CreateItem, ExchangeService, Folder, FolderIdRef, GetFolder, GetItem,
    Item, MessageDisposition, ServiceRequest, Transport, TransportRequest, UpdateFolder,
    UpdateItem, WellKnownFolder,
};
