//! Service objects, requests and their execution.

pub mod envelope;
pub mod exchange;
pub mod object;
pub mod request;
pub mod requests;
pub mod response;
pub mod transport;

#[cfg(feature = "async")]
pub use exchange::PendingRequest;
pub use exchange::ExchangeService;
pub use object::{Folder, Item, ServiceObject};
pub use request::{ResponseContext, ServiceRequest};
pub use requests::{
    ConflictResolutionMode, CreateItem, FolderIdRef, GetFolder, GetItem, MessageDisposition,
    UpdateFolder, UpdateItem, WellKnownFolder,
};
pub use response::{ResponseClass, ResponseMessage, ServerVersionInfo};
pub use transport::{Transport, TransportRequest};
