//! The service: request execution against a [`Transport`].

use crate::common::config::ServiceConfig;
use crate::common::error::{Error, Result};
use crate::common::version::ExchangeVersion;
use crate::schema::SchemaRegistry;
use crate::service::envelope::write_request;
use crate::service::object::{Folder, Item};
use crate::service::request::{ResponseContext, ServiceRequest, ensure_message_count};
use crate::service::response::{ResponseClass, ServerVersionInfo, read_response};
use crate::service::transport::{Transport, TransportRequest};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Entry point for all operations against one endpoint.
///
/// The service owns nothing mutable apart from the last server version it
/// saw, so one instance can be shared across threads.
pub struct ExchangeService {
    config: ServiceConfig,
    registry: Arc<SchemaRegistry>,
    transport: Arc<dyn Transport>,
    server_info: Mutex<Option<ServerVersionInfo>>,
}

impl fmt::Debug for ExchangeService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeService")
            .field("config", &self.config)
            .field("server_info", &*self.server_info.lock())
            .finish_non_exhaustive()
    }
}

impl ExchangeService {
    /// Create a service using the shared schema registry.
    pub fn new(config: ServiceConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        Self::with_registry(config, transport, SchemaRegistry::shared_handle())
    }

    pub fn with_registry(
        config: ServiceConfig,
        transport: Arc<dyn Transport>,
        registry: Arc<SchemaRegistry>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            registry,
            transport,
            server_info: Mutex::new(None),
        })
    }

    #[inline]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    #[inline]
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    #[inline]
    pub fn version(&self) -> ExchangeVersion {
        self.config.requested_version
    }

    /// `ServerVersionInfo` of the most recent response that carried one.
    pub fn server_info(&self) -> Option<ServerVersionInfo> {
        self.server_info.lock().clone()
    }

    pub fn new_item(&self) -> Item {
        Item::new(Arc::clone(self.registry.item()), self.version())
    }

    pub fn new_message(&self) -> Item {
        Item::new(Arc::clone(self.registry.message()), self.version())
    }

    pub fn new_contact(&self) -> Item {
        Item::new(Arc::clone(self.registry.contact()), self.version())
    }

    pub fn new_folder(&self) -> Folder {
        Folder::new(Arc::clone(self.registry.folder()), self.version())
    }

    /// Send `request` and wait for its result.
    ///
    /// The first response message with class `Error` fails the call. On
    /// failure the request keeps its objects unchanged, ready for a retry.
    pub fn execute<R: ServiceRequest>(&self, request: &mut R) -> Result<R::Response> {
        let version = self.version();
        let body = write_request(&*request, version, self.config.impersonated_user.as_deref())?;
        if self.config.trace_enabled {
            debug!(operation = R::ELEMENT, body = %body, "sending request");
        }

        let response = self.transport.post(&TransportRequest {
            url: &self.config.url,
            user_agent: &self.config.user_agent,
            timeout: self.config.timeout(),
            body: &body,
        })?;
        if self.config.trace_enabled {
            debug!(operation = R::ELEMENT, body = %response, "received response");
        }

        let context = ResponseContext {
            version,
            registry: &self.registry,
        };
        let parsed = read_response(&response, request, &context)?;
        if let Some(info) = parsed.server_info {
            *self.server_info.lock() = Some(info);
        }

        ensure_message_count(request.expected_message_count(), parsed.messages.len())?;
        for message in &parsed.messages {
            match message.class {
                ResponseClass::Error => return Err(message.to_error().into()),
                ResponseClass::Warning => warn!(
                    operation = R::ELEMENT,
                    code = %message.code,
                    text = message.message_text.as_deref().unwrap_or_default(),
                    "server returned a warning"
                ),
                ResponseClass::Success => {},
            }
        }
        request.finish(parsed.messages)
    }
}

#[cfg(feature = "async")]
mod pending {
    use super::*;
    use tokio::sync::oneshot;
    use tokio::task::JoinHandle;

    /// Handle to a request started with [`ExchangeService::execute_async`].
    #[derive(Debug)]
    pub struct PendingRequest {
        cancel: Option<oneshot::Sender<()>>,
        task: JoinHandle<()>,
    }

    impl PendingRequest {
        /// Abandon the request if its response has not arrived yet.
        ///
        /// The callback then receives [`Error::Cancelled`]. Returns false
        /// when it is too late to cancel.
        pub fn cancel(&mut self) -> bool {
            match self.cancel.take() {
                Some(sender) => !self.task.is_finished() && sender.send(()).is_ok(),
                None => false,
            }
        }

        pub fn is_finished(&self) -> bool {
            self.task.is_finished()
        }

        /// Wait until the callback has run.
        pub async fn wait(self) -> Result<()> {
            self.task
                .await
                .map_err(|err| Error::Other(format!("Request task failed: {}", err)))
        }
    }

    impl ExchangeService {
        /// Run `request` on a worker and hand the result to `callback`.
        ///
        /// Must be called from within a Tokio runtime. The blocking
        /// transport call runs on the blocking pool; a cancelled request's
        /// response is discarded.
        pub fn execute_async<R, F>(self: &Arc<Self>, request: R, callback: F) -> Result<PendingRequest>
        where
            R: ServiceRequest + Send + 'static,
            R::Response: Send + 'static,
            F: FnOnce(Result<R::Response>) + Send + 'static,
        {
            let handle = tokio::runtime::Handle::try_current()
                .map_err(|_| Error::Other("execute_async requires a Tokio runtime".to_string()))?;
            let service = Arc::clone(self);
            let (cancel_tx, cancel_rx) = oneshot::channel::<()>();

            let task = handle.spawn(async move {
                let mut work = tokio::task::spawn_blocking(move || {
                    let mut request = request;
                    service.execute(&mut request)
                });
                tokio::select! {
                    biased;
                    Ok(()) = cancel_rx => {
                        work.abort();
                        debug!(operation = R::ELEMENT, "request cancelled");
                        callback(Err(Error::Cancelled));
                    }
                    joined = &mut work => {
                        let result = joined.unwrap_or_else(|err| {
                            Err(Error::Other(format!("Request worker failed: {}", err)))
                        });
                        callback(result);
                    }
                }
            });

            Ok(PendingRequest {
                cancel: Some(cancel_tx),
                task,
            })
        }
    }
}

#[cfg(feature = "async")]
pub use pending::PendingRequest;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace};
    use crate::service::response::ResponseMessage;

    /// Request with a fixed number of messages and no payload.
    struct Ping(usize);

    impl ServiceRequest for Ping {
        type Response = usize;

        const ELEMENT: &'static str = "Ping";
        const RESPONSE_ELEMENT: &'static str = "PingResponse";
        const RESPONSE_MESSAGE_ELEMENT: &'static str = "PingResponseMessage";

        fn write_elements(&self, writer: &mut EwsXmlWriter) -> Result<()> {
            writer.write_element_value(XmlNamespace::Messages, "Count", &self.0.to_string())
        }

        fn expected_message_count(&self) -> usize {
            self.0
        }

        fn read_message_element(
            &mut self,
            _index: usize,
            _reader: &mut EwsXmlReader<'_>,
            _context: &ResponseContext<'_>,
        ) -> Result<bool> {
            Ok(false)
        }

        fn finish(&mut self, messages: Vec<ResponseMessage>) -> Result<usize> {
            Ok(messages.len())
        }
    }

    fn envelope(messages: &[(&str, &str)]) -> String {
        let mut body = String::new();
        for (class, code) in messages {
            body.push_str(&format!(
                r#"<m:PingResponseMessage ResponseClass="{}"><m:MessageText>text</m:MessageText><m:ResponseCode>{}</m:ResponseCode></m:PingResponseMessage>"#,
                class, code
            ));
        }
        format!(
            r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Header><h:ServerVersionInfo MajorVersion="14" MinorVersion="3" xmlns:h="http://schemas.microsoft.com/exchange/services/2006/types"/></s:Header><s:Body><m:PingResponse xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages"><m:ResponseMessages>{}</m:ResponseMessages></m:PingResponse></s:Body></s:Envelope>"#,
            body
        )
    }

    fn service_returning(response: String) -> ExchangeService {
        let transport = move |request: &TransportRequest<'_>| -> Result<String> {
            assert!(request.body.contains("<m:Ping><m:Count>"));
            assert_eq!(request.url, "https://mail.contoso.com/EWS/Exchange.asmx");
            Ok(response.clone())
        };
        ExchangeService::new(
            ServiceConfig::new("https://mail.contoso.com/EWS/Exchange.asmx"),
            Arc::new(transport),
        )
        .unwrap()
    }

    #[test]
    fn test_execute_success_records_server_info() {
        let service = service_returning(envelope(&[("Success", "NoError"), ("Warning", "ErrorBatchProcessingStopped")]));
        assert_eq!(service.execute(&mut Ping(2)).unwrap(), 2);
        assert_eq!(service.server_info().map(|info| info.major_version), Some(14));
    }

    #[test]
    fn test_error_message_fails_call() {
        let service = service_returning(envelope(&[("Success", "NoError"), ("Error", "ErrorItemNotFound")]));
        let err = service.execute(&mut Ping(2)).unwrap_err();
        assert_eq!(err.service_error().map(|e| e.code.as_str()), Some("ErrorItemNotFound"));
    }

    #[test]
    fn test_message_count_mismatch() {
        let service = service_returning(envelope(&[("Success", "NoError")]));
        assert!(matches!(service.execute(&mut Ping(2)), Err(Error::Deserialization(_))));
    }

    #[test]
    fn test_transport_error_propagates() {
        let transport = |_: &TransportRequest<'_>| -> Result<String> {
            Err(Error::Transport("connection refused".to_string()))
        };
        let service = ExchangeService::new(
            ServiceConfig::new("https://mail.contoso.com/EWS/Exchange.asmx"),
            Arc::new(transport),
        )
        .unwrap();
        assert!(matches!(service.execute(&mut Ping(1)), Err(Error::Transport(_))));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let transport = |_: &TransportRequest<'_>| -> Result<String> { Ok(String::new()) };
        assert!(ExchangeService::new(ServiceConfig::new(""), Arc::new(transport)).is_err());
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_execute_async_invokes_callback() {
        let service = Arc::new(service_returning(envelope(&[("Success", "NoError")])));
        let (tx, rx) = tokio::sync::oneshot::channel();
        let pending = service
            .execute_async(Ping(1), move |result| {
                let _ = tx.send(result);
            })
            .unwrap();
        pending.wait().await.unwrap();
        assert_eq!(rx.await.unwrap().unwrap(), 1);
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_cancel_before_response() {
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        let gate = Mutex::new(release_rx);
        let response = envelope(&[("Success", "NoError")]);
        let transport = move |_: &TransportRequest<'_>| -> Result<String> {
            let _ = gate.lock().recv();
            Ok(response.clone())
        };
        let service = Arc::new(
            ExchangeService::new(
                ServiceConfig::new("https://mail.contoso.com/EWS/Exchange.asmx"),
                Arc::new(transport),
            )
            .unwrap(),
        );

        let (tx, rx) = tokio::sync::oneshot::channel();
        let mut pending = service
            .execute_async(Ping(1), move |result| {
                let _ = tx.send(result);
            })
            .unwrap();
        assert!(pending.cancel());
        assert!(matches!(rx.await.unwrap(), Err(Error::Cancelled)));

        release_tx.send(()).unwrap();
        pending.wait().await.unwrap();
    }

    #[cfg(feature = "async")]
    #[test]
    fn test_execute_async_needs_runtime() {
        let service = Arc::new(service_returning(envelope(&[])));
        assert!(service.execute_async(Ping(0), |_| {}).is_err());
    }
}
