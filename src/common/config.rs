//! Client configuration.
//!
//! A [`ServiceConfig`] can be built in code or loaded from YAML:
//!
//! ```yaml
//! url: https://mail.example.com/EWS/Exchange.asmx
//! requested_version: Exchange2010_SP1
//! user_agent: ews-binding
//! timeout_secs: 100
//! trace_enabled: true
//! impersonated_user: alice@example.com
//! ```

use crate::common::error::{Error, Result};
use crate::common::version::ExchangeVersion;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const DEFAULT_USER_AGENT: &str = concat!("ews-binding/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT_SECS: u64 = 100;

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Settings for one `ExchangeService`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// EWS endpoint URL
    pub url: String,
    /// Version written into `RequestServerVersion`
    #[serde(default)]
    pub requested_version: ExchangeVersion,
    /// User agent passed to the transport
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-request timeout handed to the transport
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Log request and response bodies at debug level
    #[serde(default)]
    pub trace_enabled: bool,
    /// SMTP address to impersonate, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impersonated_user: Option<String>,
}

impl ServiceConfig {
    /// Configuration for an endpoint with default settings.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            requested_version: ExchangeVersion::default(),
            user_agent: default_user_agent(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            trace_enabled: false,
            impersonated_user: None,
        }
    }

    pub fn with_version(mut self, version: ExchangeVersion) -> Self {
        self.requested_version = version;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.trace_enabled = enabled;
        self
    }

    pub fn with_impersonation(mut self, smtp_address: impl Into<String>) -> Self {
        self.impersonated_user = Some(smtp_address.into());
        self
    }

    /// Timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: ServiceConfig = serde_saphyr::from_str(yaml)
            .map_err(|e| Error::Config(format!("Failed to parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let yaml = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&yaml)
    }

    /// Check the settings that would make every request fail.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::Config("Service URL must not be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("Timeout must be greater than zero".to_string()));
        }
        if let Some(user) = &self.impersonated_user
            && !user.contains('@')
        {
            return Err(Error::Config(format!(
                "Impersonated user '{}' is not an SMTP address",
                user
            )));
        }
        Ok(())
    }
}
