//! Client configuration
//!
//! A configuration comes from one of three sources:
//! - `ClientConfig::builder(endpoint)` in code
//! - `ClientConfig::load(path)` from a JSON file; omitted keys take defaults
//! - `ClientConfig::from_env()` from `TD_CLIENT_API_KEY` and `TD_API_SERVER`
//!
//! Every source validates before returning, so a `ClientConfig` handed to
//! `TdClient::new` is already known to be usable.
//!
//! # Security
//!
//! The `Debug` implementation masks the API key as `"***REDACTED***"`.

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::{ClientError, ClientResult};
use crate::observability::{log_event_with_fields, Event, Logger, Severity};

/// Public API server
pub const DEFAULT_ENDPOINT: &str = "https://api.treasuredata.com";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "TD_CLIENT_API_KEY";

/// Environment variable overriding the API server
pub const ENDPOINT_ENV: &str = "TD_API_SERVER";

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for `TdClient`
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the API server
    pub endpoint: String,
    /// Sent as `Authorization: TD1 <key>` when present
    pub api_key: Option<String>,
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
    /// User-Agent header value
    pub user_agent: String,
    /// Minimum log severity (trace, info, warn, error, fatal)
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("td-client-rust/{}", env!("CARGO_PKG_VERSION")),
            log_level: "warn".to_string(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "***REDACTED***"))
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl ClientConfig {
    pub fn builder(endpoint: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(endpoint)
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> ClientResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        let config: ClientConfig = serde_json::from_str(&content)
            .map_err(|e| ClientError::Config(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        log_event_with_fields(
            Event::ConfigLoaded,
            &[("source", "file"), ("path", &path.display().to_string())],
        );
        Ok(config)
    }

    /// Build configuration from the process environment
    pub fn from_env() -> ClientResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from any variable lookup
    ///
    /// A bare host name in `TD_API_SERVER` is taken as HTTPS.
    pub fn from_lookup<F>(lookup: F) -> ClientResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ClientConfig::default();

        if let Some(server) = lookup(ENDPOINT_ENV).filter(|s| !s.trim().is_empty()) {
            let server = server.trim();
            config.endpoint = if server.contains("://") {
                server.to_string()
            } else {
                format!("https://{}", server)
            };
        }
        config.api_key = lookup(API_KEY_ENV).filter(|k| !k.is_empty());

        config.validate()?;

        log_event_with_fields(Event::ConfigLoaded, &[("source", "env")]);
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ClientResult<()> {
        if self.endpoint.is_empty() {
            return Err(self.reject("endpoint cannot be empty".to_string()));
        }

        let url = reqwest::Url::parse(&self.endpoint)
            .map_err(|e| self.reject(format!("Invalid endpoint: {}", e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(self.reject(format!(
                "Invalid endpoint scheme '{}': expected http or https",
                url.scheme()
            )));
        }

        if self.timeout_secs == 0 {
            return Err(self.reject("timeout_secs must be > 0".to_string()));
        }

        if Severity::parse(&self.log_level).is_none() {
            return Err(self.reject(format!(
                "Invalid log_level: '{}'. Must be one of trace, info, warn, error, fatal.",
                self.log_level
            )));
        }

        Ok(())
    }

    fn reject(&self, message: String) -> ClientError {
        log_event_with_fields(Event::ConfigRejected, &[("reason", &message)]);
        ClientError::Config(message)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Parsed log level; `warn` if the field does not parse
    pub fn severity(&self) -> Severity {
        Severity::parse(&self.log_level).unwrap_or(Severity::Warn)
    }

    /// Makes `log_level` the process-wide minimum severity
    pub fn apply_log_level(&self) {
        Logger::set_min_severity(self.severity());
    }
}

/// Builder for client configuration
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            config: ClientConfig {
                endpoint: endpoint.into(),
                ..Default::default()
            },
        }
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = Some(api_key.into());
        self
    }

    /// Set the request timeout, rounded down to whole seconds
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_secs = timeout.as_secs();
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.log_level = level.into();
        self
    }

    /// Build the configuration, validating all settings
    pub fn build(self) -> ClientResult<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
