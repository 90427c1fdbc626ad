//! Configuration
//!
//! All structs deserialize with serde, so they can be embedded in whatever
//! configuration file the owning application loads.

use crate::avro::ParserOptions;
use crate::error::{NamingResult, RegistryError, RegistryResult};
use crate::naming::SubjectNaming;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Registry connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Schema registry URL
    pub url: String,
    /// Basic auth username
    #[serde(default)]
    pub username: Option<String>,
    /// Basic auth password
    #[serde(default)]
    pub password: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// TLS settings
    #[serde(default)]
    pub tls: Option<TlsConfig>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8081".to_string(),
            username: None,
            password: None,
            timeout_secs: default_timeout(),
            tls: None,
        }
    }
}

impl RegistryConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> RegistryResult<()> {
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(RegistryError::Config(format!(
                "Registry URL must start with http:// or https://, got '{}'",
                self.url
            )));
        }
        if self.username.is_some() != self.password.is_some() {
            return Err(RegistryError::Config(
                "Basic auth requires both username and password".into(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(RegistryError::Config("timeout_secs must be > 0".into()));
        }
        Ok(())
    }
}

fn default_timeout() -> u64 {
    30
}

/// TLS settings for the registry connection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Additional PEM-encoded CA certificate to trust
    #[serde(default)]
    pub ca_cert_path: Option<PathBuf>,
    /// Skip certificate verification (development only)
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

/// Which subjects the catalog loads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicSelection {
    /// Discover every subject from the registry
    #[default]
    All,
    /// Only the listed subjects
    Subjects(Vec<String>),
}

/// Schema catalog settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub topics: TopicSelection,
    /// Also index every historical version, not just the latest
    #[serde(default)]
    pub fetch_all_versions: bool,
    /// Maximum concurrent registry requests during a sync
    #[serde(default = "default_concurrency")]
    pub concurrency_limit: usize,
    /// Background refresh interval in seconds; 0 disables refresh
    #[serde(default)]
    pub refresh_interval_secs: u64,
    #[serde(default)]
    pub parser: ParserOptions,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            registry: RegistryConfig::default(),
            topics: TopicSelection::All,
            fetch_all_versions: false,
            concurrency_limit: default_concurrency(),
            refresh_interval_secs: 0,
            parser: ParserOptions::default(),
        }
    }
}

fn default_concurrency() -> usize {
    10
}

impl CatalogConfig {
    pub fn new(registry: RegistryConfig) -> Self {
        Self {
            registry,
            ..Default::default()
        }
    }

    pub fn with_subjects<I, S>(mut self, subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics = TopicSelection::Subjects(subjects.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_fetch_all_versions(mut self, enabled: bool) -> Self {
        self.fetch_all_versions = enabled;
        self
    }

    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval_secs = interval.as_secs();
        self
    }

    pub fn with_parser_options(mut self, options: ParserOptions) -> Self {
        self.parser = options;
        self
    }

    /// `None` when refresh is disabled
    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }

    pub fn validate(&self) -> RegistryResult<()> {
        self.registry.validate()?;
        if self.concurrency_limit == 0 {
            return Err(RegistryError::Config(
                "concurrency_limit must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Serializer/deserializer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerdeConfig {
    /// Key subject naming strategy name (default `TopicNameStrategy`)
    #[serde(default)]
    pub key_subject_strategy: Option<String>,
    /// Value subject naming strategy name (default `TopicNameStrategy`)
    #[serde(default)]
    pub value_subject_strategy: Option<String>,
    /// Fail when no schema is registered for a subject; otherwise the payload
    /// is sent as JSON
    #[serde(default = "default_true")]
    pub fail_on_missing_schema: bool,
    /// Decode payloads without the wire-format header as JSON
    #[serde(default = "default_true")]
    pub json_fallback: bool,
    /// Initial encode buffer size in bytes
    #[serde(default = "default_buffer_size")]
    pub initial_buffer_size: usize,
}

impl Default for SerdeConfig {
    fn default() -> Self {
        Self {
            key_subject_strategy: None,
            value_subject_strategy: None,
            fail_on_missing_schema: true,
            json_fallback: true,
            initial_buffer_size: default_buffer_size(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_buffer_size() -> usize {
    crate::wire::DEFAULT_BUFFER_SIZE
}

impl SerdeConfig {
    pub fn with_value_strategy(mut self, name: impl Into<String>) -> Self {
        self.value_subject_strategy = Some(name.into());
        self
    }

    pub fn with_key_strategy(mut self, name: impl Into<String>) -> Self {
        self.key_subject_strategy = Some(name.into());
        self
    }

    pub fn with_fail_on_missing_schema(mut self, strict: bool) -> Self {
        self.fail_on_missing_schema = strict;
        self
    }

    pub fn with_json_fallback(mut self, enabled: bool) -> Self {
        self.json_fallback = enabled;
        self
    }

    /// Resolve the configured strategy names
    pub fn subject_naming(&self) -> NamingResult<SubjectNaming> {
        SubjectNaming::from_names(
            self.key_subject_strategy.as_deref(),
            self.value_subject_strategy.as_deref(),
        )
    }

    pub fn validate(&self) -> NamingResult<()> {
        self.subject_naming()?;
        Ok(())
    }
}
