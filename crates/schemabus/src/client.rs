//! Registry client
//!
//! [`RegistryClient`] is the read-only slice of the Confluent REST API the
//! catalog needs. [`HttpRegistryClient`] implements it over HTTP; tests and
//! embedders can supply their own implementation.

use crate::config::RegistryConfig;
use crate::error::{error_codes, RegistryError, RegistryResult};
use crate::types::{SchemaVersion, Subject, SubjectVersion};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

const ACCEPT: &str = "application/vnd.schemaregistry.v1+json";

/// Read access to a schema registry
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// `GET /subjects`
    async fn list_subjects(&self) -> RegistryResult<Vec<Subject>>;

    /// `GET /subjects/{subject}/versions`
    async fn list_versions(&self, subject: &Subject) -> RegistryResult<Vec<u32>>;

    /// `GET /subjects/{subject}/versions/{version}`
    async fn get_version(
        &self,
        subject: &Subject,
        version: SchemaVersion,
    ) -> RegistryResult<SubjectVersion>;
}

/// Confluent-compatible registry client over HTTP
pub struct HttpRegistryClient {
    client: Client,
    base_url: String,
}

impl HttpRegistryClient {
    pub fn new(config: &RegistryConfig) -> RegistryResult<Self> {
        config.validate()?;

        let mut builder = Client::builder().timeout(config.timeout());

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            use base64::Engine;
            use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

            let credentials = format!("{}:{}", username, password);
            let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);

            let mut auth = HeaderValue::from_str(&format!("Basic {}", encoded))
                .map_err(|e| RegistryError::Config(e.to_string()))?;
            auth.set_sensitive(true);

            let mut headers = HeaderMap::new();
            headers.insert(AUTHORIZATION, auth);
            builder = builder.default_headers(headers);
        }

        if let Some(tls) = &config.tls {
            if let Some(path) = &tls.ca_cert_path {
                let pem = std::fs::read(path).map_err(|e| {
                    RegistryError::Config(format!("Cannot read CA certificate {}: {}", path.display(), e))
                })?;
                let cert = reqwest::Certificate::from_pem(&pem)
                    .map_err(|e| RegistryError::Config(format!("Invalid CA certificate: {}", e)))?;
                builder = builder.add_root_certificate(cert);
            }
            if tls.accept_invalid_certs {
                tracing::warn!(url = %config.url, "TLS certificate verification disabled for schema registry");
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        let client = builder
            .build()
            .map_err(|e| RegistryError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn subject_url(&self, subject: &Subject) -> String {
        format!(
            "{}/subjects/{}",
            self.base_url,
            urlencoding::encode(subject.as_str())
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> RegistryResult<T> {
        tracing::debug!(url = %url, "Schema registry request");

        let response = self.client.get(url).header("Accept", ACCEPT).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(parse_error(status, &body, what));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl RegistryClient for HttpRegistryClient {
    async fn list_subjects(&self) -> RegistryResult<Vec<Subject>> {
        let url = format!("{}/subjects", self.base_url);
        let subjects: Vec<String> = self.get_json(&url, "subjects").await?;
        Ok(subjects.into_iter().map(Subject::new).collect())
    }

    async fn list_versions(&self, subject: &Subject) -> RegistryResult<Vec<u32>> {
        let url = format!("{}/versions", self.subject_url(subject));
        self.get_json(&url, subject.as_str()).await
    }

    async fn get_version(
        &self,
        subject: &Subject,
        version: SchemaVersion,
    ) -> RegistryResult<SubjectVersion> {
        let url = format!("{}/versions/{}", self.subject_url(subject), version);
        let what = format!("{} version {}", subject, version);
        self.get_json(&url, &what).await
    }
}

fn parse_error(status: StatusCode, body: &str, what: &str) -> RegistryError {
    #[derive(Deserialize)]
    struct ErrorResponse {
        error_code: Option<u32>,
        message: Option<String>,
    }

    if let Ok(err) = serde_json::from_str::<ErrorResponse>(body) {
        let msg = err.message.unwrap_or_else(|| what.to_string());
        return match err.error_code {
            Some(error_codes::SUBJECT_NOT_FOUND) => RegistryError::SubjectNotFound(msg),
            Some(error_codes::VERSION_NOT_FOUND) => RegistryError::VersionNotFound(msg),
            Some(error_codes::SCHEMA_NOT_FOUND) => RegistryError::SchemaNotFound(msg),
            _ if status == StatusCode::NOT_FOUND => RegistryError::VersionNotFound(msg),
            _ => RegistryError::Network(format!("{}: {}", status, msg)),
        };
    }

    if status == StatusCode::NOT_FOUND {
        return RegistryError::VersionNotFound(what.to_string());
    }

    RegistryError::Network(format!("{}: {}", status, body))
}
