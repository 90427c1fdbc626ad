//! Error types
//!
//! Each concern has its own error enum so callers can match on exactly the
//! failures that concern produces:
//!
//! | Error | Raised by |
//! |-------|-----------|
//! | [`RegistryError`] | registry HTTP client, catalog initialization |
//! | [`CodecError`] | schema parsing, wire-format encode/decode |
//! | [`NamingError`] | subject naming strategy construction and use |
//! | [`SerdeError`] | serializer/deserializer adapters |
//! | [`Error`] | producer adapter (serialization plus transport) |

use crate::types::SchemaId;
use thiserror::Error;

/// Confluent-compatible error codes returned in registry error bodies
pub mod error_codes {
    pub const SUBJECT_NOT_FOUND: u32 = 40401;
    pub const VERSION_NOT_FOUND: u32 = 40402;
    pub const SCHEMA_NOT_FOUND: u32 = 40403;
}

/// Registry access errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Subject not found: {0}")]
    SubjectNotFound(String),

    #[error("Version not found: {0}")]
    VersionNotFound(String),

    #[error("Schema not found: {0}")]
    SchemaNotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected registry response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RegistryError {
    /// Whether the registry reported that the requested subject or version
    /// does not exist (as opposed to being unreachable).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RegistryError::SubjectNotFound(_)
                | RegistryError::VersionNotFound(_)
                | RegistryError::SchemaNotFound(_)
        )
    }
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RegistryError::InvalidResponse(err.to_string())
        } else {
            RegistryError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        RegistryError::InvalidResponse(err.to_string())
    }
}

pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// Schema parsing and wire-format errors
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Schema parse error: {0}")]
    Parse(String),

    #[error("Invalid wire format: {0}")]
    WireFormat(String),

    #[error("Unknown schema id: {0}")]
    UnknownSchemaId(SchemaId),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },
}

pub type CodecResult<T> = std::result::Result<T, CodecError>;

impl From<apache_avro::Error> for CodecError {
    fn from(e: apache_avro::Error) -> Self {
        CodecError::Parse(e.to_string())
    }
}

/// Subject naming errors
#[derive(Debug, Error)]
pub enum NamingError {
    #[error("Invalid subject name strategy '{name}', expected one of: {valid}")]
    InvalidStrategy { name: String, valid: String },

    #[error("Payload for topic '{topic}' carries no '{tag}' type tag, required by {strategy}")]
    MissingTypeTag {
        topic: String,
        tag: &'static str,
        strategy: &'static str,
    },
}

pub type NamingResult<T> = std::result::Result<T, NamingError>;

/// Serializer/deserializer adapter errors
#[derive(Debug, Error)]
pub enum SerdeError {
    #[error("No schema registered for subject '{subject}'")]
    MissingSchema { subject: String },

    #[error(transparent)]
    Naming(#[from] NamingError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SerdeResult<T> = std::result::Result<T, SerdeError>;

/// Top-level error for the producer adapter
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Serde(#[from] SerdeError),

    #[error("Transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, Error>;
