//! # schemabus
//!
//! Schema-registry backed Avro messaging for publish/subscribe buses.
//!
//! ## Features
//!
//! - **Schema catalog**: mirrors a Confluent-compatible registry into memory
//!   with bounded request concurrency and atomic snapshot swaps
//! - **Wire format**: Confluent framing with automatic buffer growth
//! - **Schema evolution**: reader/writer resolution with field defaults
//! - **Subject naming**: topic, record and topic-record strategies
//! - **Adapters**: serializer, deserializer and a producer wrapper for any
//!   transport
//!
//! ## Confluent Wire Format
//!
//! ```text
//! [0x00][schema_id: 4 bytes big-endian][avro_binary_data]
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use schemabus::{CatalogConfig, RegistryConfig, SchemaCatalog, WireCodec};
//! use std::sync::Arc;
//!
//! let catalog = Arc::new(SchemaCatalog::new(CatalogConfig::new(
//!     RegistryConfig::new("http://localhost:8081"),
//! ))?);
//! catalog.initialize().await?;
//!
//! let orders = catalog.resolve_by_subject("orders").expect("registered");
//! let bytes = WireCodec::encode_default(&value, &orders.schema, orders.id)?;
//!
//! let decoded = WireCodec::decode(&bytes, |id| catalog.resolve_by_id(id), None, None)?;
//! ```

pub mod adapter;
pub mod avro;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod naming;
pub mod types;
pub mod wire;

pub use adapter::{
    DecodedMessage, MessageProducer, PayloadFormat, SchemaDeserializer, SchemaProducer,
    SchemaSerializer,
};
pub use avro::{AvroParser, AvroType, BinaryWrite, ParserOptions, SchemaParser, UnionMode};
pub use catalog::{CatalogSnapshot, RefreshScheduler, SchemaCatalog};
pub use client::{HttpRegistryClient, RegistryClient};
pub use config::{CatalogConfig, RegistryConfig, SerdeConfig, TlsConfig, TopicSelection};
pub use error::{
    CodecError, CodecResult, Error, NamingError, NamingResult, RegistryError, RegistryResult,
    Result, SerdeError, SerdeResult,
};
pub use naming::{strip_type_tag, type_tag, SubjectNameStrategy, SubjectNaming, TYPE_TAG};
pub use types::{
    Channel, ResolvedSchema, SchemaId, SchemaRecord, SchemaVersion, Subject, SubjectVersion,
};
pub use wire::{Decoded, WireCodec, DEFAULT_BUFFER_SIZE, HEADER_LEN, MAGIC_BYTE};
