//! Producer/consumer adapters
//!
//! Glue between a message-bus client and the schema machinery. The transport
//! is never patched; [`SchemaProducer`] wraps any [`MessageProducer`] and
//! serializes before delegating to it.
//!
//! ```rust,ignore
//! use schemabus::{SchemaProducer, SchemaSerializer, SerdeConfig};
//!
//! let serializer = SchemaSerializer::new(catalog.clone(), SerdeConfig::default())?;
//! let producer = SchemaProducer::new(my_transport, serializer);
//! producer.send("orders", None, &serde_json::json!({"id": 1})).await?;
//! ```

use crate::avro::AvroType;
use crate::catalog::SchemaCatalog;
use crate::config::SerdeConfig;
use crate::error::{CodecError, NamingResult, Result, SerdeError, SerdeResult};
use crate::naming::{strip_type_tag, SubjectNameStrategy, SubjectNaming};
use crate::types::{ResolvedSchema, SchemaId};
use crate::wire::WireCodec;
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;

/// Encodes payloads for a topic using the catalog's schemas
pub struct SchemaSerializer {
    catalog: Arc<SchemaCatalog>,
    naming: SubjectNaming,
    config: SerdeConfig,
}

impl SchemaSerializer {
    /// Fails if a configured naming strategy name is unknown
    pub fn new(catalog: Arc<SchemaCatalog>, config: SerdeConfig) -> NamingResult<Self> {
        let naming = config.subject_naming()?;
        Ok(Self {
            catalog,
            naming,
            config,
        })
    }

    pub fn naming(&self) -> &SubjectNaming {
        &self.naming
    }

    /// Serialize a key or value payload.
    ///
    /// Without a registered schema the payload is rejected, or sent as JSON
    /// when `fail_on_missing_schema` is off. The type tag never reaches the
    /// wire.
    pub fn serialize(&self, topic: &str, payload: &JsonValue, is_key: bool) -> SerdeResult<Bytes> {
        let subject = self.naming.prepare_subject_name(topic, payload, is_key)?;
        let body = strip_type_tag(payload);

        match self.resolve(&subject, is_key) {
            Some(resolved) => {
                let bytes = WireCodec::encode(
                    &body,
                    &resolved.schema,
                    resolved.id,
                    self.config.initial_buffer_size,
                )?;
                Ok(Bytes::from(bytes))
            }
            None if self.config.fail_on_missing_schema => {
                Err(SerdeError::MissingSchema { subject })
            }
            None => {
                tracing::debug!(topic, subject = %subject, "No schema registered, sending JSON");
                Ok(Bytes::from(serde_json::to_vec(&*body)?))
            }
        }
    }

    fn resolve(&self, subject: &str, is_key: bool) -> Option<ResolvedSchema> {
        if !is_key {
            return self.catalog.resolve_by_subject(subject);
        }
        let key = self.catalog.resolve_key_by_subject(subject);
        match self.naming.strategy(true) {
            SubjectNameStrategy::TopicName => key,
            // record subjects carry no -key suffix
            _ => key.or_else(|| self.catalog.resolve_by_subject(subject)),
        }
    }
}

/// How a consumed payload was encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    Avro,
    Json,
}

/// A consumed payload
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMessage {
    pub value: JsonValue,
    /// Set for Avro payloads
    pub schema_id: Option<SchemaId>,
    pub format: PayloadFormat,
}

/// Decodes consumed payloads using the catalog's schemas
pub struct SchemaDeserializer {
    catalog: Arc<SchemaCatalog>,
    config: SerdeConfig,
    readers: HashMap<String, Arc<AvroType>>,
    fallback_writer: Option<Arc<AvroType>>,
}

impl SchemaDeserializer {
    pub fn new(catalog: Arc<SchemaCatalog>, config: SerdeConfig) -> Self {
        Self {
            catalog,
            config,
            readers: HashMap::new(),
            fallback_writer: None,
        }
    }

    /// Decode messages on `topic` into `reader`'s shape
    pub fn with_reader_schema(mut self, topic: impl Into<String>, reader: Arc<AvroType>) -> Self {
        self.readers.insert(topic.into(), reader);
        self
    }

    /// Writer schema used when an id is not in the catalog
    pub fn with_fallback_writer(mut self, writer: Arc<AvroType>) -> Self {
        self.fallback_writer = Some(writer);
        self
    }

    pub fn deserialize(&self, topic: &str, bytes: &[u8]) -> SerdeResult<DecodedMessage> {
        let reader = self.readers.get(topic).map(|r| &**r);
        let decoded = WireCodec::decode(
            bytes,
            |id| self.catalog.resolve_by_id(id),
            self.fallback_writer.as_deref(),
            reader,
        );

        match decoded {
            Ok(decoded) => Ok(DecodedMessage {
                value: decoded.value,
                schema_id: Some(decoded.schema_id),
                format: PayloadFormat::Avro,
            }),
            Err(CodecError::WireFormat(reason)) if self.config.json_fallback => {
                match serde_json::from_slice(bytes) {
                    Ok(value) => Ok(DecodedMessage {
                        value,
                        schema_id: None,
                        format: PayloadFormat::Json,
                    }),
                    Err(_) => Err(CodecError::WireFormat(reason).into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Message-bus send side, implemented by the transport client
#[async_trait]
pub trait MessageProducer: Send + Sync {
    /// Whatever the transport reports back for a delivered message
    type Receipt: Send;

    async fn send(&self, topic: &str, key: Option<Bytes>, value: Bytes) -> Result<Self::Receipt>;
}

/// Transport wrapper that serializes key and value before sending
pub struct SchemaProducer<P> {
    inner: P,
    serializer: SchemaSerializer,
}

impl<P: MessageProducer> SchemaProducer<P> {
    pub fn new(inner: P, serializer: SchemaSerializer) -> Self {
        Self { inner, serializer }
    }

    pub async fn send(
        &self,
        topic: &str,
        key: Option<&JsonValue>,
        value: &JsonValue,
    ) -> Result<P::Receipt> {
        let key = key
            .map(|k| self.serializer.serialize(topic, k, true))
            .transpose()?;
        let value = self.serializer.serialize(topic, value, false)?;
        self.inner.send(topic, key, value).await
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn serializer(&self) -> &SchemaSerializer {
        &self.serializer
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}
