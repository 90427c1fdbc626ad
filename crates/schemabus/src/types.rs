//! Core registry types

use crate::avro::AvroType;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Registry-wide schema identifier, as carried in the wire-format header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaId(pub i32);

impl SchemaId {
    pub fn new(id: i32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for SchemaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message channel a subject belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Key,
    Value,
}

impl Channel {
    pub fn from_is_key(is_key: bool) -> Self {
        if is_key {
            Channel::Key
        } else {
            Channel::Value
        }
    }

    /// Subject suffix under TopicNameStrategy
    pub fn suffix(&self) -> &'static str {
        match self {
            Channel::Key => "-key",
            Channel::Value => "-value",
        }
    }
}

/// Registry subject name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Subject(pub String);

impl Subject {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Value subject for a topic: `{topic}-value`
    pub fn value(topic: &str) -> Self {
        Self(format!("{}{}", topic, Channel::Value.suffix()))
    }

    /// Key subject for a topic: `{topic}-key`
    pub fn key(topic: &str) -> Self {
        Self(format!("{}{}", topic, Channel::Key.suffix()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into the bare name and its channel.
    ///
    /// `orders-value` -> (`orders`, Value), `orders-key` -> (`orders`, Key),
    /// `Student` -> (`Student`, Value).
    pub fn bare(&self) -> (&str, Channel) {
        if let Some(bare) = self.0.strip_suffix(Channel::Key.suffix()) {
            if !bare.is_empty() {
                return (bare, Channel::Key);
            }
        }
        if let Some(bare) = self.0.strip_suffix(Channel::Value.suffix()) {
            if !bare.is_empty() {
                return (bare, Channel::Value);
            }
        }
        (&self.0, Channel::Value)
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Subject {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Subject {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Version selector for registry lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaVersion {
    Latest,
    Number(u32),
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaVersion::Latest => write!(f, "latest"),
            SchemaVersion::Number(v) => write!(f, "{}", v),
        }
    }
}

impl From<u32> for SchemaVersion {
    fn from(v: u32) -> Self {
        SchemaVersion::Number(v)
    }
}

/// A specific version of a schema for a subject, as returned by
/// `GET /subjects/{subject}/versions/{version}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectVersion {
    pub subject: String,
    pub version: u32,
    pub id: SchemaId,
    pub schema: String,
}

/// One registry entry together with its compiled form.
///
/// Exactly one of `parsed` / `parse_error` is set.
#[derive(Debug, Clone)]
pub struct SchemaRecord {
    pub subject: Subject,
    pub version: u32,
    pub id: SchemaId,
    pub raw_schema: String,
    pub parsed: Option<Arc<AvroType>>,
    pub parse_error: Option<String>,
}

impl SchemaRecord {
    pub fn is_parsed(&self) -> bool {
        self.parsed.is_some()
    }
}

/// Result of a subject lookup against the catalog
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    pub subject: Subject,
    pub version: u32,
    pub id: SchemaId,
    pub schema: Arc<AvroType>,
}
