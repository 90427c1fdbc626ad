//! Subject naming strategies
//!
//! Maps `(topic, payload, key/value)` to the registry subject whose schema
//! encodes the payload.
//!
//! | Strategy | Subject |
//! |----------|---------|
//! | `TopicNameStrategy` (default) | `{topic}` |
//! | `RecordNameStrategy` | `{record}` |
//! | `TopicRecordNameStrategy` | `{topic}-{record}` |
//!
//! The record name is read from the payload's [`TYPE_TAG`] field, which the
//! producer sets explicitly. The tag is not part of the record and must be
//! removed with [`strip_type_tag`] before the payload is serialized.

use crate::error::{NamingError, NamingResult};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::borrow::Cow;

/// Payload field carrying the logical record name
pub const TYPE_TAG: &str = "__type";

/// Strategy for deriving a subject name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SubjectNameStrategy {
    #[default]
    TopicName,
    RecordName,
    TopicRecordName,
}

impl SubjectNameStrategy {
    pub const ALL: [SubjectNameStrategy; 3] = [
        SubjectNameStrategy::TopicName,
        SubjectNameStrategy::RecordName,
        SubjectNameStrategy::TopicRecordName,
    ];

    pub fn canonical_name(&self) -> &'static str {
        match self {
            SubjectNameStrategy::TopicName => "TopicNameStrategy",
            SubjectNameStrategy::RecordName => "RecordNameStrategy",
            SubjectNameStrategy::TopicRecordName => "TopicRecordNameStrategy",
        }
    }

    /// Parse an optional configuration value; absent or empty means
    /// `TopicName`.
    pub fn from_config(name: Option<&str>) -> NamingResult<Self> {
        match name.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(name) => name.parse(),
        }
    }

    fn requires_type_tag(&self) -> bool {
        !matches!(self, SubjectNameStrategy::TopicName)
    }

    pub fn subject_name(&self, topic: &str, payload: &JsonValue) -> NamingResult<String> {
        if !self.requires_type_tag() {
            return Ok(topic.to_string());
        }
        let record = type_tag(payload).ok_or_else(|| NamingError::MissingTypeTag {
            topic: topic.to_string(),
            tag: TYPE_TAG,
            strategy: self.canonical_name(),
        })?;
        Ok(match self {
            SubjectNameStrategy::TopicRecordName => format!("{}-{}", topic, record),
            _ => record.to_string(),
        })
    }
}

impl std::fmt::Display for SubjectNameStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.canonical_name())
    }
}

impl std::str::FromStr for SubjectNameStrategy {
    type Err = NamingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.canonical_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| NamingError::InvalidStrategy {
                name: s.to_string(),
                valid: Self::ALL
                    .iter()
                    .map(|s| s.canonical_name())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// Key and value strategies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubjectNaming {
    key: SubjectNameStrategy,
    value: SubjectNameStrategy,
}

impl SubjectNaming {
    pub fn new(key: SubjectNameStrategy, value: SubjectNameStrategy) -> Self {
        Self { key, value }
    }

    /// Build from configured strategy names
    pub fn from_names(key: Option<&str>, value: Option<&str>) -> NamingResult<Self> {
        Ok(Self {
            key: SubjectNameStrategy::from_config(key)?,
            value: SubjectNameStrategy::from_config(value)?,
        })
    }

    pub fn key_strategy(&self) -> SubjectNameStrategy {
        self.key
    }

    pub fn value_strategy(&self) -> SubjectNameStrategy {
        self.value
    }

    pub fn strategy(&self, is_key: bool) -> SubjectNameStrategy {
        if is_key {
            self.key
        } else {
            self.value
        }
    }

    pub fn prepare_subject_name(
        &self,
        topic: &str,
        payload: &JsonValue,
        is_key: bool,
    ) -> NamingResult<String> {
        self.strategy(is_key).subject_name(topic, payload)
    }
}

/// The payload's logical record name, if tagged
pub fn type_tag(payload: &JsonValue) -> Option<&str> {
    payload
        .get(TYPE_TAG)
        .and_then(JsonValue::as_str)
        .filter(|s| !s.is_empty())
}

/// `payload` without its type tag; borrows when there is nothing to strip.
pub fn strip_type_tag(payload: &JsonValue) -> Cow<'_, JsonValue> {
    match payload {
        JsonValue::Object(obj) if obj.contains_key(TYPE_TAG) => {
            let mut obj = obj.clone();
            obj.remove(TYPE_TAG);
            Cow::Owned(JsonValue::Object(obj))
        }
        _ => Cow::Borrowed(payload),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_is_topic_name() {
        let naming = SubjectNaming::default();
        for payload in [json!({"a": 1}), json!("text"), json!({"__type": "Student"})] {
            assert_eq!(
                naming.prepare_subject_name("orders", &payload, false).unwrap(),
                "orders"
            );
        }
    }

    #[test]
    fn test_explicit_topic_name() {
        let naming = SubjectNaming::from_names(None, Some("TopicNameStrategy")).unwrap();
        assert_eq!(
            naming
                .prepare_subject_name("orders", &json!([1, 2]), false)
                .unwrap(),
            "orders"
        );
    }

    #[test]
    fn test_topic_record_name() {
        let naming = SubjectNaming::from_names(None, Some("TopicRecordNameStrategy")).unwrap();
        let payload = json!({"__type": "Student", "name": "Ada"});
        assert_eq!(
            naming.prepare_subject_name("orders", &payload, false).unwrap(),
            "orders-Student"
        );
    }

    #[test]
    fn test_record_name() {
        let naming = SubjectNaming::from_names(Some("recordnamestrategy"), None).unwrap();
        let payload = json!({"__type": "com.example.Key"});
        assert_eq!(
            naming.prepare_subject_name("orders", &payload, true).unwrap(),
            "com.example.Key"
        );
        // value channel still uses the default
        assert_eq!(
            naming.prepare_subject_name("orders", &payload, false).unwrap(),
            "orders"
        );
    }

    #[test]
    fn test_missing_tag() {
        let naming = SubjectNaming::new(
            SubjectNameStrategy::TopicName,
            SubjectNameStrategy::RecordName,
        );
        let err = naming
            .prepare_subject_name("orders", &json!({"name": "Ada"}), false)
            .unwrap_err();
        assert!(matches!(err, NamingError::MissingTypeTag { .. }));
    }

    #[test]
    fn test_invalid_strategy_lists_valid_names() {
        let err = SubjectNaming::from_names(None, Some("bogus")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("bogus"));
        assert!(msg.contains("TopicNameStrategy"));
        assert!(msg.contains("RecordNameStrategy"));
        assert!(msg.contains("TopicRecordNameStrategy"));
    }

    #[test]
    fn test_empty_name_is_default() {
        assert_eq!(
            SubjectNameStrategy::from_config(Some("  ")).unwrap(),
            SubjectNameStrategy::TopicName
        );
    }

    #[test]
    fn test_strip_type_tag() {
        let payload = json!({"__type": "Student", "name": "Ada"});
        assert_eq!(*strip_type_tag(&payload), json!({"name": "Ada"}));

        let untagged = json!({"name": "Ada"});
        assert!(matches!(strip_type_tag(&untagged), Cow::Borrowed(_)));
    }
}
