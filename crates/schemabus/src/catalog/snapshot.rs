//! Immutable catalog indices

use crate::avro::AvroType;
use crate::types::{Channel, ResolvedSchema, SchemaId, SchemaRecord, Subject};
use std::collections::HashMap;
use std::sync::Arc;

/// One published view of the registry.
///
/// Built by a sync, then only read. Refreshes build a new snapshot rather than
/// modifying a published one.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    by_id: HashMap<SchemaId, Arc<SchemaRecord>>,
    /// Keyed by the full registry subject
    latest: HashMap<String, Arc<SchemaRecord>>,
    by_version: HashMap<(Subject, u32), Arc<SchemaRecord>>,
    rejected: Vec<Arc<SchemaRecord>>,
}

impl CatalogSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a subject's latest record.
    ///
    /// Unparsed records are kept only in the rejected list. When the subject
    /// already has a record, the higher version wins.
    pub fn insert_latest(&mut self, record: SchemaRecord) {
        let record = Arc::new(record);
        if !record.is_parsed() {
            self.rejected.push(record);
            return;
        }

        self.by_id.insert(record.id, record.clone());

        match self.latest.get(record.subject.as_str()) {
            Some(existing) if existing.version >= record.version => {}
            _ => {
                self.latest
                    .insert(record.subject.as_str().to_string(), record.clone());
            }
        }
    }

    /// Index a historical record by id and `(subject, version)`
    pub fn insert_version(&mut self, record: SchemaRecord) {
        let record = Arc::new(record);
        if !record.is_parsed() {
            self.rejected.push(record);
            return;
        }
        self.by_id.entry(record.id).or_insert_with(|| record.clone());
        self.by_version
            .insert((record.subject.clone(), record.version), record);
    }

    pub fn by_id(&self, id: SchemaId) -> Option<Arc<AvroType>> {
        self.by_id.get(&id).and_then(|r| r.parsed.clone())
    }

    pub fn record_by_id(&self, id: SchemaId) -> Option<&Arc<SchemaRecord>> {
        self.by_id.get(&id)
    }

    /// Latest schema for `subject` on `channel`.
    ///
    /// An exact registry subject on the same channel wins; otherwise
    /// `subject` is taken as a topic and the `-value` / `-key` subject is
    /// used.
    pub fn latest(&self, subject: &str, channel: Channel) -> Option<ResolvedSchema> {
        self.latest
            .get(subject)
            .filter(|r| r.subject.bare().1 == channel)
            .or_else(|| {
                self.latest
                    .get(&format!("{}{}", subject, channel.suffix()))
            })
            .and_then(|r| resolved(r))
    }

    pub fn version(&self, subject: &str, version: u32) -> Option<ResolvedSchema> {
        self.by_version
            .get(&(Subject::new(subject), version))
            .and_then(|r| resolved(r))
    }

    /// Registry subjects with a latest record
    pub fn subjects(&self) -> impl Iterator<Item = &Subject> {
        self.latest.values().map(|r| &r.subject)
    }

    pub fn schema_count(&self) -> usize {
        self.by_id.len()
    }

    pub fn subject_count(&self) -> usize {
        self.latest.len()
    }

    pub fn version_count(&self) -> usize {
        self.by_version.len()
    }

    /// Records dropped because their schema failed to parse
    pub fn rejected(&self) -> &[Arc<SchemaRecord>] {
        &self.rejected
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

fn resolved(record: &SchemaRecord) -> Option<ResolvedSchema> {
    record.parsed.as_ref().map(|schema| ResolvedSchema {
        subject: record.subject.clone(),
        version: record.version,
        id: record.id,
        schema: schema.clone(),
    })
}
