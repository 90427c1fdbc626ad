//! In-memory registry used by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use schemabus::{
    RegistryClient, RegistryError, RegistryResult, SchemaId, SchemaVersion, Subject,
    SubjectVersion,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const STUDENT_V1: &str = r#"{
    "type": "record",
    "name": "Student",
    "fields": [
        {"name": "name", "type": "string"},
        {"name": "age", "type": "int"}
    ]
}"#;

pub const STUDENT_V2: &str = r#"{
    "type": "record",
    "name": "Student",
    "fields": [
        {"name": "name", "type": "string"},
        {"name": "age", "type": "int"},
        {"name": "anotherString", "type": "string", "default": "defaultValue"}
    ]
}"#;

pub fn record_schema(name: &str) -> String {
    format!(
        r#"{{"type":"record","name":"{}","fields":[{{"name":"id","type":"long"}}]}}"#,
        name
    )
}

#[derive(Default)]
struct State {
    subjects: BTreeMap<String, Vec<(u32, i32, String)>>,
    missing_latest: HashSet<String>,
    unreachable: HashSet<String>,
    listing_down: bool,
    history_down: bool,
}

/// Registry fake with failure injection and request accounting
#[derive(Default)]
pub struct MemoryRegistry {
    state: Mutex<State>,
    latency: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requests: AtomicUsize,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Register `schema` as the next version of `subject`
    pub fn register(&self, subject: &str, id: i32, schema: &str) -> &Self {
        let mut state = self.state.lock();
        let versions = state.subjects.entry(subject.to_string()).or_default();
        let version = versions.len() as u32 + 1;
        versions.push((version, id, schema.to_string()));
        self
    }

    /// Subject is listed but its latest version lookup returns 404
    pub fn hide_latest(&self, subject: &str) {
        self.state.lock().missing_latest.insert(subject.to_string());
    }

    /// Every lookup for the subject fails with a network error
    pub fn make_unreachable(&self, subject: &str) {
        self.state.lock().unreachable.insert(subject.to_string());
    }

    pub fn restore(&self, subject: &str) {
        let mut state = self.state.lock();
        state.unreachable.remove(subject);
        state.missing_latest.remove(subject);
    }

    pub fn set_listing_down(&self, down: bool) {
        self.state.lock().listing_down = down;
    }

    /// Version listing fails; latest lookups still work
    pub fn set_history_down(&self, down: bool) {
        self.state.lock().history_down = down;
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> InFlight<'_> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        InFlight(&self.in_flight)
    }

    fn check_reachable(&self, subject: &Subject) -> RegistryResult<()> {
        if self.state.lock().unreachable.contains(subject.as_str()) {
            return Err(RegistryError::Network(format!(
                "connection refused while fetching {}",
                subject
            )));
        }
        Ok(())
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RegistryClient for MemoryRegistry {
    async fn list_subjects(&self) -> RegistryResult<Vec<Subject>> {
        let _guard = self.enter().await;
        let state = self.state.lock();
        if state.listing_down {
            return Err(RegistryError::Network("registry unavailable".into()));
        }
        Ok(state.subjects.keys().map(|s| Subject::new(s.as_str())).collect())
    }

    async fn list_versions(&self, subject: &Subject) -> RegistryResult<Vec<u32>> {
        let _guard = self.enter().await;
        self.check_reachable(subject)?;
        let state = self.state.lock();
        if state.history_down {
            return Err(RegistryError::Network("version listing unavailable".into()));
        }
        state
            .subjects
            .get(subject.as_str())
            .map(|versions| versions.iter().map(|(v, _, _)| *v).collect())
            .ok_or_else(|| RegistryError::SubjectNotFound(subject.to_string()))
    }

    async fn get_version(
        &self,
        subject: &Subject,
        version: SchemaVersion,
    ) -> RegistryResult<SubjectVersion> {
        let _guard = self.enter().await;
        self.check_reachable(subject)?;
        let state = self.state.lock();
        if version == SchemaVersion::Latest && state.missing_latest.contains(subject.as_str()) {
            return Err(RegistryError::VersionNotFound(format!("{} latest", subject)));
        }
        let versions = state
            .subjects
            .get(subject.as_str())
            .ok_or_else(|| RegistryError::SubjectNotFound(subject.to_string()))?;
        let found = match version {
            SchemaVersion::Latest => versions.last(),
            SchemaVersion::Number(n) => versions.iter().find(|(v, _, _)| *v == n),
        };
        let (v, id, schema) = found
            .ok_or_else(|| RegistryError::VersionNotFound(format!("{} {}", subject, version)))?;
        Ok(SubjectVersion {
            subject: subject.to_string(),
            version: *v,
            id: SchemaId::new(*id),
            schema: schema.clone(),
        })
    }
}
