//! Schema catalog
//!
//! Mirrors the registry into memory so the encode/decode path never waits on
//! the network.
//!
//! ```text
//!   initialize() / refresh()
//!        │
//!        ├── GET /subjects                      (or configured subject list)
//!        ├── GET /subjects/{s}/versions/latest  (≤ concurrency_limit in flight)
//!        ├── parse each schema                  (failures logged and dropped)
//!        ├── publish snapshot ──────────────────► resolve_by_id / resolve_by_subject
//!        │
//!        └── fetch_all_versions:
//!            ├── GET /subjects/{s}/versions
//!            ├── GET /subjects/{s}/versions/{n}
//!            └── publish merged snapshot
//! ```
//!
//! Lookups clone the current `Arc<CatalogSnapshot>`, so a reader sees either
//! the old or the new snapshot, never a partially built one.
//!
//! # Example
//!
//! ```rust,ignore
//! use schemabus::{CatalogConfig, RegistryConfig, SchemaCatalog};
//!
//! let config = CatalogConfig::new(RegistryConfig::new("http://localhost:8081"))
//!     .with_refresh_interval(std::time::Duration::from_secs(60));
//! let catalog = std::sync::Arc::new(SchemaCatalog::new(config)?);
//! catalog.initialize().await?;
//! catalog.start_refresh();
//!
//! let orders = catalog.resolve_by_subject("orders");
//! ```

mod refresh;
mod snapshot;

pub use refresh::RefreshScheduler;
pub use snapshot::CatalogSnapshot;

use crate::avro::{AvroParser, AvroType, SchemaParser};
use crate::client::{HttpRegistryClient, RegistryClient};
use crate::config::{CatalogConfig, TopicSelection};
use crate::error::RegistryResult;
use crate::types::{
    Channel, ResolvedSchema, SchemaId, SchemaRecord, SchemaVersion, Subject, SubjectVersion,
};
use futures::stream::{self, StreamExt, TryStreamExt};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// In-memory mirror of a schema registry
pub struct SchemaCatalog {
    client: Arc<dyn RegistryClient>,
    parser: Arc<dyn SchemaParser>,
    config: CatalogConfig,
    snapshot: RwLock<Arc<CatalogSnapshot>>,
    refresh: Mutex<Option<RefreshScheduler>>,
    initialized: AtomicBool,
    disposed: AtomicBool,
}

impl std::fmt::Debug for SchemaCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaCatalog")
            .field("registry", &self.config.registry.url)
            .field("topics", &self.config.topics)
            .field("schemas", &self.snapshot.read().schema_count())
            .finish()
    }
}

impl SchemaCatalog {
    /// Catalog backed by the HTTP registry client and the Avro parser
    pub fn new(config: CatalogConfig) -> RegistryResult<Self> {
        config.validate()?;
        let client = Arc::new(HttpRegistryClient::new(&config.registry)?);
        Ok(Self::with_client(config, client))
    }

    /// Catalog backed by a custom registry client
    pub fn with_client(config: CatalogConfig, client: Arc<dyn RegistryClient>) -> Self {
        let parser = Arc::new(AvroParser::new(config.parser.clone()));
        Self {
            client,
            parser,
            config,
            snapshot: RwLock::new(Arc::new(CatalogSnapshot::new())),
            refresh: Mutex::new(None),
            initialized: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
        }
    }

    /// Replace the schema parser
    pub fn with_parser(mut self, parser: Arc<dyn SchemaParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Load the first snapshot.
    ///
    /// Fails if the subject list cannot be fetched or the registry is
    /// unreachable. Subjects without a registered version and schemas that
    /// fail to parse are skipped.
    ///
    /// With `fetch_all_versions`, the catalog counts as initialized as soon
    /// as the latest-only snapshot is published. If fetching history fails
    /// afterwards this returns the error, but `is_initialized` stays `true`
    /// and lookups keep serving the latest versions.
    pub async fn initialize(&self) -> RegistryResult<Arc<CatalogSnapshot>> {
        let snapshot = self.synchronize(true).await?;
        self.initialized.store(true, Ordering::Release);
        Ok(snapshot)
    }

    /// Rebuild the catalog and swap in the result.
    ///
    /// Errors are logged; the previous snapshot stays in place.
    pub async fn refresh(&self) {
        if self.disposed.load(Ordering::Acquire) {
            return;
        }
        match self.synchronize(false).await {
            Ok(snapshot) => tracing::debug!(
                schemas = snapshot.schema_count(),
                subjects = snapshot.subject_count(),
                "Schema catalog refreshed"
            ),
            Err(e) => tracing::warn!(error = %e, "Schema catalog refresh failed, keeping previous snapshot"),
        }
    }

    /// Start periodic refresh if an interval is configured.
    ///
    /// Returns `false` when refresh is disabled, already running, or the
    /// catalog has been disposed.
    pub fn start_refresh(self: &Arc<Self>) -> bool {
        let Some(interval) = self.config.refresh_interval() else {
            return false;
        };
        if self.disposed.load(Ordering::Acquire) {
            return false;
        }
        let mut refresh = self.refresh.lock();
        if refresh.as_ref().is_some_and(RefreshScheduler::is_running) {
            return false;
        }
        *refresh = Some(RefreshScheduler::spawn(Arc::downgrade(self), interval));
        true
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh
            .lock()
            .as_ref()
            .is_some_and(RefreshScheduler::is_running)
    }

    /// Stop background refresh. Lookups keep serving the last snapshot.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
        if let Some(scheduler) = self.refresh.lock().take() {
            scheduler.cancel();
            tracing::info!("Schema catalog refresh stopped");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// The current snapshot
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.snapshot.read().clone()
    }

    pub fn resolve_by_id(&self, id: SchemaId) -> Option<Arc<AvroType>> {
        self.snapshot().by_id(id)
    }

    /// Latest value schema for a bare (`orders`) or full (`orders-value`)
    /// subject
    pub fn resolve_by_subject(&self, subject: &str) -> Option<ResolvedSchema> {
        self.snapshot().latest(subject, Channel::Value)
    }

    /// Latest key schema for a bare (`orders`) or full (`orders-key`) subject
    pub fn resolve_key_by_subject(&self, subject: &str) -> Option<ResolvedSchema> {
        self.snapshot().latest(subject, Channel::Key)
    }

    pub fn resolve_for_channel(&self, subject: &str, channel: Channel) -> Option<ResolvedSchema> {
        self.snapshot().latest(subject, channel)
    }

    /// A specific version; the latest record answers for its own version
    /// even when history is not loaded.
    pub fn resolve_version(&self, subject: &str, version: u32) -> Option<ResolvedSchema> {
        let snapshot = self.snapshot();
        snapshot.version(subject, version).or_else(|| {
            let channel = Subject::new(subject).bare().1;
            snapshot
                .latest(subject, channel)
                .filter(|r| r.version == version && r.subject.as_str() == subject)
        })
    }

    fn publish(&self, snapshot: CatalogSnapshot) -> Arc<CatalogSnapshot> {
        let snapshot = Arc::new(snapshot);
        *self.snapshot.write() = snapshot.clone();
        tracing::info!(
            schemas = snapshot.schema_count(),
            subjects = snapshot.subject_count(),
            versions = snapshot.version_count(),
            rejected = snapshot.rejected().len(),
            "Published schema catalog snapshot"
        );
        snapshot
    }

    /// Build a complete snapshot from the registry.
    ///
    /// With `publish_latest` the latest-only snapshot is published before
    /// history is fetched, so lookups work as early as possible.
    async fn synchronize(&self, publish_latest: bool) -> RegistryResult<Arc<CatalogSnapshot>> {
        let subjects = self.discover_subjects().await?;
        let limit = self.config.concurrency_limit.max(1);

        let latest: Vec<SubjectVersion> = stream::iter(subjects)
            .map(|subject| async move { self.fetch_version(subject, SchemaVersion::Latest).await })
            .buffer_unordered(limit)
            .try_collect::<Vec<_>>()
            .await?
            .into_iter()
            .flatten()
            .collect();

        let known: Vec<Subject> = latest.iter().map(|sv| Subject::new(&sv.subject)).collect();

        let mut snapshot = CatalogSnapshot::new();
        for sv in latest {
            snapshot.insert_latest(self.compile(sv));
        }

        if !self.config.fetch_all_versions {
            return Ok(self.publish(snapshot));
        }

        if publish_latest {
            let published = self.publish(snapshot);
            self.initialized.store(true, Ordering::Release);
            snapshot = (*published).clone();
        }

        let versions: Vec<(Subject, Vec<u32>)> = stream::iter(known)
            .map(|subject| async move { self.fetch_versions(subject).await })
            .buffer_unordered(limit)
            .try_collect::<Vec<_>>()
            .await?
            .into_iter()
            .flatten()
            .collect();

        let pairs = versions
            .into_iter()
            .flat_map(|(subject, versions)| versions.into_iter().map(move |v| (subject.clone(), v)));

        let history: Vec<SubjectVersion> = stream::iter(pairs)
            .map(|(subject, version)| async move {
                self.fetch_version(subject, SchemaVersion::Number(version)).await
            })
            .buffer_unordered(limit)
            .try_collect::<Vec<_>>()
            .await?
            .into_iter()
            .flatten()
            .collect();

        for sv in history {
            snapshot.insert_version(self.compile(sv));
        }

        Ok(self.publish(snapshot))
    }

    async fn discover_subjects(&self) -> RegistryResult<Vec<Subject>> {
        match &self.config.topics {
            TopicSelection::Subjects(subjects) => {
                Ok(subjects.iter().map(|s| Subject::new(s.as_str())).collect())
            }
            TopicSelection::All => {
                let subjects = self.client.list_subjects().await?;
                tracing::debug!(count = subjects.len(), "Discovered registry subjects");
                Ok(subjects)
            }
        }
    }

    /// `None` when the registry has no such subject or version
    async fn fetch_version(
        &self,
        subject: Subject,
        version: SchemaVersion,
    ) -> RegistryResult<Option<SubjectVersion>> {
        match self.client.get_version(&subject, version).await {
            Ok(mut sv) => {
                sv.subject = subject.0;
                Ok(Some(sv))
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!(subject = %subject, version = %version, "Subject version not registered, skipping");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_versions(&self, subject: Subject) -> RegistryResult<Option<(Subject, Vec<u32>)>> {
        match self.client.list_versions(&subject).await {
            Ok(versions) => Ok(Some((subject, versions))),
            Err(e) if e.is_not_found() => {
                tracing::debug!(subject = %subject, "Subject has no versions, skipping history");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn compile(&self, sv: SubjectVersion) -> SchemaRecord {
        let (parsed, parse_error) = match self.parser.parse(&sv.schema) {
            Ok(parsed) => (Some(Arc::new(parsed)), None),
            Err(e) => {
                tracing::warn!(
                    subject = %sv.subject,
                    version = sv.version,
                    schema_id = %sv.id,
                    error = %e,
                    "Dropping schema that failed to parse"
                );
                (None, Some(e.to_string()))
            }
        };

        SchemaRecord {
            subject: Subject::new(sv.subject),
            version: sv.version,
            id: sv.id,
            raw_schema: sv.schema,
            parsed,
            parse_error,
        }
    }
}

impl Drop for SchemaCatalog {
    fn drop(&mut self) {
        if let Some(scheduler) = self.refresh.get_mut().take() {
            scheduler.cancel();
        }
    }
}
