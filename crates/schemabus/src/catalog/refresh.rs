//! Periodic background refresh

use super::SchemaCatalog;
use std::sync::Weak;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Handle to a running refresh task.
///
/// The task holds only a weak reference to its catalog and stops on its own
/// once the catalog is dropped. Dropping the handle cancels the task.
#[derive(Debug)]
pub struct RefreshScheduler {
    task: JoinHandle<()>,
    interval: Duration,
}

impl RefreshScheduler {
    /// Spawn a task that refreshes `catalog` every `interval`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(catalog: Weak<SchemaCatalog>, interval: Duration) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick fires immediately; initialize() already synced
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(catalog) = catalog.upgrade() else {
                    tracing::debug!("Schema catalog dropped, stopping refresh");
                    break;
                };
                catalog.refresh().await;
            }
        });

        tracing::info!(interval_secs = interval.as_secs(), "Started schema catalog refresh");
        Self { task, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn cancel(&self) {
        self.task.abort();
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.task.abort();
    }
}
