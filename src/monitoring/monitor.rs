use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info};
use uuid::Uuid;

use super::prober::UrlProbe;
use super::store::{ProjectStore, StoreError};
use super::types::{ProbeResult, UrlCheckUpdate, UrlStatusMap};

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("URL status persistence failed: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    /// The project did not exist when the pass started.
    ProjectMissing,
    /// The project was deleted while its URLs were being probed.
    ProjectRemoved,
    /// Results were written back in one update.
    Completed(UrlCheckUpdate),
}

/// Runs monitoring passes: probe every configured URL of a project and
/// write the merged `url_status` back.
///
/// Passes for the same project are serialized so a slower, older pass can
/// never overwrite a newer one mid-flight. Different projects run freely.
pub struct ProjectUrlMonitor {
    store: Arc<dyn ProjectStore>,
    prober: Arc<dyn UrlProbe>,
    pass_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl ProjectUrlMonitor {
    pub fn new(store: Arc<dyn ProjectStore>, prober: Arc<dyn UrlProbe>) -> Self {
        Self {
            store,
            prober,
            pass_locks: DashMap::new(),
        }
    }

    pub async fn run_pass(&self, project_id: Uuid) -> Result<PassOutcome, MonitorError> {
        self.run_pass_gated(project_id, None).await
    }

    /// Runs a pass that holds a permit from `permits` only while it probes.
    ///
    /// The permit is taken after the project's lock, so passes queued behind
    /// a busy project never tie up capacity other projects could use.
    pub async fn run_pass_with_permit(
        &self,
        project_id: Uuid,
        permits: &Semaphore,
    ) -> Result<PassOutcome, MonitorError> {
        self.run_pass_gated(project_id, Some(permits)).await
    }

    async fn run_pass_gated(
        &self,
        project_id: Uuid,
        permits: Option<&Semaphore>,
    ) -> Result<PassOutcome, MonitorError> {
        let _entry = PassLockEntry {
            locks: &self.pass_locks,
            project_id,
        };
        let lock = self.pass_locks.entry(project_id).or_default().value().clone();
        let _guard = lock.lock().await;
        let _permit = match permits {
            Some(permits) => permits.acquire().await.ok(),
            None => None,
        };
        self.execute_pass(project_id).await
    }

    async fn execute_pass(&self, project_id: Uuid) -> Result<PassOutcome, MonitorError> {
        let Some(project) = self.store.find_project_by_id(project_id).await? else {
            debug!(project_id = %project_id, "Project gone before URL check; skipping.");
            return Ok(PassOutcome::ProjectMissing);
        };

        let (repository, demo) = tokio::join!(
            self.probe_if_set(project.repository_target()),
            self.probe_if_set(project.demo_target()),
        );

        let finished_at = Utc::now();
        let update = UrlCheckUpdate {
            url_status: UrlStatusMap { repository, demo },
            last_url_check: finished_at,
            updated_at: finished_at,
        };

        if !self
            .store
            .update_project_fields(project_id, update.clone())
            .await?
        {
            debug!(project_id = %project_id, "Project deleted during URL check; results dropped.");
            return Ok(PassOutcome::ProjectRemoved);
        }

        info!(
            project_id = %project_id,
            repository_accessible = ?update.url_status.repository.as_ref().map(|r| r.accessible),
            demo_accessible = ?update.url_status.demo.as_ref().map(|r| r.accessible),
            "URL check completed."
        );
        Ok(PassOutcome::Completed(update))
    }

    async fn probe_if_set(&self, url: Option<&str>) -> Option<ProbeResult> {
        match url {
            Some(url) => Some(self.prober.probe(url).await),
            None => None,
        }
    }
}

/// Drops the project's lock entry once nothing else waits on it, including
/// when the pass panics or is cancelled.
struct PassLockEntry<'a> {
    locks: &'a DashMap<Uuid, Arc<Mutex<()>>>,
    project_id: Uuid,
}

impl Drop for PassLockEntry<'_> {
    fn drop(&mut self) {
        // Only the map still holds the lock once no other pass is queued on it.
        self.locks
            .remove_if(&self.project_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
