//! Decides when a project needs a URL check and hands the work to a
//! background pool so request handlers never wait on probes.
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::monitor::{PassOutcome, ProjectUrlMonitor};
use super::types::ProjectUrls;

/// What just happened to the project on the request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectChange {
    Created,
    /// Flags are true when the update payload carried that key, whatever its value.
    Updated {
        repository_url: bool,
        demo_url: bool,
    },
}

pub fn needs_monitoring(project: &ProjectUrls, change: ProjectChange) -> bool {
    match change {
        ProjectChange::Created => project.has_any_target(),
        ProjectChange::Updated {
            repository_url,
            demo_url,
        } => repository_url || demo_url,
    }
}

/// Cheap, cloneable handle used by request handlers to schedule passes.
#[derive(Clone, Debug)]
pub struct MonitoringTrigger {
    queue: mpsc::UnboundedSender<Uuid>,
}

impl MonitoringTrigger {
    /// Schedules one pass when `change` calls for it. Never blocks.
    /// Returns whether a pass was queued.
    pub fn maybe_schedule(&self, project: &ProjectUrls, change: ProjectChange) -> bool {
        if !needs_monitoring(project, change) {
            return false;
        }
        self.schedule(project.id)
    }

    pub fn schedule(&self, project_id: Uuid) -> bool {
        match self.queue.send(project_id) {
            Ok(()) => {
                debug!(project_id = %project_id, "URL check scheduled.");
                true
            }
            Err(_) => {
                error!(project_id = %project_id, "Monitoring worker is not running; URL check dropped.");
                false
            }
        }
    }
}

/// Background pool that drains the trigger queue.
///
/// Each pass runs in its own task, at most `max_concurrent_passes` probing at
/// a time. A pass waits for its project's lock before it takes a permit, so a
/// burst for one project leaves the rest of the pool free.
/// A failed pass is logged; a panicking one only ends its own task.
pub struct MonitorWorker {
    monitor: Arc<ProjectUrlMonitor>,
    permits: Arc<Semaphore>,
    capacity: u32,
}

impl MonitorWorker {
    pub fn spawn(
        monitor: Arc<ProjectUrlMonitor>,
        max_concurrent_passes: usize,
    ) -> (MonitoringTrigger, JoinHandle<()>) {
        let (queue, rx) = mpsc::unbounded_channel();
        let capacity = u32::try_from(max_concurrent_passes.clamp(1, 1024)).unwrap_or(1024);
        let worker = Self {
            monitor,
            permits: Arc::new(Semaphore::new(capacity as usize)),
            capacity,
        };
        let handle = tokio::spawn(worker.run(rx));
        (MonitoringTrigger { queue }, handle)
    }

    async fn run(self, mut rx: mpsc::UnboundedReceiver<Uuid>) {
        info!(
            max_concurrent_passes = self.capacity,
            "URL monitoring worker started."
        );

        let mut passes = JoinSet::new();
        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Some(project_id) => {
                        passes.spawn(Self::pass(
                            self.monitor.clone(),
                            self.permits.clone(),
                            project_id,
                        ));
                    }
                    None => break,
                },
                Some(joined) = passes.join_next(), if !passes.is_empty() => {
                    log_join(joined);
                }
            }
        }

        warn!("Monitoring queue closed; waiting for in-flight URL checks.");
        while let Some(joined) = passes.join_next().await {
            log_join(joined);
        }
        info!("URL monitoring worker stopped.");
    }

    async fn pass(monitor: Arc<ProjectUrlMonitor>, permits: Arc<Semaphore>, project_id: Uuid) {
        match monitor.run_pass_with_permit(project_id, &permits).await {
            Ok(PassOutcome::Completed(_)) => {}
            Ok(outcome) => {
                debug!(project_id = %project_id, ?outcome, "URL check ended without a write.");
            }
            Err(e) => {
                error!(project_id = %project_id, error = %e, "URL check failed.");
            }
        }
    }
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        error!(error = %e, "URL check task aborted.");
    }
}
