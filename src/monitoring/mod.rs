//! Background liveness checks for the repository and demo URLs of projects.
//!
//! Request handlers call [`MonitoringTrigger::maybe_schedule`] after their own
//! write; a [`MonitorWorker`] picks the project up, probes each configured URL
//! through a [`UrlProbe`], and stores the merged [`UrlStatusMap`] through a
//! [`ProjectStore`].

pub mod monitor;
pub mod prober;
pub mod store;
pub mod trigger;
pub mod types;

pub use monitor::{MonitorError, PassOutcome, ProjectUrlMonitor};
pub use prober::{HttpProber, UrlProbe};
pub use store::{MemoryProjectStore, ProjectStore, StoreError, StoredProject};
pub use trigger::{MonitorWorker, MonitoringTrigger, ProjectChange};
pub use types::{ProbeResult, ProjectUrls, UrlCheckUpdate, UrlStatusMap};
