use chrono::{DateTime, Utc};
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of a single probe against one URL.
///
/// Built once when the probe concludes and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub url: String,
    /// `None` when no HTTP response was received.
    pub status_code: Option<u16>,
    pub accessible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl ProbeResult {
    /// A completed HTTP exchange. Anything below 400 counts as accessible.
    pub fn responded(url: impl Into<String>, status_code: u16, checked_at: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            status_code: Some(status_code),
            accessible: status_code < 400,
            error: None,
            checked_at,
        }
    }

    /// A probe that never got a response (DNS, refused, TLS, timeout, bad URL...).
    pub fn failed(
        url: impl Into<String>,
        error: impl Into<String>,
        checked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            url: url.into(),
            status_code: None,
            accessible: false,
            error: Some(error.into()),
            checked_at,
        }
    }
}

/// The `url_status` document stored on a project.
///
/// A key is only serialized when the matching URL was probed in the pass
/// that produced this map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct UrlStatusMap {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<ProbeResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo: Option<ProbeResult>,
}

impl UrlStatusMap {
    pub fn is_empty(&self) -> bool {
        self.repository.is_none() && self.demo.is_none()
    }
}

/// The slice of a project record that monitoring reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectUrls {
    pub id: Uuid,
    pub repository_url: Option<String>,
    pub demo_url: Option<String>,
}

impl ProjectUrls {
    pub fn repository_target(&self) -> Option<&str> {
        probe_target(self.repository_url.as_deref())
    }

    pub fn demo_target(&self) -> Option<&str> {
        probe_target(self.demo_url.as_deref())
    }

    pub fn has_any_target(&self) -> bool {
        self.repository_target().is_some() || self.demo_target().is_some()
    }
}

/// The fields written back by one monitoring pass, as a single update.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlCheckUpdate {
    pub url_status: UrlStatusMap,
    pub last_url_check: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Whitespace-only values count as empty; the untrimmed value is what gets probed.
fn probe_target(url: Option<&str>) -> Option<&str> {
    url.filter(|u| !u.trim().is_empty())
}
