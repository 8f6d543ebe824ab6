use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use super::types::{ProjectUrls, UrlCheckUpdate, UrlStatusMap};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Read/write access to the project records that monitoring touches.
///
/// Lookups here are keyed by project id only. Ownership is checked by the
/// request path before a pass is ever scheduled.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn find_project_by_id(&self, id: Uuid) -> Result<Option<ProjectUrls>, StoreError>;

    /// Applies `update` as one write. Returns `false` when no project matched.
    async fn update_project_fields(
        &self,
        id: Uuid,
        update: UrlCheckUpdate,
    ) -> Result<bool, StoreError>;
}

/// A project as held by [`MemoryProjectStore`].
#[derive(Debug, Clone, Default)]
pub struct StoredProject {
    pub repository_url: Option<String>,
    pub demo_url: Option<String>,
    pub url_status: UrlStatusMap,
    pub last_url_check: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Process-local store, used for tests and local tooling.
#[derive(Debug, Clone, Default)]
pub struct MemoryProjectStore {
    projects: Arc<DashMap<Uuid, StoredProject>>,
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: Uuid, project: StoredProject) {
        self.projects.insert(id, project);
    }

    pub fn get(&self, id: Uuid) -> Option<StoredProject> {
        self.projects.get(&id).map(|p| p.value().clone())
    }

    pub fn remove(&self, id: Uuid) -> Option<StoredProject> {
        self.projects.remove(&id).map(|(_, project)| project)
    }

    /// Edits a stored project in place, the way a request handler write would.
    pub fn modify<F>(&self, id: Uuid, edit: F) -> bool
    where
        F: FnOnce(&mut StoredProject),
    {
        match self.projects.get_mut(&id) {
            Some(mut project) => {
                edit(project.value_mut());
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl ProjectStore for MemoryProjectStore {
    async fn find_project_by_id(&self, id: Uuid) -> Result<Option<ProjectUrls>, StoreError> {
        Ok(self.projects.get(&id).map(|p| ProjectUrls {
            id,
            repository_url: p.repository_url.clone(),
            demo_url: p.demo_url.clone(),
        }))
    }

    async fn update_project_fields(
        &self,
        id: Uuid,
        update: UrlCheckUpdate,
    ) -> Result<bool, StoreError> {
        Ok(self.modify(id, |project| {
            project.url_status = update.url_status;
            project.last_url_check = Some(update.last_url_check);
            project.updated_at = Some(update.updated_at);
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::types::ProbeResult;
    use chrono::Utc;

    #[tokio::test]
    async fn update_replaces_whole_status_map() {
        let store = MemoryProjectStore::new();
        let id = Uuid::new_v4();
        let now = Utc::now();
        store.insert(
            id,
            StoredProject {
                repository_url: Some("https://git.example/a".into()),
                url_status: UrlStatusMap {
                    repository: Some(ProbeResult::responded("https://git.example/a", 200, now)),
                    demo: Some(ProbeResult::responded("https://old-demo.example", 200, now)),
                },
                ..Default::default()
            },
        );

        let update = UrlCheckUpdate {
            url_status: UrlStatusMap {
                repository: Some(ProbeResult::responded("https://git.example/a", 404, now)),
                demo: None,
            },
            last_url_check: now,
            updated_at: now,
        };
        assert!(store.update_project_fields(id, update).await.unwrap());

        let stored = store.get(id).unwrap();
        assert!(stored.url_status.demo.is_none());
        assert_eq!(stored.url_status.repository.unwrap().status_code, Some(404));
        assert_eq!(stored.last_url_check, Some(now));
    }

    #[tokio::test]
    async fn update_on_missing_project_reports_not_found() {
        let store = MemoryProjectStore::new();
        let now = Utc::now();
        let update = UrlCheckUpdate {
            url_status: UrlStatusMap::default(),
            last_url_check: now,
            updated_at: now,
        };
        assert!(!store.update_project_fields(Uuid::new_v4(), update).await.unwrap());
        assert!(store.find_project_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }
}
