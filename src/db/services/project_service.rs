use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::db::entities::{prelude::*, project};
use crate::monitoring::{ProjectStore, ProjectUrls, StoreError, UrlCheckUpdate, UrlStatusMap};
use crate::web::models::{CreateProject, UpdateProject};

pub async fn create_project(
    db: &DatabaseConnection,
    challenge_id: Uuid,
    user_id: Uuid,
    data: CreateProject,
) -> Result<project::Model, DbErr> {
    let now = Utc::now();
    let new_project = project::ActiveModel {
        id: Set(Uuid::new_v4()),
        challenge_id: Set(challenge_id),
        user_id: Set(user_id),
        title: Set(data.title),
        description: Set(data.description),
        repository_url: Set(data.repository_url),
        demo_url: Set(data.demo_url),
        tech_stack: Set(data.tech_stack.into()),
        status: Set(data.status),
        progress_percentage: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        last_url_check: Set(None),
        url_status: Set(UrlStatusMap::default()),
    };
    new_project.insert(db).await
}

pub async fn get_projects_by_challenge_id(
    db: &DatabaseConnection,
    challenge_id: Uuid,
    user_id: Uuid,
) -> Result<Vec<project::Model>, DbErr> {
    Project::find()
        .filter(project::Column::ChallengeId.eq(challenge_id))
        .filter(project::Column::UserId.eq(user_id))
        .order_by_asc(project::Column::CreatedAt)
        .all(db)
        .await
}

pub async fn get_projects_by_user_id(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> Result<Vec<project::Model>, DbErr> {
    Project::find()
        .filter(project::Column::UserId.eq(user_id))
        .order_by_asc(project::Column::CreatedAt)
        .all(db)
        .await
}

pub async fn get_project_for_user(
    db: &DatabaseConnection,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<Option<project::Model>, DbErr> {
    Project::find_by_id(project_id)
        .filter(project::Column::UserId.eq(user_id))
        .one(db)
        .await
}

/// Writes only the keys present in `data`. Monitoring fields are never touched here.
/// Returns `None` when the user owns no such project.
pub async fn update_project(
    db: &DatabaseConnection,
    project_id: Uuid,
    user_id: Uuid,
    data: UpdateProject,
) -> Result<Option<project::Model>, DbErr> {
    let Some(existing) = get_project_for_user(db, project_id, user_id).await? else {
        return Ok(None);
    };

    let mut active = existing.into_active_model();
    if let Some(title) = data.title {
        active.title = Set(title);
    }
    if let Some(description) = data.description {
        active.description = Set(description);
    }
    if let Some(repository_url) = data.repository_url {
        active.repository_url = Set(repository_url);
    }
    if let Some(demo_url) = data.demo_url {
        active.demo_url = Set(demo_url);
    }
    if let Some(tech_stack) = data.tech_stack {
        active.tech_stack = Set(tech_stack.into());
    }
    if let Some(status) = data.status {
        active.status = Set(status);
    }
    if let Some(progress) = data.progress_percentage {
        active.progress_percentage = Set(progress);
    }
    active.updated_at = Set(Utc::now());

    active.update(db).await.map(Some)
}

/// Returns the number of projects removed.
pub async fn delete_project(
    db: &DatabaseConnection,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<u64, DbErr> {
    let result = Project::delete_many()
        .filter(project::Column::Id.eq(project_id))
        .filter(project::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// The `projects` table as seen by the URL monitor.
#[derive(Clone, Debug)]
pub struct SeaOrmProjectStore {
    db: DatabaseConnection,
}

impl SeaOrmProjectStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProjectStore for SeaOrmProjectStore {
    async fn find_project_by_id(&self, id: Uuid) -> Result<Option<ProjectUrls>, StoreError> {
        let row = Project::find_by_id(id)
            .select_only()
            .columns([
                project::Column::Id,
                project::Column::RepositoryUrl,
                project::Column::DemoUrl,
            ])
            .into_tuple::<(Uuid, Option<String>, Option<String>)>()
            .one(&self.db)
            .await?;

        Ok(row.map(|(id, repository_url, demo_url)| ProjectUrls {
            id,
            repository_url,
            demo_url,
        }))
    }

    async fn update_project_fields(
        &self,
        id: Uuid,
        update: UrlCheckUpdate,
    ) -> Result<bool, StoreError> {
        let result = Project::update_many()
            .col_expr(project::Column::UrlStatus, Expr::value(update.url_status))
            .col_expr(project::Column::LastUrlCheck, Expr::value(update.last_url_check))
            .col_expr(project::Column::UpdatedAt, Expr::value(update.updated_at))
            .filter(project::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
