use axum::{
    Json, Router,
    extract::{Extension, Path, State},
    routing::get,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::entities::project;
use crate::db::services;
use crate::monitoring::ProjectChange;
use crate::web::models::{AuthenticatedUser, CreateProject, MessageResponse, UpdateProject};
use crate::web::{AppError, AppState};

fn validate_update(payload: &UpdateProject) -> Result<(), AppError> {
    if let Some(progress) = payload.progress_percentage {
        if !(0..=100).contains(&progress) {
            return Err(AppError::InvalidInput(
                "progress_percentage must be between 0 and 100".to_string(),
            ));
        }
    }
    if payload.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::InvalidInput("Title must not be empty".to_string()));
    }
    Ok(())
}

/// Which URL keys the payload carried, whatever their values.
fn change_for(payload: &UpdateProject) -> ProjectChange {
    ProjectChange::Updated {
        repository_url: payload.repository_url.is_some(),
        demo_url: payload.demo_url.is_some(),
    }
}

fn project_not_found() -> AppError {
    AppError::NotFound("Project not found".to_string())
}

pub(super) async fn create_project_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(challenge_id): Path<Uuid>,
    Json(payload): Json<CreateProject>,
) -> Result<Json<project::Model>, AppError> {
    if payload.title.trim().is_empty() {
        return Err(AppError::InvalidInput("Title must not be empty".to_string()));
    }
    services::get_challenge_for_user(&app_state.db_pool, challenge_id, authenticated_user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Challenge not found".to_string()))?;

    let project = services::create_project(
        &app_state.db_pool,
        challenge_id,
        authenticated_user.id,
        payload,
    )
    .await?;

    app_state
        .monitoring
        .maybe_schedule(&project.urls(), ProjectChange::Created);
    Ok(Json(project))
}

pub(super) async fn get_challenge_projects_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(challenge_id): Path<Uuid>,
) -> Result<Json<Vec<project::Model>>, AppError> {
    services::get_challenge_for_user(&app_state.db_pool, challenge_id, authenticated_user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Challenge not found".to_string()))?;

    let projects = services::get_projects_by_challenge_id(
        &app_state.db_pool,
        challenge_id,
        authenticated_user.id,
    )
    .await?;
    Ok(Json(projects))
}

async fn get_project_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<project::Model>, AppError> {
    services::get_project_for_user(&app_state.db_pool, project_id, authenticated_user.id)
        .await?
        .map(Json)
        .ok_or_else(project_not_found)
}

async fn update_project_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<UpdateProject>,
) -> Result<Json<project::Model>, AppError> {
    validate_update(&payload)?;
    let change = change_for(&payload);

    let project =
        services::update_project(&app_state.db_pool, project_id, authenticated_user.id, payload)
            .await?
            .ok_or_else(project_not_found)?;

    app_state.monitoring.maybe_schedule(&project.urls(), change);
    Ok(Json(project))
}

async fn delete_project_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    let removed =
        services::delete_project(&app_state.db_pool, project_id, authenticated_user.id).await?;
    if removed == 0 {
        return Err(project_not_found());
    }
    Ok(Json(MessageResponse::new("Project deleted successfully")))
}

pub fn create_projects_router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/{project_id}",
        get(get_project_handler)
            .put(update_project_handler)
            .delete(delete_project_handler),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_must_be_a_percentage() {
        for ok in [0, 50, 100] {
            let payload = UpdateProject {
                progress_percentage: Some(ok),
                ..Default::default()
            };
            assert!(validate_update(&payload).is_ok());
        }
        for bad in [-1, 101] {
            let payload = UpdateProject {
                progress_percentage: Some(bad),
                ..Default::default()
            };
            assert!(matches!(validate_update(&payload), Err(AppError::InvalidInput(_))));
        }
    }

    #[test]
    fn only_url_keys_mark_a_url_change() {
        let title_only = UpdateProject {
            title: Some("Renamed".into()),
            ..Default::default()
        };
        assert_eq!(
            change_for(&title_only),
            ProjectChange::Updated {
                repository_url: false,
                demo_url: false
            }
        );

        let cleared_demo = UpdateProject {
            demo_url: Some(None),
            ..Default::default()
        };
        assert_eq!(
            change_for(&cleared_demo),
            ProjectChange::Updated {
                repository_url: false,
                demo_url: true
            }
        );
    }
}
