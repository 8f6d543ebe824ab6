use axum::{
    Json, Router,
    extract::{Extension, Path, State},
    routing::get,
};
use std::sync::Arc;
use uuid::Uuid;

use super::project_routes::{create_project_handler, get_challenge_projects_handler};
use crate::db::entities::challenge;
use crate::db::services;
use crate::web::models::{AuthenticatedUser, CreateChallenge, MessageResponse, UpdateChallenge};
use crate::web::{AppError, AppState};

fn validate_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::InvalidInput("Title must not be empty".to_string()));
    }
    Ok(())
}

const MAX_DURATION_DAYS: i32 = 36_500;

fn validate_duration(duration_days: Option<i32>) -> Result<(), AppError> {
    match duration_days {
        Some(days) if days < 1 => Err(AppError::InvalidInput(
            "duration_days must be at least 1".to_string(),
        )),
        Some(days) if days > MAX_DURATION_DAYS => Err(AppError::InvalidInput(format!(
            "duration_days must be at most {MAX_DURATION_DAYS}"
        ))),
        _ => Ok(()),
    }
}

fn challenge_not_found() -> AppError {
    AppError::NotFound("Challenge not found".to_string())
}

async fn create_challenge_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateChallenge>,
) -> Result<Json<challenge::Model>, AppError> {
    validate_title(&payload.title)?;
    validate_duration(payload.duration_days)?;
    let challenge =
        services::create_challenge(&app_state.db_pool, authenticated_user.id, payload).await?;
    Ok(Json(challenge))
}

async fn get_challenges_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<challenge::Model>>, AppError> {
    let challenges =
        services::get_challenges_by_user_id(&app_state.db_pool, authenticated_user.id).await?;
    Ok(Json(challenges))
}

async fn get_challenge_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(challenge_id): Path<Uuid>,
) -> Result<Json<challenge::Model>, AppError> {
    services::get_challenge_for_user(&app_state.db_pool, challenge_id, authenticated_user.id)
        .await?
        .map(Json)
        .ok_or_else(challenge_not_found)
}

async fn update_challenge_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(challenge_id): Path<Uuid>,
    Json(payload): Json<UpdateChallenge>,
) -> Result<Json<challenge::Model>, AppError> {
    validate_title(&payload.title)?;
    validate_duration(payload.duration_days)?;
    services::update_challenge(
        &app_state.db_pool,
        challenge_id,
        authenticated_user.id,
        payload,
    )
    .await?
    .map(Json)
    .ok_or_else(challenge_not_found)
}

async fn delete_challenge_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(challenge_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    if !services::delete_challenge(&app_state.db_pool, challenge_id, authenticated_user.id).await? {
        return Err(challenge_not_found());
    }
    Ok(Json(MessageResponse::new("Challenge deleted successfully")))
}

pub fn create_challenges_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(get_challenges_handler).post(create_challenge_handler),
        )
        .route(
            "/{challenge_id}",
            get(get_challenge_handler)
                .put(update_challenge_handler)
                .delete(delete_challenge_handler),
        )
        .route(
            "/{challenge_id}/projects",
            get(get_challenge_projects_handler).post(create_project_handler),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_titles_are_rejected() {
        assert!(validate_title("").is_err());
        assert!(validate_title("   ").is_err());
        assert!(validate_title("100 days of code").is_ok());
    }

    #[test]
    fn non_positive_durations_are_rejected() {
        assert!(validate_duration(None).is_ok());
        assert!(validate_duration(Some(30)).is_ok());
        assert!(validate_duration(Some(0)).is_err());
        assert!(validate_duration(Some(-5)).is_err());
    }

    #[test]
    fn oversized_durations_are_rejected() {
        assert!(validate_duration(Some(MAX_DURATION_DAYS)).is_ok());
        assert!(validate_duration(Some(MAX_DURATION_DAYS + 1)).is_err());
        assert!(validate_duration(Some(i32::MAX)).is_err());
    }
}
