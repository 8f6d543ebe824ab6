use axum::{
    Json, Router,
    extract::{Extension, State},
    http::HeaderMap,
    routing::{get, post},
};
use std::sync::Arc;

use crate::services::auth_service::{self, SESSION_ID_HEADER};
use crate::web::models::{AuthenticatedUser, MessageResponse, ProfileResponse, UserResponse};
use crate::web::{AppError, AppState};

async fn profile_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ProfileResponse>, AppError> {
    let session_id = headers
        .get(SESSION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::InvalidInput(format!("Missing {SESSION_ID_HEADER} header")))?;

    let profile = auth_service::sign_in(
        &app_state.db_pool,
        &app_state.http_client,
        &app_state.config,
        session_id,
    )
    .await?;
    Ok(Json(profile))
}

async fn me_handler(Extension(user): Extension<AuthenticatedUser>) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}

async fn logout_handler(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<MessageResponse>, AppError> {
    auth_service::sign_out(&app_state.db_pool, &user).await?;
    Ok(Json(MessageResponse::new("Logged out successfully")))
}

pub fn create_public_router() -> Router<Arc<AppState>> {
    Router::new().route("/profile", post(profile_handler))
}

pub fn create_protected_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/me", get(me_handler))
        .route("/logout", post(logout_handler))
}
