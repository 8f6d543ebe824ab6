use axum::{
    body::Body as AxumBody,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::debug;

use crate::services::auth_service;
use crate::web::{AppState, error::AppError};

pub const SESSION_COOKIE: &str = "session_token";

pub async fn auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request<AxumBody>,
    next: Next,
) -> Result<Response, AppError> {
    // Try to get token from Authorization header first, then fall back to cookie
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|s| s.to_string())
        .or_else(|| jar.get(SESSION_COOKIE).map(|c| c.value().to_string()))
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;

    let authenticated_user = auth_service::authenticate_token(&state.db_pool, &token)
        .await
        .inspect_err(|e| debug!(error = %e, "Session rejected."))?;

    req.extensions_mut().insert(authenticated_user);
    Ok(next.run(req).await)
}
