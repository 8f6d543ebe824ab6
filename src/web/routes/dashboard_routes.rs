use axum::{
    Json, Router,
    extract::{Extension, State},
    routing::get,
};
use std::sync::Arc;

use crate::db::services;
use crate::web::models::{AuthenticatedUser, DashboardResponse};
use crate::web::{AppError, AppState};

async fn get_dashboard_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<DashboardResponse>, AppError> {
    let dashboard = services::build_dashboard(&app_state.db_pool, &authenticated_user).await?;
    Ok(Json(dashboard))
}

pub fn create_dashboard_router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(get_dashboard_handler))
}
