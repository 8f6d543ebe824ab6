use axum::{
    Json, Router,
    extract::State,
    http::Method,
    middleware as axum_middleware,
    routing::get,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::monitoring::MonitoringTrigger;
use crate::server::config::ServerConfig;
use crate::web::{middleware::auth, models::HealthResponse, routes::*};

pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;

pub use error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DatabaseConnection,
    pub config: Arc<ServerConfig>,
    /// Client for the identity provider. Probing uses its own client.
    pub http_client: reqwest::Client,
    pub monitoring: MonitoringTrigger,
}

async fn health_check_handler(State(app_state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let database = match app_state.db_pool.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            warn!(error = %e, "Health check could not reach the database.");
            "error"
        }
    };
    Json(HealthResponse {
        status: if database == "connected" { "healthy" } else { "unhealthy" },
        timestamp: Utc::now(),
        database,
    })
}

pub fn create_axum_router(
    db_pool: DatabaseConnection,
    config: Arc<ServerConfig>,
    http_client: reqwest::Client,
    monitoring: MonitoringTrigger,
) -> Router {
    let app_state = Arc::new(AppState {
        db_pool,
        config,
        http_client,
        monitoring,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let require_session = || axum_middleware::from_fn_with_state(app_state.clone(), auth::auth);

    Router::new()
        .route("/api/health", get(health_check_handler))
        .nest(
            "/api/auth",
            auth_routes::create_public_router()
                .merge(auth_routes::create_protected_router().route_layer(require_session())),
        )
        .nest(
            "/api/challenges",
            challenge_routes::create_challenges_router().route_layer(require_session()),
        )
        .nest(
            "/api/projects",
            project_routes::create_projects_router().route_layer(require_session()),
        )
        .nest(
            "/api/dashboard",
            dashboard_routes::create_dashboard_router().route_layer(require_session()),
        )
        .with_state(app_state.clone())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::{HttpProber, MemoryProjectStore, MonitorWorker, ProjectUrlMonitor};
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_config() -> Arc<ServerConfig> {
        Arc::new(ServerConfig {
            database_url: "postgres://unused".into(),
            bind_address: "127.0.0.1:0".into(),
            identity_provider_url: "http://127.0.0.1:9/session-data".into(),
            session_ttl_days: 7,
            probe_timeout_seconds: 1,
            probe_max_redirects: 3,
            monitor_concurrency: 1,
            log_dir: "logs".into(),
        })
    }

    // No database behind it. Only paths that are rejected before any
    // query runs can be exercised here.
    fn test_router() -> Router {
        let prober = HttpProber::new(Duration::from_secs(1), 3).unwrap();
        let monitor = Arc::new(ProjectUrlMonitor::new(
            Arc::new(MemoryProjectStore::new()),
            Arc::new(prober),
        ));
        let (trigger, _worker) = MonitorWorker::spawn(monitor, 1);
        create_axum_router(
            DatabaseConnection::Disconnected,
            test_config(),
            reqwest::Client::new(),
            trigger,
        )
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_database_state_without_failing() {
        let response = test_router()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["database"], "error");
        assert_eq!(json["status"], "unhealthy");
        assert!(json["timestamp"].is_string());
    }

    #[tokio::test]
    async fn protected_routes_require_a_session() {
        for uri in ["/api/challenges", "/api/dashboard", "/api/auth/me"] {
            let response = test_router()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
            let json = body_json(response).await;
            assert_eq!(json["error"], "Not authenticated");
        }
    }

    #[tokio::test]
    async fn project_routes_require_a_session() {
        let uri = format!("/api/projects/{}", uuid::Uuid::new_v4());
        let response = test_router()
            .oneshot(
                Request::put(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"title":"x"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn profile_requires_session_id_header() {
        let response = test_router()
            .oneshot(Request::post("/api/auth/profile").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Missing X-Session-ID header");
    }

    #[tokio::test]
    async fn unreachable_identity_provider_is_a_bad_gateway() {
        let response = test_router()
            .oneshot(
                Request::post("/api/auth/profile")
                    .header("X-Session-ID", "abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
