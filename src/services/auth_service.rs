use chrono::Utc;
use reqwest::{Client, StatusCode};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use tracing::{info, warn};

use crate::db::services as db_services;
use crate::server::config::ServerConfig;
use crate::web::error::AppError;
use crate::web::models::{AuthenticatedUser, ProfileResponse};

pub const SESSION_ID_HEADER: &str = "X-Session-ID";

/// What the identity provider returns for a valid session id.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionData {
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub session_token: String,
}

pub async fn fetch_session_data(
    client: &Client,
    identity_provider_url: &str,
    session_id: &str,
) -> Result<SessionData, AppError> {
    let response = client
        .get(identity_provider_url)
        .header(SESSION_ID_HEADER, session_id)
        .send()
        .await
        .map_err(|e| AppError::IdentityProvider(format!("Request failed: {e}")))?;

    if response.status() != StatusCode::OK {
        warn!(status = %response.status(), "Identity provider rejected the session id.");
        return Err(AppError::Unauthorized("Invalid session".to_string()));
    }

    response
        .json::<SessionData>()
        .await
        .map_err(|e| AppError::IdentityProvider(format!("Unexpected response: {e}")))
}

/// Exchanges an identity provider session id for a local session.
pub async fn sign_in(
    db: &DatabaseConnection,
    client: &Client,
    config: &ServerConfig,
    session_id: &str,
) -> Result<ProfileResponse, AppError> {
    let data = fetch_session_data(client, &config.identity_provider_url, session_id).await?;

    let user =
        db_services::find_or_create_user(db, &data.email, &data.name, data.picture.as_deref())
            .await?;
    let expires_at = Utc::now() + config.session_ttl();
    db_services::create_session(db, user.id, &data.session_token, expires_at).await?;

    info!(user_id = %user.id, "User signed in.");
    Ok(ProfileResponse {
        user,
        session_token: data.session_token,
    })
}

/// Resolves a session token to its user. Expired sessions are removed on sight.
pub async fn authenticate_token(
    db: &DatabaseConnection,
    session_token: &str,
) -> Result<AuthenticatedUser, AppError> {
    let session = db_services::find_session_by_token(db, session_token)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid session".to_string()))?;

    if db_services::is_expired(&session, Utc::now()) {
        db_services::delete_session_by_token(db, session_token).await?;
        return Err(AppError::Unauthorized("Session expired".to_string()));
    }

    let user = db_services::find_user_by_id(db, session.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    Ok(AuthenticatedUser {
        id: user.id,
        email: user.email,
        name: user.name,
        picture: user.picture,
        session_token: session.session_token,
    })
}

pub async fn sign_out(db: &DatabaseConnection, user: &AuthenticatedUser) -> Result<(), AppError> {
    db_services::delete_session_by_token(db, &user.session_token).await?;
    info!(user_id = %user.id, "User signed out.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::HeaderMap, http::StatusCode as AxumStatus, routing::get};
    use tokio::net::TcpListener;

    async fn spawn_identity_provider() -> String {
        let app = Router::new()
            .route(
                "/session-data",
                get(|headers: HeaderMap| async move {
                    match headers.get(SESSION_ID_HEADER).and_then(|v| v.to_str().ok()) {
                        Some("good") => Ok(Json(serde_json::json!({
                            "email": "ada@example.com",
                            "name": "Ada",
                            "session_token": "tok-123"
                        }))),
                        _ => Err(AxumStatus::UNAUTHORIZED),
                    }
                }),
            )
            .route("/garbage", get(|| async { "not json" }));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn valid_session_id_yields_profile() {
        let base = spawn_identity_provider().await;
        let data = fetch_session_data(&Client::new(), &format!("{base}/session-data"), "good")
            .await
            .unwrap();

        assert_eq!(data.email, "ada@example.com");
        assert_eq!(data.session_token, "tok-123");
        assert!(data.picture.is_none());
    }

    #[tokio::test]
    async fn rejected_session_id_is_unauthorized() {
        let base = spawn_identity_provider().await;
        let err = fetch_session_data(&Client::new(), &format!("{base}/session-data"), "bad")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Unauthorized(msg) if msg == "Invalid session"));
    }

    #[tokio::test]
    async fn malformed_provider_response_is_a_gateway_error() {
        let base = spawn_identity_provider().await;
        let err = fetch_session_data(&Client::new(), &format!("{base}/garbage"), "good")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::IdentityProvider(_)));
    }
}
