//! Single-shot reachability checks for user supplied URLs.
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Url, redirect};
use std::time::Duration;
use tracing::debug;

use super::types::ProbeResult;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Anything that can turn a URL into a [`ProbeResult`].
///
/// Implementations must not fail: every fault is reported inside the result.
#[async_trait]
pub trait UrlProbe: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeResult;
}

/// Probes over HTTP(S) with one GET per call and no retries.
#[derive(Clone, Debug)]
pub struct HttpProber {
    client: Client,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(timeout: Duration, max_redirects: usize) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::limited(max_redirects))
            .user_agent(concat!("challenge-tracker/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, timeout })
    }

    // The client timeout spans connect, headers and the body drained here.
    async fn fetch(&self, url: Url) -> Result<u16, String> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| describe_error(&e, self.timeout))?;
        let status = response.status().as_u16();

        while response
            .chunk()
            .await
            .map_err(|e| describe_error(&e, self.timeout))?
            .is_some()
        {}

        Ok(status)
    }
}

#[async_trait]
impl UrlProbe for HttpProber {
    async fn probe(&self, url: &str) -> ProbeResult {
        let outcome = match parse_target(url) {
            Ok(parsed) => self.fetch(parsed).await,
            Err(e) => Err(e),
        };
        let checked_at = Utc::now();

        match outcome {
            Ok(status_code) => {
                debug!(url, status_code, "Probe completed.");
                ProbeResult::responded(url, status_code, checked_at)
            }
            Err(error) => {
                debug!(url, error = %error, "Probe failed.");
                ProbeResult::failed(url, error, checked_at)
            }
        }
    }
}

fn parse_target(url: &str) -> Result<Url, String> {
    let parsed = Url::parse(url).map_err(|e| format!("Error: Invalid URL ({e})"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(format!("Error: Unsupported URL scheme '{other}'")),
    }
}

fn describe_error(e: &reqwest::Error, timeout: Duration) -> String {
    if e.is_timeout() {
        format!("Error: Request timed out after {}s", timeout.as_secs_f32())
    } else if e.is_redirect() {
        "Error: Too many redirects".to_string()
    } else if e.is_connect() {
        format!("Error: Connection failed ({})", root_cause(e))
    } else {
        format!("Error: {}", root_cause(e))
    }
}

// reqwest's Display only shows the outermost layer ("error sending request").
fn root_cause(e: &(dyn std::error::Error + 'static)) -> String {
    let mut current = e;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http::StatusCode, response::Redirect, routing::get};
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    async fn spawn_target() -> SocketAddr {
        let app = Router::new()
            .route("/ok", get(|| async { "fine" }))
            .route("/missing", get(|| async { (StatusCode::NOT_FOUND, "nope") }))
            .route("/broken", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .route("/moved", get(|| async { Redirect::temporary("/ok") }))
            .route("/loop", get(|| async { Redirect::temporary("/loop") }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn prober() -> HttpProber {
        HttpProber::new(Duration::from_millis(500), 3).unwrap()
    }

    #[tokio::test]
    async fn ok_response_is_accessible() {
        let addr = spawn_target().await;
        let url = format!("http://{addr}/ok");
        let before = Utc::now();

        let result = prober().probe(&url).await;

        assert_eq!(result.url, url);
        assert_eq!(result.status_code, Some(200));
        assert!(result.accessible);
        assert!(result.error.is_none());
        assert!(result.checked_at >= before);
    }

    #[tokio::test]
    async fn not_found_is_a_completed_but_inaccessible_probe() {
        let addr = spawn_target().await;
        let result = prober().probe(&format!("http://{addr}/missing")).await;

        assert_eq!(result.status_code, Some(404));
        assert!(!result.accessible);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn server_error_is_inaccessible() {
        let addr = spawn_target().await;
        let result = prober().probe(&format!("http://{addr}/broken")).await;

        assert_eq!(result.status_code, Some(500));
        assert!(!result.accessible);
    }

    #[tokio::test]
    async fn redirects_are_followed() {
        let addr = spawn_target().await;
        let url = format!("http://{addr}/moved");
        let result = prober().probe(&url).await;

        assert_eq!(result.url, url);
        assert_eq!(result.status_code, Some(200));
        assert!(result.accessible);
    }

    #[tokio::test]
    async fn redirect_loop_is_reported_as_failure() {
        let addr = spawn_target().await;
        let result = prober().probe(&format!("http://{addr}/loop")).await;

        assert_eq!(result.status_code, None);
        assert!(!result.accessible);
        assert_eq!(result.error.as_deref(), Some("Error: Too many redirects"));
    }

    #[tokio::test]
    async fn refused_connection_is_captured_as_data() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = prober().probe(&format!("http://{addr}/")).await;

        assert_eq!(result.status_code, None);
        assert!(!result.accessible);
        assert!(!result.error.as_deref().unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let addr = spawn_target().await;
        let started = std::time::Instant::now();

        let result = prober().probe(&format!("http://{addr}/slow")).await;

        assert!(started.elapsed() < Duration::from_secs(4));
        assert_eq!(result.status_code, None);
        assert!(result.error.as_deref().unwrap_or_default().contains("timed out"));
    }

    #[tokio::test]
    async fn malformed_and_unsupported_urls_fail_without_io() {
        let result = prober().probe("not a url").await;
        assert!(!result.accessible);
        assert!(result.error.as_deref().unwrap_or_default().starts_with("Error: Invalid URL"));

        let result = prober().probe("ftp://files.example.com/x").await;
        assert_eq!(result.url, "ftp://files.example.com/x");
        assert!(result.error.as_deref().unwrap_or_default().contains("ftp"));
    }
}
