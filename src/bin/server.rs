use challenge_tracker::db::{self, services::SeaOrmProjectStore};
use challenge_tracker::monitoring::{HttpProber, MonitorWorker, ProjectUrlMonitor};
use challenge_tracker::server::{config::ServerConfig, logging::init_logging};
use challenge_tracker::web;

use clap::Parser;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    // Config comes first so the log directory is known.
    let server_config = match ServerConfig::load(args.config.as_deref()) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Failed to load server configuration: {e}");
            return Err(e.into());
        }
    };

    init_logging(&server_config.log_dir)?;
    info!(version = env!("CARGO_PKG_VERSION"), "Starting challenge tracker.");

    // --- Database Pool Setup ---
    let mut opt = ConnectOptions::new(server_config.database_url.clone());
    opt.max_connections(10)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let db_pool: DatabaseConnection = Database::connect(opt).await.inspect_err(|e| {
        error!(error = %e, "Failed to create database connection.");
    })?;
    db::run_migrations(&db_pool).await?;

    // --- URL Monitoring Setup ---
    let prober = HttpProber::new(
        server_config.probe_timeout(),
        server_config.probe_max_redirects,
    )?;
    let monitor = Arc::new(ProjectUrlMonitor::new(
        Arc::new(SeaOrmProjectStore::new(db_pool.clone())),
        Arc::new(prober),
    ));
    let (monitoring, monitor_worker) =
        MonitorWorker::spawn(monitor, server_config.monitor_concurrency);

    // --- Axum HTTP Server Setup ---
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .build()?;
    let app = web::create_axum_router(
        db_pool.clone(),
        server_config.clone(),
        http_client,
        monitoring,
    );

    let addr: SocketAddr = server_config.bind_address.parse()?;
    let socket = if addr.is_ipv4() {
        tokio::net::TcpSocket::new_v4()?
    } else {
        tokio::net::TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.set_keepalive(true)?;
    socket.bind(addr)?;
    let listener = socket.listen(1024)?;
    info!(address = %addr, "HTTP server listening.");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router (and with it every trigger handle) is gone, so the worker
    // drains its queue and returns.
    if let Err(e) = monitor_worker.await {
        error!(error = %e, "URL monitoring worker ended abnormally.");
    }
    db_pool.close().await?;
    info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for the shutdown signal.");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received.");
}
