/// Chore Service Main Entry Point
///
/// Starts the gRPC server with:
/// - PostgreSQL connection pool and migrations
/// - Token manager (shared signing secret)
/// - Authentication layer in front of every RPC except Login
/// - Server reflection
use anyhow::{Context, Result};
use chore_service::config::Settings;
use chore_service::grpc::chorepoints::v1::chore_service_server::ChoreServiceServer;
use chore_service::grpc::{ChoreServer, FILE_DESCRIPTOR_SET};
use grpc_auth::AuthLayer;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use token_core::TokenManager;
use tokio::signal;
use tonic::transport::Server;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "chore_service=info,info".into()),
        )
        .with_target(false)
        .json()
        .init();

    info!("Starting chore service");

    // Load configuration
    let settings = Settings::load().context("Failed to load configuration")?;
    info!("Configuration loaded successfully");

    // Build the token manager; an empty secret fails here, at startup
    let tokens = Arc::new(
        TokenManager::new(&settings.auth.token_secret)
            .context("Failed to initialize token manager")?,
    );
    info!("Token manager initialized");

    // Initialize database connection pool
    let db_pool = PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&settings.database.url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    info!(
        "Database pool initialized with {} max connections",
        settings.database.max_connections
    );

    // Run database migrations
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("Failed to run database migrations")?;
    info!("Database migrations completed");

    let reflection = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()
        .context("Failed to build reflection service")?;

    let service = ChoreServer::new(db_pool, tokens.clone());

    let addr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Invalid server address")?;

    info!("Starting gRPC server on {}", addr);

    Server::builder()
        .layer(AuthLayer::new(tokens, &["Login"]))
        .add_service(reflection)
        .add_service(ChoreServiceServer::new(service))
        .serve_with_shutdown(addr, shutdown_signal())
        .await
        .context("gRPC server error")?;

    info!("Chore service shutdown complete");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Shutting down gracefully...");
}
