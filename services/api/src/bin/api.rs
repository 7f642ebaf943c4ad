//! services/api/src/bin/api.rs

use api_lib::{
    adapters::DbAdapter,
    config::{Config, StoreBackend},
    error::ApiError,
    sweeper::ExpirySweeper,
    web::{self, state::AppState},
};
use barbershop_core::LedgerBackend;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Select the Store ---
    let app_state = match config.store_backend {
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| ApiError::Internal("DATABASE_URL is required".to_string()))?;
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let db_adapter = Arc::new(DbAdapter::new(db_pool));
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            AppState::new(
                config.clone(),
                db_adapter.clone(),
                LedgerBackend::Persistent(db_adapter),
            )
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory store; data is lost on restart.");
            AppState::in_memory(config.clone())
        }
    };
    let app_state = Arc::new(app_state);

    // --- 3. Start Background Work ---
    let shutdown = CancellationToken::new();
    let sweeper = config.expiry_sweep_interval.map(|interval| {
        tokio::spawn(
            ExpirySweeper::new(app_state.appointments.clone(), interval, shutdown.clone()).run(),
        )
    });

    // --- 4. Create the Web Router ---
    let app = web::router(app_state)?;

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
            }
            info!("Shutdown signal received.");
            server_shutdown.cancel();
        })
        .await?;

    shutdown.cancel();
    if let Some(handle) = sweeper {
        if let Err(e) = handle.await {
            warn!("Expiry sweeper ended abnormally: {}", e);
        }
    }
    info!("Server stopped.");
    Ok(())
}
