//! services/api/src/bin/api.rs

use std::sync::Arc;

use api_lib::{
    adapters::{Argon2Hasher, DbAdapter, JwtTokenAdapter, LocalBlobStore, MemoryAdapter},
    config::{Config, StoreBackend},
    error::ApiError,
    web::{self, rest::ApiDoc, state::AppState},
};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use streaming_catalog_core::{CatalogPorts, CatalogService};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Select the Backing Store ---
    let hasher = Arc::new(Argon2Hasher::new());
    let tokens = Arc::new(JwtTokenAdapter::new(&config.jwt));
    let blobs = Arc::new(LocalBlobStore::new(config.covers_dir.clone()));

    let ports = match &config.store {
        StoreBackend::Postgres {
            database_url,
            max_connections,
        } => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(*max_connections)
                .acquire_timeout(config.store_timeout)
                .connect(database_url)
                .await?;
            let db = Arc::new(DbAdapter::new(db_pool));
            info!("Running database migrations...");
            db.run_migrations().await?;
            info!("Database migrations complete.");
            CatalogPorts {
                users: db.clone(),
                movies: db.clone(),
                engagement: db.clone(),
                ratings: db,
                hasher,
                tokens,
                blobs,
            }
        }
        StoreBackend::Memory => {
            info!("Using the in-memory store; data is lost on shutdown.");
            let memory = Arc::new(MemoryAdapter::new());
            CatalogPorts {
                users: memory.clone(),
                movies: memory.clone(),
                engagement: memory.clone(),
                ratings: memory,
                hasher,
                tokens,
                blobs,
            }
        }
    };

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        catalog: Arc::new(CatalogService::with_timeout(ports, config.store_timeout)),
        config: config.clone(),
    });

    // --- 4. Create the Web Router ---
    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(web::router(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
