//! # Server Module
//!
//! HTTP server setup and route configuration for the course admin API.

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{credentials::CredentialStore, jwt::JwtService};
use crate::config::{Config, CorsConfig};
use crate::database::{CatalogStore, DatabaseConfig, DatabaseConnection, MemoryCatalogStore, PgCatalogStore};
use crate::services::CatalogService;

/// Application state shared across all route handlers
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<CredentialStore>,
    pub jwt_service: Arc<JwtService>,
    pub catalog: Arc<CatalogService>,
}

impl AppState {
    pub fn new(config: &Config, store: Arc<dyn CatalogStore>) -> Self {
        Self {
            credentials: Arc::new(CredentialStore::new(&config.admin)),
            jwt_service: Arc::new(JwtService::new(&config.auth)),
            catalog: Arc::new(CatalogService::new(store)),
        }
    }
}

/// Assemble the full router around an application state
pub fn build_router(app_state: AppState, cors: &CorsConfig) -> Router {
    let jwt_service = app_state.jwt_service.clone();

    Router::new()
        .merge(crate::routes::health::create_health_routes())
        .merge(crate::routes::auth::create_auth_routes(jwt_service.clone()))
        .merge(crate::routes::courses::create_course_routes(jwt_service))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(cors)),
        )
        .with_state(app_state)
}

fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cors
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}

/// Open the configured storage backend, migrating PostgreSQL on the way
async fn open_store(config: &Config) -> Result<Arc<dyn CatalogStore>> {
    if config.database.is_memory() {
        tracing::warn!("💾 Using in-memory catalog store; data is lost on restart");
        return Ok(Arc::new(MemoryCatalogStore::new()));
    }

    let db_config = DatabaseConfig::from_settings(&config.database)?;
    let db = DatabaseConnection::new(db_config).await?;
    db.migrate().await?;
    Ok(Arc::new(PgCatalogStore::new(&db)))
}

/// Starts the HTTP server and serves until the process is terminated.
pub async fn start(config: Config) -> Result<()> {
    let store = open_store(&config).await?;
    let app_state = AppState::new(&config, store);
    let app = build_router(app_state, &config.cors);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr} - port may already be in use"))?;

    tracing::info!("🚀 Course admin API starting...");
    tracing::info!("📡 Listening on http://{}", addr);
    tracing::info!("🏥 Health check available at http://{}/api/health", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
