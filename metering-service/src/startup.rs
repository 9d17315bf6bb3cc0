//! Application startup and lifecycle management.

use crate::config::{MeteringConfig, StorageBackend};
use crate::handlers::{self, health::HealthState};
use crate::services::{Database, InMemoryStorage, Stores, UsageService};
use crate::workflow::{DetailizationTracker, TariffCatalog, TariffChangeWorkflow};
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{metrics::metrics_middleware, tracing::request_id_middleware};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub usage: Arc<UsageService>,
    pub catalog: Arc<TariffCatalog>,
    pub tariff_requests: Arc<TariffChangeWorkflow>,
    pub detailization: Arc<DetailizationTracker>,
}

impl AppState {
    pub fn new(config: &MeteringConfig, stores: &Stores) -> Result<Self, AppError> {
        let offset = config.reporting.offset()?;
        Ok(Self {
            usage: Arc::new(UsageService::new(
                stores,
                offset,
                config.reporting.history_hours,
            )),
            catalog: Arc::new(TariffCatalog::new(stores.tariffs.clone())),
            tariff_requests: Arc::new(TariffChangeWorkflow::new(stores.tariff_requests.clone())),
            detailization: Arc::new(DetailizationTracker::new(stores.detailizations.clone())),
        })
    }
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    /// Build the application with the configured storage backend.
    pub async fn build(config: MeteringConfig) -> Result<Self, AppError> {
        let stores = match config.storage.backend {
            StorageBackend::Postgres => {
                let db = Database::new(
                    &config.database.url,
                    config.database.max_connections,
                    config.database.min_connections,
                )
                .await
                .map_err(|e| {
                    tracing::error!("Failed to connect to PostgreSQL: {}", e);
                    e
                })?;
                db.run_migrations().await.map_err(|e| {
                    tracing::error!("Failed to run database migrations: {}", e);
                    e
                })?;
                Stores::from_backend(Arc::new(db))
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on restart");
                Stores::from_backend(Arc::new(InMemoryStorage::new()))
            }
        };

        Self::build_with_stores(config, stores).await
    }

    /// Build the application on top of already constructed stores.
    pub async fn build_with_stores(config: MeteringConfig, stores: Stores) -> Result<Self, AppError> {
        let health_state = HealthState {
            storage: stores.health.clone(),
        };
        let state = AppState::new(&config, &stores)?;
        let app = router(state, health_state);

        // Port 0 picks a random port for tests
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            service = %config.service_name,
            version = %config.service_version,
            backend = ?config.storage.backend,
            "Listening on port {}",
            port
        );

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

fn router(state: AppState, health_state: HealthState) -> Router {
    let health_router = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::health::metrics_endpoint))
        .with_state(health_state);

    let api = Router::new()
        .route(
            "/v1/subjects/:subject_id/usage",
            get(handlers::usage::get_usage_summary),
        )
        .route(
            "/v1/subjects/:subject_id/tariff",
            get(handlers::tariffs::get_tariff).put(handlers::tariffs::activate_tariff),
        )
        .route(
            "/v1/subjects/:subject_id/samples",
            post(handlers::samples::ingest_samples),
        )
        .route(
            "/v1/tariffs",
            post(handlers::tariffs::create_tariff).get(handlers::tariffs::list_tariffs),
        )
        .route(
            "/v1/tariff-requests",
            post(handlers::tariff_requests::create_tariff_request)
                .get(handlers::tariff_requests::list_tariff_requests),
        )
        .route(
            "/v1/tariff-requests/:id/approve",
            post(handlers::tariff_requests::approve_tariff_request),
        )
        .route(
            "/v1/tariff-requests/:id/reject",
            post(handlers::tariff_requests::reject_tariff_request),
        )
        .route(
            "/v1/detailization-requests",
            post(handlers::detailization::create_detailization_request)
                .get(handlers::detailization::list_detailization_requests),
        )
        .route("/v1/admin/overview", get(handlers::admin::platform_overview))
        .with_state(state);

    api.merge(health_router)
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}
