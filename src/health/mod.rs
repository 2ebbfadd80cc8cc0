//! Liveness and readiness probes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
}

#[derive(Clone)]
pub struct HealthState {
    pub db_pool: Arc<DatabaseConnection>,
    pub started: Instant,
}

impl HealthState {
    pub fn new(db_pool: Arc<DatabaseConnection>) -> Self {
        Self {
            db_pool,
            started: Instant::now(),
        }
    }

    async fn database_status(&self) -> HealthStatus {
        match self.db_pool.ping().await {
            Ok(()) => HealthStatus::Up,
            Err(e) => {
                error!("Database health check failed: {}", e);
                HealthStatus::Down
            }
        }
    }
}

/// Liveness: the process is serving requests.
pub async fn health_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    debug!("Health check endpoint called");
    (
        StatusCode::OK,
        Json(json!({
            "status": HealthStatus::Up,
            "version": env!("CARGO_PKG_VERSION"),
            "uptime_seconds": state.started.elapsed().as_secs(),
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

/// Readiness: the database answers a ping.
pub async fn readiness_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let database = state.database_status().await;
    let status_code = match database {
        HealthStatus::Up => StatusCode::OK,
        HealthStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
    };

    (
        status_code,
        Json(json!({
            "ready": database == HealthStatus::Up,
            "checks": { "database": database },
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

pub async fn version_info() -> impl IntoResponse {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Health routes, meant to be nested under `/health`.
pub fn health_routes<S>(db_pool: Arc<DatabaseConnection>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/version", get(version_info))
        .with_state(Arc::new(HealthState::new(db_pool)))
}
