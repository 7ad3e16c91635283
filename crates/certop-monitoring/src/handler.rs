use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::service::{MonitoringProbe, MonitoringSnapshot};

pub struct MonitoringState {
    pub probe: Arc<MonitoringProbe>,
}

/// Liveness payload served at the root `/health` endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct LivenessResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub version: &'static str,
}

#[derive(OpenApi)]
#[openapi(
    paths(get_monitoring),
    components(schemas(MonitoringSnapshot, LivenessResponse)),
    info(
        title = "Monitoring API",
        description = "Host uptime, scheduled check status and certificate store size.",
        version = "1.0.0"
    ),
    tags(
        (name = "Monitoring", description = "Monitoring endpoints")
    )
)]
pub struct MonitoringApiDoc;

pub fn configure_routes() -> Router<Arc<MonitoringState>> {
    Router::new().route("/monitoring", get(get_monitoring))
}

/// Monitoring snapshot
#[utoipa::path(
    tag = "Monitoring",
    get,
    path = "/monitoring",
    responses(
        (status = 200, description = "Point-in-time monitoring data", body = MonitoringSnapshot)
    )
)]
async fn get_monitoring(State(state): State<Arc<MonitoringState>>) -> impl IntoResponse {
    Json(state.probe.snapshot().await)
}

/// Liveness handler, mounted at the application root rather than under
/// `/api` so load balancers can reach it without the API prefix.
pub async fn liveness() -> impl IntoResponse {
    Json(LivenessResponse {
        status: "ok",
        timestamp: Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
    })
}
