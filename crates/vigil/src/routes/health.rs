//! Liveness, monitor trigger, and cache inspection endpoints.

use axum::{Json, extract::State};
use serde::Serialize;
use std::collections::BTreeMap;

use vigil_common::{HealthReport, ServiceName};

use crate::health::PeerStatus;
use crate::state::AppState;

/// Liveness endpoint probed by the health monitor
pub async fn healthy() -> Json<HealthReport> {
    Json(HealthReport::healthy())
}

#[derive(Serialize)]
pub struct UpdateHealthResponse {
    status: &'static str,
}

/// Run one monitor cycle before answering.
///
/// Answers the same way whether or not the cycle published; failures are
/// logged by the monitor.
pub async fn update_health(State(state): State<AppState>) -> Json<UpdateHealthResponse> {
    state.monitor.run_cycle().await;

    Json(UpdateHealthResponse {
        status: "updated health status",
    })
}

/// Current contents of the local status cache
pub async fn status_snapshot(
    State(state): State<AppState>,
) -> Json<BTreeMap<ServiceName, PeerStatus>> {
    Json(state.status.snapshot().await)
}
