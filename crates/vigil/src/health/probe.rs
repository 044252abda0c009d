//! Single-peer liveness check.

use std::sync::Arc;

use vigil_common::constants::endpoints;
use vigil_common::{HealthReport, HealthState, ServiceName};

use crate::peers::{PeerDirectory, PeerTransport};

/// Calls a peer's `/healthy` endpoint and reads its `status` field.
///
/// Fails closed: unknown peers, transport errors, malformed bodies and any
/// status other than `"healthy"` all probe as down.
#[derive(Clone)]
pub struct HttpProbe {
    transport: Arc<dyn PeerTransport>,
    peers: PeerDirectory,
}

impl HttpProbe {
    pub fn new(transport: Arc<dyn PeerTransport>, peers: PeerDirectory) -> Self {
        Self { transport, peers }
    }

    pub async fn probe(&self, service: &ServiceName) -> HealthState {
        let Some(url) = self.peers.endpoint(service, endpoints::HEALTHY) else {
            tracing::debug!(service = %service, "No address for peer, probing as down");
            return HealthState::Down;
        };

        let body = match self.transport.get_json(&url).await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(service = %service, url = %url, error = %e, "Probe failed");
                return HealthState::Down;
            }
        };

        match serde_json::from_value::<HealthReport>(body) {
            Ok(report) if report.is_healthy() => HealthState::Up,
            Ok(report) => {
                tracing::debug!(service = %service, status = %report.status, "Peer reports unhealthy");
                HealthState::Down
            }
            Err(e) => {
                tracing::debug!(service = %service, error = %e, "Malformed health response");
                HealthState::Down
            }
        }
    }
}
