//! Cache-gated cross-service calls.
//!
//! The gate trips on cached knowledge, not on live failure: a peer the cache
//! marks down is never contacted, and a peer marked up may still fail. Both
//! outcomes come back as a [`ForwardError`], never as a raw transport error.

use serde_json::Value;
use std::sync::Arc;

use vigil_common::constants::endpoints;
use vigil_common::{ForwardError, ServiceName};

use crate::health::StatusCache;
use crate::peers::{PeerDirectory, PeerTransport};

/// Sends JSON payloads to peers the status cache reports as up
#[derive(Clone)]
pub struct GatedForwarder {
    cache: StatusCache,
    transport: Arc<dyn PeerTransport>,
    peers: PeerDirectory,
}

impl GatedForwarder {
    pub fn new(cache: StatusCache, transport: Arc<dyn PeerTransport>, peers: PeerDirectory) -> Self {
        Self {
            cache,
            transport,
            peers,
        }
    }

    /// POST `payload` to the target's `/receiveData` and return its body
    pub async fn forward(&self, target: &ServiceName, payload: &Value) -> Result<Value, ForwardError> {
        if !self.cache.is_up(target).await {
            tracing::warn!(target_service = %target, "Target marked down, skipping call");
            return Err(ForwardError::TargetDown {
                target: target.clone(),
            });
        }

        let Some(url) = self.peers.endpoint(target, endpoints::RECEIVE_DATA) else {
            return Err(ForwardError::Unreachable {
                target: target.clone(),
                reason: "no address configured".to_string(),
            });
        };

        match self.transport.post_json(&url, payload).await {
            Ok(body) => {
                tracing::debug!(target_service = %target, "Forwarded payload");
                Ok(body)
            }
            Err(e) => {
                tracing::warn!(target_service = %target, url = %url, error = %e, "Forwarded call failed");
                Err(ForwardError::Unreachable {
                    target: target.clone(),
                    reason: e.to_string(),
                })
            }
        }
    }
}
