//! Core types shared across Vigil services.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{HEALTHY_STATUS, channels, redis_keys, services};

/// Name of a service in the cluster (e.g. `notificationService`).
///
/// Names are opaque; the peer directory maps them to addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceName(String);

impl ServiceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn authentication() -> Self {
        Self::new(services::AUTHENTICATION)
    }

    pub fn notification() -> Self {
        Self::new(services::NOTIFICATION)
    }

    pub fn health() -> Self {
        Self::new(services::HEALTH)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Redis key holding this service's last persisted health
    pub fn health_key(&self) -> String {
        format!("{}{}", redis_keys::HEALTH_PREFIX, self.0)
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ServiceName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Liveness of a service. There is deliberately no "unknown" variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Up,
    Down,
}

impl HealthState {
    pub fn is_up(&self) -> bool {
        matches!(self, Self::Up)
    }

    /// Pub/sub channel that announces this state
    pub fn channel(&self) -> &'static str {
        match self {
            Self::Up => channels::SERVICE_UP,
            Self::Down => channels::SERVICE_DOWN,
        }
    }

    /// Value persisted under `health:{service}`
    pub fn store_value(&self) -> &'static str {
        match self {
            Self::Up => redis_keys::HEALTHY,
            Self::Down => redis_keys::UNHEALTHY,
        }
    }

    /// Interpret a persisted `health:{service}` value
    pub fn from_store_value(value: &str) -> Self {
        if value == redis_keys::HEALTHY {
            Self::Up
        } else {
            Self::Down
        }
    }
}

impl From<bool> for HealthState {
    fn from(up: bool) -> Self {
        if up { Self::Up } else { Self::Down }
    }
}

/// A liveness announcement: one message on `serviceup` or `servicedown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthEvent {
    pub service: ServiceName,
    pub state: HealthState,
}

impl HealthEvent {
    pub fn new(service: ServiceName, state: HealthState) -> Self {
        Self { service, state }
    }

    pub fn up(service: ServiceName) -> Self {
        Self::new(service, HealthState::Up)
    }

    pub fn down(service: ServiceName) -> Self {
        Self::new(service, HealthState::Down)
    }

    pub fn channel(&self) -> &'static str {
        self.state.channel()
    }

    /// Wire payload (the bare service name)
    pub fn payload(&self) -> &str {
        self.service.as_str()
    }

    /// Decode a pub/sub message. Returns `None` for foreign channels or an
    /// empty payload.
    pub fn from_message(channel: &str, payload: &str) -> Option<Self> {
        let state = match channel {
            channels::SERVICE_UP => HealthState::Up,
            channels::SERVICE_DOWN => HealthState::Down,
            _ => return None,
        };

        if payload.is_empty() {
            return None;
        }

        Some(Self::new(ServiceName::new(payload), state))
    }
}

/// Body of `GET /healthy`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
}

impl HealthReport {
    pub fn healthy() -> Self {
        Self {
            status: HEALTHY_STATUS.to_string(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HEALTHY_STATUS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_channels() {
        let up = HealthEvent::up(ServiceName::notification());
        assert_eq!(up.channel(), "serviceup");
        assert_eq!(up.payload(), "notificationService");

        let down = HealthEvent::down(ServiceName::authentication());
        assert_eq!(down.channel(), "servicedown");
        assert_eq!(down.payload(), "authenticationService");
    }

    #[test]
    fn test_event_from_message() {
        let event = HealthEvent::from_message("servicedown", "notificationService").unwrap();
        assert_eq!(event.service, ServiceName::notification());
        assert_eq!(event.state, HealthState::Down);

        assert!(HealthEvent::from_message("serviceup", "").is_none());
        assert!(HealthEvent::from_message("threat_level", "notificationService").is_none());

        // Payload is the cache key verbatim
        let padded = HealthEvent::from_message("serviceup", " notificationService").unwrap();
        assert_eq!(padded.service.as_str(), " notificationService");
        assert_ne!(padded.service, ServiceName::notification());
    }

    #[test]
    fn test_health_key() {
        assert_eq!(
            ServiceName::authentication().health_key(),
            "health:authenticationService"
        );
    }

    #[test]
    fn test_store_values() {
        assert_eq!(HealthState::from_store_value("healthy"), HealthState::Up);
        assert_eq!(HealthState::from_store_value("unhealthy"), HealthState::Down);
        assert_eq!(HealthState::from_store_value("garbage"), HealthState::Down);
        assert_eq!(HealthState::Up.store_value(), "healthy");
    }

    #[test]
    fn test_health_report_body() {
        let json = serde_json::to_value(HealthReport::healthy()).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "healthy" }));

        let parsed: HealthReport = serde_json::from_str(r#"{"status":"degraded"}"#).unwrap();
        assert!(!parsed.is_healthy());
    }
}
