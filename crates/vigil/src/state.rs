//! Application state and shared resources.

use anyhow::Result;
use std::sync::Arc;

use vigil_common::{HealthState, ServiceName};

use crate::bus::{RedisBus, StatusBus};
use crate::config::{AppConfig, Role};
use crate::forward::GatedForwarder;
use crate::health::{HealthMonitor, HttpProbe, StatusCache, StatusSubscriber};
use crate::peers::{HttpTransport, PeerDirectory, PeerTransport};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,

    /// Which service this process runs as
    pub role: Role,

    /// Pub/sub store
    pub bus: Arc<dyn StatusBus>,

    /// Local peer health, fed by the subscriber task
    pub status: StatusCache,

    /// Cache-gated caller for cross-service requests
    pub forwarder: GatedForwarder,

    /// Probe-and-publish cycles
    pub monitor: Arc<HealthMonitor>,

    /// Known peers
    pub peers: PeerDirectory,
}

impl AppState {
    /// Create application state, connecting to Redis
    pub async fn connect(config: AppConfig, role: Role) -> Result<Self> {
        let bus = RedisBus::connect(&config.store.connection_url()).await?;
        let transport = HttpTransport::new(config.http.timeout())?;

        Ok(Self::from_parts(config, role, Arc::new(bus), Arc::new(transport)))
    }

    /// Wire the services around an existing store and transport
    pub fn from_parts(
        config: AppConfig,
        role: Role,
        bus: Arc<dyn StatusBus>,
        transport: Arc<dyn PeerTransport>,
    ) -> Self {
        let peers = PeerDirectory::new(
            config
                .peers
                .iter()
                .map(|peer| (peer.name.as_str(), peer.url.as_str())),
        );

        let status = StatusCache::seeded(
            config
                .cache
                .seed
                .iter()
                .map(|seed| (ServiceName::new(seed.name.as_str()), HealthState::from(seed.up))),
        );

        let forwarder = GatedForwarder::new(status.clone(), transport.clone(), peers.clone());

        let probe = HttpProbe::new(transport, peers.clone());
        let monitor = Arc::new(HealthMonitor::new(&config.monitor, probe, bus.clone()));

        Self {
            config,
            role,
            bus,
            status,
            forwarder,
            monitor,
            peers,
        }
    }

    /// Name this process registers under
    pub fn service_name(&self) -> ServiceName {
        self.role.service_name()
    }

    /// Subscriber task that keeps `status` current
    pub fn subscriber(&self) -> StatusSubscriber {
        StatusSubscriber::new(
            self.bus.clone(),
            self.status.clone(),
            self.config.cache.resubscribe_delay(),
        )
    }

    /// Mark this service healthy in the store. Failure is logged only.
    pub async fn register_self(&self) {
        let name = self.service_name();
        match self.bus.write_health(&name, HealthState::Up).await {
            Ok(()) => tracing::info!(key = %name.health_key(), "Registered service health"),
            Err(e) => tracing::warn!(error = %e, "Failed to register service health"),
        }
    }

    /// Refine the cache seed from persisted health keys of every other peer
    pub async fn seed_from_store(&self) {
        let own = self.service_name();
        let others: Vec<ServiceName> = self
            .peers
            .names()
            .into_iter()
            .filter(|name| *name != own)
            .collect();

        crate::health::seed_from_store(self.bus.as_ref(), &self.status, &others).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryBus, StubTransport};

    fn state(role: Role, bus: Arc<MemoryBus>) -> AppState {
        AppState::from_parts(AppConfig::default(), role, bus, Arc::new(StubTransport::new()))
    }

    #[tokio::test]
    async fn test_cache_seeded_from_config() {
        let state = state(Role::Auth, Arc::new(MemoryBus::new()));

        assert!(state.status.is_up(&ServiceName::notification()).await);
        assert!(!state.status.is_up(&ServiceName::authentication()).await);
    }

    #[tokio::test]
    async fn test_register_self_writes_health_key() {
        let bus = Arc::new(MemoryBus::new());
        let state = state(Role::Notification, bus.clone());

        state.register_self().await;
        assert_eq!(bus.stored(&ServiceName::notification()), Some(HealthState::Up));
    }

    #[tokio::test]
    async fn test_seed_from_store_skips_own_key() {
        let bus = Arc::new(MemoryBus::new());
        bus.write_health(&ServiceName::notification(), HealthState::Down)
            .await
            .unwrap();
        bus.write_health(&ServiceName::authentication(), HealthState::Up)
            .await
            .unwrap();

        let state = state(Role::Auth, bus);
        state.seed_from_store().await;

        assert!(!state.status.is_up(&ServiceName::notification()).await);
        // Own entry stays unseeded
        assert!(!state.status.is_up(&ServiceName::authentication()).await);
    }
}
