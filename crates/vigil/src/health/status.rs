//! Local view of peer health, fed only by pub/sub events.

use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, broadcast};

use vigil_common::{HealthEvent, HealthState, ServiceName};

use crate::bus::StatusBus;

/// Cached state of one peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeerStatus {
    pub up: bool,
    /// When the last event for this peer was applied (`None` for seeds)
    pub updated_at: Option<DateTime<Utc>>,
}

/// In-memory `service -> up/down` map.
///
/// Last write wins: every event overwrites the entry, with no ordering token
/// beyond arrival. Names never seeded nor observed read as down.
#[derive(Clone, Default)]
pub struct StatusCache {
    entries: Arc<RwLock<HashMap<ServiceName, PeerStatus>>>,
}

impl StatusCache {
    /// Cache pre-populated with static initial states
    pub fn seeded<I>(seed: I) -> Self
    where
        I: IntoIterator<Item = (ServiceName, HealthState)>,
    {
        let entries = seed
            .into_iter()
            .map(|(name, state)| {
                (
                    name,
                    PeerStatus {
                        up: state.is_up(),
                        updated_at: None,
                    },
                )
            })
            .collect();

        Self {
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    pub async fn state(&self, service: &ServiceName) -> HealthState {
        self.entries
            .read()
            .await
            .get(service)
            .map(|s| HealthState::from(s.up))
            .unwrap_or(HealthState::Down)
    }

    pub async fn is_up(&self, service: &ServiceName) -> bool {
        self.state(service).await.is_up()
    }

    /// Fold one event into the cache, returning the previous state if any
    pub async fn apply(&self, event: &HealthEvent) -> Option<HealthState> {
        let previous = self.entries.write().await.insert(
            event.service.clone(),
            PeerStatus {
                up: event.state.is_up(),
                updated_at: Some(Utc::now()),
            },
        );
        let previous = previous.map(|p| HealthState::from(p.up));

        if previous != Some(event.state) {
            tracing::info!(
                service = %event.service,
                from = ?previous,
                to = ?event.state,
                "Peer health changed"
            );
        } else {
            tracing::trace!(service = %event.service, state = ?event.state, "Peer health refreshed");
        }

        previous
    }

    /// Set an initial state without marking it as observed
    pub async fn seed(&self, service: ServiceName, state: HealthState) {
        self.entries.write().await.insert(
            service,
            PeerStatus {
                up: state.is_up(),
                updated_at: None,
            },
        );
    }

    /// Sorted copy of every entry
    pub async fn snapshot(&self) -> BTreeMap<ServiceName, PeerStatus> {
        self.entries
            .read()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }
}

/// Refine the cache from persisted `health:{service}` keys.
///
/// Missing keys keep the static seed; read failures are logged and skipped.
pub async fn seed_from_store(bus: &dyn StatusBus, cache: &StatusCache, services: &[ServiceName]) {
    for service in services {
        match bus.read_health(service).await {
            Ok(Some(state)) => {
                tracing::debug!(service = %service, state = ?state, "Seeded from store");
                cache.seed(service.clone(), state).await;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(service = %service, error = %e, "Failed to read persisted health");
            }
        }
    }
}

/// Keeps a [`StatusCache`] subscribed to health events
pub struct StatusSubscriber {
    bus: Arc<dyn StatusBus>,
    cache: StatusCache,
    resubscribe_delay: Duration,
}

impl StatusSubscriber {
    pub fn new(bus: Arc<dyn StatusBus>, cache: StatusCache, resubscribe_delay: Duration) -> Self {
        Self {
            bus,
            cache,
            resubscribe_delay,
        }
    }

    /// Consume events until shutdown, re-subscribing whenever the stream
    /// drops or the subscribe call fails
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!("👂 Status subscriber started");

        loop {
            let subscribed = tokio::select! {
                result = self.bus.subscribe() => result,
                _ = shutdown.recv() => break,
            };

            match subscribed {
                Ok(mut events) => loop {
                    tokio::select! {
                        next = events.next() => match next {
                            Some(event) => {
                                self.cache.apply(&event).await;
                            }
                            None => {
                                tracing::warn!("Health event stream ended");
                                break;
                            }
                        },
                        _ = shutdown.recv() => {
                            tracing::info!("👂 Status subscriber shutting down");
                            return;
                        }
                    }
                },
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to subscribe to health events");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.resubscribe_delay) => {}
                _ = shutdown.recv() => break,
            }
        }

        tracing::info!("👂 Status subscriber shutting down");
    }
}
