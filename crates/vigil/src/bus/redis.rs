//! Redis-backed status bus.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use vigil_common::constants::channels;
use vigil_common::{HealthEvent, HealthState, ServiceName};

use super::{EventStream, StatusBus};

/// Redis pub/sub plus key access.
///
/// Commands go through an auto-reconnecting connection manager; every
/// subscription opens its own dedicated pub/sub connection.
#[derive(Clone)]
pub struct RedisBus {
    client: redis::Client,
    conn: ConnectionManager,
}

impl RedisBus {
    /// Connect to Redis, failing if the server is unreachable
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).context("Failed to create Redis client")?;

        let conn = ConnectionManager::new(client.clone())
            .await
            .context("Failed to connect to Redis")?;

        Ok(Self { client, conn })
    }
}

#[async_trait]
impl StatusBus for RedisBus {
    async fn publish(&self, event: &HealthEvent) -> Result<()> {
        let mut conn = self.conn.clone();
        let receivers: i64 = conn
            .publish(event.channel(), event.payload())
            .await
            .with_context(|| format!("Failed to publish to {}", event.channel()))?;

        tracing::trace!(
            channel = event.channel(),
            service = %event.service,
            receivers,
            "Published health event"
        );

        Ok(())
    }

    async fn subscribe(&self) -> Result<EventStream> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .context("Failed to open Redis pub/sub connection")?;

        for channel in [channels::SERVICE_UP, channels::SERVICE_DOWN] {
            pubsub
                .subscribe(channel)
                .await
                .with_context(|| format!("Failed to subscribe to {}", channel))?;
            tracing::info!(channel, "Subscribed to health channel");
        }

        let events = pubsub.into_on_message().filter_map(|msg| async move {
            let channel = msg.get_channel_name().to_string();
            let payload: String = match msg.get_payload() {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(channel = %channel, error = %e, "Undecodable health message");
                    return None;
                }
            };

            let event = HealthEvent::from_message(&channel, &payload);
            if event.is_none() {
                tracing::debug!(channel = %channel, payload = %payload, "Ignoring message");
            }
            event
        });

        Ok(events.boxed())
    }

    async fn write_health(&self, service: &ServiceName, state: HealthState) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(service.health_key(), state.store_value())
            .await
            .with_context(|| format!("Failed to write {}", service.health_key()))?;

        Ok(())
    }

    async fn read_health(&self, service: &ServiceName) -> Result<Option<HealthState>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn
            .get(service.health_key())
            .await
            .with_context(|| format!("Failed to read {}", service.health_key()))?;

        Ok(value.map(|v| HealthState::from_store_value(&v)))
    }
}
