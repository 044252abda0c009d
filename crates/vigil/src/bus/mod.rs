//! Pub/sub store access.
//!
//! Health events travel over two channels (`serviceup`, `servicedown`) whose
//! payload is the bare service name. The same store keeps the
//! `health:{service}` keys.

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

use vigil_common::{HealthEvent, HealthState, ServiceName};

mod redis;

pub use self::redis::RedisBus;

/// Decoded health events from a live subscription
pub type EventStream = BoxStream<'static, HealthEvent>;

/// Best-effort broadcast of health events plus the health key space
#[async_trait]
pub trait StatusBus: Send + Sync {
    /// Publish one event. No acknowledgment beyond the store accepting it.
    async fn publish(&self, event: &HealthEvent) -> Result<()>;

    /// Subscribe to both health channels. The stream ends when the
    /// underlying connection is lost.
    async fn subscribe(&self) -> Result<EventStream>;

    /// Write `health:{service}`
    async fn write_health(&self, service: &ServiceName, state: HealthState) -> Result<()>;

    /// Read `health:{service}`, `None` if never written
    async fn read_health(&self, service: &ServiceName) -> Result<Option<HealthState>>;
}
