//! In-memory stand-ins for the store and peer transport.

use anyhow::{Result, bail};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};

use vigil_common::{HealthEvent, HealthState, ServiceName, VigilError};

use crate::bus::{EventStream, StatusBus};
use crate::peers::PeerTransport;

/// Broadcast-channel bus that records every publish
pub struct MemoryBus {
    tx: broadcast::Sender<HealthEvent>,
    published: Mutex<Vec<HealthEvent>>,
    store: Mutex<HashMap<ServiceName, HealthState>>,
    fail_publish: AtomicBool,
    fail_read: AtomicBool,
    failing_subscribes: AtomicUsize,
}

impl MemoryBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            tx,
            published: Mutex::new(Vec::new()),
            store: Mutex::new(HashMap::new()),
            fail_publish: AtomicBool::new(false),
            fail_read: AtomicBool::new(false),
            failing_subscribes: AtomicUsize::new(0),
        }
    }

    pub fn published(&self) -> Vec<HealthEvent> {
        self.published.lock().unwrap().clone()
    }

    pub fn stored(&self, service: &ServiceName) -> Option<HealthState> {
        self.store.lock().unwrap().get(service).copied()
    }

    pub fn fail_publishes(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self) {
        self.fail_read.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_subscribes(&self, count: usize) {
        self.failing_subscribes.store(count, Ordering::SeqCst);
    }

    /// Wait until `count` live subscriptions exist
    pub async fn wait_for_subscribers(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.tx.receiver_count() < count {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("subscriber never attached");
    }
}

#[async_trait]
impl StatusBus for MemoryBus {
    async fn publish(&self, event: &HealthEvent) -> Result<()> {
        if self.fail_publish.load(Ordering::SeqCst) {
            bail!("connection reset by peer");
        }
        self.published.lock().unwrap().push(event.clone());
        // No subscribers is not an error for pub/sub
        let _ = self.tx.send(event.clone());
        Ok(())
    }

    async fn subscribe(&self) -> Result<EventStream> {
        let pending = self.failing_subscribes.load(Ordering::SeqCst);
        if pending > 0 {
            self.failing_subscribes.store(pending - 1, Ordering::SeqCst);
            bail!("connection refused");
        }

        let rx = self.tx.subscribe();
        let stream = futures::stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(event) => return Some((event, rx)),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => return None,
                }
            }
        });

        Ok(Box::pin(stream))
    }

    async fn write_health(&self, service: &ServiceName, state: HealthState) -> Result<()> {
        self.store.lock().unwrap().insert(service.clone(), state);
        Ok(())
    }

    async fn read_health(&self, service: &ServiceName) -> Result<Option<HealthState>> {
        if self.fail_read.load(Ordering::SeqCst) {
            bail!("connection refused");
        }
        Ok(self.stored(service))
    }
}

/// Canned reply for one URL
#[derive(Clone)]
pub enum StubReply {
    Json(Value),
    /// Return the request body (POST only)
    Echo,
    Fail(String),
}

/// URL-routed transport that counts every call
#[derive(Default)]
pub struct StubTransport {
    replies: HashMap<String, StubReply>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, url: &str, reply: StubReply) -> Self {
        self.replies.insert(url.to_string(), reply);
        self
    }

    /// Hold every reply for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn reply(&self, url: &str, body: Option<&Value>) -> Result<Value, VigilError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.replies.get(url) {
            Some(StubReply::Json(value)) => Ok(value.clone()),
            Some(StubReply::Echo) => Ok(body.cloned().unwrap_or(Value::Null)),
            Some(StubReply::Fail(reason)) => Err(VigilError::Transport(reason.clone())),
            None => Err(VigilError::Transport(format!("connection refused: {}", url))),
        }
    }
}

#[async_trait]
impl PeerTransport for StubTransport {
    async fn get_json(&self, url: &str) -> Result<Value, VigilError> {
        self.reply(url, None).await
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, VigilError> {
        self.reply(url, Some(body)).await
    }
}
