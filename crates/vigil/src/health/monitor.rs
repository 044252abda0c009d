//! Health monitor: probe every peer, publish the result.
//!
//! Each cycle probes all configured peers concurrently, waits for every
//! result, then publishes one event per peer on `serviceup` or `servicedown`.
//! Publication is unconditional, so consumers are refreshed every interval
//! even when nothing changed.
//!
//! The scheduled loop and the on-demand `/updateHealth` trigger may run
//! cycles at the same time. That overlap is tolerated: every publish is a
//! last-write-wins overwrite on the consumer side.

use anyhow::{Context, Result};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

use vigil_common::{HealthEvent, HealthState, ServiceName};

use super::probe::HttpProbe;
use crate::bus::StatusBus;
use crate::config::MonitorConfig;

/// Result of probing one peer in a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub service: ServiceName,
    pub state: HealthState,
}

/// Everything published by one cycle
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub outcomes: Vec<ProbeOutcome>,
}

impl CycleReport {
    pub fn up_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.state.is_up()).count()
    }
}

/// Periodic prober and publisher
pub struct HealthMonitor {
    probe: HttpProbe,
    bus: Arc<dyn StatusBus>,
    peers: Vec<ServiceName>,
    interval: Duration,
    probe_on_startup: bool,
    persist_status: bool,
}

impl HealthMonitor {
    pub fn new(config: &MonitorConfig, probe: HttpProbe, bus: Arc<dyn StatusBus>) -> Self {
        Self {
            probe,
            bus,
            peers: config.peer_names(),
            interval: config.interval(),
            probe_on_startup: config.probe_on_startup,
            persist_status: config.persist_status,
        }
    }

    /// Run one cycle, absorbing any failure.
    ///
    /// Returns `None` when the cycle was aborted (the error is logged).
    pub async fn run_cycle(&self) -> Option<CycleReport> {
        match self.try_cycle().await {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::error!(error = %format!("{:#}", e), "Health check cycle failed");
                None
            }
        }
    }

    /// Run one cycle, stopping at the first publish failure
    pub async fn try_cycle(&self) -> Result<CycleReport> {
        let states = join_all(self.peers.iter().map(|peer| self.probe.probe(peer))).await;

        let outcomes: Vec<ProbeOutcome> = self
            .peers
            .iter()
            .cloned()
            .zip(states)
            .map(|(service, state)| ProbeOutcome { service, state })
            .collect();

        for outcome in &outcomes {
            let event = HealthEvent::new(outcome.service.clone(), outcome.state);
            self.bus
                .publish(&event)
                .await
                .with_context(|| format!("Failed to publish health of {}", outcome.service))?;
        }

        if self.persist_status {
            for outcome in &outcomes {
                self.bus
                    .write_health(&outcome.service, outcome.state)
                    .await
                    .with_context(|| format!("Failed to persist health of {}", outcome.service))?;
            }
        }

        Ok(CycleReport { outcomes })
    }

    /// Run cycles on the configured interval until shutdown
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        if !self.probe_on_startup {
            // The first tick completes immediately
            ticker.tick().await;
        }

        tracing::info!(
            peers = ?self.peers,
            interval = ?self.interval,
            "🩺 Health monitor started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Some(report) = self.run_cycle().await {
                        tracing::debug!(
                            up = report.up_count(),
                            total = report.outcomes.len(),
                            "Health check completed"
                        );
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("🩺 Health monitor shutting down");
                    break;
                }
            }
        }
    }
}
