//! Liveness propagation.
//!
//! Implements:
//! - Health probe (one outbound check against a peer)
//! - Health monitor (periodic probe-and-publish cycles)
//! - Status cache (local view fed by pub/sub events)

mod monitor;
mod probe;
mod status;

pub use monitor::HealthMonitor;
pub use probe::HttpProbe;
pub use status::{PeerStatus, StatusCache, StatusSubscriber, seed_from_store};
