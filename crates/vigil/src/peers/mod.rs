//! Peer addressing and outbound transport.

mod directory;
mod transport;

pub use directory::PeerDirectory;
pub use transport::{HttpTransport, PeerTransport};
