//! # Vigil Common
//!
//! Shared types, errors, and constants used across Vigil services.
//!
//! ## Modules
//! - `types` - Core data structures (ServiceName, HealthState, HealthEvent)
//! - `error` - Common error types
//! - `constants` - Channel names, key prefixes, endpoints, defaults

pub mod constants;
pub mod error;
pub mod types;

pub use error::{ForwardError, VigilError};
pub use types::*;
