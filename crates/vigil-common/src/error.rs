//! Common error types for Vigil services.

use thiserror::Error;

use crate::types::ServiceName;

/// Common errors across Vigil services
#[derive(Debug, Error)]
pub enum VigilError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Outbound HTTP call failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Timeout
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

/// Outcome of a gated cross-service call that did not produce a body.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The local status cache says the target is down; no call was made.
    #[error("target is down (per cached status)")]
    TargetDown { target: ServiceName },

    /// The cache said up, but the call itself failed.
    #[error("failed to reach target")]
    Unreachable { target: ServiceName, reason: String },
}

impl ForwardError {
    /// True when the gate tripped without any network I/O
    pub fn is_gate_tripped(&self) -> bool {
        matches!(self, Self::TargetDown { .. })
    }

    /// Both kinds surface to HTTP callers as 500
    pub fn status_code(&self) -> u16 {
        500
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_error_messages() {
        let down = ForwardError::TargetDown {
            target: ServiceName::notification(),
        };
        assert_eq!(down.to_string(), "target is down (per cached status)");
        assert!(down.is_gate_tripped());

        let unreachable = ForwardError::Unreachable {
            target: ServiceName::notification(),
            reason: "connection refused".into(),
        };
        assert_eq!(unreachable.to_string(), "failed to reach target");
        assert!(!unreachable.is_gate_tripped());
        assert_eq!(unreachable.status_code(), 500);
    }

    #[test]
    fn test_vigil_error_messages() {
        assert_eq!(
            VigilError::Timeout("probe".into()).to_string(),
            "Operation timed out: probe"
        );
        assert_eq!(
            VigilError::Config("bad interval".into()).to_string(),
            "Configuration error: bad interval"
        );
    }
}
