//! Shared constants for Vigil services.

/// Default Redis host
pub const DEFAULT_REDIS_HOST: &str = "localhost";

/// Default Redis port
pub const DEFAULT_REDIS_PORT: u16 = 6379;

/// Default Redis ACL user
pub const DEFAULT_REDIS_USERNAME: &str = "default";

/// Default HTTP listen ports per role
pub const AUTH_SERVICE_PORT: u16 = 3000;
pub const NOTIFICATION_SERVICE_PORT: u16 = 3001;
pub const HEALTH_SERVICE_PORT: u16 = 3002;

/// Health monitor cycle interval (seconds)
pub const DEFAULT_MONITOR_INTERVAL_SECS: u64 = 1;

/// Outbound HTTP request timeout (seconds)
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 5;

/// Delay before re-subscribing after the pub/sub stream drops (seconds)
pub const DEFAULT_RESUBSCRIBE_DELAY_SECS: u64 = 1;

/// Well-known service names
pub mod services {
    pub const AUTHENTICATION: &str = "authenticationService";
    pub const NOTIFICATION: &str = "notificationService";
    pub const HEALTH: &str = "healthService";
}

/// Pub/sub channel names
pub mod channels {
    /// Payload: name of a service found healthy
    pub const SERVICE_UP: &str = "serviceup";

    /// Payload: name of a service found unhealthy or unreachable
    pub const SERVICE_DOWN: &str = "servicedown";
}

/// Redis key prefixes
pub mod redis_keys {
    /// Last known service health: health:{service_name}
    pub const HEALTH_PREFIX: &str = "health:";

    /// Value stored for a healthy service
    pub const HEALTHY: &str = "healthy";

    /// Value stored for an unhealthy service
    pub const UNHEALTHY: &str = "unhealthy";
}

/// HTTP endpoint paths
pub mod endpoints {
    /// Liveness endpoint exposed by every service
    pub const HEALTHY: &str = "/healthy";

    /// Data sink on the notification service
    pub const RECEIVE_DATA: &str = "/receiveData";

    /// Gated forward trigger on the auth service
    pub const SEND_TO_NOTIFICATION: &str = "/sendDataToNotificationService";

    /// On-demand monitor cycle on the health service
    pub const UPDATE_HEALTH: &str = "/updateHealth";

    /// Status cache snapshot
    pub const STATUS: &str = "/status";
}

/// Body value of `status` reported by a live service
pub const HEALTHY_STATUS: &str = "healthy";
