//! Session configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default interval between round-trip-time pings.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_millis(2000);

/// Shortest ping interval any component will use.
pub const MIN_PING_INTERVAL: Duration = Duration::from_millis(1);

/// Wire protocol the network client should use to reach the backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionProtocol {
    /// UDP (lowest latency, default for native clients).
    #[default]
    Udp,
    /// TCP.
    Tcp,
    /// Plain WebSocket.
    Ws,
    /// WebSocket over TLS.
    Wss,
}

/// Configuration passed to [`Session::init`](crate::Session::init).
///
/// The only required fields are the application id and version; all others
/// have sensible defaults.
///
/// # Example
///
/// ```
/// use relay_lobby_client::{ConnectionProtocol, LobbyConfig};
/// use std::time::Duration;
///
/// let config = LobbyConfig::new("app-1234", "1.0")
///     .with_verbose(true)
///     .with_protocol(ConnectionProtocol::Wss)
///     .with_ping_interval(Duration::from_millis(500));
/// assert_eq!(config.app_id, "app-1234");
/// assert!(config.verbose);
/// ```
#[derive(Debug, Clone)]
pub struct LobbyConfig {
    /// Application id issued by the backend operator.
    pub app_id: String,
    /// Application version; clients only match with clients of the same version.
    pub app_version: String,
    /// Trace every dispatched event.
    pub verbose: bool,
    /// Connection protocol forwarded to the network client.
    pub protocol: ConnectionProtocol,
    /// Interval between round-trip-time pings.
    ///
    /// Defaults to **2 seconds**. Values below 1 ms are clamped to 1 ms.
    pub ping_interval: Duration,
}

impl LobbyConfig {
    /// Create a new configuration with the given application id and version.
    pub fn new(app_id: impl Into<String>, app_version: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_version: app_version.into(),
            verbose: false,
            protocol: ConnectionProtocol::default(),
            ping_interval: DEFAULT_PING_INTERVAL,
        }
    }

    /// Enable or disable per-event dispatch tracing.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the connection protocol.
    #[must_use]
    pub fn with_protocol(mut self, protocol: ConnectionProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Set the ping interval. Values below 1 ms are clamped to 1 ms.
    #[must_use]
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval.max(MIN_PING_INTERVAL);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = LobbyConfig::new("app", "1.0");
        assert_eq!(config.app_id, "app");
        assert_eq!(config.app_version, "1.0");
        assert!(!config.verbose);
        assert_eq!(config.protocol, ConnectionProtocol::Udp);
        assert_eq!(config.ping_interval, Duration::from_secs(2));
    }

    #[test]
    fn zero_ping_interval_is_clamped() {
        let config = LobbyConfig::new("app", "1.0").with_ping_interval(Duration::ZERO);
        assert_eq!(config.ping_interval, Duration::from_millis(1));
    }
}
