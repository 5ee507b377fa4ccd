//! Panel Configuration
//!
//! Environment-driven configuration with device defaults. The session TTL
//! and AP subnet are policy knobs here rather than constants inside the
//! session/access code.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::access::ApSubnet;

/// Control panel configuration
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Bind address (default 0.0.0.0: the panel must be reachable from both
    /// the station network and the device's own AP)
    pub bind_addr: IpAddr,
    /// Port number (default: 8080)
    pub port: u16,
    /// Session lifetime in seconds (default: 300)
    pub session_ttl_secs: u64,
    /// Interval between background session sweeps (default: 60)
    pub sweep_interval_secs: u64,
    /// IPv4 /24 the access point hands leases from; origins inside it are
    /// granted Admin at login
    pub ap_subnet: ApSubnet,
    /// Join attempts before a station connect is reported failed
    pub wifi_join_attempts: u32,
    /// Delay between join attempts, in milliseconds
    pub wifi_join_delay_ms: u64,
    /// Path of the settings database
    pub db_path: PathBuf,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            session_ttl_secs: 300,
            sweep_interval_secs: 60,
            ap_subnet: ApSubnet::default(),
            wifi_join_attempts: 10,
            wifi_join_delay_ms: 1000,
            db_path: PathBuf::from("emberpanel.db"),
        }
    }
}

impl PanelConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("PANEL_BIND_ADDR") {
            if let Ok(parsed) = addr.parse() {
                config.bind_addr = parsed;
            }
        }

        if let Ok(port) = std::env::var("PANEL_PORT") {
            if let Ok(parsed) = port.parse() {
                config.port = parsed;
            }
        }

        if let Ok(ttl) = std::env::var("PANEL_SESSION_TTL_SECS") {
            if let Ok(parsed) = ttl.parse() {
                config.session_ttl_secs = parsed;
            }
        }

        if let Ok(interval) = std::env::var("PANEL_SWEEP_INTERVAL_SECS") {
            if let Ok(parsed) = interval.parse() {
                config.sweep_interval_secs = parsed;
            }
        }

        if let Ok(subnet) = std::env::var("PANEL_AP_SUBNET") {
            match subnet.parse() {
                Ok(parsed) => config.ap_subnet = parsed,
                Err(e) => tracing::warn!("Ignoring PANEL_AP_SUBNET: {e}"),
            }
        }

        if let Ok(attempts) = std::env::var("PANEL_WIFI_JOIN_ATTEMPTS") {
            if let Ok(parsed) = attempts.parse() {
                config.wifi_join_attempts = parsed;
            }
        }

        if let Ok(delay) = std::env::var("PANEL_WIFI_JOIN_DELAY_MS") {
            if let Ok(parsed) = delay.parse() {
                config.wifi_join_delay_ms = parsed;
            }
        }

        if let Ok(path) = std::env::var("PANEL_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }

        config
    }

    /// Get the socket address to bind
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// Session TTL as a chrono duration, for the session store
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_ttl_secs as i64)
    }

    /// Delay between WiFi join attempts
    pub fn wifi_join_delay(&self) -> Duration {
        Duration::from_millis(self.wifi_join_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PanelConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.session_ttl_secs, 300);
        assert_eq!(config.wifi_join_attempts, 10);
        assert_eq!(config.ap_subnet, ApSubnet::new([192, 168, 4]));
    }

    #[test]
    fn test_socket_addr() {
        let config = PanelConfig::default();
        assert_eq!(config.socket_addr().port(), 8080);
    }

    #[test]
    fn test_session_ttl_conversion() {
        let config = PanelConfig::default();
        assert_eq!(config.session_ttl(), chrono::Duration::seconds(300));
    }
}
