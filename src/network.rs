//! Network Control
//!
//! The WiFi radio is an external collaborator: a join or AP start either
//! succeeds or fails atomically, and the panel only sees the outcome.
//! [`RadioDriver`] is that single-attempt surface; [`Radio`] wraps it with
//! the device's bounded join retry (fixed attempt count, fixed delay) so the
//! settings handler and boot sequence share one policy.
//!
//! A join can take tens of seconds at the driver level. Callers must not
//! hold any panel lock across these futures.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A nearby network as seen by a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedNetwork {
    pub ssid: String,
    pub signal_dbm: i32,
}

/// Single-attempt radio operations, implemented against the actual WiFi
/// driver on a device build
#[async_trait]
pub trait RadioDriver: Send + Sync {
    /// One join attempt; true iff the station came up connected
    async fn try_join(&self, ssid: &str, password: &str) -> bool;

    /// (Re)start the device's own access point
    async fn start_access_point(&self, ssid: &str, password: &str) -> bool;

    /// Scan for nearby networks
    async fn scan(&self) -> Vec<ScannedNetwork>;
}

/// What the rest of the panel consumes: join with retry, AP control, scans
#[async_trait]
pub trait NetworkControl: Send + Sync {
    /// Join the station network, retrying up to the configured attempt count
    async fn join_station(&self, ssid: &str, password: &str) -> bool;

    async fn start_access_point(&self, ssid: &str, password: &str) -> bool;

    async fn scan_networks(&self) -> Vec<ScannedNetwork>;
}

/// Bounded-retry wrapper over a [`RadioDriver`]
pub struct Radio {
    driver: Arc<dyn RadioDriver>,
    join_attempts: u32,
    join_delay: Duration,
}

impl Radio {
    pub fn new(driver: Arc<dyn RadioDriver>, join_attempts: u32, join_delay: Duration) -> Self {
        Self {
            driver,
            join_attempts,
            join_delay,
        }
    }
}

#[async_trait]
impl NetworkControl for Radio {
    async fn join_station(&self, ssid: &str, password: &str) -> bool {
        info!(ssid, "Attempting to join station network");

        for attempt in 1..=self.join_attempts {
            if self.driver.try_join(ssid, password).await {
                info!(ssid, attempt, "Station network joined");
                return true;
            }
            debug!(ssid, attempt, "Join attempt failed");
            if attempt < self.join_attempts {
                tokio::time::sleep(self.join_delay).await;
            }
        }

        warn!(
            ssid,
            attempts = self.join_attempts,
            "Failed to join station network"
        );
        false
    }

    async fn start_access_point(&self, ssid: &str, password: &str) -> bool {
        let started = self.driver.start_access_point(ssid, password).await;
        if started {
            info!(ssid, "Access point started");
        } else {
            warn!(ssid, "Access point failed to start");
        }
        started
    }

    async fn scan_networks(&self) -> Vec<ScannedNetwork> {
        let found = self.driver.scan().await;
        debug!(count = found.len(), "Network scan complete");
        found
    }
}

/// Driver stand-in for builds without a radio attached: joins and AP starts
/// report success so the panel is reachable, scans come back empty.
#[derive(Debug, Default)]
pub struct LoopbackDriver;

#[async_trait]
impl RadioDriver for LoopbackDriver {
    async fn try_join(&self, ssid: &str, _password: &str) -> bool {
        debug!(ssid, "Loopback driver accepting join");
        true
    }

    async fn start_access_point(&self, ssid: &str, _password: &str) -> bool {
        debug!(ssid, "Loopback driver accepting AP start");
        true
    }

    async fn scan(&self) -> Vec<ScannedNetwork> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Driver that starts succeeding on the Nth join attempt
    struct FlakyDriver {
        calls: AtomicU32,
        succeed_on: u32,
    }

    impl FlakyDriver {
        fn new(succeed_on: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                succeed_on,
            }
        }
    }

    #[async_trait]
    impl RadioDriver for FlakyDriver {
        async fn try_join(&self, _ssid: &str, _password: &str) -> bool {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            call >= self.succeed_on
        }

        async fn start_access_point(&self, _ssid: &str, _password: &str) -> bool {
            true
        }

        async fn scan(&self) -> Vec<ScannedNetwork> {
            vec![ScannedNetwork {
                ssid: "HomeNet".into(),
                signal_dbm: -52,
            }]
        }
    }

    fn radio(driver: FlakyDriver, attempts: u32) -> (Radio, Arc<FlakyDriver>) {
        let driver = Arc::new(driver);
        (
            Radio::new(driver.clone(), attempts, Duration::from_millis(1)),
            driver,
        )
    }

    #[tokio::test]
    async fn test_join_succeeds_within_budget() {
        let (radio, driver) = radio(FlakyDriver::new(3), 10);
        assert!(radio.join_station("HomeNet", "hunter22").await);
        assert_eq!(driver.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_join_gives_up_after_fixed_attempts() {
        let (radio, driver) = radio(FlakyDriver::new(u32::MAX), 4);
        assert!(!radio.join_station("HomeNet", "wrong").await);
        assert_eq!(driver.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_first_attempt_success_does_not_retry() {
        let (radio, driver) = radio(FlakyDriver::new(1), 10);
        assert!(radio.join_station("HomeNet", "hunter22").await);
        assert_eq!(driver.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_scan_passthrough() {
        let (radio, _driver) = radio(FlakyDriver::new(1), 1);
        let found = radio.scan_networks().await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].ssid, "HomeNet");
    }

    #[tokio::test]
    async fn test_loopback_driver() {
        let radio = Radio::new(Arc::new(LoopbackDriver), 1, Duration::from_millis(1));
        assert!(radio.join_station("any", "any").await);
        assert!(radio.start_access_point("emberpanel-ap", "").await);
        assert!(radio.scan_networks().await.is_empty());
    }
}
