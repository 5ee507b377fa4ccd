//! Emberpanel - Entry Point
//!
//! Boot sequence: load persisted settings, bring the radio up (station join
//! with stored credentials if any, then the device's own access point), and
//! serve the control panel.

use std::sync::Arc;

use emberpanel::{
    AppState, LoopbackDriver, NetworkControl, PanelConfig, Radio, SettingsStore,
    SimulatedHardware, SystemClock,
};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    let log_level = std::env::var("RUST_LOG")
        .map(|s| match s.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        })
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Emberpanel v{}", env!("CARGO_PKG_VERSION"));

    let config = PanelConfig::from_env();
    let settings = SettingsStore::open(&config.db_path)?;
    let boot = settings.snapshot()?;

    let network: Arc<dyn NetworkControl> = Arc::new(Radio::new(
        Arc::new(LoopbackDriver),
        config.wifi_join_attempts,
        config.wifi_join_delay(),
    ));

    // Station join first, with whatever credentials the device has stored
    if !boot.ssid.is_empty() && !boot.wifi_password.is_empty() {
        if network.join_station(&boot.ssid, &boot.wifi_password).await {
            info!(ssid = %boot.ssid, "Station network up");
        } else {
            warn!(ssid = %boot.ssid, "Station join failed; panel reachable via AP only");
        }
    } else {
        info!("No stored station credentials");
    }

    // The AP always comes up so the panel stays reachable for first-time
    // setup and recovery
    if !network
        .start_access_point(&boot.ap_ssid, &boot.ap_password)
        .await
    {
        warn!(ssid = %boot.ap_ssid, "Access point failed to start");
    }

    let state = Arc::new(AppState::new(
        config,
        settings,
        Arc::new(SimulatedHardware::new()),
        network,
        Arc::new(SystemClock),
    ));

    emberpanel::serve(state).await
}
