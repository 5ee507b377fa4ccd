//! Emberpanel
//!
//! Local web control panel for an embedded device. The device runs as a
//! WiFi station and as its own access point at the same time, and serves a
//! small HTTP panel for LED actuation, sensor telemetry, and configuration.
//!
//! # Architecture
//!
//! ```text
//! request ──► route table ──► access gate ──► handler ──► collaborators
//!                               │                          ├── HardwareIo
//!                               ├── SessionStore           ├── SettingsStore
//!                               └── role (from origin)     └── NetworkControl
//! ```
//!
//! The access-control core is the interesting part: sessions are keyed by
//! the client's IP, the privilege tier is derived once at login from which
//! network the client came through (AP subnet ⇒ Admin, station ⇒ Viewer),
//! and every protected route passes through one gate before its handler
//! runs. Hardware, persisted settings, and the radio are collaborators
//! behind narrow interfaces.

pub mod access;
pub mod clock;
pub mod config;
pub mod hardware;
pub mod network;
pub mod session;
pub mod settings;
pub mod web;

pub use access::{resolve_role, AccessDecision, AccessGate, ApSubnet};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::PanelConfig;
pub use hardware::{HardwareIo, LedId, LedStates, SensorReading, SimulatedHardware};
pub use network::{LoopbackDriver, NetworkControl, Radio, RadioDriver, ScannedNetwork};
pub use session::{ClientIdentity, Role, Session, SessionStore};
pub use settings::{DeviceSettings, SettingsStore};
pub use web::{build_router, serve, AppState, PanelError};
