//! Web Control Panel
//!
//! Route table, shared state, and the serving loop.
//!
//! # Route table
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ GET  /login              none    login form / landing    │
//! │ POST /login              none    credential check        │
//! │ GET  /logout             none    drop session            │
//! │ GET  /                   authed  dashboard               │
//! │ GET  /toggle_led         authed  flip LED                │
//! │ GET  /set_led_intensity  authed  PWM write               │
//! │ GET  /sensor_data        authed  temperature/humidity    │
//! │ GET  /settings           Admin   settings form + scan    │
//! │ POST /update_settings    Admin   apply settings subset   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Every protected route is wrapped by a gate middleware built from
//! [`AccessGate`]; a denied request is redirected before the handler body
//! runs. Handlers contain no authorization logic of their own.

pub mod error;
pub mod handlers;
pub mod html;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::access::{AccessDecision, AccessGate};
use crate::clock::Clock;
use crate::config::PanelConfig;
use crate::hardware::HardwareIo;
use crate::network::NetworkControl;
use crate::session::{ClientIdentity, Role, SessionStore};
use crate::settings::SettingsStore;

pub use error::PanelError;

/// Everything the handlers need, injected explicitly
pub struct AppState {
    pub config: PanelConfig,
    pub sessions: Arc<SessionStore>,
    pub gate: AccessGate,
    pub settings: SettingsStore,
    pub hardware: Arc<dyn HardwareIo>,
    pub network: Arc<dyn NetworkControl>,
}

impl AppState {
    pub fn new(
        config: PanelConfig,
        settings: SettingsStore,
        hardware: Arc<dyn HardwareIo>,
        network: Arc<dyn NetworkControl>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let sessions = Arc::new(SessionStore::new(config.session_ttl(), clock));
        let gate = AccessGate::new(sessions.clone());
        Self {
            config,
            sessions,
            gate,
            settings,
            hardware,
            network,
        }
    }
}

/// Gate middleware: any authenticated client
async fn require_authenticated(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    match state.gate.authorize(ClientIdentity::from(addr), None) {
        AccessDecision::Allow => next.run(req).await,
        AccessDecision::DenyRedirect(target) => Redirect::to(target).into_response(),
    }
}

/// Gate middleware: Admin only
async fn require_admin(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    match state
        .gate
        .authorize(ClientIdentity::from(addr), Some(Role::Admin))
    {
        AccessDecision::Allow => next.run(req).await,
        AccessDecision::DenyRedirect(target) => Redirect::to(target).into_response(),
    }
}

/// Build the full router. Exposed for the integration tests, which drive it
/// with `tower::ServiceExt::oneshot`.
pub fn build_router(state: Arc<AppState>) -> Router {
    let public = Router::new()
        .route("/login", get(handlers::login_page).post(handlers::login_submit))
        .route("/logout", get(handlers::logout));

    let authenticated = Router::new()
        .route("/", get(handlers::dashboard))
        .route("/toggle_led", get(handlers::toggle_led))
        .route("/set_led_intensity", get(handlers::set_led_intensity))
        .route("/sensor_data", get(handlers::sensor_data))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_authenticated,
        ));

    let admin = Router::new()
        .route("/settings", get(handlers::settings_page))
        .route("/update_settings", post(handlers::update_settings))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .merge(public)
        .merge(authenticated)
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the panel until shutdown, sweeping expired sessions in the
/// background
pub async fn serve(state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = state.config.socket_addr();
    let sweep_interval = Duration::from_secs(state.config.sweep_interval_secs);

    // Periodic sweep bounds session memory when clients disappear without
    // logging out; lazy expiry already keeps decisions correct in between.
    let sweep_sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        interval.tick().await; // first tick fires immediately
        loop {
            interval.tick().await;
            let removed = sweep_sessions.sweep();
            if removed > 0 {
                debug!(removed, "Swept expired sessions");
            }
        }
    });

    let router = build_router(state);

    info!("Control panel listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Control panel shut down gracefully");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
