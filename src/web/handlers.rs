//! Route Handlers
//!
//! Handler bodies run strictly after the access gate has allowed the
//! request (see the route table in [`super`]); none of them re-check
//! authorization. They validate their own parameters, talk to the
//! collaborators, and render a page or redirect.

use axum::extract::{ConnectInfo, Form, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::access::resolve_role;
use crate::session::{ClientIdentity, Role};
use crate::settings::keys;

use super::error::PanelError;
use super::html;
use super::AppState;

/// WPA2 requires at least 8 characters for the AP passphrase
const MIN_AP_PASSWORD_LEN: usize = 8;

/// Landing page for a freshly authenticated client
fn landing(role: Role) -> &'static str {
    match role {
        Role::Admin => "/settings",
        Role::Viewer => "/",
    }
}

// ============================================================================
// Auth routes (no gate)
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// `GET /login` — login form, or straight to the landing page when a live
/// session already exists
pub async fn login_page(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Response {
    let identity = ClientIdentity::from(addr);
    if let Some(role) = state.sessions.current_role(identity) {
        return Redirect::to(landing(role)).into_response();
    }
    Html(html::login_page("")).into_response()
}

/// `POST /login` — credential check against the persisted portal login.
///
/// The role is resolved from the client's network origin exactly here, once,
/// and frozen into the session.
pub async fn login_submit(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Form(form): Form<LoginForm>,
) -> Result<Response, PanelError> {
    let identity = ClientIdentity::from(addr);
    let settings = state.settings.snapshot()?;

    if form.username == settings.username && form.password == settings.password {
        let role = resolve_role(identity, &state.config.ap_subnet);
        state.sessions.create(identity, role);
        info!(%identity, %role, "Login succeeded");
        Ok(Redirect::to(landing(role)).into_response())
    } else {
        warn!(%identity, "Login failed");
        Ok(Html(html::login_page("Invalid credentials. Please try again.")).into_response())
    }
}

/// `GET /logout` — drop the caller's session; safe for anyone to hit
pub async fn logout(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Redirect {
    let identity = ClientIdentity::from(addr);
    state.sessions.invalidate(identity);
    info!(%identity, "Logged out");
    Redirect::to("/login")
}

// ============================================================================
// Dashboard & LED routes (any authenticated)
// ============================================================================

/// `GET /` — dashboard with live LED states
pub async fn dashboard(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(html::dashboard_page(state.hardware.led_states()))
}

#[derive(Debug, Deserialize)]
pub struct ToggleParams {
    pub led: Option<String>,
}

/// `GET /toggle_led?led={1,2}` — flip an LED, then back to the dashboard
pub async fn toggle_led(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ToggleParams>,
) -> Result<Redirect, PanelError> {
    let led = params
        .led
        .as_deref()
        .ok_or_else(|| PanelError::validation("LED parameter missing"))
        .and_then(|value| {
            crate::hardware::LedId::from_param(value)
                .ok_or_else(|| PanelError::validation("Invalid LED parameter"))
        })?;

    state.hardware.toggle_led(led);
    Ok(Redirect::to("/"))
}

#[derive(Debug, Deserialize)]
pub struct IntensityParams {
    pub led: Option<String>,
    pub intensity: Option<String>,
}

/// `GET /set_led_intensity?led={1,2}&intensity=0..255` — PWM write.
///
/// Validation happens before any hardware call: an out-of-range value must
/// leave the LED untouched.
pub async fn set_led_intensity(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IntensityParams>,
) -> Result<(StatusCode, &'static str), PanelError> {
    let led = params
        .led
        .as_deref()
        .ok_or_else(|| PanelError::validation("LED parameter missing"))
        .and_then(|value| {
            crate::hardware::LedId::from_param(value)
                .ok_or_else(|| PanelError::validation("Invalid LED parameter"))
        })?;

    let intensity: i64 = params
        .intensity
        .as_deref()
        .ok_or_else(|| PanelError::validation("Intensity parameter missing"))?
        .parse()
        .map_err(|_| PanelError::validation("Invalid intensity value"))?;

    if !(0..=255).contains(&intensity) {
        return Err(PanelError::validation("Invalid intensity value"));
    }

    state.hardware.set_led(led, intensity as u8);
    Ok((StatusCode::OK, "LED intensity set"))
}

// ============================================================================
// Sensor route (any authenticated)
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SensorDataResponse {
    pub temperature: String,
    pub humidity: String,
}

/// `GET /sensor_data` — always 200; a failed poll reports the literal
/// `"Error"` in place of the reading
pub async fn sensor_data(State(state): State<Arc<AppState>>) -> Json<SensorDataResponse> {
    let response = match state.hardware.read_sensor() {
        Ok(reading) => SensorDataResponse {
            temperature: format!("{:.2} °C", reading.temperature),
            humidity: format!("{:.2} %", reading.humidity),
        },
        Err(e) => {
            warn!("Sensor read failed: {e}");
            SensorDataResponse {
                temperature: "Error".to_string(),
                humidity: "Error".to_string(),
            }
        }
    };
    Json(response)
}

// ============================================================================
// Settings routes (Admin)
// ============================================================================

/// `GET /settings` — form pre-filled with the current SSID/username, plus a
/// scan of nearby networks
pub async fn settings_page(State(state): State<Arc<AppState>>) -> Result<Html<String>, PanelError> {
    let settings = state.settings.snapshot()?;
    let scanned = state.network.scan_networks().await;
    Ok(Html(html::settings_page(&settings, &scanned)))
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSettingsForm {
    pub ssid: Option<String>,
    pub wifi_password: Option<String>,
    pub apssid: Option<String>,
    pub ap_password: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// `POST /update_settings` — apply any subset of the settings fields.
///
/// Sub-updates are field-independent: a failed WiFi join or a too-short AP
/// passphrase rejects only that piece, and the rest of the form still goes
/// through. A portal username/password change invalidates every session
/// before the response is sent — the device has one global login, so no
/// session may outlive a rotation.
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Form(form): Form<UpdateSettingsForm>,
) -> Result<Html<String>, PanelError> {
    let current = state.settings.snapshot()?;
    let mut applied: Vec<&str> = Vec::new();
    let mut failed: Vec<String> = Vec::new();

    // Station WiFi: persist only after the radio actually joined, so a typo
    // never replaces a working configuration.
    if let (Some(ssid), Some(wifi_password)) = (&form.ssid, &form.wifi_password) {
        if !ssid.is_empty() && !wifi_password.is_empty() {
            if state.network.join_station(ssid, wifi_password).await {
                state.settings.put(keys::SSID, ssid)?;
                state.settings.put(keys::WIFI_PASSWORD, wifi_password)?;
                applied.push("station WiFi");
            } else {
                failed.push(format!("station WiFi: could not join {ssid:?}"));
            }
        }
    }

    // Access point credentials
    if let (Some(apssid), Some(ap_password)) = (&form.apssid, &form.ap_password) {
        if !apssid.is_empty() && !ap_password.is_empty() {
            if ap_password.len() < MIN_AP_PASSWORD_LEN {
                failed.push("access point: password must be at least 8 characters".to_string());
            } else if state.network.start_access_point(apssid, ap_password).await {
                state.settings.put(keys::AP_SSID, apssid)?;
                state.settings.put(keys::AP_PASSWORD, ap_password)?;
                applied.push("access point");
            } else {
                failed.push("access point: restart failed".to_string());
            }
        }
    }

    // Portal login
    let mut rotated = false;
    if let Some(username) = &form.username {
        if !username.is_empty() && *username != current.username {
            state.settings.put(keys::USERNAME, username)?;
            applied.push("username");
            rotated = true;
        }
    }
    if let Some(password) = &form.password {
        if !password.is_empty() && *password != current.password {
            state.settings.put(keys::PASSWORD, password)?;
            applied.push("password");
            rotated = true;
        }
    }

    if rotated {
        // Synchronous, before the response: a stale session must not stay
        // valid against a rotated credential.
        state.sessions.invalidate_all();
        info!("Portal credentials rotated; all sessions invalidated");
    }

    Ok(Html(html::settings_notice(&applied, &failed)))
}
