//! Route-level tests: the full router driven through `tower::oneshot`, with
//! the peer address injected the way `into_make_service_with_connect_info`
//! would at runtime.

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;

use emberpanel::{
    build_router, AppState, HardwareIo, LedId, ManualClock, NetworkControl, PanelConfig,
    ScannedNetwork, SettingsStore, SimulatedHardware,
};

/// Radio whose outcomes are fixed per test
struct ScriptedNetwork {
    join_ok: bool,
    ap_ok: bool,
}

#[async_trait]
impl NetworkControl for ScriptedNetwork {
    async fn join_station(&self, _ssid: &str, _password: &str) -> bool {
        self.join_ok
    }

    async fn start_access_point(&self, _ssid: &str, _password: &str) -> bool {
        self.ap_ok
    }

    async fn scan_networks(&self) -> Vec<ScannedNetwork> {
        vec![ScannedNetwork {
            ssid: "HomeNet".into(),
            signal_dbm: -48,
        }]
    }
}

struct TestEnv {
    app: Router,
    state: Arc<AppState>,
    hardware: Arc<SimulatedHardware>,
    clock: Arc<ManualClock>,
}

fn env() -> TestEnv {
    env_with(SimulatedHardware::new(), true)
}

fn env_with(hardware: SimulatedHardware, join_ok: bool) -> TestEnv {
    let clock = Arc::new(ManualClock::default());
    let hardware = Arc::new(hardware);
    let state = Arc::new(AppState::new(
        PanelConfig::default(),
        SettingsStore::open_in_memory().unwrap(),
        hardware.clone(),
        Arc::new(ScriptedNetwork { join_ok, ap_ok: true }),
        clock.clone(),
    ));
    TestEnv {
        app: build_router(state.clone()),
        state,
        hardware,
        clock,
    }
}

const VIEWER_IP: &str = "10.0.0.5";
const ADMIN_IP: &str = "192.168.4.2";

fn peer(ip: &str) -> ConnectInfo<SocketAddr> {
    ConnectInfo(SocketAddr::new(ip.parse().unwrap(), 54321))
}

fn get(uri: &str, ip: &str) -> Request<Body> {
    let mut req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    req.extensions_mut().insert(peer(ip));
    req
}

fn post_form(uri: &str, ip: &str, form: &str) -> Request<Body> {
    let mut req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap();
    req.extensions_mut().insert(peer(ip));
    req
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

async fn body_string(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn login(env: &TestEnv, ip: &str) -> Response {
    env.app
        .clone()
        .oneshot(post_form("/login", ip, "username=admin&password=admin"))
        .await
        .unwrap()
}

// ============================================================================
// Authentication & gating
// ============================================================================

#[tokio::test]
async fn test_unauthenticated_requests_redirect_to_login() {
    let env = env();
    for uri in ["/", "/toggle_led?led=1", "/sensor_data", "/settings"] {
        let response = env.app.clone().oneshot(get(uri, VIEWER_IP)).await.unwrap();
        assert!(response.status().is_redirection(), "{uri}");
        assert_eq!(location(&response), "/login", "{uri}");
    }
}

#[tokio::test]
async fn test_login_page_renders_form() {
    let env = env();
    let response = env.app.clone().oneshot(get("/login", VIEWER_IP)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("name=\"username\""));
}

#[tokio::test]
async fn test_viewer_login_lands_on_dashboard() {
    let env = env();

    let response = login(&env, VIEWER_IP).await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/");

    let response = env.app.clone().oneshot(get("/", VIEWER_IP)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_viewer_denied_settings_goes_to_dashboard() {
    let env = env();
    login(&env, VIEWER_IP).await;

    // Denied with a redirect to /, not /login: the client is authenticated,
    // just not privileged
    let response = env.app.clone().oneshot(get("/settings", VIEWER_IP)).await.unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_admin_login_lands_on_settings() {
    let env = env();

    let response = login(&env, ADMIN_IP).await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/settings");

    let response = env.app.clone().oneshot(get("/settings", ADMIN_IP)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Settings"));
    // Scan results from the radio show up in the form
    assert!(body.contains("HomeNet"));
}

#[tokio::test]
async fn test_login_failure_rerenders_form() {
    let env = env();
    let response = env
        .app
        .clone()
        .oneshot(post_form("/login", VIEWER_IP, "username=admin&password=wrong"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("Invalid credentials"));

    // And no session was created
    let response = env.app.clone().oneshot(get("/", VIEWER_IP)).await.unwrap();
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_login_page_redirects_when_already_authenticated() {
    let env = env();

    login(&env, ADMIN_IP).await;
    let response = env.app.clone().oneshot(get("/login", ADMIN_IP)).await.unwrap();
    assert_eq!(location(&response), "/settings");

    login(&env, VIEWER_IP).await;
    let response = env.app.clone().oneshot(get("/login", VIEWER_IP)).await.unwrap();
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let env = env();
    login(&env, VIEWER_IP).await;

    let response = env.app.clone().oneshot(get("/logout", VIEWER_IP)).await.unwrap();
    assert_eq!(location(&response), "/login");

    let response = env.app.clone().oneshot(get("/", VIEWER_IP)).await.unwrap();
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_session_expires_after_ttl() {
    let env = env();
    login(&env, VIEWER_IP).await;

    env.clock.advance(chrono::Duration::seconds(301));
    let response = env.app.clone().oneshot(get("/", VIEWER_IP)).await.unwrap();
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_sessions_are_per_origin() {
    let env = env();
    login(&env, VIEWER_IP).await;

    // A different origin is still unauthenticated
    let response = env.app.clone().oneshot(get("/", "10.0.0.6")).await.unwrap();
    assert_eq!(location(&response), "/login");
}

// ============================================================================
// LED routes
// ============================================================================

#[tokio::test]
async fn test_toggle_led_flips_state() {
    let env = env();
    login(&env, VIEWER_IP).await;

    assert!(!env.hardware.led_states().led1.on);
    let response = env
        .app
        .clone()
        .oneshot(get("/toggle_led?led=1", VIEWER_IP))
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/");
    assert!(env.hardware.led_states().led1.on);
    assert!(!env.hardware.led_states().led2.on);
}

#[tokio::test]
async fn test_toggle_led_missing_or_invalid_param_is_400() {
    let env = env();
    login(&env, VIEWER_IP).await;

    for uri in ["/toggle_led", "/toggle_led?led=3"] {
        let response = env.app.clone().oneshot(get(uri, VIEWER_IP)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
    assert!(!env.hardware.led_states().led1.on);
}

#[tokio::test]
async fn test_set_led_intensity() {
    let env = env();
    login(&env, VIEWER_IP).await;

    let response = env
        .app
        .clone()
        .oneshot(get("/set_led_intensity?led=2&intensity=128", VIEWER_IP))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(env.hardware.led_states().led2.intensity, 128);
}

#[tokio::test]
async fn test_out_of_range_intensity_leaves_led_unchanged() {
    let env = env();
    login(&env, VIEWER_IP).await;
    env.hardware.set_led(LedId::Led1, 10);

    for uri in [
        "/set_led_intensity?led=1&intensity=300",
        "/set_led_intensity?led=1&intensity=-1",
        "/set_led_intensity?led=1&intensity=abc",
        "/set_led_intensity?led=1",
    ] {
        let response = env.app.clone().oneshot(get(uri, VIEWER_IP)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
    assert_eq!(env.hardware.led_states().led1.intensity, 10);
}

// ============================================================================
// Sensor route
// ============================================================================

#[tokio::test]
async fn test_sensor_data_reports_reading() {
    let env = env();
    login(&env, VIEWER_IP).await;

    let response = env.app.clone().oneshot(get("/sensor_data", VIEWER_IP)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value =
        serde_json::from_str(&body_string(response).await).unwrap();
    assert!(json["temperature"].as_str().unwrap().contains("°C"));
    assert!(json["humidity"].as_str().unwrap().contains('%'));
}

#[tokio::test]
async fn test_sensor_failure_reports_error_marker_with_200() {
    let env = env_with(SimulatedHardware::with_failing_sensor(), true);
    login(&env, VIEWER_IP).await;

    let response = env.app.clone().oneshot(get("/sensor_data", VIEWER_IP)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value =
        serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["temperature"], "Error");
    assert_eq!(json["humidity"], "Error");
}

// ============================================================================
// Settings routes
// ============================================================================

#[tokio::test]
async fn test_credential_rotation_invalidates_all_sessions() {
    let env = env();
    login(&env, ADMIN_IP).await;
    login(&env, VIEWER_IP).await;

    let response = env
        .app
        .clone()
        .oneshot(post_form("/update_settings", ADMIN_IP, "password=rotated"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Both sessions are gone, the rotating admin's included
    for ip in [ADMIN_IP, VIEWER_IP] {
        let response = env.app.clone().oneshot(get("/", ip)).await.unwrap();
        assert_eq!(location(&response), "/login", "{ip}");
    }

    // Old credentials no longer work; the rotated ones do
    let response = login(&env, ADMIN_IP).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = env
        .app
        .clone()
        .oneshot(post_form("/login", ADMIN_IP, "username=admin&password=rotated"))
        .await
        .unwrap();
    assert!(response.status().is_redirection());
}

#[tokio::test]
async fn test_wifi_join_failure_does_not_persist_credentials() {
    let env = env_with(SimulatedHardware::new(), false);
    login(&env, ADMIN_IP).await;

    let response = env
        .app
        .clone()
        .oneshot(post_form(
            "/update_settings",
            ADMIN_IP,
            "ssid=HomeNet&wifi_password=hunter22",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("could not join"));

    // Prior configuration untouched, session still valid
    assert_eq!(env.state.settings.snapshot().unwrap().ssid, "");
    let response = env.app.clone().oneshot(get("/settings", ADMIN_IP)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_successful_wifi_update_persists_credentials() {
    let env = env();
    login(&env, ADMIN_IP).await;

    let response = env
        .app
        .clone()
        .oneshot(post_form(
            "/update_settings",
            ADMIN_IP,
            "ssid=HomeNet&wifi_password=hunter22",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let settings = env.state.settings.snapshot().unwrap();
    assert_eq!(settings.ssid, "HomeNet");
    assert_eq!(settings.wifi_password, "hunter22");
}

#[tokio::test]
async fn test_settings_sub_updates_are_field_independent() {
    let env = env();
    login(&env, ADMIN_IP).await;

    // AP password too short fails on its own; the username change in the
    // same request still goes through (and rotates sessions)
    let response = env
        .app
        .clone()
        .oneshot(post_form(
            "/update_settings",
            ADMIN_IP,
            "apssid=newap&ap_password=short&username=operator",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let settings = env.state.settings.snapshot().unwrap();
    assert_eq!(settings.ap_ssid, "emberpanel-ap");
    assert_eq!(settings.ap_password, "");
    assert_eq!(settings.username, "operator");

    // Username rotation logged everyone out
    let response = env.app.clone().oneshot(get("/", ADMIN_IP)).await.unwrap();
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_ap_update_with_valid_password_persists() {
    let env = env();
    login(&env, ADMIN_IP).await;

    env.app
        .clone()
        .oneshot(post_form(
            "/update_settings",
            ADMIN_IP,
            "apssid=newap&ap_password=longenough",
        ))
        .await
        .unwrap();

    let settings = env.state.settings.snapshot().unwrap();
    assert_eq!(settings.ap_ssid, "newap");
    assert_eq!(settings.ap_password, "longenough");
}

#[tokio::test]
async fn test_empty_update_reports_no_changes() {
    let env = env();
    login(&env, ADMIN_IP).await;

    let response = env
        .app
        .clone()
        .oneshot(post_form(
            "/update_settings",
            ADMIN_IP,
            "ssid=&wifi_password=&username=&password=",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("No Changes Made"));

    // Submitting the current username unchanged is also not a rotation
    let response = env
        .app
        .clone()
        .oneshot(post_form("/update_settings", ADMIN_IP, "username=admin"))
        .await
        .unwrap();
    assert!(body_string(response).await.contains("No Changes Made"));
    let response = env.app.clone().oneshot(get("/", ADMIN_IP)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_update_settings_requires_admin() {
    let env = env();
    login(&env, VIEWER_IP).await;

    let response = env
        .app
        .clone()
        .oneshot(post_form("/update_settings", VIEWER_IP, "password=sneaky"))
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/");

    // The handler never ran
    assert_eq!(env.state.settings.snapshot().unwrap().password, "admin");
}
