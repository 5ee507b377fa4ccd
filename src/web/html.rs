//! Panel Pages
//!
//! Static templates with placeholder substitution. The panel is served to a
//! phone or laptop on the device's own network; there is no client-side app,
//! just plain forms posting back to the routes.

use crate::hardware::LedStates;
use crate::network::ScannedNetwork;
use crate::settings::DeviceSettings;

const BASE_STYLE: &str = r#"
    body { font-family: -apple-system, 'Segoe UI', Roboto, sans-serif;
           background: #0f172a; color: #e2e8f0; max-width: 480px;
           margin: 2rem auto; padding: 0 1rem; }
    h1 { color: #38bdf8; font-size: 1.5rem; }
    a { color: #38bdf8; }
    input, select { display: block; width: 100%; margin: 0.5rem 0;
                    padding: 0.5rem; background: #1e293b; color: #e2e8f0;
                    border: 1px solid #334155; border-radius: 4px; }
    button { padding: 0.5rem 1.5rem; background: #38bdf8; color: #0f172a;
             border: none; border-radius: 4px; cursor: pointer; }
    .error { color: #f87171; }
    .led { padding: 0.5rem 0; }
"#;

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{BASE_STYLE}</style>\n</head>\n\
         <body>\n{body}\n</body>\n</html>"
    )
}

/// Escape text interpolated into markup (SSIDs and usernames are
/// user-controlled strings)
fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Login form, optionally with an error message
pub fn login_page(message: &str) -> String {
    let error = if message.is_empty() {
        String::new()
    } else {
        format!("<p class=\"error\">{}</p>", escape(message))
    };
    page(
        "Device Login",
        &format!(
            "<h1>Device Login</h1>\n{error}\n\
             <form method=\"POST\" action=\"/login\">\n\
             <input type=\"text\" name=\"username\" placeholder=\"Username\" required>\n\
             <input type=\"password\" name=\"password\" placeholder=\"Password\" required>\n\
             <button type=\"submit\">Log in</button>\n</form>"
        ),
    )
}

/// Dashboard with live LED states
pub fn dashboard_page(leds: LedStates) -> String {
    let led_row = |n: u8, on: bool| {
        let state = if on { "ON" } else { "OFF" };
        format!(
            "<div class=\"led\">LED {n}: <strong>{state}</strong> \
             <a href=\"/toggle_led?led={n}\">toggle</a></div>"
        )
    };
    page(
        "Device Dashboard",
        &format!(
            "<h1>Dashboard</h1>\n{}\n{}\n\
             <p><a href=\"/sensor_data\">Sensor data</a> · \
             <a href=\"/settings\">Settings</a> · \
             <a href=\"/logout\">Log out</a></p>",
            led_row(1, leds.led1.on),
            led_row(2, leds.led2.on),
        ),
    )
}

/// Settings form pre-filled with the current SSID/username, plus scan results
pub fn settings_page(settings: &DeviceSettings, scanned: &[ScannedNetwork]) -> String {
    let options: String = scanned
        .iter()
        .map(|n| {
            format!(
                "<option value=\"{0}\">{0} ({1} dBm)</option>\n",
                escape(&n.ssid),
                n.signal_dbm
            )
        })
        .collect();
    let scan_list = if options.is_empty() {
        String::new()
    } else {
        format!("<select onchange=\"ssid.value=this.value\">\n<option>Nearby networks</option>\n{options}</select>")
    };

    page(
        "Device Settings",
        &format!(
            "<h1>Settings</h1>\n\
             <form method=\"POST\" action=\"/update_settings\">\n\
             <h2>Station WiFi</h2>\n{scan_list}\n\
             <input type=\"text\" id=\"ssid\" name=\"ssid\" placeholder=\"SSID\" value=\"{ssid}\">\n\
             <input type=\"password\" name=\"wifi_password\" placeholder=\"WiFi password\">\n\
             <h2>Access Point</h2>\n\
             <input type=\"text\" name=\"apssid\" placeholder=\"AP SSID\" value=\"{apssid}\">\n\
             <input type=\"password\" name=\"ap_password\" placeholder=\"AP password (min 8 chars)\">\n\
             <h2>Portal Login</h2>\n\
             <input type=\"text\" name=\"username\" placeholder=\"Username\" value=\"{username}\">\n\
             <input type=\"password\" name=\"password\" placeholder=\"New password\">\n\
             <button type=\"submit\">Save</button>\n</form>\n\
             <p><a href=\"/\">Back to dashboard</a></p>",
            ssid = escape(&settings.ssid),
            apssid = escape(&settings.ap_ssid),
            username = escape(&settings.username),
        ),
    )
}

/// Outcome page for a settings update
pub fn settings_notice(applied: &[&str], failed: &[String]) -> String {
    let body = if applied.is_empty() && failed.is_empty() {
        "<h1>No Changes Made</h1>".to_string()
    } else {
        let applied_list: String = applied
            .iter()
            .map(|item| format!("<li>{}</li>", escape(item)))
            .collect();
        let failed_list: String = failed
            .iter()
            .map(|item| format!("<li class=\"error\">{}</li>", escape(item)))
            .collect();
        let mut s = String::from("<h1>Settings Update</h1>");
        if !applied_list.is_empty() {
            s.push_str(&format!("<p>Updated:</p><ul>{applied_list}</ul>"));
        }
        if !failed_list.is_empty() {
            s.push_str(&format!("<p>Not applied:</p><ul>{failed_list}</ul>"));
        }
        s
    };
    page(
        "Settings Update",
        &format!("{body}\n<p><a href=\"/settings\">Back to settings</a></p>"),
    )
}
