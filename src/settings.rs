//! Persisted Device Settings
//!
//! Key/value store over SQLite for the handful of strings the device keeps
//! across reboots: station WiFi credentials, access-point credentials, and
//! the portal login. Defaults are applied on read when a key has never been
//! written.
//!
//! The settings route handlers are the only readers/writers; the
//! access-control layer never caches credentials beyond the request that
//! reads them.

use anyhow::Result;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::info;

/// Well-known settings keys
pub mod keys {
    pub const SSID: &str = "ssid";
    pub const WIFI_PASSWORD: &str = "wifi_password";
    pub const AP_SSID: &str = "apssid";
    pub const AP_PASSWORD: &str = "ap_password";
    pub const USERNAME: &str = "username";
    pub const PASSWORD: &str = "password";
}

pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "admin";
pub const DEFAULT_AP_SSID: &str = "emberpanel-ap";

/// Everything the settings pages care about, read in one pass
#[derive(Debug, Clone)]
pub struct DeviceSettings {
    pub ssid: String,
    pub wifi_password: String,
    pub ap_ssid: String,
    pub ap_password: String,
    pub username: String,
    pub password: String,
}

/// SQLite-backed key/value settings store
pub struct SettingsStore {
    conn: Mutex<Connection>,
}

impl SettingsStore {
    /// Open or create the settings database
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;

        info!("Settings store opened: {}", path.display());
        Ok(store)
    }

    /// In-memory store for tests
    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.lock().execute(
            "CREATE TABLE IF NOT EXISTS settings (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Read a value, falling back to `default` when the key was never written
    pub fn get(&self, key: &str, default: &str) -> Result<String> {
        let conn = self.conn.lock();
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.unwrap_or_else(|| default.to_string()))
    }

    /// Write a value, overwriting any previous one
    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        self.conn.lock().execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Read all settings with defaults applied
    pub fn snapshot(&self) -> Result<DeviceSettings> {
        Ok(DeviceSettings {
            ssid: self.get(keys::SSID, "")?,
            wifi_password: self.get(keys::WIFI_PASSWORD, "")?,
            ap_ssid: self.get(keys::AP_SSID, DEFAULT_AP_SSID)?,
            ap_password: self.get(keys::AP_PASSWORD, "")?,
            username: self.get(keys::USERNAME, DEFAULT_USERNAME)?,
            password: self.get(keys::PASSWORD, DEFAULT_PASSWORD)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_absent() {
        let store = SettingsStore::open_in_memory().unwrap();
        let settings = store.snapshot().unwrap();

        assert_eq!(settings.username, "admin");
        assert_eq!(settings.password, "admin");
        assert_eq!(settings.ap_ssid, DEFAULT_AP_SSID);
        assert_eq!(settings.ssid, "");
    }

    #[test]
    fn test_put_then_get() {
        let store = SettingsStore::open_in_memory().unwrap();
        store.put(keys::SSID, "HomeNet").unwrap();
        assert_eq!(store.get(keys::SSID, "").unwrap(), "HomeNet");
    }

    #[test]
    fn test_put_overwrites() {
        let store = SettingsStore::open_in_memory().unwrap();
        store.put(keys::USERNAME, "alice").unwrap();
        store.put(keys::USERNAME, "bob").unwrap();
        assert_eq!(store.get(keys::USERNAME, "admin").unwrap(), "bob");
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.db");

        {
            let store = SettingsStore::open(&path).unwrap();
            store.put(keys::PASSWORD, "rotated").unwrap();
        }

        let store = SettingsStore::open(&path).unwrap();
        assert_eq!(store.snapshot().unwrap().password, "rotated");
    }
}
