//! Platform settings, read once from the JSON `settings.conf` file.

use crate::errors::{JaxpError, Result};
use crate::store::ConnectionSettings;
use chrono::FixedOffset;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

static OFFSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([+-])(\d{2}):(\d{2})$").expect("offset pattern"));

fn default_time_zone() -> String {
    "UTC".to_string()
}

/// Credentials block (`"MySQL"` in the settings file).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StoreSettings {
    pub server: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Database selected by [`crate::Handler::open`].
    #[serde(default)]
    pub database: Option<String>,
}

/// `BasePath`, `BaseUrl` and `InitialExtensions` are parsed and carried for
/// the application layer (page rendering, module loading); nothing in this
/// crate reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Settings {
    /// Install directory of the site.
    #[serde(default)]
    pub base_path: String,
    /// Public root URL, prefixed to permalinks and media paths.
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_time_zone")]
    pub default_time_zone: String,
    /// Extension modules the application loads at start-up, in order.
    #[serde(default)]
    pub initial_extensions: Vec<String>,
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(rename = "MySQL")]
    pub store: StoreSettings,
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    /// Parses and validates a settings document.
    pub fn from_json(raw: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(raw)?;
        settings.utc_offset()?;
        Ok(settings)
    }

    /// `DefaultTimeZone` as a fixed offset: `UTC`, `Z` or `±HH:MM`.
    pub fn utc_offset(&self) -> Result<FixedOffset> {
        parse_offset(&self.default_time_zone)
    }

    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings::new(&self.store.server, &self.store.username, &self.store.password)
    }

    /// Installs the logger with `LogLevel` (default `warn`) unless `RUST_LOG` is set.
    pub fn init_logging(&self) -> bool {
        init_logging(self.log_level.as_deref().unwrap_or("warn"))
    }
}

pub fn parse_offset(zone: &str) -> Result<FixedOffset> {
    let zone = zone.trim();
    if zone.eq_ignore_ascii_case("utc") || zone == "Z" {
        return FixedOffset::east_opt(0).ok_or_else(|| JaxpError::config("invalid UTC offset"));
    }

    let caps = OFFSET
        .captures(zone)
        .ok_or_else(|| JaxpError::config(&format!("unsupported time zone '{}'", zone)))?;
    let hours: i32 = caps[2]
        .parse()
        .map_err(|_| JaxpError::config(&format!("bad hours in '{}'", zone)))?;
    let minutes: i32 = caps[3]
        .parse()
        .map_err(|_| JaxpError::config(&format!("bad minutes in '{}'", zone)))?;
    if hours > 14 || minutes > 59 {
        return Err(JaxpError::config(&format!("offset '{}' out of range", zone)));
    }

    let seconds = (hours * 3600 + minutes * 60) * if &caps[1] == "-" { -1 } else { 1 };
    FixedOffset::east_opt(seconds)
        .ok_or_else(|| JaxpError::config(&format!("offset '{}' out of range", zone)))
}

/// Installs `env_logger` once. `RUST_LOG` wins over `default_filter`.
/// Returns false when a logger was already installed.
pub fn init_logging(default_filter: &str) -> bool {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .try_init()
        .is_ok()
}
