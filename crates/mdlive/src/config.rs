use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::diagram::Theme;
use crate::presenter::PresenterConfig;
use crate::runtime::RuntimeConfig;
use crate::session::SessionConfig;
use crate::sync::SyncConfig;
use crate::viewport::ViewportConfig;

const FILENAME: &str = "config.yaml";
const APP_DIR: &str = "mdlive";

pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:8080/ws";
pub const DEFAULT_HTTP_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_RECONNECT_MS: u64 = 1000;

pub const VALID_KEYS: &[&str] = &[
    "server.url",
    "server.http",
    "sync.debounce_ms",
    "sync.in_flight_ms",
    "sync.reconnect_ms",
    "viewport.min_scale",
    "viewport.max_scale",
    "viewport.step",
    "presenter.swipe_threshold",
    "presenter.theme",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncSection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<ViewportSection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presenter: Option<PresenterSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// WebSocket endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Base URL of the HTTP API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_flight_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconnect_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewportSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_scale: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_scale: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresenterSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swipe_threshold: Option<f64>,

    /// `light` or `dark`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join(FILENAME))
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::anyhow!("No config found. Run `mdlive config show` to see defaults.")
            } else {
                anyhow::anyhow!("Failed to read config: {e}")
            }
        })?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        let contents = format!("# mdlive configuration - https://github.com/mklab-se/mdlive\n{yaml}");
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn server_url(&self) -> &str {
        self.server
            .as_ref()
            .and_then(|s| s.url.as_deref())
            .unwrap_or(DEFAULT_SERVER_URL)
    }

    pub fn http_url(&self) -> &str {
        self.server
            .as_ref()
            .and_then(|s| s.http.as_deref())
            .unwrap_or(DEFAULT_HTTP_URL)
    }

    pub fn sync_config(&self) -> SyncConfig {
        let defaults = SyncConfig::default();
        let section = self.sync.clone().unwrap_or_default();
        SyncConfig {
            debounce: section
                .debounce_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.debounce),
            in_flight: section
                .in_flight_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.in_flight),
        }
    }

    pub fn viewport_config(&self) -> ViewportConfig {
        let defaults = ViewportConfig::default();
        let section = self.viewport.clone().unwrap_or_default();
        ViewportConfig {
            min_scale: section.min_scale.unwrap_or(defaults.min_scale),
            max_scale: section.max_scale.unwrap_or(defaults.max_scale),
            step: section.step.unwrap_or(defaults.step),
            ..defaults
        }
    }

    pub fn theme(&self) -> Theme {
        self.presenter
            .as_ref()
            .and_then(|p| p.theme)
            .unwrap_or_default()
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.presenter
            .get_or_insert_with(PresenterSection::default)
            .theme = Some(theme);
    }

    pub fn session_config(&self) -> SessionConfig {
        let swipe_threshold = self
            .presenter
            .as_ref()
            .and_then(|p| p.swipe_threshold)
            .unwrap_or(PresenterConfig::default().swipe_threshold);
        SessionConfig {
            sync: self.sync_config(),
            presenter: PresenterConfig {
                swipe_threshold,
                viewport: self.viewport_config(),
                theme: self.theme(),
            },
        }
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        let reconnect_ms = self
            .sync
            .as_ref()
            .and_then(|s| s.reconnect_ms)
            .unwrap_or(DEFAULT_RECONNECT_MS);
        RuntimeConfig {
            reconnect: Duration::from_millis(reconnect_ms),
            ..Default::default()
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "server.url" => {
                if !(value.starts_with("ws://") || value.starts_with("wss://")) {
                    anyhow::bail!("Invalid server.url: {value}. Must start with ws:// or wss://.");
                }
                self.server.get_or_insert_with(ServerConfig::default).url = Some(value.to_string());
            }
            "server.http" => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    anyhow::bail!(
                        "Invalid server.http: {value}. Must start with http:// or https://."
                    );
                }
                self.server.get_or_insert_with(ServerConfig::default).http =
                    Some(value.to_string());
            }
            "sync.debounce_ms" | "sync.in_flight_ms" | "sync.reconnect_ms" => {
                let ms = parse_millis(key, value)?;
                let sync = self.sync.get_or_insert_with(SyncSection::default);
                match key {
                    "sync.debounce_ms" => sync.debounce_ms = Some(ms),
                    "sync.in_flight_ms" => sync.in_flight_ms = Some(ms),
                    _ => sync.reconnect_ms = Some(ms),
                }
            }
            "viewport.min_scale" | "viewport.max_scale" => {
                let scale = parse_positive(key, value)?;
                let current = self.viewport_config();
                let (min, max) = if key == "viewport.min_scale" {
                    (scale, current.max_scale)
                } else {
                    (current.min_scale, scale)
                };
                if min >= max {
                    anyhow::bail!(
                        "Invalid {key}: {value}. viewport.min_scale must be below viewport.max_scale."
                    );
                }
                let viewport = self.viewport.get_or_insert_with(ViewportSection::default);
                if key == "viewport.min_scale" {
                    viewport.min_scale = Some(scale);
                } else {
                    viewport.max_scale = Some(scale);
                }
            }
            "viewport.step" => {
                let step = parse_positive(key, value)?;
                if step <= 1.0 {
                    anyhow::bail!("Invalid viewport.step: {value}. Must be greater than 1.");
                }
                self.viewport
                    .get_or_insert_with(ViewportSection::default)
                    .step = Some(step);
            }
            "presenter.swipe_threshold" => {
                let threshold = parse_positive(key, value)?;
                self.presenter
                    .get_or_insert_with(PresenterSection::default)
                    .swipe_threshold = Some(threshold);
            }
            "presenter.theme" => {
                let theme = value.parse::<Theme>().map_err(|_| {
                    anyhow::anyhow!("Invalid presenter.theme: {value}. Must be light or dark.")
                })?;
                self.set_theme(theme);
            }
            _ => anyhow::bail!("Unknown config key: {key}. Valid keys: {}", VALID_KEYS.join(", ")),
        }
        Ok(())
    }
}

fn parse_millis(key: &str, value: &str) -> Result<u64> {
    value
        .parse::<u64>()
        .map_err(|_| anyhow::anyhow!("Invalid {key}: {value}. Must be a whole number of milliseconds."))
}

fn parse_positive(key: &str, value: &str) -> Result<f64> {
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() && n > 0.0 => Ok(n),
        _ => anyhow::bail!("Invalid {key}: {value}. Must be a positive number."),
    }
}
