//! Gateway configuration
//!
//! Settings come from an optional TOML file (path in `POKEDEX_CONFIG`) and
//! are then overridden by individual `POKEDEX_*` environment variables.
//!
//! ```toml
//! listen_addr = "0.0.0.0:4000"
//! downstream_url = "http://localhost:3002"
//! delete_confirmation = "fixed"
//! connect_timeout_ms = 2000
//! log_filter = "info,pokedex_gateway=debug"
//! cors = true
//! ```

use crate::error::{Error, Result};
use crate::orchestrator::DeleteConfirmation;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "POKEDEX_CONFIG";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// Address the HTTP/WebSocket listener binds to
    pub listen_addr: String,
    /// Base URL of the downstream Pokemon service
    pub downstream_url: String,
    pub delete_confirmation: DeleteConfirmation,
    /// TCP connect timeout towards the downstream service
    pub connect_timeout_ms: Option<u64>,
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    pub log_filter: String,
    pub cors: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:4000".to_string(),
            downstream_url: "http://localhost:3002".to_string(),
            delete_confirmation: DeleteConfirmation::Fixed,
            connect_timeout_ms: None,
            log_filter: "info".to_string(),
            cors: false,
        }
    }
}

impl GatewayConfig {
    /// Load from the file named by `POKEDEX_CONFIG` (if set), then apply
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let base = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(format!("invalid configuration: {e}")))
    }

    /// Apply `POKEDEX_*` overrides looked up through `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("POKEDEX_LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Some(url) = lookup("POKEDEX_DOWNSTREAM_URL") {
            self.downstream_url = url;
        }
        if let Some(mode) = lookup("POKEDEX_DELETE_CONFIRMATION") {
            self.delete_confirmation = mode.parse()?;
        }
        if let Some(ms) = lookup("POKEDEX_CONNECT_TIMEOUT_MS") {
            let ms = ms.trim().parse().map_err(|e| {
                Error::Config(format!("POKEDEX_CONNECT_TIMEOUT_MS must be an integer: {e}"))
            })?;
            self.connect_timeout_ms = Some(ms);
        }
        if let Some(filter) = lookup("POKEDEX_LOG") {
            self.log_filter = filter;
        }
        if let Some(cors) = lookup("POKEDEX_CORS") {
            self.cors = parse_bool(&cors).ok_or_else(|| {
                Error::Config(format!("POKEDEX_CORS must be a boolean, got {cors:?}"))
            })?;
        }
        Ok(self)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
