//! Service configuration, loaded from a TOML file when present.

use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Service configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServiceConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            bind: default_bind(),
        }
    }
}

impl ServiceConfig {
    /// Loads configuration from a TOML file. Callers typically fall back to
    /// defaults when the file does not exist:
    /// `ServiceConfig::load("shiftplan.toml").unwrap_or_default()`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}
