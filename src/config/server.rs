// src/config/server.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::slack::client::DEFAULT_SLACK_API_BASE;

pub const ENV_SERVER_CONFIG_PATH: &str = "SERVER_CONFIG_PATH";
pub const DEFAULT_SERVER_CONFIG_PATH: &str = "config/server.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub slack_api_base: String,
    /// Per-call timeout for Slack Web API requests.
    pub http_timeout_secs: u64,
    /// Reject signed requests older than this; 0 disables the replay guard.
    pub max_request_age_secs: u64,
    pub metrics_enabled: bool,
    /// How long shutdown waits for acknowledged commands to finish posting.
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
            slack_api_base: DEFAULT_SLACK_API_BASE.to_string(),
            http_timeout_secs: 10,
            max_request_age_secs: 300,
            metrics_enabled: true,
            shutdown_grace_secs: 10,
        }
    }
}

impl ServerConfig {
    /// 1) $SERVER_CONFIG_PATH (must exist)
    /// 2) config/server.toml
    /// 3) built-in defaults
    /// `PORT` overrides the port in every case.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_SERVER_CONFIG_PATH) {
            Self::load_from(&PathBuf::from(p))?
        } else {
            let p = Path::new(DEFAULT_SERVER_CONFIG_PATH);
            if p.exists() {
                Self::load_from(p)?
            } else {
                Self::default()
            }
        };
        if let Ok(port) = std::env::var("PORT") {
            cfg.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT is not a valid port: {port}"))?;
        }
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading server config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing server config")
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
