//! Process configuration, read once at startup and passed down explicitly.

pub mod rewrite;
pub mod server;
pub mod slack;

use anyhow::{Context, Result};

pub use rewrite::RewriteConfig;
pub use server::ServerConfig;
pub use slack::SlackConfig;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub slack: SlackConfig,
    pub rewrite: RewriteConfig,
}

impl AppConfig {
    /// Any error here is fatal: the service refuses to start half-configured.
    pub fn load() -> Result<Self> {
        Ok(Self {
            server: ServerConfig::load_default().context("server config")?,
            slack: SlackConfig::from_env().context("slack config")?,
            rewrite: RewriteConfig::load_default().context("rewrite config")?,
        })
    }
}
