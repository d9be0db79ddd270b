// src/config/rewrite.rs
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

pub const ENV_REWRITE_CONFIG_PATH: &str = "REWRITE_CONFIG_PATH";
pub const DEFAULT_REWRITE_CONFIG_PATH: &str = "config/rewrite.json";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_temperature() -> f32 {
    1.0
}
fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_timeout_secs() -> u64 {
    15
}

#[derive(Clone, Serialize, Deserialize)]
pub struct RewriteConfig {
    pub enabled: bool,
    /// Only "openai" is supported (case-insensitive).
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature, clamped to 0.0–2.0.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// "ENV" means: read from OPENAI_API_KEY
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for RewriteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewriteConfig")
            .field("enabled", &self.enabled)
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("key_len", &self.api_key.len())
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_provider(),
            model: default_model(),
            temperature: default_temperature(),
            api_key: String::new(),
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RewriteConfig {
    /// `$REWRITE_CONFIG_PATH`, then `config/rewrite.json`; without a file the rewriter
    /// is on exactly when `OPENAI_API_KEY` is set.
    pub fn load_default() -> anyhow::Result<Self> {
        let env_key = std::env::var(ENV_OPENAI_API_KEY).ok();
        if let Ok(p) = std::env::var(ENV_REWRITE_CONFIG_PATH) {
            return Self::load_from_file(&p, env_key);
        }
        let path = Path::new(DEFAULT_REWRITE_CONFIG_PATH);
        if path.exists() {
            return Self::load_from_file(path, env_key);
        }
        Ok(Self::from_env_key(env_key))
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P, env_key: Option<String>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading rewrite config from {}", path.display()))?;
        Self::from_json_str(&data, env_key)
    }

    pub fn from_json_str(data: &str, env_key: Option<String>) -> anyhow::Result<Self> {
        let mut cfg: RewriteConfig = serde_json::from_str(data).context("parsing rewrite config")?;

        cfg.provider = cfg.provider.to_lowercase();
        if cfg.provider != "openai" {
            bail!("Unsupported provider in config: {}", cfg.provider);
        }

        if cfg.api_key.trim().eq_ignore_ascii_case("env") {
            cfg.api_key = match env_key {
                Some(k) if !k.trim().is_empty() => k,
                _ if cfg.enabled => bail!("Missing {ENV_OPENAI_API_KEY} env var"),
                _ => String::new(),
            };
        }

        cfg.temperature = if cfg.temperature.is_finite() {
            cfg.temperature.clamp(0.0, 2.0)
        } else {
            default_temperature()
        };

        Ok(cfg)
    }

    fn from_env_key(env_key: Option<String>) -> Self {
        match env_key.filter(|k| !k.trim().is_empty()) {
            Some(api_key) => Self {
                enabled: true,
                api_key,
                ..Self::default()
            },
            None => Self::default(),
        }
    }
}
