//! Application configuration — loading, defaults, and env overrides.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{
    APP_NAME, CACHE_MANIFEST, CACHE_NAME, DEFAULT_ORIGIN, DEFAULT_TOAST_TTL_MS,
    REPLY_DELAY_MAX_MS, REPLY_DELAY_MIN_MS, SEND_DELAY_MS, TOAST_LIMIT,
};
use crate::router::RouterConfig;
use crate::util::{env_first, normalize_url};

/// Tunables for a chat session.  Every field has a default, so a config
/// file only needs the keys it wants to change.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub username: Option<String>,
    pub origin: String,
    pub cache_name: String,
    pub cache_manifest: Vec<String>,
    pub toast_limit: usize,
    pub toast_ttl_ms: u64,
    pub reply_delay_min_ms: u64,
    pub reply_delay_max_ms: u64,
    pub send_delay_ms: u64,
    pub send_retries: u32,
    pub fail_sends: bool,
    pub rng_seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            username: None,
            origin: DEFAULT_ORIGIN.to_string(),
            cache_name: CACHE_NAME.to_string(),
            cache_manifest: CACHE_MANIFEST.iter().map(|s| s.to_string()).collect(),
            toast_limit: TOAST_LIMIT,
            toast_ttl_ms: DEFAULT_TOAST_TTL_MS,
            reply_delay_min_ms: REPLY_DELAY_MIN_MS,
            reply_delay_max_ms: REPLY_DELAY_MAX_MS,
            send_delay_ms: SEND_DELAY_MS,
            send_retries: 0,
            fail_sends: false,
            rng_seed: None,
        }
    }
}

/// Where the configuration was loaded from.
#[derive(Clone, Debug)]
pub enum ConfigSource {
    Embedded,
    File(PathBuf),
}

impl ConfigSource {
    pub fn label(&self) -> String {
        match self {
            ConfigSource::Embedded => "embedded defaults".to_string(),
            ConfigSource::File(path) => path.display().to_string(),
        }
    }
}

impl AppConfig {
    /// Load from `$CHATPULSE_CONFIG`, `./chatpulse.json`, the platform config
    /// dir, or the embedded defaults (first hit wins), then apply env
    /// overrides.
    pub fn load() -> Result<(Self, ConfigSource)> {
        let (mut config, source) = Self::locate()?;
        config.apply_env();
        Ok((config, source))
    }

    fn locate() -> Result<(Self, ConfigSource)> {
        if let Ok(path) = env::var("CHATPULSE_CONFIG") {
            let path = PathBuf::from(path);
            return Ok((Self::load_from_path(&path)?, ConfigSource::File(path)));
        }

        let cwd_path = PathBuf::from("chatpulse.json");
        if cwd_path.exists() {
            return Ok((Self::load_from_path(&cwd_path)?, ConfigSource::File(cwd_path)));
        }

        if let Some(config_path) = config_dir_file("chatpulse.json") {
            if config_path.exists() {
                return Ok((
                    Self::load_from_path(&config_path)?,
                    ConfigSource::File(config_path),
                ));
            }
        }

        let embedded: AppConfig = serde_json::from_str(include_str!("../chatpulse.json"))
            .context("parse embedded chatpulse.json")?;
        Ok((embedded, ConfigSource::Embedded))
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read config from {}", path.display()))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("parse config from {}", path.display()))?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Some(user) = env_first(&["CHATPULSE_USER"]) {
            self.username = Some(user.trim().to_string());
        }
        if let Some(origin) = env_first(&["CHATPULSE_ORIGIN"]) {
            self.origin = origin;
        }
    }

    /// The origin resource keys are resolved against.
    pub fn origin_url(&self) -> Result<Url> {
        let raw = normalize_url(self.origin.trim());
        Url::parse(&raw).with_context(|| format!("parse origin `{raw}`"))
    }

    pub fn toast_ttl(&self) -> Duration {
        Duration::from_millis(self.toast_ttl_ms)
    }

    pub fn send_delay(&self) -> Duration {
        Duration::from_millis(self.send_delay_ms)
    }

    pub fn router_config(&self) -> RouterConfig {
        RouterConfig {
            reply_delay_min: Duration::from_millis(self.reply_delay_min_ms),
            reply_delay_max: Duration::from_millis(self.reply_delay_max_ms),
            send_retries: self.send_retries,
        }
    }
}

fn config_dir_file(filename: &str) -> Option<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", APP_NAME, APP_NAME)?;
    Some(proj_dirs.config_dir().join(filename))
}
