//! Configuration file loading and translation to `petlibro_core::HubConfig`.
//!
//! Layering, lowest to highest: built-in defaults, `config.toml`, `PETLIBRO_*`
//! environment variables, then command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use petlibro_core::{HubConfig, Region};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Contents of `config.toml`.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub email: Option<String>,

    /// Plaintext password. Prefer `PETLIBRO_PASSWORD`.
    pub password: Option<String>,

    /// Session token from an earlier login.
    pub token: Option<String>,

    #[serde(default = "default_region")]
    pub region: String,

    /// Overrides the region's API host.
    pub base_url: Option<String>,

    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Request timeout, seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Poll interval, seconds.
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// Portions per manual feed.
    #[serde(default = "default_portions")]
    pub portions: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            email: None,
            password: None,
            token: None,
            region: default_region(),
            base_url: None,
            timezone: default_timezone(),
            timeout: default_timeout(),
            interval: default_interval(),
            portions: default_portions(),
        }
    }
}

fn default_region() -> String {
    Region::default().to_string()
}
fn default_timezone() -> String {
    "UTC".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_interval() -> u64 {
    petlibro_core::DEFAULT_POLL_INTERVAL.as_secs()
}
fn default_portions() -> u32 {
    1
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "petlibro", "petlibro").map_or_else(
        || PathBuf::from(".petlibro").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Environment keys clap already reads as plain strings. Figment would type
/// them, so an all-digit password would fail to extract.
const CLAP_ENV_KEYS: &[&str] = &["config", "email", "password", "token"];

/// Load the layered config. A missing file is not an error.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PETLIBRO_").ignore(CLAP_ENV_KEYS))
        .extract()?;
    Ok(config)
}

// ── Translation ─────────────────────────────────────────────────────

/// Apply CLI overrides to `cfg` and build the hub's runtime config.
pub fn resolve(cfg: Config, global: &GlobalOpts, path: &Path) -> Result<HubConfig, CliError> {
    let email = global.email.clone().or(cfg.email);
    let password = global.password.clone().or(cfg.password);
    let token = global.token.clone().or(cfg.token);

    let (email, password) = match (email, password) {
        (Some(email), Some(password)) => (email, password),
        (Some(email), None) if token.is_some() => (email, String::new()),
        _ => {
            return Err(CliError::NoCredentials {
                path: path.display().to_string(),
            });
        }
    };

    let region_str = global.region.clone().unwrap_or(cfg.region);
    let region: Region = region_str.parse().map_err(|_| CliError::Validation {
        field: "region".into(),
        reason: format!("unknown region '{region_str}'"),
    })?;

    let base_url = cfg
        .base_url
        .map(|raw| {
            Url::parse(&raw).map_err(|e| CliError::Validation {
                field: "base_url".into(),
                reason: format!("{e}: {raw}"),
            })
        })
        .transpose()?;

    Ok(HubConfig {
        email,
        password: SecretString::from(password),
        token: token.map(SecretString::from),
        region,
        base_url,
        time_zone: global.timezone.clone().unwrap_or(cfg.timezone),
        timeout: Duration::from_secs(global.timeout.unwrap_or(cfg.timeout)),
        poll_interval: Duration::from_secs(global.interval.unwrap_or(cfg.interval)),
        manual_feed_portions: cfg.portions,
    })
}
