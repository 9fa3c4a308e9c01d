use std::{env, fmt::Display, fs::read_to_string, str::FromStr, time::Duration};

use thiserror::Error;
use tracing::{info, warn};

/// Keys that may come from a Docker secret file.
const SECRET_KEYS: &[&str] = &["REDIS_URL"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value: {reason}")]
    Invalid { key: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{other}', expected redis or memory")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub backend: StoreBackend,
    pub redis_url: String,
    pub redis_timeout: Duration,
    pub redis_retries: usize,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| layered(key, read_secret, |key| env::var(key).ok()))
    }

    /// Builds a config from any key lookup, falling back to defaults for missing keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            port: try_load(&lookup, "RUST_PORT", "8080")?,
            backend: try_load(&lookup, "STORE_BACKEND", "redis")?,
            redis_url: try_load(&lookup, "REDIS_URL", "redis://127.0.0.1:6379")?,
            redis_timeout: Duration::from_millis(try_load(&lookup, "REDIS_TIMEOUT_MS", "100")?),
            redis_retries: try_load(&lookup, "REDIS_RETRIES", "1")?,
        })
    }
}

fn try_load<F, T>(lookup: &F, key: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    lookup(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key: key.to_string(),
                reason: e.to_string(),
            }
        })
}

fn layered<S, E>(key: &str, secret: S, env: E) -> Option<String>
where
    S: Fn(&str) -> Option<String>,
    E: Fn(&str) -> Option<String>,
{
    let from_secret = SECRET_KEYS.contains(&key).then(|| secret(key)).flatten();
    if from_secret.is_some() {
        return from_secret;
    }

    let value = env(key);
    if value.is_none() {
        warn!("Environment variable {key} not found, using default");
    }

    value
}

// Secrets take precedence over plain environment variables.
fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path).ok().map(|s| s.trim().to_string())
}
