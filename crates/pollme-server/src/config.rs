use std::path::Path;

use anyhow::{Context, Result};
use pollme_core::AppConfig;
use serde::Deserialize;

pub const JWT_SECRET_ENV: &str = "POLLME_JWT_SECRET";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/pollme.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiry_seconds: u64,
    pub login_url: String,
    pub grant_add_poll_on_register: bool,
    pub secure_cookies: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let app = AppConfig::default();
        Self {
            jwt_secret: app.jwt_secret,
            jwt_expiry_seconds: app.jwt_expiry_seconds,
            login_url: app.login_url,
            grant_add_poll_on_register: app.grant_add_poll_on_register,
            secure_cookies: app.secure_cookies,
        }
    }
}

impl Config {
    /// Read `path`, or fall back to defaults when it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str::<Config>(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?
        } else {
            tracing::warn!("config file {} not found, using defaults", path.display());
            Config::default()
        };
        config.apply_env(std::env::var(JWT_SECRET_ENV).ok());
        Ok(config)
    }

    fn apply_env(&mut self, jwt_secret: Option<String>) {
        if let Some(secret) = jwt_secret.filter(|s| !s.trim().is_empty()) {
            self.auth.jwt_secret = secret;
        }
    }

    pub fn app_config(&self) -> Result<AppConfig> {
        if self.auth.jwt_secret.trim().is_empty() {
            anyhow::bail!(
                "auth.jwt_secret is empty; set it in the config file or via {JWT_SECRET_ENV}"
            );
        }
        Ok(AppConfig {
            jwt_secret: self.auth.jwt_secret.clone(),
            jwt_expiry_seconds: self.auth.jwt_expiry_seconds,
            login_url: self.auth.login_url.clone(),
            grant_add_poll_on_register: self.auth.grant_add_poll_on_register,
            secure_cookies: self.auth.secure_cookies,
        })
    }
}
