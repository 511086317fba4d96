use std::time::Duration;

use anyhow::{Context, Result, bail};

use fete_api::media::CloudinaryConfig;
use fete_db::{Backoff, DbConfig};

/// Secrets copied from sample `.env` files. Refuse to sign tokens with them.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "your-secret-key",
    "your_jwt_secret",
];

const DEFAULT_ORIGINS: &str = "http://localhost:3000,http://localhost:3001";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub database: DbConfig,
    pub jwt_secret: String,
    pub allowed_origins: Vec<String>,
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
    pub trust_proxy: bool,
    pub admin_email: String,
    /// The admin is only seeded when this is set.
    pub admin_password: Option<String>,
    /// `None` unless all three Cloudinary credentials are present.
    pub cloudinary: Option<CloudinaryConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let environment = match var("FETE_ENV").as_deref() {
            None | Some("development") => Environment::Development,
            Some("production") => Environment::Production,
            Some(other) => bail!("FETE_ENV must be development or production, got {other:?}"),
        };

        let database_url = var("DATABASE_URL").context("DATABASE_URL is not set")?;

        let jwt_secret = var("FETE_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("FETE_JWT_SECRET is unset or still a placeholder");
        }

        let connect_attempts: u32 = parse_or(&var, "FETE_DB_CONNECT_ATTEMPTS", 5)?;
        if connect_attempts == 0 {
            bail!("FETE_DB_CONNECT_ATTEMPTS must be at least 1");
        }

        let cloudinary = match (
            var("CLOUDINARY_CLOUD_NAME"),
            var("CLOUDINARY_API_KEY"),
            var("CLOUDINARY_API_SECRET"),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret,
                folder: var("CLOUDINARY_FOLDER").unwrap_or_else(|| "fete".to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            host: var("FETE_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&var, "FETE_PORT", 5000)?,
            environment,
            database: DbConfig {
                url: database_url,
                require_tls: environment == Environment::Production,
                startup_backoff: Backoff::default().with_max_attempts(connect_attempts),
            },
            jwt_secret,
            allowed_origins: var("FETE_ALLOWED_ORIGINS")
                .unwrap_or_else(|| DEFAULT_ORIGINS.to_string())
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect(),
            rate_limit_max: parse_or(&var, "FETE_RATE_LIMIT_MAX", 100)?,
            rate_limit_window: Duration::from_secs(parse_or(
                &var,
                "FETE_RATE_LIMIT_WINDOW_SECS",
                900,
            )?),
            trust_proxy: parse_or(&var, "FETE_TRUST_PROXY", false)?,
            admin_email: var("FETE_ADMIN_EMAIL").unwrap_or_else(|| "admin@fete.local".to_string()),
            admin_password: var("FETE_ADMIN_PASSWORD"),
            cloudinary,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{key} has invalid value {raw:?}: {e}")),
    }
}
