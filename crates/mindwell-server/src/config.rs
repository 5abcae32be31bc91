//! Server configuration loaded from `MINDWELL_*` environment variables.
//!
//! Secrets may also be provided as Docker/compose secret files under
//! `/run/secrets/<NAME>`.

use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use mindwell_auth::{AuthConfig, MAX_SESSION_LIFETIME_SECS};
use mindwell_db::DbConfig;
use thiserror::Error;
use tracing::{info, warn};

const SECRETS_DIR: &str = "/run/secrets";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub db: DbConfig,
    pub auth: AuthConfig,
    /// Mark the session cookie `Secure` (disable only for plain-HTTP dev).
    pub secure_cookies: bool,
    /// Origin allowed to read `/api/submissions`. `None` allows any.
    pub allowed_origin: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let db_defaults = DbConfig::default();
        let auth_defaults = AuthConfig::default();

        let db = DbConfig {
            url: try_load("MINDWELL_DB_URL", db_defaults.url)?,
            namespace: try_load("MINDWELL_DB_NAMESPACE", db_defaults.namespace)?,
            database: try_load("MINDWELL_DB_DATABASE", db_defaults.database)?,
            username: var("MINDWELL_DB_USERNAME"),
            password: optional_secret("MINDWELL_DB_PASSWORD"),
        };

        let auth = AuthConfig {
            session_secret: read_secret("MINDWELL_SESSION_SECRET")?,
            session_lifetime_secs: session_ttl(try_load(
                "MINDWELL_SESSION_TTL_SECS",
                auth_defaults.session_lifetime_secs,
            )?)?,
            pepper: optional_secret("MINDWELL_PASSWORD_PEPPER"),
            resend_cooldown_secs: try_load(
                "MINDWELL_RESEND_COOLDOWN_SECS",
                auth_defaults.resend_cooldown_secs,
            )?,
            ..auth_defaults
        };

        Ok(Self {
            port: try_load("MINDWELL_PORT", 3000)?,
            db,
            auth,
            secure_cookies: try_load("MINDWELL_SECURE_COOKIES", true)?,
            allowed_origin: var("MINDWELL_ALLOWED_ORIGIN"),
        })
    }
}

/// Session lifetimes must fit a signed timestamp and a cookie `Max-Age`.
fn session_ttl(secs: u64) -> Result<u64, ConfigError> {
    match i64::try_from(secs) {
        Ok(s) if (1..=MAX_SESSION_LIFETIME_SECS).contains(&s) => Ok(secs),
        _ => Err(ConfigError::Invalid {
            key: "MINDWELL_SESSION_TTL_SECS",
            message: format!("must be between 1 and {MAX_SESSION_LIFETIME_SECS} seconds"),
        }),
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match var(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key,
                message: e.to_string(),
            }
        }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

/// Secret from the environment, falling back to `/run/secrets/<key>`.
fn optional_secret(key: &'static str) -> Option<String> {
    var(key).or_else(|| {
        read_to_string(format!("{SECRETS_DIR}/{key}"))
            .map(|s| s.trim().to_string())
            .ok()
            .filter(|s| !s.is_empty())
    })
}

fn read_secret(key: &'static str) -> Result<String, ConfigError> {
    optional_secret(key).ok_or_else(|| {
        warn!("Failed to read {key} from environment or {SECRETS_DIR}");
        ConfigError::Missing(key)
    })
}
