//! Runtime configuration, read from environment variables.

use chrono::Duration;
use thiserror::Error;

const DEV_JWT_SECRET: &str = "dev-jwt-secret-not-for-production";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Listen address for the HTTP server.
    pub bind_addr: String,
    /// Postgres connection URL. `None` runs against the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    /// Insert the demo catalog at startup.
    pub seed_catalog: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            database_url: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            access_token_ttl: Duration::minutes(60),
            refresh_token_ttl: Duration::minutes(24 * 60),
            seed_catalog: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; unset and empty values take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let jwt_secret = match var("JWT_SECRET") {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set, using development secret");
                defaults.jwt_secret
            }
        };

        Ok(Self {
            bind_addr: var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            database_url: var("DATABASE_URL"),
            jwt_secret,
            access_token_ttl: minutes("ACCESS_TOKEN_TTL_MINUTES", var("ACCESS_TOKEN_TTL_MINUTES"))?
                .unwrap_or(defaults.access_token_ttl),
            refresh_token_ttl: minutes("REFRESH_TOKEN_TTL_MINUTES", var("REFRESH_TOKEN_TTL_MINUTES"))?
                .unwrap_or(defaults.refresh_token_ttl),
            seed_catalog: flag("SEED_CATALOG", var("SEED_CATALOG"))?,
        })
    }
}

fn minutes(name: &'static str, value: Option<String>) -> Result<Option<Duration>, ConfigError> {
    let Some(value) = value else {
        return Ok(None);
    };
    match value.trim().parse::<i64>() {
        Ok(m) if m > 0 => Ok(Some(Duration::minutes(m))),
        _ => Err(ConfigError::Invalid {
            name,
            value,
            reason: "expected a positive number of minutes",
        }),
    }
}

fn flag(name: &'static str, value: Option<String>) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value,
            reason: "expected true or false",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(load(&[]).unwrap(), AppConfig::default());
    }

    #[test]
    fn reads_all_variables() {
        let cfg = load(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("DATABASE_URL", "postgres://localhost/storefront"),
            ("JWT_SECRET", "s3cret"),
            ("ACCESS_TOKEN_TTL_MINUTES", "5"),
            ("REFRESH_TOKEN_TTL_MINUTES", "120"),
            ("SEED_CATALOG", "true"),
        ])
        .unwrap();

        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/storefront"));
        assert_eq!(cfg.jwt_secret, "s3cret");
        assert_eq!(cfg.access_token_ttl, Duration::minutes(5));
        assert_eq!(cfg.refresh_token_ttl, Duration::minutes(120));
        assert!(cfg.seed_catalog);
    }

    #[test]
    fn blank_database_url_means_in_memory() {
        assert_eq!(load(&[("DATABASE_URL", "  ")]).unwrap().database_url, None);
    }

    #[test]
    fn rejects_bad_numbers_and_flags() {
        assert!(load(&[("ACCESS_TOKEN_TTL_MINUTES", "0")]).is_err());
        assert!(load(&[("REFRESH_TOKEN_TTL_MINUTES", "soon")]).is_err());
        assert!(load(&[("SEED_CATALOG", "maybe")]).is_err());
    }
}
