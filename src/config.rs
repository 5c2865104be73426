//! Application configuration structure
use std::{env, net::SocketAddr};

use anyhow::{Context, Result};
use axum_extra::extract::cookie::Key;
use secrecy::SecretString;
use tracing::info;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: Option<SecretString>,
    pub max_connections: u32,
    pub jwt_secret: SecretString,
    pub cookie_secret: Key,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| {
                info!("BIND_ADDR not set, using default: {DEFAULT_BIND_ADDR}");
                DEFAULT_BIND_ADDR.to_string()
            })
            .parse::<SocketAddr>()
            .context("Invalid BIND_ADDR")?;
        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value
                .parse::<u32>()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .context("JWT_SECRET not found")?
            .into();

        Ok(Self {
            bind_addr,
            database_url: lookup("DATABASE_URL")
                .filter(|s| !s.is_empty())
                .map(Into::into),
            max_connections,
            jwt_secret,
            cookie_secret: Key::generate(),
        })
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR.parse().unwrap());
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert!(config.database_url.is_none());
        assert_eq!(config.jwt_secret.expose_secret(), "s3cret");
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("JWT_SECRET", "s3cret"),
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("DATABASE_URL", "postgres://localhost/study"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.max_connections, 12);
        assert_eq!(
            config.database_url.unwrap().expose_secret(),
            "postgres://localhost/study"
        );
    }

    #[test]
    fn test_missing_secret() {
        assert!(load(&[]).is_err());
        assert!(load(&[("JWT_SECRET", "")]).is_err());
        assert!(load(&[("JWT_SECRET", "x"), ("BIND_ADDR", "nowhere")]).is_err());
    }
}
