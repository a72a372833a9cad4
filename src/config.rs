//! Configuration module for environment variables and application settings

use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use jsonwebtoken::Algorithm;

const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:5173", "http://127.0.0.1:5173"];

/// Application configuration, loaded once at startup and passed down by value.
#[derive(Debug, Clone)]
pub struct Config {
    /// The single administrator identity
    pub admin: AdminConfig,

    /// Token signing settings
    pub auth: AuthConfig,

    /// Storage backend selection
    pub database: DatabaseSettings,

    /// Server configuration
    pub server: ServerConfig,

    /// Allowed browser origins
    pub cors: CorsConfig,
}

#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret_key: String,
    pub algorithm: Algorithm,
    pub access_token_expire_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: usize,
}

impl DatabaseSettings {
    /// `memory://` selects the in-process store instead of PostgreSQL.
    pub fn is_memory(&self) -> bool {
        self.url.starts_with("memory://")
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow!("{key} environment variable is required"))
        };

        let algorithm = parse_algorithm(&lookup("ALGORITHM").unwrap_or_else(|| "HS256".to_string()))?;

        let access_token_expire_minutes: i64 = lookup("ACCESS_TOKEN_EXPIRE_MINUTES")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .context("ACCESS_TOKEN_EXPIRE_MINUTES must be an integer")?;
        if access_token_expire_minutes <= 0 {
            bail!("ACCESS_TOKEN_EXPIRE_MINUTES must be positive");
        }

        let port = match lookup("SERVER_PORT").or_else(|| lookup("PORT")) {
            Some(p) => p.parse().context("SERVER_PORT must be a valid port number")?,
            None => 8000,
        };

        let allowed_origins = match lookup("CORS_ALLOWED_ORIGINS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        Ok(Self {
            admin: AdminConfig {
                email: required("ADMIN_EMAIL")?,
                password: required("ADMIN_PASSWORD")?,
            },

            auth: AuthConfig {
                secret_key: required("SECRET_KEY")?,
                algorithm,
                access_token_expire_minutes,
            },

            database: DatabaseSettings {
                url: required("DATABASE_URL")?,
                max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                    .map(|v| v.parse().context("DATABASE_MAX_CONNECTIONS must be an integer"))
                    .transpose()?
                    .unwrap_or(16),
            },

            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port,
            },

            cors: CorsConfig { allowed_origins },
        })
    }
}

/// Only the HMAC family works with a shared symmetric secret.
fn parse_algorithm(name: &str) -> Result<Algorithm> {
    let algorithm = Algorithm::from_str(name.trim())
        .map_err(|_| anyhow!("Unknown signing algorithm: {name}"))?;
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        other => bail!("Signing algorithm {other:?} requires a key pair, expected HS256, HS384 or HS512"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const BASE: &[(&str, &str)] = &[
        ("ADMIN_EMAIL", "admin@x.com"),
        ("ADMIN_PASSWORD", "secret"),
        ("SECRET_KEY", "signing-key"),
        ("DATABASE_URL", "memory://"),
    ];

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup_from(BASE)).unwrap();
        assert_eq!(config.admin.email, "admin@x.com");
        assert_eq!(config.auth.algorithm, Algorithm::HS256);
        assert_eq!(config.auth.access_token_expire_minutes, 30);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.database.max_connections, 16);
        assert!(config.database.is_memory());
        assert_eq!(config.cors.allowed_origins.len(), 2);
    }

    #[test]
    fn test_missing_secret_is_an_error() {
        let pairs: Vec<_> = BASE.iter().copied().filter(|(k, _)| *k != "SECRET_KEY").collect();
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(err.to_string().contains("SECRET_KEY"));
    }

    #[test]
    fn test_overrides() {
        let mut pairs = BASE.to_vec();
        pairs.extend([
            ("ALGORITHM", "HS512"),
            ("ACCESS_TOKEN_EXPIRE_MINUTES", "5"),
            ("PORT", "9000"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example,"),
        ]);
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.auth.algorithm, Algorithm::HS512);
        assert_eq!(config.auth.access_token_expire_minutes, 5);
        assert_eq!(config.server.port, 9000);
        assert_eq!(
            config.cors.allowed_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn test_rejects_asymmetric_algorithm_and_bad_ttl() {
        let mut pairs = BASE.to_vec();
        pairs.push(("ALGORITHM", "RS256"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());

        let mut pairs = BASE.to_vec();
        pairs.push(("ACCESS_TOKEN_EXPIRE_MINUTES", "0"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }
}
