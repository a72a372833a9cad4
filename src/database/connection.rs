// Database Connection Management
//
// Handles PostgreSQL connection pooling using tokio-postgres and deadpool.
use anyhow::{Context, Result};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use std::str::FromStr;
use std::time::Duration;

use crate::config::DatabaseSettings;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub pg: tokio_postgres::Config,
    pub max_size: usize,
    pub timeouts: deadpool_postgres::Timeouts,
}

impl DatabaseConfig {
    /// Create configuration from a database URL
    pub fn from_url(url: &str, max_size: usize) -> Result<Self> {
        let parsed = url::Url::parse(url).context("Failed to parse database URL")?;
        if parsed.scheme() != "postgresql" && parsed.scheme() != "postgres" {
            anyhow::bail!("Invalid database URL scheme, expected postgresql or postgres");
        }

        let pg = tokio_postgres::Config::from_str(url).context("Failed to parse DATABASE_URL")?;

        Ok(Self {
            pg,
            max_size,
            timeouts: deadpool_postgres::Timeouts {
                wait: Some(Duration::from_secs(30)),
                create: Some(Duration::from_secs(30)),
                recycle: Some(Duration::from_secs(30)),
            },
        })
    }

    /// Create configuration from the application settings
    pub fn from_settings(settings: &DatabaseSettings) -> Result<Self> {
        Self::from_url(&settings.url, settings.max_connections)
    }

    /// `host:port/dbname`, safe to log
    pub fn masked(&self) -> String {
        let host = self
            .pg
            .get_hosts()
            .first()
            .map(|h| match h {
                tokio_postgres::config::Host::Tcp(s) => s.clone(),
                tokio_postgres::config::Host::Unix(s) => s.to_string_lossy().to_string(),
            })
            .unwrap_or_else(|| "localhost".to_string());
        let port = self.pg.get_ports().first().copied().unwrap_or(5432);
        let dbname = self.pg.get_dbname().unwrap_or_default();
        format!("{}:{}/{}", host, port, dbname)
    }
}

/// Database connection wrapper
#[derive(Debug, Clone)]
pub struct DatabaseConnection {
    pool: Pool,
}

impl DatabaseConnection {
    /// Create a new database connection with the provided configuration
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        tracing::info!("🔌 Connecting to database: {}", config.masked());

        // TLS is negotiated according to the URL's sslmode (prefer by default)
        let tls_connector = TlsConnector::builder()
            .build()
            .context("Failed to build TLS connector")?;
        let tls = MakeTlsConnector::new(tls_connector);

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = Manager::from_config(config.pg, tls, mgr_config);

        let pool = Pool::builder(mgr)
            .max_size(config.max_size)
            .wait_timeout(config.timeouts.wait)
            .create_timeout(config.timeouts.create)
            .recycle_timeout(config.timeouts.recycle)
            .runtime(deadpool_postgres::Runtime::Tokio1)
            .build()
            .context("Failed to create database pool")?;

        let connection = Self { pool };
        connection.health_check().await?;

        tracing::info!("✅ Database connection established successfully");

        Ok(connection)
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<()> {
        crate::database::migrations::run_migrations(&self.pool).await
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<()> {
        let client = self
            .pool
            .get()
            .await
            .context("Failed to get connection for health check")?;

        client
            .query("SELECT 1", &[])
            .await
            .context("Database health check failed")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url_accepts_postgres_schemes() {
        let config = DatabaseConfig::from_url("postgres://admin:pw@db.internal:6543/catalog", 4).unwrap();
        assert_eq!(config.max_size, 4);
        assert_eq!(config.masked(), "db.internal:6543/catalog");
        assert_eq!(config.pg.get_user(), Some("admin"));

        assert!(DatabaseConfig::from_url("postgresql://localhost/catalog", 4).is_ok());
    }

    #[test]
    fn test_from_url_rejects_other_schemes() {
        assert!(DatabaseConfig::from_url("mysql://localhost/catalog", 4).is_err());
        assert!(DatabaseConfig::from_url("not a url", 4).is_err());
    }
}
