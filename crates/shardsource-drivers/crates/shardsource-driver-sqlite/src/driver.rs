//! SQLite driver implementation

use async_trait::async_trait;
use shardsource_core::{
    Connection, ConnectionConfig, DataSourceError, DatabaseDriver, Result, mask_url_password,
};
use std::sync::Arc;

use crate::SqliteConnection;

/// SQLite database driver
pub struct SqliteDriver;

impl SqliteDriver {
    /// Create a new SQLite driver instance
    pub fn new() -> Self {
        Self
    }
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the database location from a SQLite URL
///
/// Accepts `sqlite::memory:`, `sqlite:<path-or-uri>`, `sqlite://<path>` and
/// bare paths.
pub fn database_path(url: &str) -> Result<&str> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);

    if path.trim().is_empty() {
        return Err(DataSourceError::Configuration(format!(
            "SQLite url '{}' does not name a database. Example: sqlite::memory: or sqlite:/path/to/database.db",
            url
        )));
    }
    Ok(path)
}

#[async_trait]
impl DatabaseDriver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn display_name(&self) -> &'static str {
        "SQLite"
    }

    #[tracing::instrument(skip(self, config), fields(url = %mask_url_password(&config.url)))]
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
        let path = database_path(&config.url)?;

        if config.username.is_some() {
            tracing::debug!("SQLite ignores credentials");
        }

        let conn = SqliteConnection::open(path).map_err(|e| {
            tracing::error!(error = %e, "failed to connect to SQLite database");
            e
        })?;

        tracing::debug!(path = %path, "SQLite connection created");
        Ok(Arc::new(conn))
    }

    #[tracing::instrument(skip(self, config))]
    async fn test_connection(&self, config: &ConnectionConfig) -> Result<()> {
        tracing::debug!("testing SQLite connection");
        let conn = self.connect(config).await?;
        conn.query("SELECT 1", &[]).await?;
        conn.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_path_forms() {
        assert_eq!(database_path("sqlite::memory:").unwrap(), ":memory:");
        assert_eq!(database_path("sqlite:/tmp/a.db").unwrap(), "/tmp/a.db");
        assert_eq!(database_path("sqlite:///tmp/a.db").unwrap(), "/tmp/a.db");
        assert_eq!(
            database_path("sqlite:file:shard?mode=memory&cache=shared").unwrap(),
            "file:shard?mode=memory&cache=shared"
        );
        assert_eq!(database_path("/var/db/x.db").unwrap(), "/var/db/x.db");
    }

    #[test]
    fn test_database_path_rejects_empty() {
        assert!(matches!(
            database_path("sqlite:"),
            Err(DataSourceError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_in_memory() {
        let driver = SqliteDriver::new();
        let config = ConnectionConfig::new("sqlite", "sqlite::memory:");
        let conn = driver.connect(&config).await.expect("connect");
        assert_eq!(conn.driver_name(), "sqlite");

        driver.test_connection(&config).await.expect("test connection");
    }
}
