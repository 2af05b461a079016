//! Database driver trait definition

use crate::{Connection, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Core driver trait that all database drivers must implement
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Identifier used in datasource configuration (e.g., "sqlite")
    fn name(&self) -> &'static str;

    /// Human-readable name for diagnostics
    fn display_name(&self) -> &'static str {
        self.name()
    }

    /// Open a new, unpooled connection
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>>;

    /// Open a connection and run a trivial round trip
    async fn test_connection(&self, config: &ConnectionConfig) -> Result<()>;
}

/// Everything a driver needs to open one connection
#[derive(Debug, Clone, Default)]
pub struct ConnectionConfig {
    /// Driver identifier (e.g., "sqlite")
    pub driver: String,
    /// Fully resolved connection URL
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Additional driver/pool properties, passed through verbatim
    pub params: HashMap<String, String>,
}

impl ConnectionConfig {
    /// Create a configuration for the given driver and URL
    pub fn new(driver: &str, url: &str) -> Self {
        Self {
            driver: driver.to_string(),
            url: url.to_string(),
            ..Default::default()
        }
    }
}
