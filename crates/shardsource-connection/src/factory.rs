//! Pool connection factory backed by a database driver

use std::sync::Arc;

use async_trait::async_trait;
use shardsource_core::{Connection, ConnectionConfig, DatabaseDriver, Result};

use crate::pool::ConnectionFactory;

/// Opens pool connections through a driver with a fixed configuration
pub struct DriverConnectionFactory {
    driver: Arc<dyn DatabaseDriver>,
    config: ConnectionConfig,
}

impl DriverConnectionFactory {
    pub fn new(driver: Arc<dyn DatabaseDriver>, config: ConnectionConfig) -> Self {
        Self { driver, config }
    }
}

#[async_trait]
impl ConnectionFactory for DriverConnectionFactory {
    async fn create(&self) -> Result<Arc<dyn Connection>> {
        self.driver.connect(&self.config).await
    }
}
