//! Datasource facade

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashSet;
use shardsource_core::{
    DataSourceDescriptor, DataSourceError, DatabaseDriver, PoolIdentity, Result, ShardingKey,
    ShardingKeyBuilder, mask_url_password,
};
use shardsource_drivers::DriverRegistry;

use crate::pool::ConnectionPool;
use crate::registry::PoolRegistry;
use crate::resolver::{ConnectionResolver, DataSourceConnection};

/// A configured datasource that hands out pooled or direct connections
///
/// The driver is resolved once at construction. Pools are shared through the
/// [`PoolRegistry`], so two datasources describing the same pool name reuse
/// the same pool.
pub struct DataSource {
    descriptor: Arc<DataSourceDescriptor>,
    driver: Arc<dyn DatabaseDriver>,
    registry: Arc<PoolRegistry>,
    /// Identities this datasource has resolved to
    identities: DashSet<PoolIdentity>,
}

impl DataSource {
    /// Create a datasource backed by the process-wide pool registry
    pub fn new(descriptor: DataSourceDescriptor, drivers: &DriverRegistry) -> Result<Self> {
        Self::with_registry(descriptor, drivers, PoolRegistry::global())
    }

    /// Create a datasource backed by a caller-supplied pool registry
    pub fn with_registry(
        descriptor: DataSourceDescriptor,
        drivers: &DriverRegistry,
        registry: Arc<PoolRegistry>,
    ) -> Result<Self> {
        let driver = drivers.get(descriptor.driver()).ok_or_else(|| {
            DataSourceError::Configuration(format!(
                "Unknown driver '{}' (registered: {})",
                descriptor.driver(),
                drivers.list().join(", ")
            ))
        })?;

        tracing::debug!(
            driver = %descriptor.driver(),
            pool = ?descriptor.pool_name(),
            sharding = descriptor.sharding_enabled(),
            "datasource configured"
        );

        Ok(Self {
            descriptor: Arc::new(descriptor),
            driver,
            registry,
            identities: DashSet::new(),
        })
    }

    /// Validate a property bag and build a datasource over the global registry
    pub fn from_properties(
        properties: HashMap<String, String>,
        drivers: &DriverRegistry,
    ) -> Result<Self> {
        Self::new(DataSourceDescriptor::from_properties(properties)?, drivers)
    }

    /// Start resolving a connection with per-call overrides
    pub fn connection_builder(&self) -> ConnectionResolver<'_> {
        ConnectionResolver::new(self)
    }

    /// Resolve a connection with the descriptor's defaults
    pub async fn get_connection(&self) -> Result<DataSourceConnection> {
        self.connection_builder().build().await
    }

    /// Start building a sharding key for this datasource
    pub fn sharding_key_builder(&self) -> Result<ShardingKeyBuilder> {
        if !self.descriptor.sharding_enabled() {
            return Err(DataSourceError::NotSupported(
                "Sharding is not enabled for this datasource (set useSharding=true)".into(),
            ));
        }
        Ok(ShardingKey::builder())
    }

    /// The registered pool a resolution with `sharding_key` would use, if it
    /// has already been created
    pub fn existing_pool(&self, sharding_key: Option<&ShardingKey>) -> Option<ConnectionPool> {
        let mut resolver = self.connection_builder();
        if let Some(key) = sharding_key {
            resolver = resolver.sharding_key(key.clone());
        }
        let identity = resolver.resolve_target().identity?;
        self.registry.get(&identity)
    }

    /// Pools this datasource has resolved to, keyed by identity
    pub fn pools(&self) -> Vec<(PoolIdentity, ConnectionPool)> {
        self.identities
            .iter()
            .filter_map(|entry| {
                let identity = entry.key();
                self.registry
                    .get(identity)
                    .map(|pool| (identity.clone(), pool))
            })
            .collect()
    }

    pub(crate) fn record_identity(&self, identity: &PoolIdentity) {
        self.identities.insert(identity.clone());
    }

    pub fn descriptor(&self) -> &DataSourceDescriptor {
        &self.descriptor
    }

    pub fn driver(&self) -> Arc<dyn DatabaseDriver> {
        self.driver.clone()
    }

    pub fn registry(&self) -> &Arc<PoolRegistry> {
        &self.registry
    }

    /// The URL template, before sharding key substitution
    pub fn url(&self) -> &str {
        self.descriptor.url_template()
    }

    pub fn pool_name(&self) -> Option<&str> {
        self.descriptor.pool_name()
    }

    pub fn properties(&self) -> &HashMap<String, String> {
        self.descriptor.properties()
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DataSource[driver={}, url={}, pool={}, sharding={}]",
            self.descriptor.driver(),
            mask_url_password(self.descriptor.url_template()),
            self.descriptor.pool_name().unwrap_or("<none>"),
            self.descriptor.sharding_enabled()
        )
    }
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSource")
            .field("driver", &self.descriptor.driver())
            .field("url", &mask_url_password(self.descriptor.url_template()))
            .field("pool", &self.descriptor.pool_name())
            .field("sharding", &self.descriptor.sharding_enabled())
            .finish()
    }
}
