//! Connection resolution
//!
//! A [`ConnectionResolver`] collects per-call overrides (credentials and a
//! sharding key) and turns a datasource into a live connection:
//!
//! 1. resolve the URL template against the sharding key
//! 2. pick the pool identity: the configured pool name, or the sharding key
//!    when it changed the URL and pooling is configured
//! 3. without an identity, open a direct connection through the driver
//! 4. otherwise get-or-create the pool in the registry and borrow from it

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use shardsource_core::{
    Connection, ConnectionConfig, DataSourceError, PoolIdentity, Result, ShardingKey,
    mask_url_password, resolve_url,
};

use crate::datasource::DataSource;
use crate::factory::DriverConnectionFactory;
use crate::pool::{ConnectionPool, PoolConfig, PooledConnection};

/// Where and how a resolution will connect, before any I/O happens
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub url: String,
    /// `None` when the datasource is unpooled
    pub identity: Option<PoolIdentity>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for ResolvedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedTarget")
            .field("url", &mask_url_password(&self.url))
            .field("identity", &self.identity)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Single-use builder resolving one connection from a [`DataSource`]
///
/// Setters ignore empty arguments, so a later empty write never erases an
/// earlier value. `build` consumes the resolver.
#[must_use = "a resolver does nothing until `build` is awaited"]
pub struct ConnectionResolver<'a> {
    datasource: &'a DataSource,
    username: Option<String>,
    password: Option<String>,
    sharding_key: Option<ShardingKey>,
    super_sharding_key: Option<ShardingKey>,
}

impl<'a> ConnectionResolver<'a> {
    pub(crate) fn new(datasource: &'a DataSource) -> Self {
        Self {
            datasource,
            username: None,
            password: None,
            sharding_key: None,
            super_sharding_key: None,
        }
    }

    /// Override the datasource's default username
    pub fn user(mut self, username: impl Into<String>) -> Self {
        let username = username.into();
        if !username.is_empty() {
            self.username = Some(username);
        }
        self
    }

    /// Override the datasource's default password
    pub fn password(mut self, password: impl Into<String>) -> Self {
        let password = password.into();
        if !password.is_empty() {
            self.password = Some(password);
        }
        self
    }

    /// Route the connection to a shard
    pub fn sharding_key(mut self, key: impl Into<Option<ShardingKey>>) -> Self {
        if let Some(key) = key.into() {
            self.sharding_key = Some(key);
        }
        self
    }

    /// Accepted for API parity with sharded drivers; not used for routing
    pub fn super_sharding_key(mut self, key: impl Into<Option<ShardingKey>>) -> Self {
        if let Some(key) = key.into() {
            self.super_sharding_key = Some(key);
        }
        self
    }

    /// Compute the URL, pool identity and credentials without connecting
    pub fn resolve_target(&self) -> ResolvedTarget {
        let descriptor = self.datasource.descriptor();
        let resolved = resolve_url(descriptor.url_template(), self.sharding_key.as_ref());

        let mut identity = descriptor.pool_name().map(PoolIdentity::named);
        if resolved.substituted
            && identity.is_some()
            && let Some(key) = &self.sharding_key
        {
            identity = Some(PoolIdentity::shard(key));
        }

        ResolvedTarget {
            url: resolved.url,
            identity,
            username: self
                .username
                .clone()
                .or_else(|| descriptor.username().map(str::to_string)),
            password: self
                .password
                .clone()
                .or_else(|| descriptor.password().map(str::to_string)),
        }
    }

    /// Resolve and open the connection
    #[tracing::instrument(skip(self), fields(driver = %self.datasource.descriptor().driver(), identity))]
    pub async fn build(self) -> Result<DataSourceConnection> {
        if self.super_sharding_key.is_some() {
            tracing::debug!("super sharding key supplied; it does not affect routing");
        }

        let target = self.resolve_target();
        let datasource = self.datasource;
        let config = ConnectionConfig {
            driver: datasource.descriptor().driver().to_string(),
            url: target.url,
            username: target.username,
            password: target.password,
            params: datasource.descriptor().properties().clone(),
        };

        let Some(identity) = target.identity else {
            tracing::debug!(url = %mask_url_password(&config.url), "opening unpooled connection");
            let connection = datasource.driver().connect(&config).await?;
            return Ok(DataSourceConnection::Direct(connection));
        };

        tracing::Span::current().record("identity", identity.as_str());
        datasource.record_identity(&identity);
        let pool = datasource
            .registry()
            .get_or_create(&identity, || create_pool(datasource, &identity, config))
            .await?;

        let connection = pool.get().await?;
        Ok(DataSourceConnection::Pooled(connection))
    }
}

async fn create_pool(
    datasource: &DataSource,
    identity: &PoolIdentity,
    config: ConnectionConfig,
) -> Result<ConnectionPool> {
    let wrap = |e: DataSourceError| DataSourceError::pool_creation(identity.as_str(), e);

    let pool_config = PoolConfig::from_properties(&config.params).map_err(wrap)?;
    let url = config.url.clone();
    let factory = DriverConnectionFactory::new(datasource.driver(), config);

    let pool = ConnectionPool::connect(url, pool_config, factory)
        .await
        .map_err(wrap)?;

    tracing::info!(
        identity = %identity,
        url = %mask_url_password(pool.url()),
        max_size = pool.config().max_size(),
        "connection pool created"
    );
    Ok(pool)
}

/// A connection obtained from a datasource
pub enum DataSourceConnection {
    /// Opened directly through the driver; closing it is the caller's job
    Direct(Arc<dyn Connection>),
    /// Borrowed from a registered pool; returned on drop
    Pooled(PooledConnection),
}

impl DataSourceConnection {
    pub fn is_pooled(&self) -> bool {
        matches!(self, Self::Pooled(_))
    }

    /// The pool this connection came from, if any
    pub fn pool(&self) -> Option<&ConnectionPool> {
        match self {
            Self::Direct(_) => None,
            Self::Pooled(conn) => Some(conn.pool()),
        }
    }
}

impl Deref for DataSourceConnection {
    type Target = dyn Connection;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Direct(conn) => conn.as_ref(),
            Self::Pooled(conn) => &**conn,
        }
    }
}
