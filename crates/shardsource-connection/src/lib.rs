//! shardsource connection - datasource resolution and pooling
//!
//! Turns a [`DataSourceDescriptor`](shardsource_core::DataSourceDescriptor)
//! into connections. Pooled datasources share pools through a process-wide
//! [`PoolRegistry`]; sharded datasources get one pool per sharding key.

mod datasource;
mod factory;
pub mod pool;
mod registry;
mod resolver;

pub use datasource::DataSource;
pub use factory::DriverConnectionFactory;
pub use pool::{ConnectionFactory, ConnectionPool, PoolConfig, PoolStats, PooledConnection};
pub use registry::PoolRegistry;
pub use resolver::{ConnectionResolver, DataSourceConnection, ResolvedTarget};
