//! Connection pooling for database connections
//!
//! This module provides the pool provider used for pooled datasources:
//! configurable pool sizes, timeouts, validation on borrow and statistics.
//!
//! # Example
//!
//! ```ignore
//! use shardsource_connection::pool::{ConnectionPool, PoolConfig};
//!
//! let config = PoolConfig::new(1, 20)
//!     .with_acquire_timeout_ms(5000)
//!     .with_idle_timeout_ms(300000);
//!
//! let pool = ConnectionPool::connect("sqlite::memory:", config, connection_factory).await?;
//! let conn = pool.get().await?;
//! // Connection returned to pool on drop
//! ```

mod config;
mod pool;
mod stats;

#[cfg(test)]
mod tests;

pub use config::PoolConfig;
pub use pool::{ConnectionFactory, ConnectionPool, PooledConnection};
pub use stats::PoolStats;
