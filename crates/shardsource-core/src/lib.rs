//! shardsource core - shared abstractions for datasource resolution
//!
//! This crate provides the types every other shardsource crate depends on:
//!
//! - `DataSourceDescriptor` - validated configuration for one datasource
//! - `ShardingKey` - typed key selecting a partition
//! - `PoolIdentity` - key a connection pool is registered under
//! - `resolve_url` - sharding key substitution in URL templates
//! - `DatabaseDriver` / `Connection` - traits implemented by drivers
//! - `DataSourceError` - the single error type surfaced to callers

mod connection;
pub mod descriptor;
mod driver;
mod error;
mod identity;
mod sharding;
mod types;
pub mod url;

pub use connection::*;
pub use descriptor::DataSourceDescriptor;
pub use driver::*;
pub use error::*;
pub use identity::PoolIdentity;
pub use sharding::*;
pub use types::*;
pub use url::{ResolvedUrl, SHARDING_KEY_PLACEHOLDER, mask_url_password, resolve_url};
