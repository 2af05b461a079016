//! shardsource drivers - database driver implementations
//!
//! Concrete implementations of the `DatabaseDriver` trait from
//! `shardsource-core`, plus the registry that maps a datasource's driver
//! identifier to an implementation.

#[cfg(feature = "sqlite")]
pub use shardsource_driver_sqlite as sqlite;

mod registry;

pub use registry::DriverRegistry;

pub use shardsource_core::{
    Connection, ConnectionConfig, DataSourceError, DatabaseDriver, QueryResult, Result, Row,
    StatementResult, Value,
};
