//! Tests for connection pool functionality

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use shardsource_core::{Connection, DataSourceError, QueryResult, Result, StatementResult, Value};

use super::config::PoolConfig;
use super::pool::{ConnectionFactory, ConnectionPool};
use super::stats::PoolStats;

struct MockConnection {
    closed: AtomicBool,
}

impl MockConnection {
    fn new() -> Self {
        Self {
            closed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn driver_name(&self) -> &str {
        "mock"
    }

    async fn execute(&self, _sql: &str, _params: &[Value]) -> Result<StatementResult> {
        Ok(StatementResult::default())
    }

    async fn query(&self, _sql: &str, _params: &[Value]) -> Result<QueryResult> {
        Ok(QueryResult::empty())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Mock factory that counts connections created and can be told to fail
struct MockConnectionFactory {
    counter: AtomicUsize,
    fail_after: Option<usize>,
}

impl MockConnectionFactory {
    fn new() -> Self {
        Self {
            counter: AtomicUsize::new(0),
            fail_after: None,
        }
    }

    fn failing_after(successes: usize) -> Self {
        Self {
            counter: AtomicUsize::new(0),
            fail_after: Some(successes),
        }
    }

    fn count(&self) -> usize {
        self.counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectionFactory for MockConnectionFactory {
    async fn create(&self) -> Result<Arc<dyn Connection>> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        if self.fail_after.is_some_and(|limit| n >= limit) {
            return Err(DataSourceError::Connection("database unreachable".into()));
        }
        Ok(Arc::new(MockConnection::new()))
    }
}

// =============================================================================
// PoolConfig tests
// =============================================================================

#[test]
fn test_pool_config_creation() {
    let config = PoolConfig::new(2, 10);
    assert_eq!(config.min_size(), 2);
    assert_eq!(config.max_size(), 10);
    assert_eq!(config.acquire_timeout(), Duration::from_millis(30_000));
    assert_eq!(config.idle_timeout(), Duration::from_millis(600_000));
    assert!(config.max_lifetime().is_none());
}

#[test]
fn test_pool_config_validation() {
    assert!(PoolConfig::new(0, 0).validate().is_err());

    let err = PoolConfig::new(10, 5).validate().unwrap_err();
    assert!(err.to_string().contains("min_size (10) cannot exceed max_size (5)"));

    assert!(PoolConfig::default().validate().is_ok());
}

#[test]
fn test_pool_config_from_properties() {
    let properties: HashMap<String, String> = [
        ("url", "sqlite::memory:"),
        ("initialSize", "2"),
        ("maxActive", "8"),
        ("maxWaitMillis", "250"),
        ("minEvictableIdleTimeMillis", "1000"),
        ("maxConnLifetimeMillis", "60000"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let config = PoolConfig::from_properties(&properties).expect("valid pool properties");
    assert_eq!(config.min_size(), 2);
    assert_eq!(config.max_size(), 8);
    assert_eq!(config.acquire_timeout(), Duration::from_millis(250));
    assert_eq!(config.idle_timeout(), Duration::from_millis(1000));
    assert_eq!(config.max_lifetime(), Some(Duration::from_millis(60_000)));
}

#[test]
fn test_pool_config_from_properties_rejects_bad_values() {
    let not_a_number: HashMap<String, String> =
        [("maxTotal".to_string(), "lots".to_string())].into();
    let err = PoolConfig::from_properties(&not_a_number).unwrap_err();
    assert!(matches!(err, DataSourceError::Configuration(ref msg) if msg.contains("maxTotal")));

    let inverted: HashMap<String, String> = [
        ("minIdle".to_string(), "5".to_string()),
        ("maxTotal".to_string(), "2".to_string()),
    ]
    .into();
    assert!(PoolConfig::from_properties(&inverted).is_err());

    let out_of_range: HashMap<String, String> = [(
        "maxTotal".to_string(),
        "99999999999999999999999".to_string(),
    )]
    .into();
    let err = PoolConfig::from_properties(&out_of_range).unwrap_err();
    assert!(matches!(err, DataSourceError::Configuration(ref msg) if msg.contains("maxTotal")));
}

#[test]
fn test_pool_config_serialization() {
    let config = PoolConfig::new(2, 10)
        .with_acquire_timeout_ms(5000)
        .with_max_lifetime_ms(3600000);

    let json = serde_json::to_string(&config).expect("serialize");
    let deserialized: PoolConfig = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(deserialized, config);
}

// =============================================================================
// PoolStats tests
// =============================================================================

#[test]
fn test_pool_stats_utilization() {
    let stats = PoolStats::new(5, 5, 0, 10);
    assert_eq!(stats.total(), 10);
    assert!((stats.utilization() - 0.5).abs() < 0.001);
    assert!(!stats.is_exhausted());

    let full = PoolStats::new(0, 4, 3, 4);
    assert!(full.is_exhausted());
    assert_eq!(full.waiting(), 3);

    assert!((PoolStats::default().utilization() - 0.0).abs() < 0.001);
    assert!(!PoolStats::default().is_exhausted());
}

// =============================================================================
// ConnectionPool tests
// =============================================================================

#[tokio::test]
async fn test_new_rejects_invalid_config() {
    let result = ConnectionPool::new("mock://", PoolConfig::new(3, 1), MockConnectionFactory::new());
    assert!(matches!(result, Err(DataSourceError::Configuration(_))));
}

#[tokio::test]
async fn test_connect_warms_min_size() {
    let factory = Arc::new(MockConnectionFactory::new());
    let pool = ConnectionPool::connect("mock://db", PoolConfig::new(2, 5), factory.clone())
        .await
        .expect("create pool");

    assert_eq!(factory.count(), 2);
    assert_eq!(pool.stats().idle(), 2);
    assert_eq!(pool.url(), "mock://db");

    let _conn = pool.get().await.expect("get connection");
    assert_eq!(factory.count(), 2);
}

#[tokio::test]
async fn test_connect_fails_when_warm_up_fails() {
    let result = ConnectionPool::connect(
        "mock://db",
        PoolConfig::new(3, 5),
        MockConnectionFactory::failing_after(1),
    )
    .await;
    assert!(matches!(result, Err(DataSourceError::Connection(_))));
}

#[tokio::test]
async fn test_pool_get_connection() {
    let pool = ConnectionPool::new("mock://", PoolConfig::new(0, 5), MockConnectionFactory::new())
        .expect("create pool");

    let conn = pool.get().await.expect("get connection");
    assert_eq!(conn.driver_name(), "mock");
    assert!(conn.pool().ptr_eq(&pool));

    let stats = pool.stats();
    assert_eq!(stats.active(), 1);
    assert_eq!(stats.idle(), 0);
    assert_eq!(stats.waiting(), 0);
}

#[tokio::test]
async fn test_pool_connection_return() {
    let factory = Arc::new(MockConnectionFactory::new());
    let pool = ConnectionPool::new("mock://", PoolConfig::new(0, 5), factory.clone())
        .expect("create pool");

    {
        let _conn = pool.get().await.expect("get connection");
        assert_eq!(pool.stats().active(), 1);
    }

    assert_eq!(pool.stats().active(), 0);
    assert_eq!(pool.stats().idle(), 1);

    let _conn2 = pool.get().await.expect("get connection");
    assert_eq!(factory.count(), 1);
}

#[tokio::test]
async fn test_closed_connection_is_not_returned() {
    let factory = Arc::new(MockConnectionFactory::new());
    let pool = ConnectionPool::new("mock://", PoolConfig::new(0, 5), factory.clone())
        .expect("create pool");

    {
        let conn = pool.get().await.expect("get connection");
        conn.close().await.expect("close");
    }

    assert_eq!(pool.stats().idle(), 0);
    let _conn = pool.get().await.expect("get connection");
    assert_eq!(factory.count(), 2);
}

#[tokio::test]
async fn test_pool_max_size_limit() {
    let config = PoolConfig::new(0, 2).with_acquire_timeout_ms(100);
    let pool = ConnectionPool::new("mock://", config, MockConnectionFactory::new())
        .expect("create pool");

    let conn1 = pool.get().await.expect("get connection 1");
    let conn2 = pool.get().await.expect("get connection 2");
    assert!(pool.stats().is_exhausted());

    let err = pool.get().await.err().expect("third acquire should time out");
    assert!(matches!(err, DataSourceError::Timeout(_)));
    assert_eq!(pool.stats().waiting(), 0);

    drop(conn1);
    let _conn3 = pool.get().await.expect("slot freed");
    drop(conn2);
}

#[tokio::test]
async fn test_factory_failure_on_get_is_surfaced() {
    let pool = ConnectionPool::new(
        "mock://",
        PoolConfig::new(0, 2),
        MockConnectionFactory::failing_after(0),
    )
    .expect("create pool");

    let err = pool.get().await.err().expect("factory fails");
    assert!(matches!(err, DataSourceError::Connection(_)));
    assert_eq!(pool.stats().active(), 0);
    assert_eq!(pool.stats().waiting(), 0);
}

#[tokio::test]
async fn test_idle_timeout_discards_stale_connections() {
    let factory = Arc::new(MockConnectionFactory::new());
    let config = PoolConfig::new(0, 2).with_idle_timeout_ms(10);
    let pool = ConnectionPool::new("mock://", config, factory.clone()).expect("create pool");

    drop(pool.get().await.expect("get"));
    tokio::time::sleep(Duration::from_millis(30)).await;

    let _conn = pool.get().await.expect("get");
    assert_eq!(factory.count(), 2);
}

#[tokio::test]
async fn test_max_lifetime_discards_old_connections() {
    let factory = Arc::new(MockConnectionFactory::new());
    let config = PoolConfig::new(0, 2).with_max_lifetime_ms(1);
    let pool = ConnectionPool::new("mock://", config, factory.clone()).expect("create pool");

    drop(pool.get().await.expect("get"));
    assert_eq!(pool.stats().idle(), 1);
    tokio::time::sleep(Duration::from_millis(10)).await;

    let _conn = pool.get().await.expect("get");
    assert_eq!(factory.count(), 2);
    assert_eq!(pool.stats().idle(), 0);
}

#[tokio::test]
async fn test_cancelled_acquire_is_not_counted_as_waiting() {
    let pool = ConnectionPool::new("mock://", PoolConfig::new(0, 1), MockConnectionFactory::new())
        .expect("create pool");

    let _held = pool.get().await.expect("get connection");

    let abandoned = tokio::time::timeout(Duration::from_millis(20), pool.get()).await;
    assert!(abandoned.is_err(), "acquire should still be waiting for the slot");
    assert_eq!(pool.stats().waiting(), 0);
}

#[tokio::test]
async fn test_pool_close_idle() {
    let pool = ConnectionPool::new("mock://", PoolConfig::new(0, 5), MockConnectionFactory::new())
        .expect("create pool");

    {
        let _conn1 = pool.get().await.expect("get");
        let _conn2 = pool.get().await.expect("get");
    }
    assert_eq!(pool.stats().idle(), 2);

    pool.close_idle().await;
    assert_eq!(pool.stats().idle(), 0);
}
