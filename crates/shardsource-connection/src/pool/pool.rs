//! Connection pool implementation

use std::collections::VecDeque;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use parking_lot::Mutex;
use shardsource_core::{Connection, DataSourceError, Result, mask_url_password};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::config::PoolConfig;
use super::stats::PoolStats;

/// Factory trait for creating new connections
#[async_trait]
pub trait ConnectionFactory: Send + Sync + 'static {
    /// Create a new connection
    async fn create(&self) -> Result<Arc<dyn Connection>>;

    /// Validate that a connection is still usable
    ///
    /// Default implementation only checks that it has not been closed.
    async fn validate(&self, conn: &dyn Connection) -> bool {
        !conn.is_closed()
    }
}

#[async_trait]
impl<T: ConnectionFactory> ConnectionFactory for Arc<T> {
    async fn create(&self) -> Result<Arc<dyn Connection>> {
        (**self).create().await
    }

    async fn validate(&self, conn: &dyn Connection) -> bool {
        (**self).validate(conn).await
    }
}

/// Idle connection with lifecycle metadata
struct IdleConnection {
    connection: Arc<dyn Connection>,
    created_at: Instant,
    last_used_at: Instant,
}

struct PoolShared {
    url: String,
    config: PoolConfig,
    factory: Arc<dyn ConnectionFactory>,
    idle: Mutex<VecDeque<IdleConnection>>,
    /// Bounds the number of borrowed connections
    semaphore: Arc<Semaphore>,
    active_count: AtomicUsize,
    waiting_count: AtomicUsize,
}

/// A connection pool for one resolved datasource URL
///
/// Cloning is cheap and yields a handle to the same pool. Connections are
/// returned to the pool when the [`PooledConnection`] wrapper is dropped.
#[derive(Clone)]
pub struct ConnectionPool {
    shared: Arc<PoolShared>,
}

impl ConnectionPool {
    /// Create an empty pool; connections are opened on demand
    pub fn new<F: ConnectionFactory>(
        url: impl Into<String>,
        config: PoolConfig,
        factory: F,
    ) -> Result<Self> {
        config.validate()?;
        let semaphore = Arc::new(Semaphore::new(config.max_size()));
        Ok(Self {
            shared: Arc::new(PoolShared {
                url: url.into(),
                config,
                factory: Arc::new(factory),
                idle: Mutex::new(VecDeque::new()),
                semaphore,
                active_count: AtomicUsize::new(0),
                waiting_count: AtomicUsize::new(0),
            }),
        })
    }

    /// Create a pool and open its `min_size` initial connections
    ///
    /// Any connection failure aborts creation, so a misconfigured datasource
    /// is reported here rather than on first use.
    pub async fn connect<F: ConnectionFactory>(
        url: impl Into<String>,
        config: PoolConfig,
        factory: F,
    ) -> Result<Self> {
        let pool = Self::new(url, config, factory)?;
        let initial = pool.shared.config.min_size();

        let mut opened = Vec::with_capacity(initial);
        for _ in 0..initial {
            match pool.shared.factory.create().await {
                Ok(connection) => opened.push(connection),
                Err(e) => {
                    for connection in opened {
                        let _ = connection.close().await;
                    }
                    return Err(e);
                }
            }
        }

        {
            let now = Instant::now();
            let mut idle = pool.shared.idle.lock();
            idle.extend(opened.into_iter().map(|connection| IdleConnection {
                connection,
                created_at: now,
                last_used_at: now,
            }));
        }

        tracing::debug!(
            url = %mask_url_password(pool.url()),
            initial_connections = initial,
            "connection pool warmed up"
        );
        Ok(pool)
    }

    /// Get a connection from the pool
    ///
    /// This will:
    /// 1. Wait for a free slot (bounded by `max_size`), up to the acquire timeout
    /// 2. Reuse a valid idle connection if there is one
    /// 3. Otherwise open a new connection through the factory
    pub async fn get(&self) -> Result<PooledConnection> {
        let shared = &self.shared;
        let waiting = WaitingGuard::enter(&shared.waiting_count);

        let result = tokio::time::timeout(shared.config.acquire_timeout(), async {
            let permit = shared
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| DataSourceError::Connection("Pool semaphore closed".into()))?;

            let (connection, created_at) = match self.try_get_idle().await {
                Some(idle) => idle,
                None => (shared.factory.create().await?, Instant::now()),
            };

            Ok::<_, DataSourceError>((connection, created_at, permit))
        })
        .await;

        drop(waiting);

        match result {
            Ok(Ok((connection, created_at, permit))) => {
                shared.active_count.fetch_add(1, Ordering::SeqCst);
                Ok(PooledConnection {
                    connection: Some(connection),
                    created_at,
                    pool: self.clone(),
                    _permit: permit,
                })
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(DataSourceError::Timeout(format!(
                "Timed out waiting for connection (timeout: {:?})",
                shared.config.acquire_timeout()
            ))),
        }
    }

    /// Pop idle connections until one passes lifetime, idle and validity checks
    async fn try_get_idle(&self) -> Option<(Arc<dyn Connection>, Instant)> {
        loop {
            let inner = { self.shared.idle.lock().pop_front() }?;

            let expired = self
                .shared
                .config
                .max_lifetime()
                .is_some_and(|max| inner.created_at.elapsed() > max);
            let stale = inner.last_used_at.elapsed() > self.shared.config.idle_timeout();

            if expired || stale || !self.shared.factory.validate(&*inner.connection).await {
                let _ = inner.connection.close().await;
                continue;
            }

            return Some((inner.connection, inner.created_at));
        }
    }

    fn return_connection(&self, connection: Arc<dyn Connection>, created_at: Instant) {
        self.shared.active_count.fetch_sub(1, Ordering::SeqCst);

        if connection.is_closed() {
            return;
        }

        self.shared.idle.lock().push_back(IdleConnection {
            connection,
            created_at,
            last_used_at: Instant::now(),
        });
    }

    /// Get current pool statistics
    pub fn stats(&self) -> PoolStats {
        let idle = self.shared.idle.lock().len();
        let active = self.shared.active_count.load(Ordering::SeqCst);
        let waiting = self.shared.waiting_count.load(Ordering::SeqCst);
        PoolStats::new(idle, active, waiting, self.shared.config.max_size())
    }

    pub fn config(&self) -> &PoolConfig {
        &self.shared.config
    }

    /// The resolved URL this pool connects to
    pub fn url(&self) -> &str {
        &self.shared.url
    }

    /// True when both handles refer to the same pool
    pub fn ptr_eq(&self, other: &ConnectionPool) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Close all idle connections in the pool
    pub async fn close_idle(&self) {
        let connections: Vec<_> = { self.shared.idle.lock().drain(..).collect() };

        for inner in connections {
            let _ = inner.connection.close().await;
        }
    }
}

impl fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("url", &mask_url_password(self.url()))
            .field("stats", &self.stats())
            .finish()
    }
}

/// Counts a caller in `waiting_count` until dropped, including when the
/// caller's future is cancelled mid-wait
struct WaitingGuard<'a>(&'a AtomicUsize);

impl<'a> WaitingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A connection borrowed from the pool
///
/// When dropped, the connection is automatically returned to the pool.
pub struct PooledConnection {
    connection: Option<Arc<dyn Connection>>,
    created_at: Instant,
    pool: ConnectionPool,
    _permit: OwnedSemaphorePermit,
}

impl PooledConnection {
    /// Get the underlying connection as an Arc
    pub fn inner(&self) -> &Arc<dyn Connection> {
        self.connection.as_ref().expect("connection taken")
    }

    /// The pool this connection was borrowed from
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }
}

impl Deref for PooledConnection {
    type Target = dyn Connection;

    fn deref(&self) -> &Self::Target {
        self.inner().as_ref()
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.connection.take() {
            self.pool.return_connection(conn, self.created_at);
        }
    }
}
