//! SQLite connection pool
//!
//! A bounded pool of `rusqlite` connections to one database file.
//! Connections are opened lazily, handed out exclusively for the duration of
//! one operation, and recycled on release. `acquire` is synchronous and is
//! meant to be called from the blocking bridge's worker threads, never from
//! the async runtime itself.

use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};

/// Database configuration for the connection pool
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Maximum time to wait for a connection
    pub acquire_timeout: Duration,
    /// Driver-level busy timeout applied to every connection
    pub busy_timeout: Duration,
    /// Number of blocking worker threads to pair the pool with
    pub worker_threads: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: String::from("./brain.db"),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(10),
            busy_timeout: Duration::from_secs(5),
            worker_threads: 5,
        }
    }
}

impl DatabaseConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let path = std::env::var("DATABASE_PATH").unwrap_or_else(|_| "./brain.db".to_string());

        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);

        let acquire_timeout = std::env::var("DATABASE_ACQUIRE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map_or(Duration::from_secs(10), Duration::from_secs);

        let busy_timeout = std::env::var("DATABASE_BUSY_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map_or(Duration::from_secs(5), Duration::from_millis);

        let worker_threads = std::env::var("DATABASE_WORKER_THREADS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(max_connections);

        Self {
            path,
            max_connections,
            acquire_timeout,
            busy_timeout,
            worker_threads,
        }
    }
}

/// Bounded SQLite connection pool
///
/// Cloning is cheap and shares the same pool.
#[derive(Clone, Debug)]
pub struct SqlitePool {
    inner: Arc<PoolInner>,
}

#[derive(Debug)]
struct PoolInner {
    config: DatabaseConfig,
    state: Mutex<PoolState>,
    /// Signalled whenever a connection is returned or a slot frees up
    available: Condvar,
}

#[derive(Debug)]
struct PoolState {
    /// Idle connections ready for checkout, most recently used last
    idle: Vec<Connection>,
    /// Total live connections, idle plus checked out
    open: u32,
    closed: bool,
}

impl SqlitePool {
    /// Create a new pool for the configured database
    ///
    /// No connection is opened yet; connections are established lazily on
    /// first acquire so a misconfigured endpoint surfaces as a
    /// [`DbError::Connection`] from the operation that first needs one.
    pub fn connect(config: &DatabaseConfig) -> DbResult<Self> {
        if config.max_connections == 0 {
            return Err(DbError::Connection(
                "pool size must be at least 1".to_string(),
            ));
        }

        // Ensure parent directory exists for file-backed databases
        if let Some(parent) = Path::new(&config.path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DbError::Connection(e.to_string()))?;
            }
        }

        info!(
            path = %config.path,
            max_connections = config.max_connections,
            "database connection pool created"
        );

        Ok(Self {
            inner: Arc::new(PoolInner {
                config: config.clone(),
                state: Mutex::new(PoolState {
                    idle: Vec::new(),
                    open: 0,
                    closed: false,
                }),
                available: Condvar::new(),
            }),
        })
    }

    /// Check out a connection, blocking the calling thread until one is
    /// available or the acquire timeout elapses
    ///
    /// Returns [`DbError::PoolExhausted`] when every connection stayed
    /// checked out for the whole wait, [`DbError::PoolClosed`] after
    /// [`shutdown`](Self::shutdown), and [`DbError::Connection`] when a
    /// fresh connection could not be established.
    pub fn acquire(&self) -> DbResult<PooledConnection> {
        let deadline = Instant::now() + self.inner.config.acquire_timeout;
        let mut state = self.inner.state.lock();

        loop {
            if state.closed {
                return Err(DbError::PoolClosed);
            }

            if let Some(conn) = state.idle.pop() {
                return Ok(PooledConnection::new(conn, Arc::clone(&self.inner)));
            }

            if state.open < self.inner.config.max_connections {
                // Reserve the slot before releasing the lock, so concurrent
                // acquires cannot overshoot the bound while we connect.
                state.open += 1;
                drop(state);

                match open_connection(&self.inner.config) {
                    Ok(conn) => {
                        return Ok(PooledConnection::new(conn, Arc::clone(&self.inner)));
                    }
                    Err(e) => {
                        let mut state = self.inner.state.lock();
                        state.open -= 1;
                        drop(state);
                        self.inner.available.notify_one();
                        return Err(e);
                    }
                }
            }

            if self
                .inner
                .available
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                return Err(DbError::PoolExhausted);
            }
        }
    }

    /// Shut the pool down, closing all idle connections
    ///
    /// Idempotent. Waiters are woken and fail with [`DbError::PoolClosed`];
    /// connections still checked out are closed when their guard drops.
    pub fn shutdown(&self) {
        let idle = {
            let mut state = self.inner.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            let idle = std::mem::take(&mut state.idle);
            state.open -= idle.len() as u32;
            idle
        };
        self.inner.available.notify_all();

        let closed = idle.len();
        for conn in idle {
            if let Err((_, e)) = conn.close() {
                warn!(error = %e, "failed to close pooled connection cleanly");
            }
        }

        info!(closed, "database connection pool shut down");
    }

    /// Whether the pool has been shut down
    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    /// Total live connections, idle plus checked out
    pub fn open_connections(&self) -> u32 {
        self.inner.state.lock().open
    }

    /// Connections currently idle in the pool
    pub fn idle_connections(&self) -> usize {
        self.inner.state.lock().idle.len()
    }
}

/// Open and configure one physical connection
fn open_connection(config: &DatabaseConfig) -> DbResult<Connection> {
    let conn =
        Connection::open(&config.path).map_err(|e| DbError::Connection(e.to_string()))?;

    conn.busy_timeout(config.busy_timeout)
        .map_err(|e| DbError::Connection(e.to_string()))?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL; PRAGMA foreign_keys = ON;",
    )
    .map_err(|e| DbError::Connection(e.to_string()))?;

    debug!(path = %config.path, "opened new database connection");
    Ok(conn)
}

/// RAII guard around a checked-out connection
///
/// Dereferences to [`rusqlite::Connection`]. Dropping the guard returns the
/// connection to the pool on every exit path; a connection flagged with
/// [`invalidate`](Self::invalidate) is discarded instead, and a replacement
/// is opened lazily by a later acquire.
#[derive(Debug)]
pub struct PooledConnection {
    conn: Option<Connection>,
    pool: Arc<PoolInner>,
    broken: bool,
}

impl PooledConnection {
    fn new(conn: Connection, pool: Arc<PoolInner>) -> Self {
        Self {
            conn: Some(conn),
            pool,
            broken: false,
        }
    }

    /// Mark the connection unusable so it is discarded instead of re-pooled
    pub fn invalidate(&mut self) {
        self.broken = true;
    }
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn.as_ref().expect("connection taken before drop")
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("connection taken before drop")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };

        let mut state = self.pool.state.lock();
        if self.broken || state.closed {
            state.open -= 1;
            drop(state);
            drop(conn);
            if self.broken {
                warn!("discarded broken database connection");
            }
        } else {
            state.idle.push(conn);
            drop(state);
        }
        self.pool.available.notify_one();
    }
}
