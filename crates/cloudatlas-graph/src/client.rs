//! Neo4j connection management and shared graph client.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use neo4rs::{ConfigBuilder, Graph, Query};
use tokio::sync::{Mutex as AsyncMutex, OnceCell};

use cloudatlas_core::Neo4jSettings;

use crate::normalize::record_from_row;
use crate::query::{CypherQuery, QueryRunner, Record};

/// Errors from graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Neo4j query error: {0}")]
    Query(#[from] neo4rs::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub fetch_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Neo4jSettings::default().into()
    }
}

impl From<Neo4jSettings> for GraphConfig {
    fn from(settings: Neo4jSettings) -> Self {
        Self {
            uri: settings.uri,
            user: settings.user,
            password: settings.password,
            max_connections: settings.max_connections,
            fetch_size: settings.fetch_size,
        }
    }
}

/// Thread-safe Neo4j graph client with connection pooling.
///
/// Every query checks a connection out of the pool and returns it when the
/// row stream is dropped, on success and on error alike. Connections are never
/// held across queries. Clone is cheap (inner Arc).
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Connect to Neo4j and verify the connection with a handshake query.
    pub async fn connect(config: &GraphConfig) -> Result<Self, GraphError> {
        let neo_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        graph
            .run(neo4rs::query("RETURN 1"))
            .await
            .map_err(|e| GraphError::Connection(format!("handshake failed: {e}")))?;

        tracing::info!(uri = %config.uri, "Connected to Neo4j");
        Ok(Self { graph })
    }

    /// Execute a query without collecting rows.
    pub async fn run(&self, query: Query) -> Result<(), GraphError> {
        self.graph.run(query).await?;
        Ok(())
    }

    /// Execute a read query and collect all rows.
    pub async fn query_rows(&self, query: Query) -> Result<Vec<neo4rs::Row>, GraphError> {
        let mut stream = self.graph.execute(query).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }
}

#[async_trait]
impl QueryRunner for GraphClient {
    async fn fetch_records(&self, query: &CypherQuery) -> Result<Vec<Record>, GraphError> {
        let rows = self.query_rows(query.to_neo4rs()).await?;
        rows.iter()
            .map(|row| record_from_row(row, &query.columns))
            .collect()
    }
}

// ── Shared Handle ────────────────────────────────────────────────

type InitCell<T> = Arc<OnceCell<Result<T, String>>>;

/// One-shot initialization guard that can be reset.
///
/// Concurrent callers before the first completed attempt all await the same
/// attempt and observe the same outcome. A failed attempt is kept until
/// [`SharedInit::reset`] so nothing retries behind the caller's back.
/// Attempts and resets are serialized, so at most one attempt runs at a time.
pub(crate) struct SharedInit<T> {
    cell: Mutex<InitCell<T>>,
    attempt_lock: AsyncMutex<()>,
    attempts: AtomicUsize,
}

impl<T: Clone> SharedInit<T> {
    pub(crate) fn new() -> Self {
        Self {
            cell: Mutex::new(Arc::new(OnceCell::new())),
            attempt_lock: AsyncMutex::new(()),
            attempts: AtomicUsize::new(0),
        }
    }

    fn current(&self) -> InitCell<T> {
        self.cell
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub(crate) async fn get_or_init<F, Fut>(&self, init: F) -> Result<T, String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, String>>,
    {
        if let Some(done) = self.get() {
            return done;
        }

        let _attempt = self.attempt_lock.lock().await;
        // Re-read: a reset may have swapped the cell while we waited.
        let cell = self.current();
        let outcome = cell
            .get_or_init(|| {
                self.attempts.fetch_add(1, Ordering::SeqCst);
                init()
            })
            .await
            .clone();
        outcome
    }

    pub(crate) fn get(&self) -> Option<Result<T, String>> {
        self.current().get().cloned()
    }

    /// Drop the stored outcome. Returns whether there was one.
    ///
    /// Waits for an in-flight attempt to finish first.
    pub(crate) async fn reset(&self) -> bool {
        let _attempt = self.attempt_lock.lock().await;
        let mut guard = self
            .cell
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let had_value = guard.initialized();
        *guard = Arc::new(OnceCell::new());
        had_value
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

/// Process-wide handle to the graph, connected lazily on first use.
///
/// Constructed once at startup and passed by reference (or cheap clone) to
/// every component that reads the graph.
#[derive(Clone)]
pub struct GraphHandle {
    config: Arc<GraphConfig>,
    state: Arc<SharedInit<GraphClient>>,
}

impl GraphHandle {
    pub fn new(config: GraphConfig) -> Self {
        Self {
            config: Arc::new(config),
            state: Arc::new(SharedInit::new()),
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Get the connected client, connecting on first use.
    ///
    /// A failed connect is returned to every caller until [`Self::disconnect`].
    pub async fn client(&self) -> Result<GraphClient, GraphError> {
        let config = Arc::clone(&self.config);
        self.state
            .get_or_init(|| async move {
                GraphClient::connect(&config).await.map_err(|e| match e {
                    GraphError::Connection(msg) => msg,
                    other => other.to_string(),
                })
            })
            .await
            .map_err(GraphError::Connection)
    }

    /// Whether a successful connection is currently held.
    pub fn is_connected(&self) -> bool {
        matches!(self.state.get(), Some(Ok(_)))
    }

    /// Number of connection attempts made over the handle's lifetime.
    pub fn connect_attempts(&self) -> usize {
        self.state.attempts()
    }

    /// Release the connection. Safe to call when not connected.
    ///
    /// A connect still in progress completes before it is released.
    pub async fn disconnect(&self) {
        if self.state.reset().await {
            tracing::info!(uri = %self.config.uri, "Disconnected from Neo4j");
        }
    }
}

#[async_trait]
impl QueryRunner for GraphHandle {
    async fn fetch_records(&self, query: &CypherQuery) -> Result<Vec<Record>, GraphError> {
        self.client().await?.fetch_records(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_graph_config_defaults() {
        let config = GraphConfig::default();
        assert_eq!(config.uri, "bolt://localhost:7687");
        assert_eq!(config.user, "neo4j");
        assert_eq!(config.max_connections, 16);
        assert_eq!(config.fetch_size, 256);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_attempt() {
        let init = Arc::new(SharedInit::<u32>::new());

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let init = Arc::clone(&init);
            tasks.push(tokio::spawn(async move {
                init.get_or_init(|| async {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok(7)
                })
                .await
            }));
        }

        for task in tasks {
            assert_eq!(task.await.unwrap(), Ok(7));
        }
        assert_eq!(init.attempts(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_shared_and_not_retried() {
        let init = SharedInit::<u32>::new();

        let first = init
            .get_or_init(|| async { Err("refused".to_string()) })
            .await;
        let second = init.get_or_init(|| async { Ok(1) }).await;

        assert_eq!(first, Err("refused".to_string()));
        assert_eq!(second, Err("refused".to_string()));
        assert_eq!(init.attempts(), 1);
    }

    #[tokio::test]
    async fn test_reset_allows_fresh_attempt() {
        let init = SharedInit::<u32>::new();
        assert!(!init.reset().await);

        let _ = init
            .get_or_init(|| async { Err("refused".to_string()) })
            .await;
        assert!(init.reset().await);
        assert!(init.get().is_none());

        let again = init.get_or_init(|| async { Ok(3) }).await;
        assert_eq!(again, Ok(3));
        assert_eq!(init.attempts(), 2);
    }

    async fn tracked_attempt(
        running: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    ) -> Result<u32, String> {
        let now = running.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        running.fetch_sub(1, Ordering::SeqCst);
        Ok(1)
    }

    #[tokio::test]
    async fn test_reset_waits_for_in_flight_attempt() {
        let init = Arc::new(SharedInit::<u32>::new());
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let first = {
            let init = Arc::clone(&init);
            let (running, peak) = (Arc::clone(&running), Arc::clone(&peak));
            tokio::spawn(async move { init.get_or_init(|| tracked_attempt(running, peak)).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(init.reset().await);
        let second = init
            .get_or_init(|| tracked_attempt(Arc::clone(&running), Arc::clone(&peak)))
            .await;

        assert_eq!(first.await.unwrap(), Ok(1));
        assert_eq!(second, Ok(1));
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(init.attempts(), 2);
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let handle = GraphHandle::new(GraphConfig::default());
        handle.disconnect().await;
        handle.disconnect().await;
        assert!(!handle.is_connected());
        assert_eq!(handle.connect_attempts(), 0);
    }
}
