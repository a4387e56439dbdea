//! Connectivity Monitor: background task probing the graph store.
//!
//! The probe runs on a fixed interval regardless of request traffic and
//! publishes its outcome into a [`ConnectivityCell`]. Health endpoints only
//! ever read the cell, so their latency never depends on the store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::store::GraphStore;

/// Outcome of the most recently completed probe.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectivityStatus {
    /// No probe has completed yet.
    Unknown,
    Ok { checked_at: DateTime<Utc> },
    Failed { error: String, checked_at: DateTime<Utc> },
}

impl ConnectivityStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    pub fn checked_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Unknown => None,
            Self::Ok { checked_at } | Self::Failed { checked_at, .. } => Some(*checked_at),
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Unknown => "Connectivity to neo4j has not been checked yet".to_string(),
            Self::Ok { .. } => "Connectivity to neo4j is ok".to_string(),
            Self::Failed { error, .. } => format!("Error connecting to neo4j: {error}"),
        }
    }
}

/// Shared status cell. One writer (the monitor), any number of readers.
#[derive(Debug, Clone)]
pub struct ConnectivityCell {
    inner: Arc<RwLock<ConnectivityStatus>>,
}

impl Default for ConnectivityCell {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityCell {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(ConnectivityStatus::Unknown)),
        }
    }

    pub async fn get(&self) -> ConnectivityStatus {
        self.inner.read().await.clone()
    }

    pub async fn set(&self, status: ConnectivityStatus) {
        *self.inner.write().await = status;
    }
}

pub struct ConnectivityMonitor {
    store: Arc<dyn GraphStore>,
    cell: ConnectivityCell,
    interval: Duration,
}

impl ConnectivityMonitor {
    pub fn new(store: Arc<dyn GraphStore>, cell: ConnectivityCell, interval: Duration) -> Self {
        Self {
            store,
            cell,
            interval,
        }
    }

    /// Run one probe and publish its outcome.
    pub async fn probe(&self) -> ConnectivityStatus {
        let status = match self.store.check_connectivity().await {
            Ok(()) => ConnectivityStatus::Ok {
                checked_at: Utc::now(),
            },
            Err(e) => {
                tracing::warn!(error = %e, "Graph store connectivity check failed");
                ConnectivityStatus::Failed {
                    error: e.to_string(),
                    checked_at: Utc::now(),
                }
            }
        };
        self.cell.set(status.clone()).await;
        status
    }

    /// Probe loop. Never returns; failures are published and probing carries
    /// on at the same interval. Probes start on a fixed cadence measured from
    /// the first one, so a slow store does not stretch the period. A probe that
    /// overruns a tick delays the schedule instead of bursting to catch up.
    pub async fn run(&self) {
        tracing::info!(interval = ?self.interval, "ConnectivityMonitor started");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let was_ok = self.cell.get().await.is_ok();
            let status = self.probe().await;
            if status.is_ok() && !was_ok {
                tracing::info!("Graph store connectivity established");
            }
        }
    }

    /// Spawn [`run`](Self::run) as a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::store::{GraphQuery, MemoryGraph, Row, StoreError};

    const INTERVAL: Duration = Duration::from_secs(30);

    #[tokio::test]
    async fn cell_starts_unknown() {
        let cell = ConnectivityCell::new();
        let status = cell.get().await;
        assert_eq!(status, ConnectivityStatus::Unknown);
        assert!(!status.is_ok());
        assert!(status.checked_at().is_none());
    }

    #[tokio::test]
    async fn probe_publishes_outcome() {
        let graph = Arc::new(MemoryGraph::new());
        let cell = ConnectivityCell::new();
        let monitor = ConnectivityMonitor::new(graph.clone(), cell.clone(), INTERVAL);

        assert!(monitor.probe().await.is_ok());
        assert!(cell.get().await.is_ok());

        graph.set_unavailable(true);
        let status = monitor.probe().await;
        assert!(matches!(status, ConnectivityStatus::Failed { .. }));
        assert!(status.message().starts_with("Error connecting to neo4j"));
        assert_eq!(cell.get().await, status);
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_probing_through_failures() {
        let graph = Arc::new(MemoryGraph::new());
        let cell = ConnectivityCell::new();
        graph.set_unavailable(true);
        let handle = ConnectivityMonitor::new(graph.clone(), cell.clone(), INTERVAL).spawn();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(matches!(cell.get().await, ConnectivityStatus::Failed { .. }));

        tokio::time::sleep(INTERVAL * 3).await;
        assert!(!handle.is_finished());
        assert!(!cell.get().await.is_ok());

        graph.set_unavailable(false);
        tokio::time::sleep(INTERVAL).await;
        assert!(cell.get().await.is_ok());
        assert!(!handle.is_finished());

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn probes_on_a_fixed_interval() {
        let graph = Arc::new(MemoryGraph::new());
        let cell = ConnectivityCell::new();
        let handle = ConnectivityMonitor::new(graph.clone(), cell.clone(), INTERVAL).spawn();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(cell.get().await.is_ok());

        // Failure only shows up once the next probe has run.
        graph.set_unavailable(true);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(cell.get().await.is_ok());
        tokio::time::sleep(INTERVAL).await;
        assert!(!cell.get().await.is_ok());

        handle.abort();
    }

    /// Store whose connectivity check takes a fixed time to answer.
    struct SlowStore {
        checks: AtomicUsize,
        latency: Duration,
    }

    #[async_trait]
    impl GraphStore for SlowStore {
        async fn query_batch(&self, _queries: &[GraphQuery]) -> Result<Vec<Vec<Row>>, StoreError> {
            Ok(Vec::new())
        }

        async fn check_connectivity(&self) -> Result<(), StoreError> {
            self.checks.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.latency).await;
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_checks_do_not_stretch_the_period() {
        let store = Arc::new(SlowStore {
            checks: AtomicUsize::new(0),
            latency: Duration::from_secs(10),
        });
        let cell = ConnectivityCell::new();
        let handle = ConnectivityMonitor::new(store.clone(), cell.clone(), INTERVAL).spawn();

        // Checks start at 0s, 30s, 60s and 90s.
        tokio::time::sleep(Duration::from_secs(95)).await;
        assert_eq!(store.checks.load(Ordering::SeqCst), 4);
        assert!(cell.get().await.is_ok());

        handle.abort();
    }
}
