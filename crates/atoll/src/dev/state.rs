//! Connected live-reload clients.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

const CLIENT_BUFFER: usize = 16;

/// Message pushed to every browser over `/live`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum LiveEvent {
    /// A rebuild succeeded and the new server is up
    Reload { generation: u64 },
    /// A rebuild failed; the previous server keeps serving
    BuildFailed { message: String },
}

impl LiveEvent {
    /// SSE event name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Reload { .. } => "reload",
            Self::BuildFailed { .. } => "build-failed",
        }
    }
}

/// Set of connected clients, shared by the live server and the coordinator.
///
/// Ids are millisecond timestamps, bumped by one on collision.
#[derive(Debug, Clone, Default)]
pub struct LiveClients {
    clients: Arc<RwLock<HashMap<u64, mpsc::Sender<LiveEvent>>>>,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

impl LiveClients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a client, returning its id and event stream.
    pub fn register(&self) -> (u64, mpsc::Receiver<LiveEvent>) {
        let (tx, rx) = mpsc::channel(CLIENT_BUFFER);
        let mut clients = self.clients.write();
        let mut id = now_millis();
        while clients.contains_key(&id) {
            id += 1;
        }
        clients.insert(id, tx);
        tracing::debug!(client = id, connected = clients.len(), "live client connected");
        (id, rx)
    }

    pub fn unregister(&self, id: u64) {
        if self.clients.write().remove(&id).is_some() {
            tracing::debug!(client = id, "live client disconnected");
        }
    }

    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.read().is_empty()
    }

    /// Send `event` to every client, pruning the ones that went away.
    ///
    /// Works on a snapshot of the set, so clients may connect or leave while
    /// the broadcast runs. Returns the number of clients reached.
    pub fn broadcast(&self, event: &LiveEvent) -> usize {
        let snapshot: Vec<(u64, mpsc::Sender<LiveEvent>)> = self
            .clients
            .read()
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        let mut delivered = 0;
        let mut gone = Vec::new();
        for (id, tx) in snapshot {
            match tx.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::debug!(client = id, "live client lagging, event dropped");
                }
                Err(TrySendError::Closed(_)) => gone.push(id),
            }
        }

        for id in gone {
            self.unregister(id);
        }
        tracing::debug!(event = event.name(), delivered, "broadcast");
        delivered
    }
}
