use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, instrument, trace};

use super::{Notifier, NotifyError};
use crate::hunt::now_micros;

/// Default capacity of the wake-up channel.
pub const DEFAULT_WAKEUP_CAPACITY: usize = 1024;

/// A wake-up signal for one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WakeUp {
    pub client_id: String,
    pub sent_at: DateTime<Utc>,
}

/// Tracks connected clients and broadcasts wake-ups to them.
///
/// The connection layer registers clients as they connect and subscribes to
/// the wake-up channel to forward signals to the right connection.
pub struct ClientNotifier {
    clients: RwLock<BTreeSet<String>>,
    wakeup_tx: broadcast::Sender<WakeUp>,
    sent: AtomicU64,
    dropped: AtomicU64,
}

impl ClientNotifier {
    pub fn new(capacity: usize) -> Self {
        let (wakeup_tx, _) = broadcast::channel(capacity);
        Self {
            clients: RwLock::new(BTreeSet::new()),
            wakeup_tx,
            sent: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Marks a client as connected.
    pub async fn register(&self, client_id: impl Into<String>) {
        let client_id = client_id.into();
        trace!(client_id = %client_id, "Client connected");
        self.clients.write().await.insert(client_id);
    }

    /// Marks a client as disconnected.
    pub async fn unregister(&self, client_id: &str) -> bool {
        self.clients.write().await.remove(client_id)
    }

    /// Returns the connected client ids.
    pub async fn connected(&self) -> Vec<String> {
        self.clients.read().await.iter().cloned().collect()
    }

    /// Subscribes to the wake-up stream.
    pub fn subscribe(&self) -> broadcast::Receiver<WakeUp> {
        self.wakeup_tx.subscribe()
    }

    /// Wake-ups sent since creation.
    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// Wake-ups sent while nobody was subscribed.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for ClientNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_WAKEUP_CAPACITY)
    }
}

impl std::fmt::Debug for ClientNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientNotifier")
            .field("sent", &self.sent_count())
            .field("dropped", &self.dropped_count())
            .finish()
    }
}

#[async_trait]
impl Notifier for ClientNotifier {
    #[instrument(skip(self))]
    async fn notify_matching(&self, pattern: &str) -> Result<usize, NotifyError> {
        let regex = Regex::new(pattern).map_err(|e| NotifyError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

        let matching: Vec<String> = self
            .clients
            .read()
            .await
            .iter()
            .filter(|id| regex.is_match(id))
            .cloned()
            .collect();

        let sent_at = now_micros();
        for client_id in &matching {
            let wakeup = WakeUp {
                client_id: client_id.clone(),
                sent_at,
            };
            // No subscriber means no live connection to forward to.
            if self.wakeup_tx.send(wakeup).is_err() {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.sent.fetch_add(matching.len() as u64, Ordering::Relaxed);
        metrics::counter!("fh_notifications_total").increment(matching.len() as u64);

        debug!(notified = matching.len(), "Woke matching clients");
        Ok(matching.len())
    }
}
