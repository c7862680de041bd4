//! Reloading the mirror from the store.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::mirror::Mirror;
use super::{DispatcherError, HuntDispatcher};
use crate::hunt::{now_micros, Hunt, HUNTS_NAMESPACE};

impl HuntDispatcher {
    /// Reloads the mirror from the store and returns the number of hunts.
    ///
    /// The store is read without holding the mirror lock. Hunts committed
    /// locally while the load was in flight keep their committed version.
    /// Concurrent refreshes are serialized. On error the current mirror stays
    /// in place.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<usize, DispatcherError> {
        let _refresh = self.refresh_lock.lock().await;
        let started = Instant::now();
        let start_epoch = self.commit_epoch.load(Ordering::SeqCst);

        let hunts = match self.store.list(HUNTS_NAMESPACE).await {
            Ok(hunts) => hunts,
            Err(e) => {
                metrics::counter!("fh_dispatcher_refresh_total", "result" => "error").increment(1);
                return Err(e.into());
            }
        };

        let size = self.publish(start_epoch, hunts).await;

        *self.last_refresh.write().await = Some(now_micros());
        self.refresh_count.fetch_add(1, Ordering::SeqCst);

        metrics::counter!("fh_dispatcher_refresh_total", "result" => "ok").increment(1);
        metrics::histogram!("fh_dispatcher_refresh_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        metrics::gauge!("fh_dispatcher_mirror_size").set(size as f64);

        debug!(hunts = size, "Dispatcher mirror refreshed");
        Ok(size)
    }

    /// Swaps in a mirror built from `hunts`, keeping entries committed after
    /// `start_epoch`.
    async fn publish(&self, start_epoch: u64, hunts: Vec<Hunt>) -> usize {
        let mut fresh = Mirror::from_hunts(hunts);
        let mut mirror = self.mirror.write().await;
        let mut carried = 0usize;
        for entry in mirror.committed_after(start_epoch) {
            fresh.insert(entry.hunt.clone(), entry.committed_at);
            carried += 1;
        }
        if carried > 0 {
            debug!(carried, "Kept hunts committed during refresh");
        }
        *mirror = fresh;
        mirror.len()
    }

    /// Spawns a task that refreshes the mirror every `interval` until
    /// `cancel` fires. Failed refreshes are logged and retried on the next
    /// tick.
    pub fn spawn_refresh_task(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let dispatcher = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            info!(interval_secs = interval.as_secs_f64(), "Starting dispatcher refresh task");

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("Dispatcher refresh task shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = dispatcher.refresh().await {
                            warn!(error = %e, kind = e.kind(), "Dispatcher refresh failed");
                        }
                    }
                }
            }
        })
    }
}
