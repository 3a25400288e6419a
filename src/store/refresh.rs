//! Periodic Refresh
//!
//! The fixed-interval loop that re-runs the refresh cycle, owned through a
//! [`RefreshHandle`].

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::{MappingStore, StoreState};
use crate::error::{MappingError, Result};

/// Handle to a running refresh loop. Dropping it aborts the loop and frees
/// the store for another `start`.
pub struct RefreshHandle {
    store: Arc<MappingStore>,
    id: u64,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    /// Stop the loop and wait for it to exit. An in-flight cycle is dropped.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!("Refresh loop ended abnormally: {}", e);
                }
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            release(&self.store, self.id);
        }
    }
}

/// Clear the store's loop owner, unless a newer loop already holds it
fn release(store: &MappingStore, id: u64) {
    let _ = store
        .loop_owner
        .compare_exchange(id, 0, Ordering::SeqCst, Ordering::SeqCst);
}

/// Releases the store however the loop task ends
struct LoopGuard {
    store: Arc<MappingStore>,
    id: u64,
}

impl Drop for LoopGuard {
    fn drop(&mut self) {
        release(&self.store, self.id);
    }
}

impl MappingStore {
    /// Start the refresh loop. The first tick fires one interval from now,
    /// since `init` already ran a cycle.
    pub fn start(self: &Arc<Self>) -> Result<RefreshHandle> {
        let state = self.state();
        if !matches!(state, StoreState::Ready | StoreState::Refreshing) {
            return Err(MappingError::NotReady(state.as_str()));
        }
        let period = self.refresh_interval;
        if period.is_zero() {
            return Err(MappingError::Config("refresh interval must be positive".into()));
        }

        let id = self.loop_ids.fetch_add(1, Ordering::SeqCst) + 1;
        if self
            .loop_owner
            .compare_exchange(0, id, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(MappingError::AlreadyRunning);
        }

        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let guard = LoopGuard {
            store: Arc::clone(self),
            id,
        };

        info!("Starting refresh loop (every {:?})", period);

        let task = tokio::spawn(async move {
            let store = &guard.store;
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {}
                }

                tokio::select! {
                    _ = &mut stop_rx => break,
                    result = store.refresh() => {
                        if let Err(e) = result {
                            debug!("Refresh tick failed, next tick retries: {}", e);
                        }
                    }
                }
            }

            info!("Refresh loop stopped");
        });

        Ok(RefreshHandle {
            store: Arc::clone(self),
            id,
            stop: Some(stop_tx),
            task: Some(task),
        })
    }
}
