use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::ResponseCache;

/// How often the janitor sweeps expired entries
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Runs one sweep over the cache, returning the number of evicted entries
pub fn sweep(cache: &ResponseCache) -> usize {
    let removed = cache.evict_expired();
    tracing::info!(
        removed = removed,
        size = cache.len(),
        "Cache cleanup completed"
    );
    removed
}

/// Handle for stopping the janitor task
pub struct JanitorHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl JanitorHandle {
    /// Signals the janitor to stop and waits for it to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Cache janitor task failed");
        }
        tracing::info!("Cache janitor stopped");
    }
}

/// Spawns a background task that sweeps the cache every `period`
///
/// The first sweep happens one full period after spawning. The task runs
/// until [`JanitorHandle::shutdown`] is called.
pub fn spawn_janitor(cache: Arc<ResponseCache>, period: Duration) -> JanitorHandle {
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);

    let task = tokio::spawn(async move {
        tracing::info!(period_secs = period.as_secs(), "Cache janitor started");

        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    sweep(&cache);
                }
                _ = shutdown_rx.recv() => {
                    break;
                }
            }
        }
    });

    JanitorHandle { shutdown_tx, task }
}
