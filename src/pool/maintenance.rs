use super::entry::RecycleReason;
use super::manager::PoolCore;
use crate::session::SessionFactory;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Handle to the background task that refreshes aged idle sessions.
pub(crate) struct MaintenanceTask {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SweepOutcome {
    pub checked: usize,
    pub refreshed: usize,
    pub failed: usize,
}

impl MaintenanceTask {
    pub(crate) fn spawn<F: SessionFactory>(
        core: Arc<PoolCore<F>>,
        generation: u64,
        token: CancellationToken,
    ) -> Self {
        let handle = tokio::spawn(run(core, generation, token.clone()));
        Self {
            token,
            handle: Some(handle),
        }
    }

    /// Cancel the loop and wait until it has fully exited.
    pub(crate) async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                if !err.is_cancelled() {
                    error!("Session pool maintenance task failed: {}", err);
                }
            }
        }
    }
}

impl Drop for MaintenanceTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run<F: SessionFactory>(core: Arc<PoolCore<F>>, generation: u64, token: CancellationToken) {
    info!("Session pool maintenance task started");

    let period = core.config.maintenance_interval;
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let outcome = sweep(&core, generation, &token).await;
        if outcome.failed > 0 {
            error!(
                "Error in pool maintenance: {} of {} session refreshes failed",
                outcome.failed, outcome.checked
            );
        }

        let stats = core.stats().await;
        debug!(
            "Pool status: {} available, {} in use ({} refreshed)",
            stats.available, stats.in_use, outcome.refreshed
        );
    }

    info!("Session pool maintenance task stopped");
}

/// Check every entry that was idle when the sweep began, one at a time.
///
/// Each entry is taken, checked, and put back before the next one is touched, so
/// at most one idle entry is out of the queue at any moment. In-use entries are never
/// looked at; only idle age matters here.
pub(crate) async fn sweep<F: SessionFactory>(
    core: &PoolCore<F>,
    generation: u64,
    token: &CancellationToken,
) -> SweepOutcome {
    let mut outcome = SweepOutcome::default();
    let pending = core.available_len().await;

    for _ in 0..pending {
        if token.is_cancelled() {
            break;
        }
        let Some(entry) = core.take_available(generation).await else {
            break;
        };
        outcome.checked += 1;

        if !entry.is_aged(core.config.max_age) {
            core.enqueue(entry, generation).await;
            continue;
        }

        info!(
            "Refreshing old session {} (age: {}s)",
            entry.id,
            entry.age().as_secs()
        );

        let created = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            created = core.create_entry() => Some(created),
        };

        let Some(created) = created else {
            core.enqueue(entry, generation).await;
            break;
        };

        if created.is_ok() {
            outcome.refreshed += 1;
        } else {
            outcome.failed += 1;
        }

        let entry = core
            .complete_recycle(entry, created, RecycleReason::MaxAge)
            .await;
        core.enqueue(entry, generation).await;
    }

    outcome
}
