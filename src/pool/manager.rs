use super::config::PoolConfig;
use super::entry::{EntrySnapshot, EntryState, PoolEntry, RecycleReason};
use super::maintenance::MaintenanceTask;
#[cfg(feature = "metrics")]
use super::metrics::PoolMetrics;
use super::stats::{PoolStats, PoolStatus};
use crate::session::SessionFactory;
use crate::telemetry::{PoolEvent, PoolEventKind, TelemetryHistory, TelemetrySeverity};
use crate::utils::error::{Result, WarmPoolError};
use futures::future::join_all;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

struct PoolState<S> {
    available: VecDeque<PoolEntry<S>>,
    in_use: HashMap<String, PoolEntry<S>>,
    running: bool,
    /// Bumped on every successful start so late returns from a previous run are not re-admitted.
    generation: u64,
    /// Cancelled by `stop`; wakes waiting acquirers and the maintenance loop.
    shutdown: CancellationToken,
    /// One permit per entry sitting in `available`. Takers hold a permit before popping.
    /// Replaced on every start, so permits stranded by an earlier run cannot leak in.
    permits: Arc<Semaphore>,
}

impl<S> PoolState<S> {
    fn accepts(&self, generation: u64) -> bool {
        self.running && self.generation == generation
    }

    fn stats(&self, capacity: usize) -> PoolStats {
        PoolStats {
            capacity,
            available: self.available.len(),
            in_use: self.in_use.len(),
            running: self.running,
        }
    }
}

/// State shared between the pool handle and its maintenance task.
pub(crate) struct PoolCore<F: SessionFactory> {
    pub(crate) config: PoolConfig,
    factory: Arc<F>,
    state: Mutex<PoolState<F::Session>>,
    pub(crate) telemetry: TelemetryHistory,
}

impl<F: SessionFactory> PoolCore<F> {
    pub(crate) async fn create_entry(&self) -> anyhow::Result<PoolEntry<F::Session>> {
        self.factory.create().await.map(PoolEntry::new)
    }

    /// Remove the oldest idle entry without waiting, for maintenance.
    pub(crate) async fn take_available(&self, generation: u64) -> Option<PoolEntry<F::Session>> {
        let mut state = self.state.lock().await;
        if !state.accepts(generation) {
            return None;
        }

        state.permits.try_acquire().ok()?.forget();
        state.available.pop_front()
    }

    /// Put an entry back at the tail of the idle queue, or close it if the run it
    /// belongs to has ended.
    pub(crate) async fn enqueue(&self, entry: PoolEntry<F::Session>, generation: u64) {
        let rejected = {
            let mut state = self.state.lock().await;
            if state.accepts(generation) {
                state.available.push_back(entry);
                state.permits.add_permits(1);
                #[cfg(feature = "metrics")]
                PoolMetrics::record_occupancy(&state.stats(self.config.capacity));
                None
            } else {
                Some(entry)
            }
        };

        if let Some(entry) = rejected {
            debug!("Pool no longer running, closing session {}", entry.id);
            entry.close().await;
        }
    }

    /// Finish a recycle attempt. On success the old session is closed and the
    /// replacement returned; on failure the old entry is kept so the slot survives.
    pub(crate) async fn complete_recycle(
        &self,
        old: PoolEntry<F::Session>,
        created: anyhow::Result<PoolEntry<F::Session>>,
        reason: RecycleReason,
    ) -> PoolEntry<F::Session> {
        match created {
            Ok(replacement) => {
                debug!("Replaced session {} with {}", old.id, replacement.id);
                #[cfg(feature = "metrics")]
                PoolMetrics::record_recycle(reason);
                self.telemetry
                    .record(
                        PoolEvent::new(
                            TelemetrySeverity::Info,
                            PoolEventKind::Recycled,
                            format!("Session recycled ({})", reason),
                        )
                        .with_entry(old.id.clone())
                        .with_details(json!({
                            "replacement": replacement.id,
                            "reason": reason,
                            "executions": old.execution_count,
                            "age_seconds": old.age().as_secs(),
                        })),
                    )
                    .await;
                old.close().await;
                replacement
            }
            Err(err) => {
                warn!(
                    "Failed to recreate session {} ({}), keeping current session: {:#}",
                    old.id, reason, err
                );
                #[cfg(feature = "metrics")]
                PoolMetrics::record_factory_failure();
                self.telemetry
                    .record(
                        PoolEvent::new(
                            TelemetrySeverity::Warning,
                            PoolEventKind::RecycleFailed,
                            format!("Session factory failed: {:#}", err),
                        )
                        .with_entry(old.id.clone()),
                    )
                    .await;
                old
            }
        }
    }

    pub(crate) async fn stats(&self) -> PoolStats {
        self.state.lock().await.stats(self.config.capacity)
    }

    pub(crate) async fn available_len(&self) -> usize {
        self.state.lock().await.available.len()
    }
}

/// Bounded pool of pre-warmed sessions.
///
/// Construct once at startup, `start` it, share it behind an `Arc`, and `stop` it on
/// shutdown. Sessions are handed out FIFO by `acquire` and must be given back with
/// `release`; sessions past their execution or age budget are replaced on release, and
/// idle ones past their age are replaced by a background maintenance task.
pub struct ResourcePool<F: SessionFactory> {
    core: Arc<PoolCore<F>>,
    /// Also serializes `start` and `stop`.
    maintenance: Mutex<Option<MaintenanceTask>>,
}

impl<F: SessionFactory> ResourcePool<F> {
    pub fn new(config: PoolConfig, factory: F) -> Self {
        Self::with_telemetry(config, Arc::new(factory), TelemetryHistory::default())
    }

    pub fn with_telemetry(config: PoolConfig, factory: Arc<F>, telemetry: TelemetryHistory) -> Self {
        let state = PoolState {
            available: VecDeque::with_capacity(config.capacity),
            in_use: HashMap::with_capacity(config.capacity),
            running: false,
            generation: 0,
            shutdown: CancellationToken::new(),
            permits: Arc::new(Semaphore::new(0)),
        };

        Self {
            core: Arc::new(PoolCore {
                config,
                factory,
                state: Mutex::new(state),
                telemetry,
            }),
            maintenance: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.core.config
    }

    pub fn factory(&self) -> &Arc<F> {
        &self.core.factory
    }

    pub fn telemetry(&self) -> &TelemetryHistory {
        &self.core.telemetry
    }

    /// Pre-warm `capacity` sessions and launch maintenance.
    ///
    /// A factory failure aborts the start: every session created so far is closed and
    /// the error is returned. Starting a running pool only logs a warning.
    pub async fn start(&self) -> Result<()> {
        let mut maintenance = self.maintenance.lock().await;
        if self.is_running().await {
            warn!("Session pool already running");
            return Ok(());
        }

        let capacity = self.core.config.capacity;
        info!("Starting session pool with {} sessions", capacity);

        let results = join_all((0..capacity).map(|_| self.core.create_entry())).await;

        let mut entries = Vec::with_capacity(capacity);
        let mut failure = None;
        for result in results {
            match result {
                Ok(entry) => {
                    entries.push(entry);
                    debug!("Pre-warmed session {}/{}", entries.len(), capacity);
                }
                Err(err) => {
                    #[cfg(feature = "metrics")]
                    PoolMetrics::record_factory_failure();
                    if failure.is_none() {
                        failure = Some(err);
                    } else {
                        warn!("Additional pre-warm failure: {:#}", err);
                    }
                }
            }
        }

        if let Some(err) = failure {
            error!(
                "Session pool failed to start, closing {} pre-warmed sessions: {:#}",
                entries.len(),
                err
            );
            join_all(entries.into_iter().map(PoolEntry::close)).await;
            self.core
                .telemetry
                .record(PoolEvent::new(
                    TelemetrySeverity::Error,
                    PoolEventKind::StartFailed,
                    format!("Pre-warm failed: {:#}", err),
                ))
                .await;
            return Err(WarmPoolError::Factory(err));
        }

        let token = CancellationToken::new();
        let generation = {
            let mut state = self.core.state.lock().await;
            state.available.extend(entries);
            state.running = true;
            state.generation += 1;
            state.shutdown = token.clone();
            state.permits = Arc::new(Semaphore::new(capacity));
            #[cfg(feature = "metrics")]
            PoolMetrics::record_occupancy(&state.stats(capacity));
            state.generation
        };

        *maintenance = Some(MaintenanceTask::spawn(
            Arc::clone(&self.core),
            generation,
            token,
        ));

        self.core
            .telemetry
            .record(PoolEvent::new(
                TelemetrySeverity::Info,
                PoolEventKind::Started,
                format!("Session pool started with {} sessions", capacity),
            ))
            .await;
        info!("Session pool started successfully");
        Ok(())
    }

    /// Stop maintenance and close every session, idle or checked out. No-op when stopped.
    pub async fn stop(&self) {
        let mut maintenance = self.maintenance.lock().await;
        let token = {
            let mut state = self.core.state.lock().await;
            if !state.running {
                return;
            }
            state.running = false;
            state.shutdown.clone()
        };

        info!("Stopping session pool...");
        token.cancel();

        if let Some(task) = maintenance.take() {
            task.shutdown().await;
        }

        let (available, in_use) = {
            let mut state = self.core.state.lock().await;
            let available = std::mem::take(&mut state.available);
            let in_use = std::mem::take(&mut state.in_use);
            state.permits.close();
            #[cfg(feature = "metrics")]
            PoolMetrics::record_occupancy(&state.stats(self.core.config.capacity));
            (available, in_use)
        };

        let closed = available.len() + in_use.len();
        for entry in available {
            entry.close().await;
        }
        for entry in in_use.into_values() {
            entry.close().await;
        }

        self.core
            .telemetry
            .record(PoolEvent::new(
                TelemetrySeverity::Info,
                PoolEventKind::Stopped,
                format!("Session pool stopped, closed {} sessions", closed),
            ))
            .await;
        info!("Session pool stopped");
    }

    /// Check out the next idle session, waiting up to `timeout`.
    ///
    /// Returns the session handle and the entry id to pass to [`release`](Self::release).
    pub async fn acquire(&self, timeout: Duration) -> Result<(Arc<F::Session>, String)> {
        let (generation, shutdown, permits) = {
            let state = self.core.state.lock().await;
            if !state.running {
                return Err(WarmPoolError::PoolNotRunning);
            }
            (state.generation, state.shutdown.clone(), Arc::clone(&state.permits))
        };

        // The permit is held, not forgotten, until the entry is popped under the lock,
        // so a caller dropped while waiting for the lock hands it straight back.
        let permit = tokio::select! {
            biased;
            acquired = tokio::time::timeout(timeout, permits.acquire()) => match acquired {
                Ok(Ok(permit)) => permit,
                Ok(Err(_)) => return Err(WarmPoolError::PoolNotRunning),
                Err(_) => {
                    warn!("No sessions available (timeout after {:?})", timeout);
                    #[cfg(feature = "metrics")]
                    PoolMetrics::record_acquire_timeout();
                    self.core
                        .telemetry
                        .record(PoolEvent::new(
                            TelemetrySeverity::Warning,
                            PoolEventKind::Exhausted,
                            format!("No session became available within {:?}", timeout),
                        ))
                        .await;
                    return Err(WarmPoolError::PoolExhausted { timeout });
                }
            },
            _ = shutdown.cancelled() => return Err(WarmPoolError::PoolNotRunning),
        };

        let mut state = self.core.state.lock().await;
        permit.forget();
        if !state.accepts(generation) {
            return Err(WarmPoolError::PoolNotRunning);
        }
        let entry = state
            .available
            .pop_front()
            .ok_or(WarmPoolError::PoolNotRunning)?;

        let id = entry.id.clone();
        let session = Arc::clone(&entry.session);
        state.in_use.insert(id.clone(), entry);

        #[cfg(feature = "metrics")]
        {
            PoolMetrics::record_acquire();
            PoolMetrics::record_occupancy(&state.stats(self.core.config.capacity));
        }
        debug!("Acquired session {}", id);

        Ok((session, id))
    }

    /// [`acquire`](Self::acquire) with the configured default timeout.
    pub async fn acquire_default(&self) -> Result<(Arc<F::Session>, String)> {
        self.acquire(self.core.config.acquire_timeout).await
    }

    /// Return a checked-out session. Unknown ids are logged and ignored.
    ///
    /// An entry that only needs requeueing goes back under the same lock that removes
    /// it from `in_use`. Recycling runs on a spawned task, so dropping this future
    /// mid-recycle still requeues (or closes) the entry.
    pub async fn release(&self, entry_id: &str) {
        let (entry, generation, reason) = {
            let mut state = self.core.state.lock().await;
            let Some(mut entry) = state.in_use.remove(entry_id) else {
                warn!("Attempted to release unknown session {}", entry_id);
                return;
            };

            entry.execution_count += 1;
            #[cfg(feature = "metrics")]
            PoolMetrics::record_release();

            match entry.recycle_reason(&self.core.config) {
                Some(reason) => (entry, state.generation, reason),
                None => {
                    state.available.push_back(entry);
                    state.permits.add_permits(1);
                    #[cfg(feature = "metrics")]
                    PoolMetrics::record_occupancy(&state.stats(self.core.config.capacity));
                    drop(state);
                    debug!("Released session {}", entry_id);
                    return;
                }
            }
        };

        info!(
            "Recreating session {} (executions: {}, age: {}s)",
            entry.id,
            entry.execution_count,
            entry.age().as_secs()
        );

        let core = Arc::clone(&self.core);
        let recycle = tokio::spawn(async move {
            let created = core.create_entry().await;
            let entry = core.complete_recycle(entry, created, reason).await;
            core.enqueue(entry, generation).await;
        });

        if let Err(e) = recycle.await {
            error!("Recycle task for session {} failed: {}", entry_id, e);
            return;
        }
        debug!("Released session {}", entry_id);
    }

    pub async fn is_running(&self) -> bool {
        self.core.state.lock().await.running
    }

    pub async fn stats(&self) -> PoolStats {
        self.core.stats().await
    }

    pub async fn status(&self) -> PoolStatus {
        PoolStatus::from(self.stats().await)
    }

    /// Idle entries in queue order, followed by checked-out entries.
    pub async fn entries(&self) -> Vec<EntrySnapshot> {
        let state = self.core.state.lock().await;
        state
            .available
            .iter()
            .map(|entry| EntrySnapshot::of(entry, EntryState::Available))
            .chain(
                state
                    .in_use
                    .values()
                    .map(|entry| EntrySnapshot::of(entry, EntryState::InUse)),
            )
            .collect()
    }
}
