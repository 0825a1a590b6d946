use super::entry::RecycleReason;
use super::stats::PoolStats;
use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

lazy_static! {
    pub static ref SESSIONS_AVAILABLE: IntGauge = register_int_gauge!(
        "warmpool_sessions_available",
        "Number of idle sessions ready to be acquired"
    )
    .expect("register warmpool_sessions_available gauge");
    pub static ref SESSIONS_IN_USE: IntGauge = register_int_gauge!(
        "warmpool_sessions_in_use",
        "Number of sessions currently checked out"
    )
    .expect("register warmpool_sessions_in_use gauge");
    pub static ref ACQUIRES: IntCounter = register_int_counter!(
        "warmpool_acquires_total",
        "Total number of successful session acquisitions"
    )
    .expect("register warmpool_acquires_total counter");
    pub static ref ACQUIRE_TIMEOUTS: IntCounter = register_int_counter!(
        "warmpool_acquire_timeouts_total",
        "Total number of acquisitions that timed out on an exhausted pool"
    )
    .expect("register warmpool_acquire_timeouts_total counter");
    pub static ref RELEASES: IntCounter = register_int_counter!(
        "warmpool_releases_total",
        "Total number of sessions returned to the pool"
    )
    .expect("register warmpool_releases_total counter");
    pub static ref RECYCLES: IntCounterVec = register_int_counter_vec!(
        "warmpool_recycles_total",
        "Total number of sessions replaced, by reason",
        &["reason"]
    )
    .expect("register warmpool_recycles_total counter_vec");
    pub static ref FACTORY_FAILURES: IntCounter = register_int_counter!(
        "warmpool_factory_failures_total",
        "Total number of failed session creations"
    )
    .expect("register warmpool_factory_failures_total counter");
}

#[derive(Debug, Clone, Copy)]
pub struct PoolMetrics;

impl PoolMetrics {
    #[inline]
    pub fn record_acquire() {
        ACQUIRES.inc();
    }

    #[inline]
    pub fn record_acquire_timeout() {
        ACQUIRE_TIMEOUTS.inc();
    }

    #[inline]
    pub fn record_release() {
        RELEASES.inc();
    }

    #[inline]
    pub fn record_recycle(reason: RecycleReason) {
        RECYCLES.with_label_values(&[reason.as_str()]).inc();
    }

    #[inline]
    pub fn record_factory_failure() {
        FACTORY_FAILURES.inc();
    }

    #[inline]
    pub fn record_occupancy(stats: &PoolStats) {
        SESSIONS_AVAILABLE.set(stats.available as i64);
        SESSIONS_IN_USE.set(stats.in_use as i64);
    }
}
