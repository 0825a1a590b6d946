pub mod config;
pub mod entry;
mod maintenance;
pub mod manager;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod stats;

pub use config::PoolConfig;
pub use entry::{EntrySnapshot, EntryState, RecycleReason};
pub use manager::ResourcePool;
#[cfg(feature = "metrics")]
pub use metrics::PoolMetrics;
pub use stats::{PoolStats, PoolStatus};
