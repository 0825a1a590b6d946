use serde::{Deserialize, Serialize};

/// Snapshot of pool occupancy. Counts are approximate under concurrent traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub capacity: usize,
    pub available: usize,
    pub in_use: usize,
    pub running: bool,
}

impl PoolStats {
    /// Share of the pool checked out, in percent, rounded to two decimals.
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        let raw = self.in_use as f64 / self.capacity as f64 * 100.0;
        (raw * 100.0).round() / 100.0
    }

    pub fn is_healthy(&self) -> bool {
        self.running && self.available > 0
    }
}

/// Status document served to monitoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolStatus {
    pub pool_size: usize,
    pub available: usize,
    pub in_use: usize,
    pub utilization: f64,
    pub is_healthy: bool,
    pub is_running: bool,
}

impl From<PoolStats> for PoolStatus {
    fn from(stats: PoolStats) -> Self {
        Self {
            pool_size: stats.capacity,
            available: stats.available,
            in_use: stats.in_use,
            utilization: stats.utilization(),
            is_healthy: stats.is_healthy(),
            is_running: stats.running,
        }
    }
}
