use std::time::Duration;

/// Runtime configuration for the session pool
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of sessions kept warm
    pub capacity: usize,
    /// Releases after which a session is recycled
    pub max_executions: u64,
    /// Age after which a session is recycled
    pub max_age: Duration,
    /// How often the maintenance loop sweeps idle sessions
    pub maintenance_interval: Duration,
    /// Wait used by `acquire_default`
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: 5,
            max_executions: 10,
            max_age: Duration::from_secs(30 * 60),
            maintenance_interval: Duration::from_secs(60),
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

impl PoolConfig {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn max_executions(mut self, max: u64) -> Self {
        self.max_executions = max;
        self
    }

    pub fn max_age(mut self, age: Duration) -> Self {
        self.max_age = age;
        self
    }

    pub fn maintenance_interval(mut self, interval: Duration) -> Self {
        self.maintenance_interval = interval;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }
}
