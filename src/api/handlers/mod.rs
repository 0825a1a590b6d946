pub mod execute;
pub mod management;
pub mod pool;

pub use execute::*;
pub use management::*;
pub use pool::*;

use crate::pool::ResourcePool;
use crate::session::SessionFactory;
use std::sync::Arc;
use std::time::Instant;

/// API state containing shared resources
pub struct ApiState<F: SessionFactory> {
    pub pool: Arc<ResourcePool<F>>,
    pub start_time: Instant,
}

impl<F: SessionFactory> ApiState<F> {
    pub fn new(pool: Arc<ResourcePool<F>>) -> Self {
        Self {
            pool,
            start_time: Instant::now(),
        }
    }
}

impl<F: SessionFactory> Clone for ApiState<F> {
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
            start_time: self.start_time,
        }
    }
}
