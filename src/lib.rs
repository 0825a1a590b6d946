// Warmpool - pre-warmed session pool

pub mod api;
pub mod config;
pub mod pool;
pub mod session;
pub mod telemetry;
pub mod utils;

// Re-export commonly used types
pub use pool::{PoolConfig, ResourcePool};
pub use session::{Session, SessionFactory};
pub use utils::error::{Result, WarmPoolError};
