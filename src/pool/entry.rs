use super::config::PoolConfig;
use crate::session::Session;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// Why a session is being replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecycleReason {
    ExecutionBudget,
    MaxAge,
}

impl RecycleReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExecutionBudget => "execution_budget",
            Self::MaxAge => "max_age",
        }
    }
}

impl fmt::Display for RecycleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pool-owned session plus its usage metadata.
///
/// Recycling never mutates an entry in place: a replacement gets a fresh id and counters.
pub(crate) struct PoolEntry<S> {
    pub(crate) id: String,
    pub(crate) session: Arc<S>,
    pub(crate) created_at: Instant,
    pub(crate) execution_count: u64,
}

impl<S: Session> PoolEntry<S> {
    pub(crate) fn new(session: S) -> Self {
        Self {
            id: format!("session_{}", Uuid::new_v4()),
            session: Arc::new(session),
            created_at: Instant::now(),
            execution_count: 0,
        }
    }

    pub(crate) fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    pub(crate) fn is_aged(&self, max_age: Duration) -> bool {
        self.age() >= max_age
    }

    /// Recycle check run on release, after the execution count was bumped.
    pub(crate) fn recycle_reason(&self, config: &PoolConfig) -> Option<RecycleReason> {
        if self.execution_count >= config.max_executions {
            Some(RecycleReason::ExecutionBudget)
        } else if self.is_aged(config.max_age) {
            Some(RecycleReason::MaxAge)
        } else {
            None
        }
    }

    pub(crate) async fn close(self) {
        self.session.close().await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    Available,
    InUse,
}

/// Point-in-time view of one pool entry
#[derive(Debug, Clone, Serialize)]
pub struct EntrySnapshot {
    pub id: String,
    pub execution_count: u64,
    pub age_seconds: u64,
    pub state: EntryState,
}

impl EntrySnapshot {
    pub(crate) fn of<S: Session>(entry: &PoolEntry<S>, state: EntryState) -> Self {
        Self {
            id: entry.id.clone(),
            execution_count: entry.execution_count,
            age_seconds: entry.age().as_secs(),
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MockSessionFactory, SessionFactory};

    async fn entry() -> PoolEntry<crate::session::MockSession> {
        let factory = MockSessionFactory::new();
        PoolEntry::new(factory.create().await.unwrap())
    }

    #[tokio::test]
    async fn fresh_entry_is_not_recycled() {
        let config = PoolConfig::new(1).max_executions(2);
        let entry = entry().await;

        assert!(entry.id.starts_with("session_"));
        assert_eq!(entry.execution_count, 0);
        assert_eq!(entry.recycle_reason(&config), None);
    }

    #[tokio::test]
    async fn execution_budget_triggers_recycle() {
        let config = PoolConfig::new(1).max_executions(2);
        let mut entry = entry().await;

        entry.execution_count = 1;
        assert_eq!(entry.recycle_reason(&config), None);

        entry.execution_count = 2;
        assert_eq!(
            entry.recycle_reason(&config),
            Some(RecycleReason::ExecutionBudget)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn age_triggers_recycle_at_boundary() {
        let config = PoolConfig::new(1).max_age(Duration::from_secs(60));
        let entry = entry().await;

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(entry.recycle_reason(&config), None);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(entry.recycle_reason(&config), Some(RecycleReason::MaxAge));
    }

    #[tokio::test]
    async fn distinct_entries_get_distinct_ids() {
        let a = entry().await;
        let b = entry().await;
        assert_ne!(a.id, b.id);
    }
}
