use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Severity level of pool events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TelemetrySeverity {
    Info,
    Warning,
    Error,
}

/// What happened to the pool.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PoolEventKind {
    Started,
    StartFailed,
    Stopped,
    Recycled,
    RecycleFailed,
    Exhausted,
}

/// Single lifecycle observation about the session pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolEvent {
    pub timestamp: DateTime<Utc>,
    pub severity: TelemetrySeverity,
    pub kind: PoolEventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl PoolEvent {
    pub fn new(
        severity: TelemetrySeverity,
        kind: PoolEventKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            severity,
            kind,
            entry_id: None,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_entry(mut self, entry_id: impl Into<String>) -> Self {
        self.entry_id = Some(entry_id.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Bounded in-memory history of pool events, queried by the status API.
#[derive(Debug, Clone)]
pub struct TelemetryHistory {
    events: Arc<RwLock<VecDeque<PoolEvent>>>,
    max_events: usize,
    max_age: ChronoDuration,
}

impl Default for TelemetryHistory {
    fn default() -> Self {
        Self::new(1000, 24)
    }
}

impl TelemetryHistory {
    pub fn new(max_events: usize, retention_hours: u64) -> Self {
        Self {
            events: Arc::new(RwLock::new(VecDeque::with_capacity(max_events.max(1)))),
            max_events: max_events.max(1),
            max_age: ChronoDuration::hours(retention_hours as i64),
        }
    }

    /// Append an event, trimming by age and size.
    pub async fn record(&self, event: PoolEvent) {
        let mut events = self.events.write().await;

        let cutoff = Utc::now() - self.max_age;
        while events.front().is_some_and(|front| front.timestamp < cutoff) {
            events.pop_front();
        }

        events.push_back(event);

        while events.len() > self.max_events {
            events.pop_front();
        }
    }

    pub async fn get_events(&self) -> Vec<PoolEvent> {
        let events = self.events.read().await;
        events.iter().cloned().collect()
    }

    /// Events recorded within the last `minutes`.
    pub async fn get_events_since(&self, minutes: u32) -> Vec<PoolEvent> {
        let events = self.events.read().await;
        let cutoff = Utc::now()
            .checked_sub_signed(ChronoDuration::minutes(i64::from(minutes)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        events
            .iter()
            .filter(|event| event.timestamp >= cutoff)
            .cloned()
            .collect()
    }

    pub async fn count(&self, kind: PoolEventKind) -> usize {
        let events = self.events.read().await;
        events.iter().filter(|event| event.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn history_is_bounded() {
        let history = TelemetryHistory::new(2, 1);
        for i in 0..3 {
            history
                .record(PoolEvent::new(
                    TelemetrySeverity::Info,
                    PoolEventKind::Recycled,
                    format!("event {}", i),
                ))
                .await;
        }

        let events = history.get_events().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].message, "event 1");
        assert_eq!(events[1].message, "event 2");
    }

    #[tokio::test]
    async fn events_since_filters_old_entries() {
        let history = TelemetryHistory::new(10, 24);
        let mut old = PoolEvent::new(TelemetrySeverity::Info, PoolEventKind::Started, "old");
        old.timestamp = Utc::now() - ChronoDuration::minutes(30);
        history.record(old).await;
        history
            .record(
                PoolEvent::new(TelemetrySeverity::Warning, PoolEventKind::Exhausted, "new")
                    .with_entry("session_x"),
            )
            .await;

        let recent = history.get_events_since(5).await;
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].entry_id.as_deref(), Some("session_x"));
        assert_eq!(history.count(PoolEventKind::Started).await, 1);
    }

    #[tokio::test]
    async fn events_since_accepts_largest_window() {
        let history = TelemetryHistory::new(10, 24);
        history
            .record(PoolEvent::new(TelemetrySeverity::Info, PoolEventKind::Started, "started"))
            .await;

        let all = history.get_events_since(u32::MAX).await;
        assert_eq!(all.len(), 1);
    }
}
