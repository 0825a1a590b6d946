use super::factory::{PromptSession, Session, SessionFactory};
use anyhow::anyhow;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const PROMPT_PREVIEW_CHARS: usize = 50;

/// Counters shared between a mock factory and every session it produced.
#[derive(Debug, Default)]
pub struct MockCounters {
    created: AtomicUsize,
    failed: AtomicUsize,
    closed: AtomicUsize,
    double_closed: AtomicUsize,
}

impl MockCounters {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of `close` calls that hit an already closed session.
    pub fn double_closed(&self) -> usize {
        self.double_closed.load(Ordering::SeqCst)
    }

    /// Sessions created and not yet closed.
    pub fn live(&self) -> usize {
        self.created().saturating_sub(self.closed())
    }
}

/// In-process stand-in for a real execution session.
#[derive(Debug)]
pub struct MockSession {
    serial: u64,
    closed: AtomicBool,
    executions: AtomicU64,
    execute_delay: Duration,
    counters: Arc<MockCounters>,
}

impl MockSession {
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn executions(&self) -> u64 {
        self.executions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Session for MockSession {
    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            self.counters.double_closed.fetch_add(1, Ordering::SeqCst);
            return;
        }
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        info!("Closing mock session {}", self.serial);
    }
}

#[async_trait]
impl PromptSession for MockSession {
    async fn execute(&self, prompt: &str, _agent: Option<&str>) -> anyhow::Result<String> {
        if self.is_closed() {
            return Err(anyhow!("session {} is closed", self.serial));
        }

        self.executions.fetch_add(1, Ordering::SeqCst);
        if !self.execute_delay.is_zero() {
            tokio::time::sleep(self.execute_delay).await;
        }

        let preview: String = prompt.chars().take(PROMPT_PREVIEW_CHARS).collect();
        Ok(format!("Mock execution result for: {}...", preview))
    }
}

/// Factory producing [`MockSession`]s, with failure injection for tests.
#[derive(Debug)]
pub struct MockSessionFactory {
    counters: Arc<MockCounters>,
    next_serial: AtomicU64,
    fail_next: AtomicUsize,
    /// Once this many sessions were created successfully, every further call fails.
    fail_after: Option<usize>,
    create_delay: Duration,
    execute_delay: Duration,
}

impl Default for MockSessionFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSessionFactory {
    pub fn new() -> Self {
        Self {
            counters: Arc::new(MockCounters::default()),
            next_serial: AtomicU64::new(1),
            fail_next: AtomicUsize::new(0),
            fail_after: None,
            create_delay: Duration::ZERO,
            execute_delay: Duration::from_millis(100),
        }
    }

    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = delay;
        self
    }

    pub fn with_execute_delay(mut self, delay: Duration) -> Self {
        self.execute_delay = delay;
        self
    }

    pub fn fail_after(mut self, successes: usize) -> Self {
        self.fail_after = Some(successes);
        self
    }

    /// Make the next `count` calls to `create` fail.
    pub fn fail_next(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    pub fn counters(&self) -> Arc<MockCounters> {
        Arc::clone(&self.counters)
    }

    fn should_fail(&self) -> bool {
        let injected = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        injected
            || self
                .fail_after
                .is_some_and(|limit| self.counters.created() >= limit)
    }
}

#[async_trait]
impl SessionFactory for MockSessionFactory {
    type Session = MockSession;

    async fn create(&self) -> anyhow::Result<MockSession> {
        if !self.create_delay.is_zero() {
            tokio::time::sleep(self.create_delay).await;
        }

        if self.should_fail() {
            self.counters.failed.fetch_add(1, Ordering::SeqCst);
            return Err(anyhow!("mock session creation failed"));
        }

        let serial = self.next_serial.fetch_add(1, Ordering::SeqCst);
        self.counters.created.fetch_add(1, Ordering::SeqCst);
        debug!("Created mock session {}", serial);

        Ok(MockSession {
            serial,
            closed: AtomicBool::new(false),
            executions: AtomicU64::new(0),
            execute_delay: self.execute_delay,
            counters: Arc::clone(&self.counters),
        })
    }
}
