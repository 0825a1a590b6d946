use async_trait::async_trait;

/// An opaque, expensive-to-create execution session.
///
/// The pool only ever holds sessions and closes them; it never looks inside.
#[async_trait]
pub trait Session: Send + Sync + 'static {
    /// Release whatever the session holds. Must tolerate being called during shutdown
    /// while a caller still has a handle to the session.
    async fn close(&self);
}

/// A session that can run a prompt. Only the HTTP execute route relies on this.
#[async_trait]
pub trait PromptSession: Session {
    async fn execute(&self, prompt: &str, agent: Option<&str>) -> anyhow::Result<String>;
}

/// Creates new sessions for the pool. Each call is a single attempt.
#[async_trait]
pub trait SessionFactory: Send + Sync + 'static {
    type Session: Session;

    async fn create(&self) -> anyhow::Result<Self::Session>;
}
