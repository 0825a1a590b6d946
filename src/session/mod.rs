pub mod factory;
pub mod mock;

pub use factory::{PromptSession, Session, SessionFactory};
pub use mock::{MockCounters, MockSession, MockSessionFactory};
