//! Runtime for executing conversations
//!
//! [`Session`] drives the router state machine and applies its effects;
//! [`TurnExecutor`] runs one participant against the chat client and tools.

mod error;
mod executor;
mod session;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use error::SessionError;
pub use executor::{Execution, StepFailure, TurnExecutor, HANDOFF_PREFIX, TOOL_RESULT_PREFIX};
pub use session::{Session, SessionConfig, DEFAULT_MAX_STEPS};
pub use traits::*;
