//! PM Copilot - multi-agent orchestration over a chat-completion API
//!
//! The core is a star-topology hand-off router: a coordinator participant
//! routes the user to specialists, each specialist hands back, and the
//! conversation suspends whenever a participant needs a user reply.
//!
//! - [`registry`]: participants, capabilities and hand-off edges, validated once
//! - [`conversation`]: the append-only turn log
//! - [`termination`]: farewell-phrase termination predicate
//! - [`state_machine`]: pure router transitions producing effects
//! - [`runtime`]: the turn executor and the session that applies effects
//! - [`llm`], [`tools`]: chat-completion client and mock directory tools
//! - [`workflows`]: the assistant and the sequential/concurrent/group-chat demos

pub mod config;
pub mod console;
pub mod conversation;
pub mod llm;
pub mod registry;
pub mod runtime;
pub mod state_machine;
pub mod termination;
pub mod tools;
pub mod workflows;

pub use config::Settings;
pub use conversation::{ConversationLog, Handoff, RequestId, Role, Turn};
pub use registry::{Capability, ConfigError, ParticipantId, ParticipantSpec, Registry};
pub use runtime::{Session, SessionConfig, SessionError, TurnExecutor};
pub use state_machine::{RouterState, RunFailure, UserResponse};
pub use termination::TerminationEvaluator;
