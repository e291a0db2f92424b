//! Hand-off router state machine
//!
//! Elm-style: [`transition`] is pure and returns the new state plus the
//! [`Effect`]s the session must apply.

mod effect;
pub mod event;
pub mod state;
pub mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::{Event, StepOutcome, UserResponse};
pub use state::{PendingRequest, RouterContext, RouterState, RunFailure};
pub use transition::{transition, TransitionError, TransitionResult};
