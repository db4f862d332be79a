//! Hearth FSM -- generic finite-state machine for application flow.
//!
//! States are registered once per enumerated kind and entered by kind. The
//! machine is UI-agnostic: it knows nothing about screens or windows, only
//! about calling `exit` on the state it leaves and `enter` on the state it
//! reaches.
//!
//! # Quick Start
//!
//! ```
//! use hearth_fsm::prelude::*;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Flow { Bootstrap, Gameplay }
//!
//! struct Quiet;
//! impl State<()> for Quiet {
//!     fn enter(&mut self, _payload: (), _token: TransitionToken) {}
//! }
//!
//! let machine: StateMachine<Flow> = StateMachine::new();
//! machine.register(Flow::Bootstrap, Quiet);
//! machine.register(Flow::Gameplay, Quiet);
//!
//! machine.enter(Flow::Bootstrap);
//! assert_eq!(machine.current(), Some(Flow::Bootstrap));
//! ```

#![deny(unsafe_code)]

pub mod machine;
pub mod state;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Configuration errors raised by the state machine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FsmError {
    /// A transition targeted a kind with no registered state.
    #[error("no state registered for kind {kind}")]
    UnregisteredState { kind: String },

    /// A second state was registered under an existing kind.
    #[error("state machine already has a state for kind {kind}")]
    DuplicateState { kind: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::machine::StateMachine;
    pub use crate::state::{State, TransitionToken};
    pub use crate::FsmError;
}
