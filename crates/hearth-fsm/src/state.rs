//! State contract and transition tokens.
//!
//! A state is any type implementing [`State<P>`], where `P` is the payload
//! type shared by every state of one machine. Machines that need per-state
//! payloads use an enum for `P` and match on the variant they expect.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// A state that can be entered and exited by a [`StateMachine`](crate::machine::StateMachine).
///
/// `enter` runs synchronously. If the body starts asynchronous work (a scene
/// load, a template fetch), its continuation should keep the
/// [`TransitionToken`] and check [`TransitionToken::is_current`] before acting,
/// because the machine does not wait for that work to finish.
pub trait State<P> {
    /// Called when the machine makes this state current.
    fn enter(&mut self, payload: P, token: TransitionToken);

    /// Called when the machine leaves this state for another one.
    fn exit(&mut self) {}
}

// ---------------------------------------------------------------------------
// TransitionToken
// ---------------------------------------------------------------------------

/// Generation stamp handed to a state when it is entered.
///
/// The machine bumps its generation counter at the start of every transition.
/// A token stays current until the next transition begins, so late callbacks
/// from a superseded state can detect that they are stale and do nothing.
#[derive(Clone)]
pub struct TransitionToken {
    generation: u64,
    counter: Rc<Cell<u64>>,
}

impl TransitionToken {
    pub(crate) fn new(generation: u64, counter: Rc<Cell<u64>>) -> Self {
        Self {
            generation,
            counter,
        }
    }

    /// The generation this token was issued for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// `true` while no later transition has started.
    pub fn is_current(&self) -> bool {
        self.counter.get() == self.generation
    }
}

impl fmt::Debug for TransitionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionToken")
            .field("generation", &self.generation)
            .field("current", &self.is_current())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_goes_stale_when_counter_advances() {
        let counter = Rc::new(Cell::new(3));
        let token = TransitionToken::new(3, counter.clone());
        assert!(token.is_current());
        assert_eq!(token.generation(), 3);

        counter.set(4);
        assert!(!token.is_current());
    }
}
