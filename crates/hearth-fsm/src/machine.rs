//! Kind-keyed state registry and transition engine.
//!
//! The [`StateMachine`] owns one instance per state kind. Kinds are plain
//! enumerations (any `Copy + Eq + Hash + Debug` type), so lookups never depend
//! on runtime type information.
//!
//! All methods take `&self`. A state body may hold an `Rc<StateMachine>` and
//! request another transition from inside `enter` or `exit`; such requests are
//! queued and run, in order, as soon as the running transition completes.
//!
//! # Example
//!
//! ```
//! use hearth_fsm::prelude::*;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Flow { Boot, Menu }
//!
//! struct Noop;
//! impl State<()> for Noop {
//!     fn enter(&mut self, _payload: (), _token: TransitionToken) {}
//! }
//!
//! let machine: StateMachine<Flow> = StateMachine::new();
//! machine.register(Flow::Boot, Noop);
//! machine.register(Flow::Menu, Noop);
//!
//! machine.enter(Flow::Boot);
//! machine.enter(Flow::Menu);
//! assert_eq!(machine.current(), Some(Flow::Menu));
//! assert_eq!(machine.generation(), 2);
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

use tracing::{debug, error};

use crate::state::{State, TransitionToken};
use crate::FsmError;

type SharedState<P> = Rc<RefCell<dyn State<P>>>;

// ---------------------------------------------------------------------------
// StateMachine
// ---------------------------------------------------------------------------

/// Generic finite-state machine keyed by an enumerated kind `K`.
///
/// `P` is the payload type passed to [`State::enter`]. Machines whose states
/// take no payload use the default `()`.
pub struct StateMachine<K, P = ()> {
    /// One registered instance per kind.
    states: RefCell<HashMap<K, SharedState<P>>>,
    /// Kind of the current state, `None` before the first transition.
    current: Cell<Option<K>>,
    /// Generation of the most recent transition. Shared with issued tokens.
    generation: Rc<Cell<u64>>,
    /// Set while a transition body is running.
    transitioning: Cell<bool>,
    /// Transitions requested while another one was running.
    queued: RefCell<VecDeque<(K, P)>>,
}

impl<K, P> StateMachine<K, P>
where
    K: Copy + Eq + Hash + Debug + 'static,
    P: 'static,
{
    /// Create an empty machine with no current state.
    pub fn new() -> Self {
        Self {
            states: RefCell::new(HashMap::new()),
            current: Cell::new(None),
            generation: Rc::new(Cell::new(0)),
            transitioning: Cell::new(false),
            queued: RefCell::new(VecDeque::new()),
        }
    }

    /// Register `state` under `kind`.
    ///
    /// Registering a kind twice is a configuration mistake: it is logged, the
    /// earlier instance is kept, and `false` is returned.
    pub fn register<S>(&self, kind: K, state: S) -> bool
    where
        S: State<P> + 'static,
    {
        let mut states = self.states.borrow_mut();
        if states.contains_key(&kind) {
            error!(
                error = %FsmError::DuplicateState { kind: format!("{kind:?}") },
                "state registration ignored"
            );
            return false;
        }
        states.insert(kind, Rc::new(RefCell::new(state)));
        true
    }

    /// Whether a state is registered under `kind`.
    pub fn is_registered(&self, kind: K) -> bool {
        self.states.borrow().contains_key(&kind)
    }

    /// Number of registered states.
    pub fn state_count(&self) -> usize {
        self.states.borrow().len()
    }

    /// Kind of the current state.
    pub fn current(&self) -> Option<K> {
        self.current.get()
    }

    /// Generation of the most recent transition (0 before the first one).
    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    /// Enter `kind` with the default payload.
    ///
    /// # Panics
    ///
    /// Panics if no state is registered under `kind`. Transitioning to an
    /// unregistered state is a programming error.
    pub fn enter(&self, kind: K)
    where
        P: Default,
    {
        self.enter_with(kind, P::default());
    }

    /// Enter `kind`, passing `payload` to its [`State::enter`].
    ///
    /// # Panics
    ///
    /// Panics if no state is registered under `kind`.
    pub fn enter_with(&self, kind: K, payload: P) {
        if let Err(e) = self.try_enter_with(kind, payload) {
            panic!("{e}");
        }
    }

    /// Fallible form of [`enter`](Self::enter).
    pub fn try_enter(&self, kind: K) -> Result<(), FsmError>
    where
        P: Default,
    {
        self.try_enter_with(kind, P::default())
    }

    /// Fallible form of [`enter_with`](Self::enter_with).
    ///
    /// The target is validated before the current state is exited, so a
    /// failed request leaves the machine untouched.
    pub fn try_enter_with(&self, kind: K, payload: P) -> Result<(), FsmError> {
        if !self.is_registered(kind) {
            return Err(FsmError::UnregisteredState {
                kind: format!("{kind:?}"),
            });
        }

        if self.transitioning.get() {
            debug!(to = ?kind, "transition requested mid-transition, queued");
            self.queued.borrow_mut().push_back((kind, payload));
            return Ok(());
        }

        let _guard = TransitionGuard::acquire(&self.transitioning, &self.queued);
        self.run_transition(kind, payload);
        loop {
            let next = self.queued.borrow_mut().pop_front();
            match next {
                Some((kind, payload)) => self.run_transition(kind, payload),
                None => break,
            }
        }
        Ok(())
    }

    fn state(&self, kind: K) -> Option<SharedState<P>> {
        self.states.borrow().get(&kind).cloned()
    }

    /// Exit the current state, then enter `kind`. `kind` must be registered.
    fn run_transition(&self, kind: K, payload: P) {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);

        let previous = self.current.get();
        if let Some(previous) = previous.and_then(|k| self.state(k)) {
            previous.borrow_mut().exit();
        }

        // The registry never shrinks and `kind` was validated on request.
        let target = self
            .state(kind)
            .expect("transition target must be registered");
        self.current.set(Some(kind));

        debug!(from = ?previous, to = ?kind, generation, "state transition");

        let token = TransitionToken::new(generation, self.generation.clone());
        target.borrow_mut().enter(payload, token);
    }
}

impl<K, P> Default for StateMachine<K, P>
where
    K: Copy + Eq + Hash + Debug + 'static,
    P: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Clears the `transitioning` flag and the queue even if a state body panics.
///
/// On a normal exit the queue is already empty. After a panic, requests
/// queued by the failed transition are dropped instead of leaking into the
/// next unrelated `enter`.
struct TransitionGuard<'a, K, P> {
    flag: &'a Cell<bool>,
    queued: &'a RefCell<VecDeque<(K, P)>>,
}

impl<'a, K, P> TransitionGuard<'a, K, P> {
    fn acquire(flag: &'a Cell<bool>, queued: &'a RefCell<VecDeque<(K, P)>>) -> Self {
        flag.set(true);
        Self { flag, queued }
    }
}

impl<K, P> Drop for TransitionGuard<'_, K, P> {
    fn drop(&mut self) {
        self.flag.set(false);
        // Payload destructors run outside the borrow.
        let stale = std::mem::take(&mut *self.queued.borrow_mut());
        drop(stale);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::rc::Weak;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Kind {
        Bootstrap,
        Gameplay,
        Unregistered,
    }

    /// Appends `"<name>.enter"` / `"<name>.exit"` to a shared log.
    struct Recording {
        name: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl State<()> for Recording {
        fn enter(&mut self, _payload: (), _token: TransitionToken) {
            self.log.borrow_mut().push(format!("{}.enter", self.name));
        }

        fn exit(&mut self) {
            self.log.borrow_mut().push(format!("{}.exit", self.name));
        }
    }

    fn recording_machine() -> (StateMachine<Kind>, Rc<RefCell<Vec<String>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let machine = StateMachine::new();
        machine.register(
            Kind::Bootstrap,
            Recording {
                name: "bootstrap",
                log: log.clone(),
            },
        );
        machine.register(
            Kind::Gameplay,
            Recording {
                name: "gameplay",
                log: log.clone(),
            },
        );
        (machine, log)
    }

    #[test]
    fn enter_sets_current() {
        let (machine, log) = recording_machine();
        assert_eq!(machine.current(), None);

        machine.enter(Kind::Bootstrap);
        assert_eq!(machine.current(), Some(Kind::Bootstrap));
        assert_eq!(*log.borrow(), vec!["bootstrap.enter"]);
    }

    #[test]
    fn exit_runs_once_before_next_enter() {
        let (machine, log) = recording_machine();
        machine.enter(Kind::Bootstrap);
        machine.enter(Kind::Gameplay);

        assert_eq!(machine.current(), Some(Kind::Gameplay));
        assert_eq!(
            *log.borrow(),
            vec!["bootstrap.enter", "bootstrap.exit", "gameplay.enter"]
        );
    }

    #[test]
    #[should_panic(expected = "Unregistered")]
    fn enter_unregistered_panics() {
        let (machine, _log) = recording_machine();
        machine.enter(Kind::Unregistered);
    }

    #[test]
    fn try_enter_unregistered_leaves_machine_untouched() {
        let (machine, log) = recording_machine();
        machine.enter(Kind::Bootstrap);

        let err = machine.try_enter(Kind::Unregistered).unwrap_err();
        assert!(matches!(err, FsmError::UnregisteredState { .. }));
        assert_eq!(machine.current(), Some(Kind::Bootstrap));
        assert_eq!(machine.generation(), 1);
        assert_eq!(*log.borrow(), vec!["bootstrap.enter"]);
    }

    #[test]
    fn duplicate_registration_keeps_first() {
        let (machine, log) = recording_machine();
        let accepted = machine.register(
            Kind::Bootstrap,
            Recording {
                name: "impostor",
                log: log.clone(),
            },
        );
        assert!(!accepted);
        assert_eq!(machine.state_count(), 2);

        machine.enter(Kind::Bootstrap);
        assert_eq!(*log.borrow(), vec!["bootstrap.enter"]);
    }

    #[test]
    fn reentering_current_state_exits_and_enters_again() {
        let (machine, log) = recording_machine();
        machine.enter(Kind::Bootstrap);
        machine.enter(Kind::Bootstrap);
        assert_eq!(
            *log.borrow(),
            vec!["bootstrap.enter", "bootstrap.exit", "bootstrap.enter"]
        );
    }

    // -- payloads ------------------------------------------------------------

    #[derive(Debug, Clone, PartialEq, Default)]
    enum Payload {
        #[default]
        None,
        Level(u32),
    }

    struct LevelState {
        seen: Rc<RefCell<Vec<Payload>>>,
    }

    impl State<Payload> for LevelState {
        fn enter(&mut self, payload: Payload, _token: TransitionToken) {
            self.seen.borrow_mut().push(payload);
        }
    }

    #[test]
    fn payload_reaches_state() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let machine: StateMachine<Kind, Payload> = StateMachine::new();
        machine.register(Kind::Gameplay, LevelState { seen: seen.clone() });

        machine.enter_with(Kind::Gameplay, Payload::Level(7));
        machine.enter(Kind::Gameplay);

        assert_eq!(*seen.borrow(), vec![Payload::Level(7), Payload::None]);
    }

    // -- re-entrancy and tokens ------------------------------------------------

    /// Requests `Gameplay` from inside its own `enter`.
    struct Chaining {
        machine: Weak<StateMachine<Kind>>,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl State<()> for Chaining {
        fn enter(&mut self, _payload: (), _token: TransitionToken) {
            self.log.borrow_mut().push("bootstrap.enter".to_owned());
            if let Some(machine) = self.machine.upgrade() {
                machine.enter(Kind::Gameplay);
            }
            self.log.borrow_mut().push("bootstrap.enter.done".to_owned());
        }

        fn exit(&mut self) {
            self.log.borrow_mut().push("bootstrap.exit".to_owned());
        }
    }

    #[test]
    fn transition_requested_from_enter_is_queued() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let machine = Rc::new(StateMachine::<Kind>::new());
        machine.register(
            Kind::Bootstrap,
            Chaining {
                machine: Rc::downgrade(&machine),
                log: log.clone(),
            },
        );
        machine.register(
            Kind::Gameplay,
            Recording {
                name: "gameplay",
                log: log.clone(),
            },
        );

        machine.enter(Kind::Bootstrap);

        assert_eq!(machine.current(), Some(Kind::Gameplay));
        assert_eq!(machine.generation(), 2);
        assert_eq!(
            *log.borrow(),
            vec![
                "bootstrap.enter",
                "bootstrap.enter.done",
                "bootstrap.exit",
                "gameplay.enter"
            ]
        );
    }

    /// Queues a transition to gameplay, then panics, the first time it is entered.
    struct Exploding {
        machine: Weak<StateMachine<Kind>>,
        armed: bool,
    }

    impl State<()> for Exploding {
        fn enter(&mut self, _payload: (), _token: TransitionToken) {
            if std::mem::replace(&mut self.armed, false) {
                if let Some(machine) = self.machine.upgrade() {
                    machine.enter(Kind::Gameplay);
                }
                panic!("bootstrap failed");
            }
        }
    }

    #[test]
    fn panicking_transition_discards_its_queued_requests() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let machine = Rc::new(StateMachine::<Kind>::new());
        machine.register(
            Kind::Bootstrap,
            Exploding {
                machine: Rc::downgrade(&machine),
                armed: true,
            },
        );
        machine.register(
            Kind::Gameplay,
            Recording {
                name: "gameplay",
                log: log.clone(),
            },
        );

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            machine.enter(Kind::Bootstrap);
        }));
        assert!(outcome.is_err());
        assert_eq!(machine.current(), Some(Kind::Bootstrap));

        machine.enter(Kind::Bootstrap);
        assert_eq!(machine.current(), Some(Kind::Bootstrap));
        assert_eq!(machine.generation(), 2);
        assert!(log.borrow().is_empty());
    }

    /// Stores the token it was entered with.
    struct TokenKeeper {
        token: Rc<RefCell<Option<TransitionToken>>>,
    }

    impl State<()> for TokenKeeper {
        fn enter(&mut self, _payload: (), token: TransitionToken) {
            *self.token.borrow_mut() = Some(token);
        }
    }

    #[test]
    fn token_is_superseded_by_next_transition() {
        let token = Rc::new(RefCell::new(None));
        let (machine, _log) = {
            let log = Rc::new(RefCell::new(Vec::new()));
            let machine = StateMachine::<Kind>::new();
            machine.register(
                Kind::Bootstrap,
                TokenKeeper {
                    token: token.clone(),
                },
            );
            machine.register(
                Kind::Gameplay,
                Recording {
                    name: "gameplay",
                    log: log.clone(),
                },
            );
            (machine, log)
        };

        machine.enter(Kind::Bootstrap);
        let issued = token.borrow().clone().unwrap();
        assert!(issued.is_current());

        machine.enter(Kind::Gameplay);
        assert!(!issued.is_current());
        assert_eq!(issued.generation(), 1);
    }
}
