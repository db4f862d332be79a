//! Binders and the per-window visual lifecycle.
//!
//! A binder is the rendered side of a viewmodel. [`Binder<V>`] is the general
//! contract used for screens; [`WindowBinder`] adds teardown and visibility
//! hooks for window visuals. [`WindowView`] wraps a window binder and enforces
//! its lifecycle:
//!
//! ```text
//! Unbound --bind--> Bound --destroy--> Destroyed
//!    \______________destroy_____________/
//! ```

use std::fmt;
use std::rc::Rc;

use tracing::warn;

use crate::view_model::WindowViewModel;

// ---------------------------------------------------------------------------
// Binder traits
// ---------------------------------------------------------------------------

/// Attaches a visual to a viewmodel so it can observe viewmodel-specific state.
pub trait Binder<V: ?Sized> {
    fn bind(&mut self, view_model: Rc<V>);
}

/// Binder for a window visual.
pub trait WindowBinder: Binder<dyn WindowViewModel> {
    /// Tear the visual down and release everything it subscribed to.
    fn close(&mut self);

    /// The visual became visible.
    fn on_enable(&mut self) {}

    /// The visual was hidden.
    fn on_disable(&mut self) {}
}

// ---------------------------------------------------------------------------
// WindowView
// ---------------------------------------------------------------------------

/// Lifecycle position of a window visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualState {
    Unbound,
    Bound,
    Destroyed,
}

/// A live window visual owned by the synchronization layer.
pub struct WindowView {
    window_id: String,
    binder: Box<dyn WindowBinder>,
    state: VisualState,
    visible: bool,
}

impl WindowView {
    pub fn new(window_id: impl Into<String>, binder: Box<dyn WindowBinder>) -> Self {
        Self {
            window_id: window_id.into(),
            binder,
            state: VisualState::Unbound,
            visible: false,
        }
    }

    pub fn window_id(&self) -> &str {
        &self.window_id
    }

    pub fn state(&self) -> VisualState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Bind to `window` and show the visual.
    ///
    /// Only valid from `Unbound`; any other state logs a warning and returns
    /// `false`.
    pub fn bind(&mut self, window: Rc<dyn WindowViewModel>) -> bool {
        if self.state != VisualState::Unbound {
            warn!(
                window = %self.window_id,
                state = ?self.state,
                "bind ignored: visual is not unbound"
            );
            return false;
        }
        self.binder.bind(window);
        self.state = VisualState::Bound;
        self.set_visible(true);
        true
    }

    /// Show or hide a bound visual, firing the enable/disable hooks on change.
    pub fn set_visible(&mut self, visible: bool) {
        if self.state != VisualState::Bound || self.visible == visible {
            return;
        }
        self.visible = visible;
        if visible {
            self.binder.on_enable();
        } else {
            self.binder.on_disable();
        }
    }

    /// Hide and close the visual. Returns `false` if it was already destroyed.
    pub fn destroy(&mut self) -> bool {
        if self.state == VisualState::Destroyed {
            return false;
        }
        self.set_visible(false);
        self.binder.close();
        self.state = VisualState::Destroyed;
        true
    }
}

impl Drop for WindowView {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for WindowView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowView")
            .field("window_id", &self.window_id)
            .field("state", &self.state)
            .field("visible", &self.visible)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::signal::Signal;
    use crate::view_model::{ViewModel, WindowState};

    struct Dialog(WindowState);

    impl ViewModel for Dialog {
        fn dispose(&self) {
            self.0.dispose();
        }
    }

    impl WindowViewModel for Dialog {
        fn id(&self) -> &str {
            self.0.id()
        }

        fn close_requested(&self) -> &Signal<()> {
            self.0.close_requested()
        }
    }

    struct Journal(Rc<RefCell<Vec<&'static str>>>);

    impl Binder<dyn WindowViewModel> for Journal {
        fn bind(&mut self, _view_model: Rc<dyn WindowViewModel>) {
            self.0.borrow_mut().push("bind");
        }
    }

    impl WindowBinder for Journal {
        fn close(&mut self) {
            self.0.borrow_mut().push("close");
        }

        fn on_enable(&mut self) {
            self.0.borrow_mut().push("enable");
        }

        fn on_disable(&mut self) {
            self.0.borrow_mut().push("disable");
        }
    }

    fn dialog() -> Rc<dyn WindowViewModel> {
        Rc::new(Dialog(WindowState::new("Dialog")))
    }

    #[test]
    fn lifecycle_runs_hooks_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut view = WindowView::new("Dialog", Box::new(Journal(log.clone())));
        assert_eq!(view.state(), VisualState::Unbound);

        assert!(view.bind(dialog()));
        assert_eq!(view.state(), VisualState::Bound);
        assert!(view.is_visible());

        assert!(view.destroy());
        assert_eq!(view.state(), VisualState::Destroyed);
        assert_eq!(*log.borrow(), vec!["bind", "enable", "disable", "close"]);
    }

    #[test]
    fn double_bind_is_ignored() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut view = WindowView::new("Dialog", Box::new(Journal(log.clone())));
        assert!(view.bind(dialog()));
        assert!(!view.bind(dialog()));
        assert_eq!(log.borrow().iter().filter(|e| **e == "bind").count(), 1);
    }

    #[test]
    fn drop_destroys_exactly_once() {
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let mut view = WindowView::new("Dialog", Box::new(Journal(log.clone())));
            view.bind(dialog());
            view.destroy();
        }
        assert_eq!(log.borrow().iter().filter(|e| **e == "close").count(), 1);
    }

    #[test]
    fn unbound_view_cannot_be_bound_after_destroy() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut view = WindowView::new("Dialog", Box::new(Journal(log.clone())));
        view.destroy();
        assert!(!view.bind(dialog()));
        assert_eq!(*log.borrow(), vec!["close"]);
    }
}
