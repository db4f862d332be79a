//! Root orchestrator: one exclusive screen plus an ordered set of open windows.
//!
//! [`UiRootViewModel`] owns every viewmodel opened through it. Opening a window
//! subscribes the root to that window's close-request signal; the handler
//! holds only weak references to the root and the window, so neither keeps the
//! other alive. Every mutation of the open set is announced exactly once on
//! [`UiRootViewModel::window_events`], and no internal borrow is held while
//! subscribers run, so they may call straight back into the root.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use hearth_ui::prelude::*;
//!
//! struct Settings(WindowState);
//! impl ViewModel for Settings {
//!     fn dispose(&self) { self.0.dispose(); }
//! }
//! impl WindowViewModel for Settings {
//!     fn id(&self) -> &str { self.0.id() }
//!     fn close_requested(&self) -> &Signal<()> { self.0.close_requested() }
//! }
//!
//! let root = UiRootViewModel::new();
//! let settings = Rc::new(Settings(WindowState::new("Settings")));
//!
//! root.open_window(settings.clone());
//! assert_eq!(root.window_count(), 1);
//!
//! // The window asks to be closed; the root disposes and evicts it.
//! settings.0.request_close();
//! assert_eq!(root.window_count(), 0);
//! assert!(settings.0.is_disposed());
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::signal::{ReactiveProperty, Signal, Subscription};
use crate::view_model::{ViewModel, ViewModelKey, WindowViewModel};

// ---------------------------------------------------------------------------
// WindowEvent
// ---------------------------------------------------------------------------

/// Change notification for the open-window set.
#[derive(Clone)]
pub enum WindowEvent {
    /// `window` was appended at `index`.
    Added {
        index: usize,
        window: Rc<dyn WindowViewModel>,
    },
    /// `window` was removed from `index` (after being disposed).
    Removed {
        index: usize,
        window: Rc<dyn WindowViewModel>,
    },
}

impl WindowEvent {
    pub fn window(&self) -> &Rc<dyn WindowViewModel> {
        match self {
            WindowEvent::Added { window, .. } | WindowEvent::Removed { window, .. } => window,
        }
    }
}

impl fmt::Debug for WindowEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (kind, index, window) = match self {
            WindowEvent::Added { index, window } => ("Added", index, window),
            WindowEvent::Removed { index, window } => ("Removed", index, window),
        };
        f.debug_struct(kind)
            .field("index", index)
            .field("window", &window.id())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// UiRootViewModel
// ---------------------------------------------------------------------------

#[derive(Default)]
struct OpenWindows {
    /// Open windows in opening order, unique by instance.
    windows: Vec<Rc<dyn WindowViewModel>>,
    /// Close-request subscription of each open window.
    subscriptions: HashMap<ViewModelKey, Subscription>,
}

impl OpenWindows {
    fn position(&self, key: ViewModelKey) -> Option<usize> {
        self.windows.iter().position(|w| ViewModelKey::of(w) == key)
    }
}

/// Owner of the current screen and of every open window.
pub struct UiRootViewModel {
    me: Weak<UiRootViewModel>,
    screen: ReactiveProperty<Option<Rc<dyn ViewModel>>>,
    open: RefCell<OpenWindows>,
    window_events: Signal<WindowEvent>,
}

impl UiRootViewModel {
    /// Create an empty root with no screen and no windows.
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|me| Self {
            me: me.clone(),
            screen: ReactiveProperty::new(None),
            open: RefCell::new(OpenWindows::default()),
            window_events: Signal::new(),
        })
    }

    // -- screen ----------------------------------------------------------------

    /// Make `screen` current, disposing the previous screen first.
    ///
    /// Re-opening the screen that is already current does nothing.
    pub fn open_screen(&self, screen: Rc<dyn ViewModel>) {
        if let Some(current) = self.screen.get() {
            if ViewModelKey::of(&current) == ViewModelKey::of(&screen) {
                debug!("open_screen ignored: screen already current");
                return;
            }
            self.screen.replace_silently(None);
            current.dispose();
        }
        self.screen.set(Some(screen));
        debug!("screen opened");
    }

    /// The screen slot. Observing it replays the current screen.
    pub fn opened_screen(&self) -> &ReactiveProperty<Option<Rc<dyn ViewModel>>> {
        &self.screen
    }

    pub fn current_screen(&self) -> Option<Rc<dyn ViewModel>> {
        self.screen.get()
    }

    // -- windows ---------------------------------------------------------------

    /// Open `window` and start listening for its close requests.
    ///
    /// Returns `false` (and logs a warning) if this instance is already open
    /// or has been disposed. A disposed window can no longer ask to be
    /// closed, so it is never admitted to the open set.
    pub fn open_window(&self, window: Rc<dyn WindowViewModel>) -> bool {
        let key = ViewModelKey::of(&window);
        if self.open.borrow().position(key).is_some() {
            warn!(window = %window.id(), "open_window ignored: window already open");
            return false;
        }

        let root = self.me.clone();
        let target = Rc::downgrade(&window);
        let subscription = window.close_requested().subscribe(move |_| {
            if let (Some(root), Some(window)) = (root.upgrade(), target.upgrade()) {
                root.close_window(&window);
            }
        });
        if !subscription.is_active() {
            warn!(window = %window.id(), "open_window ignored: window is disposed");
            return false;
        }

        let index = {
            let mut open = self.open.borrow_mut();
            open.subscriptions.insert(key, subscription);
            open.windows.push(window.clone());
            open.windows.len() - 1
        };

        debug!(window = %window.id(), index, "window opened");
        self.window_events
            .emit(&WindowEvent::Added { index, window });
        true
    }

    /// Dispose `window`, remove it from the open set and drop its subscription.
    ///
    /// Returns `false` (and logs a warning) if this instance is not open.
    pub fn close_window(&self, window: &Rc<dyn WindowViewModel>) -> bool {
        let key = ViewModelKey::of(window);
        if self.open.borrow().position(key).is_none() {
            warn!(window = %window.id(), "close_window ignored: window not open");
            return false;
        }

        window.dispose();

        let removed = {
            let mut open = self.open.borrow_mut();
            // `dispose` may have re-entered and closed the window already.
            open.position(key).map(|index| {
                open.windows.remove(index);
                (index, open.subscriptions.remove(&key))
            })
        };
        let Some((index, subscription)) = removed else {
            return true;
        };

        debug!(window = %window.id(), index, "window closed");
        self.window_events.emit(&WindowEvent::Removed {
            index,
            window: window.clone(),
        });

        if let Some(subscription) = subscription {
            subscription.dispose();
        }
        true
    }

    /// Close every open window, front to back.
    pub fn close_all_windows(&self) {
        loop {
            let front = self.open.borrow().windows.first().cloned();
            match front {
                Some(window) => {
                    self.close_window(&window);
                }
                None => break,
            }
        }
    }

    /// Close all windows, then dispose and clear the current screen.
    ///
    /// The root stays usable afterwards.
    pub fn dispose(&self) {
        self.close_all_windows();
        if let Some(screen) = self.screen.get() {
            screen.dispose();
            self.screen.set(None);
        }
    }

    /// Fired once per addition to or removal from the open set.
    pub fn window_events(&self) -> &Signal<WindowEvent> {
        &self.window_events
    }

    /// Snapshot of the open windows in opening order.
    pub fn opened_windows(&self) -> Vec<Rc<dyn WindowViewModel>> {
        self.open.borrow().windows.clone()
    }

    pub fn window_count(&self) -> usize {
        self.open.borrow().windows.len()
    }

    pub fn is_window_open(&self, window: &Rc<dyn WindowViewModel>) -> bool {
        self.open.borrow().position(ViewModelKey::of(window)).is_some()
    }

    /// Number of live close-request subscriptions held by the root.
    pub fn subscription_count(&self) -> usize {
        self.open
            .borrow()
            .subscriptions
            .values()
            .filter(|s| s.is_active())
            .count()
    }
}

impl fmt::Debug for UiRootViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = self.open.borrow();
        f.debug_struct("UiRootViewModel")
            .field("has_screen", &self.screen.get().is_some())
            .field(
                "windows",
                &open.windows.iter().map(|w| w.id().to_owned()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
