//! View synchronization for a [`UiRootViewModel`].
//!
//! [`UiRootBinder`] is the visual counterpart of the root viewmodel. Binding
//! materializes a visual for every window already open and then follows the
//! root's window events for as long as the binder lives. A single screen
//! binder can be attached; it rebinds to each screen the root opens.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::binder::Binder;
use crate::root::{UiRootViewModel, WindowEvent};
use crate::signal::{Subscription, SubscriptionBag};
use crate::view_model::{downcast_view_model, ViewModel};
use crate::windows::WindowsFactory;

/// Keeps window visuals and the screen binder in step with a root viewmodel.
pub struct UiRootBinder {
    container: String,
    windows: Rc<WindowsFactory>,
    root: RefCell<Option<Rc<UiRootViewModel>>>,
    subscriptions: RefCell<SubscriptionBag>,
    screen_slot: RefCell<Option<Subscription>>,
}

impl UiRootBinder {
    /// `container` names the parent that window visuals are created under.
    pub fn new(container: impl Into<String>, windows: Rc<WindowsFactory>) -> Self {
        Self {
            container: container.into(),
            windows,
            root: RefCell::new(None),
            subscriptions: RefCell::new(SubscriptionBag::new()),
            screen_slot: RefCell::new(None),
        }
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn windows(&self) -> &Rc<WindowsFactory> {
        &self.windows
    }

    pub fn is_bound(&self) -> bool {
        self.root.borrow().is_some()
    }

    /// Start mirroring `root`.
    ///
    /// Windows already open get their visuals immediately; later additions
    /// and removals are followed through the root's window events. Binding an
    /// already bound binder logs a warning and does nothing.
    pub fn bind(&self, root: &Rc<UiRootViewModel>) {
        if self.is_bound() {
            warn!(container = %self.container, "ui root binder is already bound");
            return;
        }
        *self.root.borrow_mut() = Some(root.clone());

        for window in root.opened_windows() {
            self.windows.open_window(window, Some(&self.container));
        }

        let windows = Rc::downgrade(&self.windows);
        let container = self.container.clone();
        let subscription = root.window_events().subscribe(move |event| {
            let Some(windows) = windows.upgrade() else {
                return;
            };
            match event {
                WindowEvent::Added { window, .. } => {
                    windows.open_window(window.clone(), Some(&container));
                }
                WindowEvent::Removed { window, .. } => {
                    windows.close_window(window);
                }
            }
        });
        self.subscriptions.borrow_mut().add(subscription);
        debug!(container = %self.container, "ui root bound");
    }

    /// Bind `binder` to the current screen and to every screen opened later.
    ///
    /// There is one screen slot: attaching again replaces the previous
    /// binder. Screens of a type other than `V` are skipped with a warning.
    pub fn attach_screen_binder<V: ViewModel>(&self, binder: Rc<RefCell<dyn Binder<V>>>) {
        let Some(root) = self.root.borrow().clone() else {
            warn!(container = %self.container, "screen binder attached before the root was bound");
            return;
        };

        // Release the old slot first so the replaced binder sees nothing more.
        if self.screen_slot.borrow_mut().take().is_some() {
            debug!(container = %self.container, "screen binder replaced");
        }

        let subscription = root.opened_screen().observe(move |screen| {
            let Some(screen) = screen else {
                return;
            };
            let Some(view_model) = downcast_view_model::<V>(screen.clone()) else {
                warn!(
                    expected = std::any::type_name::<V>(),
                    "screen binder skipped: screen has a different type"
                );
                return;
            };
            match binder.try_borrow_mut() {
                Ok(mut binder) => binder.bind(view_model),
                Err(_) => warn!("screen binder is busy, rebind skipped"),
            }
        });
        *self.screen_slot.borrow_mut() = Some(subscription);
    }

    /// Stop following the root and destroy every visual this binder created.
    pub fn destroy(&self) {
        self.subscriptions.borrow_mut().dispose();
        if let Some(slot) = self.screen_slot.borrow_mut().take() {
            slot.dispose();
        }
        self.windows.close_all();
        if self.root.borrow_mut().take().is_some() {
            debug!(container = %self.container, "ui root binder destroyed");
        }
    }
}

impl fmt::Debug for UiRootBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiRootBinder")
            .field("container", &self.container)
            .field("bound", &self.is_bound())
            .field("windows", &self.windows)
            .finish()
    }
}
