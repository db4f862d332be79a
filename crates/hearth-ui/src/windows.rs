//! Window visual factory: the 1:1 map from open windows to live visuals.
//!
//! [`WindowsFactory`] resolves a window's template through the
//! [`AssetProvider`], builds the binder through the [`CompositionRoot`], binds
//! it and keeps the resulting [`WindowView`] until the window is closed.
//!
//! A mapping is recorded *before* the template load starts. Until the load
//! completes the entry is pending: a second open of the same instance is
//! ignored, and a close simply forgets the entry so the late template is
//! discarded when it arrives. Load or instantiation failures leave a failed
//! entry with no visual; they never propagate.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, error, warn};

use crate::binder::{VisualState, WindowView};
use crate::collab::{AssetProvider, CompositionRoot, VisualTemplate};
use crate::view_model::{ViewModelKey, WindowViewModel};

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

enum Slot {
    /// Template requested, not yet delivered.
    Pending {
        request: u64,
        parent: Option<String>,
    },
    /// Visual instantiated and bound.
    Live(WindowView),
    /// Live visual lent out while its visibility hook runs.
    Toggling,
    /// Template missing or instantiation failed; the window has no visual.
    Failed,
}

struct Entry {
    window: Rc<dyn WindowViewModel>,
    slot: Slot,
}

// ---------------------------------------------------------------------------
// WindowsFactory
// ---------------------------------------------------------------------------

/// Creates, owns and destroys one visual per open window.
pub struct WindowsFactory {
    me: Weak<WindowsFactory>,
    assets: Rc<dyn AssetProvider>,
    composition: Rc<dyn CompositionRoot>,
    entries: RefCell<HashMap<ViewModelKey, Entry>>,
    next_request: Cell<u64>,
}

impl WindowsFactory {
    pub fn new(assets: Rc<dyn AssetProvider>, composition: Rc<dyn CompositionRoot>) -> Rc<Self> {
        Rc::new_cyclic(|me| Self {
            me: me.clone(),
            assets,
            composition,
            entries: RefCell::new(HashMap::new()),
            next_request: Cell::new(0),
        })
    }

    /// Start materializing a visual for `window` under `parent`.
    ///
    /// Returns `false` (and logs a warning) if the instance already has a
    /// visual or a visual in flight.
    pub fn open_window(&self, window: Rc<dyn WindowViewModel>, parent: Option<&str>) -> bool {
        let key = ViewModelKey::of(&window);
        if self.entries.borrow().contains_key(&key) {
            warn!(window = %window.id(), "window {} is already open", window.id());
            return false;
        }

        let request = self.next_request.get();
        self.next_request.set(request + 1);
        self.entries.borrow_mut().insert(
            key,
            Entry {
                window: window.clone(),
                slot: Slot::Pending {
                    request,
                    parent: parent.map(str::to_owned),
                },
            },
        );

        debug!(window = %window.id(), request, "loading window template");
        let factory = self.me.clone();
        self.assets.load_template(
            window.id(),
            Box::new(move |template| {
                if let Some(factory) = factory.upgrade() {
                    factory.finish_open(key, request, template);
                }
            }),
        );
        true
    }

    /// Destroy the visual mapped to `window`.
    ///
    /// Returns `false` (and logs a warning) if nothing is mapped to it.
    pub fn close_window(&self, window: &Rc<dyn WindowViewModel>) -> bool {
        let key = ViewModelKey::of(window);
        let entry = self.entries.borrow_mut().remove(&key);
        match entry {
            None => {
                warn!(window = %window.id(), "window {} is not open, cannot close it", window.id());
                false
            }
            Some(Entry {
                slot: Slot::Live(mut view),
                ..
            }) => {
                view.destroy();
                debug!(window = %window.id(), "window visual destroyed");
                true
            }
            Some(Entry {
                slot: Slot::Pending { request, .. },
                ..
            }) => {
                debug!(window = %window.id(), request, "window closed before its template loaded");
                true
            }
            Some(Entry {
                slot: Slot::Failed | Slot::Toggling,
                ..
            }) => true,
        }
    }

    /// Destroy every visual and forget every mapping.
    pub fn close_all(&self) {
        let entries: Vec<Entry> = self
            .entries
            .borrow_mut()
            .drain()
            .map(|(_, entry)| entry)
            .collect();
        for entry in entries {
            if let Slot::Live(mut view) = entry.slot {
                view.destroy();
            }
        }
    }

    /// Show or hide the visual of `window`, if it has a live one.
    ///
    /// The binder's `on_enable`/`on_disable` hook runs with the map unlocked,
    /// so it may query the factory or close the window. A visual whose window
    /// was closed by its own hook is destroyed afterwards.
    pub fn set_visible(&self, window: &Rc<dyn WindowViewModel>, visible: bool) {
        let key = ViewModelKey::of(window);
        let lent = match self.entries.borrow_mut().get_mut(&key) {
            Some(entry) if matches!(entry.slot, Slot::Live(_)) => {
                match std::mem::replace(&mut entry.slot, Slot::Toggling) {
                    Slot::Live(view) => Some(view),
                    _ => None,
                }
            }
            _ => None,
        };
        let Some(mut view) = lent else {
            return;
        };

        view.set_visible(visible);

        let returned = match self.entries.borrow_mut().get_mut(&key) {
            Some(entry) if matches!(entry.slot, Slot::Toggling) => {
                entry.slot = Slot::Live(view);
                None
            }
            _ => Some(view),
        };
        if let Some(mut orphan) = returned {
            debug!(window = %window.id(), "window closed during visibility change, visual destroyed");
            orphan.destroy();
        }
    }

    // -- queries ---------------------------------------------------------------

    /// Whether `window` has a mapping (live, pending or failed).
    pub fn is_mapped(&self, window: &Rc<dyn WindowViewModel>) -> bool {
        self.entries.borrow().contains_key(&ViewModelKey::of(window))
    }

    /// Lifecycle state of `window`'s visual, if it has a live one.
    pub fn visual_state(&self, window: &Rc<dyn WindowViewModel>) -> Option<VisualState> {
        match self.entries.borrow().get(&ViewModelKey::of(window)) {
            Some(Entry {
                slot: Slot::Live(view),
                ..
            }) => Some(view.state()),
            _ => None,
        }
    }

    /// Number of live visuals.
    pub fn visual_count(&self) -> usize {
        self.entries
            .borrow()
            .values()
            .filter(|e| matches!(e.slot, Slot::Live(_) | Slot::Toggling))
            .count()
    }

    /// Number of windows whose template has not arrived yet.
    pub fn pending_count(&self) -> usize {
        self.entries
            .borrow()
            .values()
            .filter(|e| matches!(e.slot, Slot::Pending { .. }))
            .count()
    }

    /// Ids of the windows that currently have a live visual.
    pub fn live_window_ids(&self) -> Vec<String> {
        self.entries
            .borrow()
            .values()
            .filter(|e| matches!(e.slot, Slot::Live(_) | Slot::Toggling))
            .map(|e| e.window.id().to_owned())
            .collect()
    }

    // -- completion ------------------------------------------------------------

    fn is_pending(&self, key: ViewModelKey, request: u64) -> bool {
        matches!(
            self.entries.borrow().get(&key),
            Some(Entry { slot: Slot::Pending { request: r, .. }, .. }) if *r == request
        )
    }

    fn mark_failed(&self, key: ViewModelKey) {
        if let Some(entry) = self.entries.borrow_mut().get_mut(&key) {
            entry.slot = Slot::Failed;
        }
    }

    fn finish_open(&self, key: ViewModelKey, request: u64, template: Option<VisualTemplate>) {
        let pending = match self.entries.borrow().get(&key) {
            Some(Entry {
                window,
                slot: Slot::Pending { request: r, parent },
            }) if *r == request => Some((window.clone(), parent.clone())),
            _ => None,
        };
        let Some((window, parent)) = pending else {
            debug!(request, "stale template load discarded");
            return;
        };

        let Some(template) = template else {
            error!(window = %window.id(), "no template for window, it will have no visual");
            self.mark_failed(key);
            return;
        };

        let binder = match self.composition.instantiate(&template, parent.as_deref()) {
            Ok(binder) => binder,
            Err(e) => {
                error!(window = %window.id(), error = %e, "window visual instantiation failed");
                self.mark_failed(key);
                return;
            }
        };

        let mut view = WindowView::new(window.id(), binder);
        view.bind(window.clone());

        // Binding may have re-entered and closed the window.
        if !self.is_pending(key, request) {
            debug!(window = %window.id(), "window closed while binding, visual destroyed");
            view.destroy();
            return;
        }
        if let Some(entry) = self.entries.borrow_mut().get_mut(&key) {
            entry.slot = Slot::Live(view);
        }
        debug!(window = %window.id(), template = %template.id, "window visual created");
    }
}

impl fmt::Debug for WindowsFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowsFactory")
            .field("visuals", &self.visual_count())
            .field("pending", &self.pending_count())
            .finish()
    }
}
