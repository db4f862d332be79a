//! Creates and tears down the visual side of the shared UI root.
//!
//! The root viewmodel lives for the whole process. Each gameplay session
//! gets a fresh [`UiRootBinder`] and [`WindowsFactory`]; destroying the
//! session closes every visual and disposes whatever the root still holds,
//! leaving the root ready for the next session.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use hearth_ui::binder::Binder;
use hearth_ui::collab::{AssetProvider, CompositionRoot};
use hearth_ui::root::UiRootViewModel;
use hearth_ui::root_binder::UiRootBinder;
use hearth_ui::view_model::ViewModel;
use hearth_ui::windows::WindowsFactory;
use tracing::{debug, warn};

pub struct UiRootFactory {
    root: Rc<UiRootViewModel>,
    assets: Rc<dyn AssetProvider>,
    composition: Rc<dyn CompositionRoot>,
    binder: RefCell<Option<UiRootBinder>>,
}

impl UiRootFactory {
    pub fn new(
        root: Rc<UiRootViewModel>,
        assets: Rc<dyn AssetProvider>,
        composition: Rc<dyn CompositionRoot>,
    ) -> Self {
        Self {
            root,
            assets,
            composition,
            binder: RefCell::new(None),
        }
    }

    /// The shared root viewmodel.
    pub fn root(&self) -> &Rc<UiRootViewModel> {
        &self.root
    }

    /// Whether a binder is currently mirroring the root.
    pub fn is_created(&self) -> bool {
        self.binder.borrow().is_some()
    }

    /// Build a binder under `container` and bind it to the root.
    ///
    /// A binder left over from an earlier call is destroyed first, so at most
    /// one set of visuals exists at a time.
    pub fn create_ui_root(&self, container: &str) {
        let previous = self.binder.borrow_mut().take();
        if let Some(previous) = previous {
            debug!(container = %previous.container(), "replacing existing ui root binder");
            previous.destroy();
        }

        let windows = WindowsFactory::new(self.assets.clone(), self.composition.clone());
        let binder = UiRootBinder::new(container, windows);
        binder.bind(&self.root);
        *self.binder.borrow_mut() = Some(binder);
        debug!(container, "ui root created");
    }

    /// Destroy the binder and dispose the root's screen and windows.
    ///
    /// Safe to call when nothing was created.
    pub fn destroy_ui_root(&self) {
        let binder = self.binder.borrow_mut().take();
        if let Some(binder) = binder {
            binder.destroy();
        }
        self.root.dispose();
    }

    /// Attach a screen binder to the live UI root.
    ///
    /// Returns `false`, with a warning, when no UI root exists.
    pub fn attach_screen_binder<V: ViewModel>(&self, binder: Rc<RefCell<dyn Binder<V>>>) -> bool {
        match self.binder.borrow().as_ref() {
            Some(root_binder) => {
                root_binder.attach_screen_binder(binder);
                true
            }
            None => {
                warn!("screen binder attached with no ui root");
                false
            }
        }
    }

    /// Window visuals currently held by the live UI root.
    pub fn visual_count(&self) -> usize {
        self.binder
            .borrow()
            .as_ref()
            .map_or(0, |binder| binder.windows().visual_count())
    }

    /// Ids of windows whose visual is live.
    pub fn live_window_ids(&self) -> Vec<String> {
        self.binder
            .borrow()
            .as_ref()
            .map(|binder| binder.windows().live_window_ids())
            .unwrap_or_default()
    }
}

impl fmt::Debug for UiRootFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiRootFactory")
            .field("root", &self.root)
            .field("binder", &self.binder.borrow())
            .finish()
    }
}
