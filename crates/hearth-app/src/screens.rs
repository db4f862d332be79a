//! Gameplay viewmodels and their headless binders.
//!
//! The gameplay screen tracks the player's score; the settings window holds
//! one toggle and can ask to be closed. Their binders render nothing: they
//! trace what a real visual would display, which is enough to run the whole
//! lifecycle without a renderer.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use hearth_ui::binder::{Binder, WindowBinder};
use hearth_ui::signal::{ReactiveProperty, Signal, SubscriptionBag};
use hearth_ui::view_model::{DisposeFlag, ViewModel, WindowState, WindowViewModel};
use tracing::{debug, info};

use crate::composition::BinderRegistry;

/// Binder name for [`TracingWindowBinder`] in template catalogs.
pub const HEADLESS_BINDER: &str = "headless";

/// Template id of [`SettingsWindow`].
pub const SETTINGS_WINDOW_ID: &str = "Settings";

// ---------------------------------------------------------------------------
// GameplayScreen
// ---------------------------------------------------------------------------

/// Screen shown while playing.
#[derive(Debug)]
pub struct GameplayScreen {
    score: ReactiveProperty<u64>,
    disposed: DisposeFlag,
}

impl GameplayScreen {
    pub fn new(score: u64) -> Rc<Self> {
        Rc::new(Self {
            score: ReactiveProperty::new(score),
            disposed: DisposeFlag::new(),
        })
    }

    pub fn score(&self) -> &ReactiveProperty<u64> {
        &self.score
    }

    /// Register one click.
    pub fn click(&self) {
        if self.disposed.is_disposed() {
            return;
        }
        self.score.set(self.score.get() + 1);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.is_disposed()
    }
}

impl ViewModel for GameplayScreen {
    fn dispose(&self) {
        if self.disposed.mark() {
            debug!(score = self.score.get(), "gameplay screen disposed");
        }
    }
}

// ---------------------------------------------------------------------------
// SettingsWindow
// ---------------------------------------------------------------------------

/// Settings window with a music toggle.
pub struct SettingsWindow {
    state: WindowState,
    music_enabled: ReactiveProperty<bool>,
}

impl SettingsWindow {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            state: WindowState::new(SETTINGS_WINDOW_ID),
            music_enabled: ReactiveProperty::new(true),
        })
    }

    pub fn music_enabled(&self) -> &ReactiveProperty<bool> {
        &self.music_enabled
    }

    pub fn toggle_music(&self) {
        self.music_enabled.set(!self.music_enabled.get());
    }

    /// Ask the owner to close this window.
    pub fn close(&self) {
        self.state.request_close();
    }

    pub fn is_disposed(&self) -> bool {
        self.state.is_disposed()
    }
}

impl ViewModel for SettingsWindow {
    fn dispose(&self) {
        self.state.dispose();
    }
}

impl WindowViewModel for SettingsWindow {
    fn id(&self) -> &str {
        self.state.id()
    }

    fn close_requested(&self) -> &Signal<()> {
        self.state.close_requested()
    }
}

// ---------------------------------------------------------------------------
// Binders
// ---------------------------------------------------------------------------

/// Screen binder that mirrors the gameplay score.
#[derive(Debug, Default)]
pub struct HudBinder {
    displayed: Rc<Cell<u64>>,
    binds: u32,
    subscriptions: SubscriptionBag,
}

impl HudBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score currently shown.
    pub fn displayed_score(&self) -> u64 {
        self.displayed.get()
    }

    /// Number of screens this binder has been bound to.
    pub fn bind_count(&self) -> u32 {
        self.binds
    }
}

impl Binder<GameplayScreen> for HudBinder {
    fn bind(&mut self, view_model: Rc<GameplayScreen>) {
        self.subscriptions.dispose();
        self.binds += 1;
        let displayed = self.displayed.clone();
        self.subscriptions.add(view_model.score().observe(move |score| {
            displayed.set(*score);
            debug!(score, "hud updated");
        }));
    }
}

/// Window binder that traces its lifecycle instead of drawing.
pub struct TracingWindowBinder {
    template: String,
    parent: Option<String>,
    bound: RefCell<Option<String>>,
}

impl TracingWindowBinder {
    pub fn new(template: &str, parent: Option<&str>) -> Self {
        Self {
            template: template.to_owned(),
            parent: parent.map(str::to_owned),
            bound: RefCell::new(None),
        }
    }
}

impl Binder<dyn WindowViewModel> for TracingWindowBinder {
    fn bind(&mut self, view_model: Rc<dyn WindowViewModel>) {
        info!(
            template = %self.template,
            parent = ?self.parent,
            window = %view_model.id(),
            "window visual bound"
        );
        *self.bound.borrow_mut() = Some(view_model.id().to_owned());
    }
}

impl WindowBinder for TracingWindowBinder {
    fn close(&mut self) {
        info!(template = %self.template, window = ?self.bound.borrow(), "window visual closed");
        self.bound.borrow_mut().take();
    }
}

/// Register the binders every game shell needs.
pub fn register_default_binders(registry: &mut BinderRegistry) {
    registry.register(HEADLESS_BINDER, |template, parent, _services| {
        Ok(Box::new(TracingWindowBinder::new(&template.id, parent)))
    });
}
