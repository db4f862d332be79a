//! Hearth UI -- viewmodel-driven window orchestration.
//!
//! This crate holds the UI core of Hearth:
//!
//! - [`signal`]: single-threaded signals, subscriptions and reactive properties.
//! - [`view_model`]: the [`ViewModel`](view_model::ViewModel) and
//!   [`WindowViewModel`](view_model::WindowViewModel) contracts.
//! - [`root`]: [`UiRootViewModel`](root::UiRootViewModel), owner of the
//!   current screen and of every open window.
//! - [`windows`] and [`root_binder`]: the synchronization layer that keeps
//!   exactly one live visual per open window.
//! - [`collab`]: the asset provider and composition root contracts the
//!   synchronization layer consumes.
//!
//! Everything runs on one logical thread. Types are `!Send` and use
//! `Rc`/`RefCell` instead of locks.

#![deny(unsafe_code)]

pub mod binder;
pub mod collab;
pub mod root;
pub mod root_binder;
pub mod signal;
pub mod view_model;
pub mod windows;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors reported by UI collaborators.
///
/// The synchronization layer logs these and degrades to "no visual"; they
/// never cross the event boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UiError {
    /// No template is registered under the requested id.
    #[error("no visual template registered for '{id}'")]
    TemplateNotFound { id: String },

    /// The template names a binder the composition root does not know.
    #[error("template '{template}' uses unknown binder '{binder}'. Registered binders: [{registered}]")]
    UnknownBinder {
        template: String,
        binder: String,
        registered: String,
    },

    /// The binder factory refused to build the visual.
    #[error("failed to instantiate template '{template}': {reason}")]
    Instantiation { template: String, reason: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::binder::{Binder, VisualState, WindowBinder, WindowView};
    pub use crate::collab::{AssetProvider, CompositionRoot, TemplateReady, VisualTemplate};
    pub use crate::root::{UiRootViewModel, WindowEvent};
    pub use crate::root_binder::UiRootBinder;
    pub use crate::signal::{ReactiveProperty, Signal, Subscription, SubscriptionBag};
    pub use crate::view_model::{
        downcast_view_model, downcast_window, DisposeFlag, ViewModel, ViewModelKey,
        WindowState, WindowViewModel,
    };
    pub use crate::windows::WindowsFactory;
    pub use crate::UiError;
}
