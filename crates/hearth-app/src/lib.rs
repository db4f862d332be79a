//! Hearth App -- the game shell around the UI core.
//!
//! This crate wires a runnable game from the pieces in `hearth-fsm` and
//! `hearth-ui`:
//!
//! - [`config`] and [`logging`]: JSON configuration and `tracing` setup.
//! - [`assets`], [`composition`], [`scene`]: concrete collaborators (template
//!   catalog, binder registry, scene loader).
//! - [`screens`]: the gameplay screen, the settings window and their binders.
//! - [`states`]: the bootstrap and gameplay flow states.
//! - [`ui_factory`] and [`bootstrap`]: startup wiring and UI root lifetime.

#![deny(unsafe_code)]

pub mod assets;
pub mod bootstrap;
pub mod composition;
pub mod config;
pub mod logging;
pub mod scene;
pub mod screens;
pub mod states;
pub mod ui_factory;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while configuring and wiring the game.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The configuration file could not be read.
    #[error("failed to read config '{path}': {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The configuration or catalog JSON is malformed.
    #[error("invalid configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Two templates share an id.
    #[error("duplicate visual template '{id}'")]
    DuplicateTemplate { id: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::assets::{CatalogAssetProvider, DeferredAssetProvider, TemplateCatalog};
    pub use crate::bootstrap::GameBootstrapper;
    pub use crate::composition::{BinderFactory, BinderRegistry, Services};
    pub use crate::config::AppConfig;
    pub use crate::scene::{ManualSceneLoader, SceneLoaded, SceneLoader};
    pub use crate::screens::{
        register_default_binders, GameplayScreen, HudBinder, SettingsWindow, TracingWindowBinder,
        HEADLESS_BINDER, SETTINGS_WINDOW_ID,
    };
    pub use crate::states::{BootstrapState, FlowMachine, FlowPayload, GameFlow, GameplayState};
    pub use crate::ui_factory::UiRootFactory;
    pub use crate::AppError;
}
