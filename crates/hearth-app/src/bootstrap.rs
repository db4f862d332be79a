//! Startup wiring.
//!
//! [`GameBootstrapper`] builds every long-lived collaborator once and passes
//! them explicitly: the asset provider and composition root go to the UI
//! root factory, the scene loader goes to the bootstrap state, and the state
//! machine owns both flow states. Nothing is looked up globally.
//!
//! ```
//! use std::rc::Rc;
//! use hearth_app::prelude::*;
//!
//! let scenes = Rc::new(ManualSceneLoader::new(Some("boot")));
//! let game = GameBootstrapper::from_config(AppConfig::default(), scenes.clone()).unwrap();
//! game.start();
//! scenes.complete_all();
//! assert_eq!(game.machine().current(), Some(GameFlow::Gameplay));
//! game.shutdown();
//! ```

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use hearth_ui::collab::{AssetProvider, CompositionRoot};
use hearth_ui::root::UiRootViewModel;
use tracing::{info, warn};

use crate::assets::{CatalogAssetProvider, TemplateCatalog};
use crate::composition::{BinderRegistry, Services};
use crate::config::AppConfig;
use crate::scene::SceneLoader;
use crate::screens::register_default_binders;
use crate::states::{BootstrapState, FlowMachine, FlowPayload, GameFlow, GameplayState};
use crate::ui_factory::UiRootFactory;
use crate::AppError;

/// Owns the game's collaborators and drives its flow machine.
pub struct GameBootstrapper {
    config: AppConfig,
    scenes: Rc<dyn SceneLoader>,
    ui: Rc<UiRootFactory>,
    machine: Rc<FlowMachine>,
    started: Cell<bool>,
}

impl GameBootstrapper {
    /// Wire the game from explicit collaborators.
    pub fn new(
        config: AppConfig,
        assets: Rc<dyn AssetProvider>,
        composition: Rc<dyn CompositionRoot>,
        scenes: Rc<dyn SceneLoader>,
    ) -> Self {
        let ui = Rc::new(UiRootFactory::new(
            UiRootViewModel::new(),
            assets,
            composition,
        ));
        Self {
            config,
            scenes,
            ui,
            machine: Rc::new(FlowMachine::new()),
            started: Cell::new(false),
        }
    }

    /// Wire the game with a catalog built from `config.templates` and the
    /// default binders.
    pub fn from_config(config: AppConfig, scenes: Rc<dyn SceneLoader>) -> Result<Self, AppError> {
        let catalog = TemplateCatalog::from_templates(config.templates.iter().cloned())?;
        let assets = Rc::new(CatalogAssetProvider::new(catalog));
        let mut registry = BinderRegistry::new(Services::new());
        register_default_binders(&mut registry);
        Ok(Self::new(config, assets, Rc::new(registry), scenes))
    }

    /// Register the flow states and enter [`GameFlow::Bootstrap`].
    ///
    /// Only the first call does anything; later calls warn and return `false`.
    pub fn start(&self) -> bool {
        self.start_with(FlowPayload::None)
    }

    /// Like [`start`](Self::start), handing `payload` through to gameplay.
    pub fn start_with(&self, payload: FlowPayload) -> bool {
        if self.started.replace(true) {
            warn!("game already started");
            return false;
        }
        self.machine.register(
            GameFlow::Bootstrap,
            BootstrapState::new(
                self.scenes.clone(),
                Rc::downgrade(&self.machine),
                self.config.gameplay_scene.clone(),
            ),
        );
        self.machine.register(
            GameFlow::Gameplay,
            GameplayState::new(self.ui.clone(), self.config.ui_root_container.clone()),
        );
        info!(
            boot = %self.config.boot_scene,
            gameplay = %self.config.gameplay_scene,
            "game starting"
        );
        self.machine.enter_with(GameFlow::Bootstrap, payload);
        true
    }

    /// Tear down the UI root. The machine keeps its current state.
    pub fn shutdown(&self) {
        self.ui.destroy_ui_root();
        info!("game shut down");
    }

    pub fn machine(&self) -> &Rc<FlowMachine> {
        &self.machine
    }

    pub fn root(&self) -> &Rc<UiRootViewModel> {
        self.ui.root()
    }

    pub fn ui(&self) -> &Rc<UiRootFactory> {
        &self.ui
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn is_started(&self) -> bool {
        self.started.get()
    }
}

impl fmt::Debug for GameBootstrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameBootstrapper")
            .field("config", &self.config)
            .field("state", &self.machine.current())
            .field("started", &self.started.get())
            .field("ui", &self.ui)
            .finish()
    }
}
