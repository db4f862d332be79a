//! Game flow states.
//!
//! The game runs two states. [`BootstrapState`] loads the gameplay scene and
//! moves on once it is ready; [`GameplayState`] owns the UI root for as long
//! as play lasts.

use std::rc::{Rc, Weak};

use hearth_fsm::prelude::*;
use tracing::{debug, info};

use crate::scene::SceneLoader;
use crate::screens::GameplayScreen;
use crate::ui_factory::UiRootFactory;

/// Kinds of the game flow machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameFlow {
    Bootstrap,
    Gameplay,
}

/// Data handed to a flow state on entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowPayload {
    #[default]
    None,
    /// Resume a session at `score`.
    Session { score: u64 },
}

impl FlowPayload {
    fn score(self) -> u64 {
        match self {
            FlowPayload::None => 0,
            FlowPayload::Session { score } => score,
        }
    }
}

/// The machine driving the game flow.
pub type FlowMachine = StateMachine<GameFlow, FlowPayload>;

// ---------------------------------------------------------------------------
// BootstrapState
// ---------------------------------------------------------------------------

/// Loads the gameplay scene, then enters [`GameFlow::Gameplay`].
///
/// The scene load may finish after something else has already moved the
/// machine on. The completion only acts if the transition that started the
/// load is still the latest one.
pub struct BootstrapState {
    scenes: Rc<dyn SceneLoader>,
    machine: Weak<FlowMachine>,
    gameplay_scene: String,
}

impl BootstrapState {
    pub fn new(
        scenes: Rc<dyn SceneLoader>,
        machine: Weak<FlowMachine>,
        gameplay_scene: impl Into<String>,
    ) -> Self {
        Self {
            scenes,
            machine,
            gameplay_scene: gameplay_scene.into(),
        }
    }
}

impl State<FlowPayload> for BootstrapState {
    fn enter(&mut self, payload: FlowPayload, token: TransitionToken) {
        info!(scene = %self.gameplay_scene, generation = token.generation(), "bootstrapping");
        let machine = self.machine.clone();
        let scene = self.gameplay_scene.clone();
        self.scenes.load_scene(
            &self.gameplay_scene,
            Box::new(move || {
                if !token.is_current() {
                    debug!(
                        scene = %scene,
                        generation = token.generation(),
                        "scene loaded for a superseded bootstrap, ignoring"
                    );
                    return;
                }
                if let Some(machine) = machine.upgrade() {
                    machine.enter_with(GameFlow::Gameplay, payload);
                }
            }),
        );
    }
}

// ---------------------------------------------------------------------------
// GameplayState
// ---------------------------------------------------------------------------

/// Creates the UI root and shows the gameplay screen.
pub struct GameplayState {
    ui: Rc<UiRootFactory>,
    container: String,
    screen: Option<Rc<GameplayScreen>>,
}

impl GameplayState {
    pub fn new(ui: Rc<UiRootFactory>, container: impl Into<String>) -> Self {
        Self {
            ui,
            container: container.into(),
            screen: None,
        }
    }
}

impl State<FlowPayload> for GameplayState {
    fn enter(&mut self, payload: FlowPayload, _token: TransitionToken) {
        self.ui.create_ui_root(&self.container);
        let screen = GameplayScreen::new(payload.score());
        self.ui.root().open_screen(screen.clone());
        self.screen = Some(screen);
        info!(score = payload.score(), "gameplay started");
    }

    fn exit(&mut self) {
        self.ui.destroy_ui_root();
        if let Some(screen) = self.screen.take() {
            info!(score = screen.score().get(), "gameplay ended");
        }
    }
}

#[cfg(test)]
mod tests {
    use hearth_ui::collab::{AssetProvider, TemplateReady};
    use hearth_ui::root::UiRootViewModel;
    use hearth_ui::view_model::downcast_view_model;

    use super::*;
    use crate::composition::{BinderRegistry, Services};
    use crate::scene::ManualSceneLoader;

    struct NoTemplates;

    impl AssetProvider for NoTemplates {
        fn load_template(&self, _id: &str, ready: TemplateReady) {
            ready(None);
        }
    }

    fn ui() -> Rc<UiRootFactory> {
        Rc::new(UiRootFactory::new(
            UiRootViewModel::new(),
            Rc::new(NoTemplates),
            Rc::new(BinderRegistry::new(Services::new())),
        ))
    }

    fn machine(scenes: Rc<ManualSceneLoader>, ui: Rc<UiRootFactory>) -> Rc<FlowMachine> {
        let machine = Rc::new(FlowMachine::new());
        machine.register(
            GameFlow::Bootstrap,
            BootstrapState::new(scenes, Rc::downgrade(&machine), "game"),
        );
        machine.register(GameFlow::Gameplay, GameplayState::new(ui, "ui-root"));
        machine
    }

    #[test]
    fn session_score_reaches_the_screen() {
        let scenes = Rc::new(ManualSceneLoader::new(Some("boot")));
        let ui = ui();
        let machine = machine(scenes.clone(), ui.clone());

        machine.enter_with(GameFlow::Bootstrap, FlowPayload::Session { score: 42 });
        assert_eq!(machine.current(), Some(GameFlow::Bootstrap));
        scenes.complete_all();

        assert_eq!(machine.current(), Some(GameFlow::Gameplay));
        let screen = ui
            .root()
            .current_screen()
            .and_then(downcast_view_model::<GameplayScreen>)
            .unwrap();
        assert_eq!(screen.score().get(), 42);
    }

    #[test]
    fn already_active_scene_enters_gameplay_within_bootstrap() {
        let scenes = Rc::new(ManualSceneLoader::new(Some("game")));
        let ui = ui();
        let machine = machine(scenes, ui.clone());

        machine.enter(GameFlow::Bootstrap);
        assert_eq!(machine.current(), Some(GameFlow::Gameplay));
        assert_eq!(machine.generation(), 2);
        assert!(ui.is_created());
    }

    #[test]
    fn leaving_gameplay_destroys_the_ui_root() {
        let scenes = Rc::new(ManualSceneLoader::new(Some("game")));
        let ui = ui();
        let machine = machine(scenes.clone(), ui.clone());
        machine.enter(GameFlow::Gameplay);
        let screen = ui.root().current_screen().unwrap();

        machine.enter(GameFlow::Bootstrap);
        // Bootstrap immediately re-enters gameplay with a new screen.
        assert_eq!(machine.current(), Some(GameFlow::Gameplay));
        let replacement = ui.root().current_screen().unwrap();
        assert!(!Rc::ptr_eq(&screen, &replacement));
        let old = downcast_view_model::<GameplayScreen>(screen).unwrap();
        assert!(old.is_disposed());
    }
}
