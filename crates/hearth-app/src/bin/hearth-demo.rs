//! Headless walk through the game flow.
//!
//! Run with:
//!   cargo run --bin hearth-demo -p hearth-app [-- path/to/config.json]
//!
//! Boots into gameplay, clicks a few times, opens and closes the settings
//! window, then shuts the UI down. Set `RUST_LOG=info` to watch it happen.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{bail, Context};
use hearth_app::logging;
use hearth_app::prelude::*;
use hearth_ui::view_model::downcast_view_model;

fn main() -> Result<(), anyhow::Error> {
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => AppConfig::default(),
    };
    logging::init(&config.log_filter);

    // ---------------------------------------------------------------------
    // Boot
    // ---------------------------------------------------------------------

    let scenes = Rc::new(ManualSceneLoader::new(Some(config.boot_scene.as_str())));
    let game = GameBootstrapper::from_config(config, scenes.clone())?;
    game.start();
    scenes.complete_all();

    if game.machine().current() != Some(GameFlow::Gameplay) {
        bail!("bootstrap did not reach gameplay");
    }

    // ---------------------------------------------------------------------
    // Play
    // ---------------------------------------------------------------------

    let hud = Rc::new(RefCell::new(HudBinder::new()));
    game.ui().attach_screen_binder::<GameplayScreen>(hud.clone());

    let screen = game
        .root()
        .current_screen()
        .and_then(downcast_view_model::<GameplayScreen>)
        .context("gameplay screen missing")?;
    for _ in 0..3 {
        screen.click();
    }

    let settings = SettingsWindow::new();
    game.root().open_window(settings.clone());
    settings.toggle_music();
    println!(
        "score {} | music {} | visuals {:?}",
        hud.borrow().displayed_score(),
        if settings.music_enabled().get() { "on" } else { "off" },
        game.ui().live_window_ids(),
    );
    settings.close();

    // ---------------------------------------------------------------------
    // Shutdown
    // ---------------------------------------------------------------------

    game.shutdown();
    println!(
        "shut down: windows {} | visuals {}",
        game.root().window_count(),
        game.ui().visual_count()
    );
    Ok(())
}
