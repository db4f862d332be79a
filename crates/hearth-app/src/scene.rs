//! Scene transition provider.
//!
//! Switching the active top-level scene is asynchronous: the caller passes a
//! completion callback that runs on the same thread once the scene is ready.
//! Only state bodies use this; the UI core never touches scenes.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;

use tracing::{debug, info};

/// Continuation run once a scene finished loading.
pub type SceneLoaded = Box<dyn FnOnce()>;

/// Switches the active top-level scene.
pub trait SceneLoader {
    /// Start loading `scene`; `on_complete` runs when it is active.
    ///
    /// Requesting the scene that is already active completes immediately
    /// without reloading it.
    fn load_scene(&self, scene: &str, on_complete: SceneLoaded);

    /// Name of the active scene, if any.
    fn active_scene(&self) -> Option<String>;
}

// ---------------------------------------------------------------------------
// ManualSceneLoader
// ---------------------------------------------------------------------------

/// Scene loader whose loads finish when the host says so.
///
/// Requests queue up until [`complete_next`](Self::complete_next) or
/// [`complete_all`](Self::complete_all) is called, which makes it suitable for
/// headless runs and for reproducing races between overlapping loads.
pub struct ManualSceneLoader {
    active: RefCell<Option<String>>,
    pending: RefCell<VecDeque<(String, SceneLoaded)>>,
}

impl ManualSceneLoader {
    pub fn new(active: Option<&str>) -> Self {
        Self {
            active: RefCell::new(active.map(str::to_owned)),
            pending: RefCell::new(VecDeque::new()),
        }
    }

    /// Number of loads still in flight.
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Finish the oldest load: activate its scene and run its callback.
    ///
    /// Returns `false` when nothing was pending.
    pub fn complete_next(&self) -> bool {
        let next = self.pending.borrow_mut().pop_front();
        let Some((scene, on_complete)) = next else {
            return false;
        };
        info!(scene = %scene, "scene loaded");
        *self.active.borrow_mut() = Some(scene);
        on_complete();
        true
    }

    /// Finish every load, including ones started by completion callbacks.
    pub fn complete_all(&self) -> usize {
        let mut completed = 0;
        while self.complete_next() {
            completed += 1;
        }
        completed
    }
}

impl SceneLoader for ManualSceneLoader {
    fn load_scene(&self, scene: &str, on_complete: SceneLoaded) {
        if self.active.borrow().as_deref() == Some(scene) {
            debug!(scene = %scene, "scene already active, completing immediately");
            on_complete();
            return;
        }
        debug!(scene = %scene, "scene load started");
        self.pending
            .borrow_mut()
            .push_back((scene.to_owned(), on_complete));
    }

    fn active_scene(&self) -> Option<String> {
        self.active.borrow().clone()
    }
}

impl fmt::Debug for ManualSceneLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualSceneLoader")
            .field("active", &self.active.borrow())
            .field("pending", &self.pending.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn load_completes_when_host_says_so() {
        let loader = ManualSceneLoader::new(Some("boot"));
        let done = Rc::new(Cell::new(false));
        let flag = done.clone();
        loader.load_scene("game", Box::new(move || flag.set(true)));

        assert!(!done.get());
        assert_eq!(loader.active_scene().as_deref(), Some("boot"));

        assert!(loader.complete_next());
        assert!(done.get());
        assert_eq!(loader.active_scene().as_deref(), Some("game"));
        assert!(!loader.complete_next());
    }

    #[test]
    fn active_scene_completes_immediately() {
        let loader = ManualSceneLoader::new(Some("game"));
        let done = Rc::new(Cell::new(false));
        let flag = done.clone();
        loader.load_scene("game", Box::new(move || flag.set(true)));
        assert!(done.get());
        assert_eq!(loader.pending(), 0);
    }
}
