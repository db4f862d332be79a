//! Composition root: builds window binders with their collaborators resolved.
//!
//! Collaborators are constructed once at startup, placed in a [`Services`]
//! container and handed to every binder factory. There is no ambient global
//! lookup: whatever a binder needs must have been inserted explicitly.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use hearth_ui::binder::WindowBinder;
use hearth_ui::collab::{CompositionRoot, VisualTemplate};
use hearth_ui::UiError;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

/// Typed container of shared collaborators, one instance per type.
#[derive(Default)]
pub struct Services {
    entries: HashMap<TypeId, Rc<dyn Any>>,
}

impl Services {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `service`, replacing any previous instance of the same type.
    pub fn insert<T: Any>(&mut self, service: Rc<T>) {
        self.entries.insert(TypeId::of::<T>(), service);
    }

    pub fn get<T: Any>(&self) -> Option<Rc<T>> {
        self.entries
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|service| service.downcast::<T>().ok())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("count", &self.entries.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// BinderRegistry
// ---------------------------------------------------------------------------

/// Builds a binder for `template`, created under `parent`.
pub type BinderFactory = Box<
    dyn Fn(&VisualTemplate, Option<&str>, &Services) -> Result<Box<dyn WindowBinder>, UiError>,
>;

/// [`CompositionRoot`] dispatching on the template's `binder` name.
pub struct BinderRegistry {
    services: Services,
    factories: HashMap<String, BinderFactory>,
}

impl BinderRegistry {
    pub fn new(services: Services) -> Self {
        Self {
            services,
            factories: HashMap::new(),
        }
    }

    /// Register `factory` under `name`.
    ///
    /// A name can be registered once; later registrations are logged and
    /// ignored, and `false` is returned.
    pub fn register<F>(&mut self, name: &str, factory: F) -> bool
    where
        F: Fn(&VisualTemplate, Option<&str>, &Services) -> Result<Box<dyn WindowBinder>, UiError>
            + 'static,
    {
        if self.factories.contains_key(name) {
            warn!(binder = %name, "binder factory already registered, keeping the first");
            return false;
        }
        self.factories.insert(name.to_owned(), Box::new(factory));
        true
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    fn registered_names(&self) -> String {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names.join(", ")
    }
}

impl CompositionRoot for BinderRegistry {
    fn instantiate(
        &self,
        template: &VisualTemplate,
        parent: Option<&str>,
    ) -> Result<Box<dyn WindowBinder>, UiError> {
        let factory = self
            .factories
            .get(&template.binder)
            .ok_or_else(|| UiError::UnknownBinder {
                template: template.id.clone(),
                binder: template.binder.clone(),
                registered: self.registered_names(),
            })?;
        debug!(template = %template.id, binder = %template.binder, parent = ?parent, "instantiating visual");
        factory(template, parent, &self.services)
    }
}

impl fmt::Debug for BinderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinderRegistry")
            .field("binders", &self.registered_names())
            .field("services", &self.services)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use hearth_ui::binder::Binder;
    use hearth_ui::view_model::WindowViewModel;

    use super::*;

    /// Counts how many visuals it was asked to build.
    #[derive(Default)]
    struct BuildCounter(Cell<u32>);

    struct Nothing;

    impl Binder<dyn WindowViewModel> for Nothing {
        fn bind(&mut self, _view_model: Rc<dyn WindowViewModel>) {}
    }

    impl WindowBinder for Nothing {
        fn close(&mut self) {}
    }

    fn registry() -> BinderRegistry {
        let mut services = Services::new();
        services.insert(Rc::new(BuildCounter::default()));
        let mut registry = BinderRegistry::new(services);
        registry.register("nothing", |_template, _parent, services| {
            let counter = services.get::<BuildCounter>().ok_or_else(|| UiError::Instantiation {
                template: "nothing".to_owned(),
                reason: "BuildCounter missing".to_owned(),
            })?;
            counter.0.set(counter.0.get() + 1);
            Ok(Box::new(Nothing))
        });
        registry
    }

    #[test]
    fn services_are_typed() {
        let mut services = Services::new();
        services.insert(Rc::new(7u32));
        assert_eq!(services.get::<u32>().as_deref(), Some(&7));
        assert!(services.get::<String>().is_none());
    }

    #[test]
    fn factory_receives_services() {
        let registry = registry();
        registry
            .instantiate(&VisualTemplate::new("Settings", "nothing"), Some("ui-root"))
            .unwrap();
        registry
            .instantiate(&VisualTemplate::new("Shop", "nothing"), None)
            .unwrap();
        let counter = registry.services().get::<BuildCounter>().unwrap();
        assert_eq!(counter.0.get(), 2);
    }

    #[test]
    fn unknown_binder_lists_registered_names() {
        let registry = registry();
        let err = registry
            .instantiate(&VisualTemplate::new("Shop", "fancy"), None)
            .err()
            .unwrap();
        assert_eq!(
            err,
            UiError::UnknownBinder {
                template: "Shop".to_owned(),
                binder: "fancy".to_owned(),
                registered: "nothing".to_owned(),
            }
        );
    }

    #[test]
    fn duplicate_binder_name_is_ignored() {
        let mut registry = registry();
        assert!(!registry.register("nothing", |_, _, _| {
            Err(UiError::Instantiation {
                template: String::new(),
                reason: "should never run".to_owned(),
            })
        }));
        assert!(registry
            .instantiate(&VisualTemplate::new("Settings", "nothing"), None)
            .is_ok());
    }
}
