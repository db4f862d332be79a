//! Asset providers backed by a template catalog.
//!
//! [`CatalogAssetProvider`] resolves window ids against an in-memory
//! [`TemplateCatalog`] and completes every request before returning.
//! [`DeferredAssetProvider`] wraps any provider and holds requests until
//! [`pump`](DeferredAssetProvider::pump) is called, which is how a frame-based
//! loader (or a test) models templates that arrive later.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use hearth_ui::collab::{AssetProvider, TemplateReady, VisualTemplate};
use hearth_ui::UiError;
use tracing::{debug, error};

use crate::AppError;

// ---------------------------------------------------------------------------
// TemplateCatalog
// ---------------------------------------------------------------------------

/// Visual templates keyed by id.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: HashMap<String, VisualTemplate>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog, rejecting duplicate ids.
    pub fn from_templates(
        templates: impl IntoIterator<Item = VisualTemplate>,
    ) -> Result<Self, AppError> {
        let mut catalog = Self::new();
        for template in templates {
            if catalog.templates.contains_key(&template.id) {
                return Err(AppError::DuplicateTemplate { id: template.id });
            }
            catalog.templates.insert(template.id.clone(), template);
        }
        Ok(catalog)
    }

    /// Parse a JSON array of templates.
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let templates: Vec<VisualTemplate> = serde_json::from_str(json)?;
        Self::from_templates(templates)
    }

    /// Add or replace a template.
    pub fn insert(&mut self, template: VisualTemplate) {
        self.templates.insert(template.id.clone(), template);
    }

    pub fn get(&self, id: &str) -> Option<&VisualTemplate> {
        self.templates.get(id)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

// ---------------------------------------------------------------------------
// CatalogAssetProvider
// ---------------------------------------------------------------------------

/// Blocking provider: every request completes before `load_template` returns.
#[derive(Debug, Clone)]
pub struct CatalogAssetProvider {
    catalog: TemplateCatalog,
}

impl CatalogAssetProvider {
    pub fn new(catalog: TemplateCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    /// Resolve `id` directly, logging when it is missing.
    pub fn load_now(&self, id: &str) -> Option<VisualTemplate> {
        match self.catalog.get(id) {
            Some(template) => Some(template.clone()),
            None => {
                error!(
                    error = %UiError::TemplateNotFound { id: id.to_owned() },
                    "failed to load template"
                );
                None
            }
        }
    }
}

impl AssetProvider for CatalogAssetProvider {
    fn load_template(&self, id: &str, ready: TemplateReady) {
        ready(self.load_now(id));
    }
}

// ---------------------------------------------------------------------------
// DeferredAssetProvider
// ---------------------------------------------------------------------------

/// Queues requests and forwards them to an inner provider on [`pump`](Self::pump).
pub struct DeferredAssetProvider {
    inner: Rc<dyn AssetProvider>,
    queue: RefCell<VecDeque<(String, TemplateReady)>>,
}

impl DeferredAssetProvider {
    pub fn new(inner: Rc<dyn AssetProvider>) -> Self {
        Self {
            inner,
            queue: RefCell::new(VecDeque::new()),
        }
    }

    /// Number of requests waiting for [`pump`](Self::pump).
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Forward every queued request, including ones queued while pumping.
    ///
    /// Returns the number of requests forwarded.
    pub fn pump(&self) -> usize {
        let mut forwarded = 0;
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some((id, ready)) = next else {
                break;
            };
            self.inner.load_template(&id, ready);
            forwarded += 1;
        }
        if forwarded > 0 {
            debug!(forwarded, "deferred template requests delivered");
        }
        forwarded
    }
}

impl AssetProvider for DeferredAssetProvider {
    fn load_template(&self, id: &str, ready: TemplateReady) {
        self.queue.borrow_mut().push_back((id.to_owned(), ready));
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn catalog() -> TemplateCatalog {
        TemplateCatalog::from_templates([
            VisualTemplate::new("Settings", "headless"),
            VisualTemplate::new("Shop", "headless"),
        ])
        .unwrap()
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = TemplateCatalog::from_templates([
            VisualTemplate::new("Settings", "a"),
            VisualTemplate::new("Settings", "b"),
        ])
        .unwrap_err();
        assert!(matches!(err, AppError::DuplicateTemplate { id } if id == "Settings"));
    }

    #[test]
    fn catalog_parses_json() {
        let catalog =
            TemplateCatalog::from_json(r#"[{ "id": "Shop", "binder": "headless" }]"#).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("Shop").unwrap().binder, "headless");
    }

    #[test]
    fn catalog_provider_completes_immediately() {
        let provider = CatalogAssetProvider::new(catalog());
        let got = Rc::new(RefCell::new(None));
        let sink = got.clone();
        provider.load_template("Shop", Box::new(move |t| *sink.borrow_mut() = t));
        assert_eq!(got.borrow().as_ref().map(|t| t.id.as_str()), Some("Shop"));
    }

    #[test]
    fn missing_id_yields_none() {
        let provider = CatalogAssetProvider::new(catalog());
        let called = Rc::new(Cell::new(false));
        let flag = called.clone();
        provider.load_template(
            "Nope",
            Box::new(move |t| {
                assert!(t.is_none());
                flag.set(true);
            }),
        );
        assert!(called.get());
    }

    #[test]
    fn deferred_provider_waits_for_pump() {
        let deferred = DeferredAssetProvider::new(Rc::new(CatalogAssetProvider::new(catalog())));
        let delivered = Rc::new(Cell::new(0));
        for id in ["Settings", "Shop"] {
            let delivered = delivered.clone();
            deferred.load_template(
                id,
                Box::new(move |t| {
                    assert!(t.is_some());
                    delivered.set(delivered.get() + 1);
                }),
            );
        }
        assert_eq!(deferred.pending(), 2);
        assert_eq!(delivered.get(), 0);

        assert_eq!(deferred.pump(), 2);
        assert_eq!(delivered.get(), 2);
        assert_eq!(deferred.pending(), 0);
    }
}
