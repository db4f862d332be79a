//! Collaborator contracts consumed by the synchronization layer.
//!
//! The UI core never loads content or constructs visuals itself. It asks an
//! [`AssetProvider`] for the [`VisualTemplate`] named by a window id and hands
//! that template to a [`CompositionRoot`], which builds the live binder with
//! its own dependencies resolved.

use serde::{Deserialize, Serialize};

use crate::binder::WindowBinder;
use crate::UiError;

// ---------------------------------------------------------------------------
// VisualTemplate
// ---------------------------------------------------------------------------

/// Loaded description of a visual, resolved from a logical id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualTemplate {
    /// Logical id the template was loaded under (a window id).
    pub id: String,
    /// Name of the binder factory the composition root should use.
    pub binder: String,
    /// Free-form presentation settings passed through to the binder factory.
    #[serde(default)]
    pub properties: serde_json::Value,
}

impl VisualTemplate {
    pub fn new(id: impl Into<String>, binder: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            binder: binder.into(),
            properties: serde_json::Value::Null,
        }
    }
}

// ---------------------------------------------------------------------------
// AssetProvider
// ---------------------------------------------------------------------------

/// Continuation receiving a loaded template, or `None` when loading failed.
pub type TemplateReady = Box<dyn FnOnce(Option<VisualTemplate>)>;

/// Resolves logical ids to visual templates.
///
/// A provider may call `ready` before returning (blocking load) or later on
/// the same thread (suspended load). When `id` is unknown the provider logs
/// the failure and passes `None`.
pub trait AssetProvider {
    fn load_template(&self, id: &str, ready: TemplateReady);
}

// ---------------------------------------------------------------------------
// CompositionRoot
// ---------------------------------------------------------------------------

/// Builds live visuals from templates, resolving their own collaborators.
pub trait CompositionRoot {
    /// Instantiate `template` under the optional `parent` container.
    fn instantiate(
        &self,
        template: &VisualTemplate,
        parent: Option<&str>,
    ) -> Result<Box<dyn WindowBinder>, UiError>;
}
