//! Template rendering for HTML bodies.

use std::path::PathBuf;

use handlebars::Handlebars;
use serde_json::Value;

use crate::error::BuildError;

/// Renders handlebars templates from a template root directory.
///
/// Template filenames are opaque to the dispatch pipeline; they are resolved
/// against the root and rendered with an opaque, already-serialized view
/// model. Rendering holds no per-call mutable state, so one engine is safely
/// shared by every worker.
pub struct TemplateEngine {
    registry: Handlebars<'static>,
    root: PathBuf,
}

impl TemplateEngine {
    /// An engine resolving templates against `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            registry: Handlebars::new(),
            root: root.into(),
        }
    }

    /// Render the named template against the view model.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::TemplateFailure`] when the template cannot be
    /// read or rendered.
    pub async fn render(&self, filename: &str, view: &Value) -> Result<String, BuildError> {
        let path = self.root.join(filename);
        let source = tokio::fs::read_to_string(&path).await.map_err(|e| {
            BuildError::TemplateFailure(format!("{}: {e}", path.display()))
        })?;

        Ok(self.registry.render_template(&source, view)?)
    }
}
