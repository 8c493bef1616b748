//! Page template merge.

use serde::Serialize;
use std::sync::Arc;

use minijinja::Environment;

use crate::assets::{AssetStore, INDEX_TEMPLATE};
use crate::render::RenderError;

/// Everything the page template needs. Built once per request and consumed
/// by a single render.
#[derive(Debug, Clone, Serialize)]
pub struct PresentationPage {
    pub body: String,
    pub style: String,
    pub title: String,
}

impl PresentationPage {
    pub fn new(body: String, style: String, title: impl Into<String>) -> Self {
        Self {
            body,
            style,
            title: title.into(),
        }
    }
}

/// Renders pages through the `index.html` template from the asset store.
#[derive(Clone)]
pub struct PageRenderer {
    assets: Arc<dyn AssetStore>,
}

impl PageRenderer {
    pub fn new(assets: Arc<dyn AssetStore>) -> Self {
        Self { assets }
    }

    pub fn render(&self, page: &PresentationPage) -> Result<String, RenderError> {
        let source = self.assets.text(INDEX_TEMPLATE)?;

        let mut env = Environment::new();
        env.add_template(INDEX_TEMPLATE, source)?;
        let template = env.get_template(INDEX_TEMPLATE)?;

        Ok(template.render(page)?)
    }
}
