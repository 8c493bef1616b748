//! Presentation pipeline.
//!
//! # Data Flow
//! ```text
//! text + grammar name
//!     → negotiate.rs (raw text or rendered page?)
//!     → highlight.rs (tokenize, inline-styled spans, wrapper style)
//!     → table.rs (one numbered row per line)
//!     → page.rs (merge into the index.html template)
//!     → HTML page
//! ```
//!
//! # Design Decisions
//! - A page is rendered completely or not at all; errors surface before any
//!   byte of the page is handed to the response
//! - Unknown grammars and styles fall back instead of failing
//! - The template is looked up in the asset store on every render

pub mod highlight;
pub mod negotiate;
pub mod page;
pub mod table;

use std::sync::Arc;
use thiserror::Error;

use crate::assets::{AssetError, AssetStore};

pub use highlight::{Highlighted, Highlighter};
pub use negotiate::{negotiate, OutputFormat};
pub use page::{PageRenderer, PresentationPage};
pub use table::render_table;

/// Errors from the presentation pipeline. All of them are answered with a
/// 500 carrying the error text.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("highlighting failed: {0}")]
    Highlight(#[from] syntect::Error),

    #[error("grammar {name} failed to load: {reason}")]
    Grammar { name: String, reason: String },

    #[error("asset unavailable: {0}")]
    Asset(#[from] AssetError),

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
}

/// Highlighter and page template bundled for handlers.
pub struct Presenter {
    highlighter: Highlighter,
    pages: PageRenderer,
}

impl Presenter {
    pub fn new(assets: Arc<dyn AssetStore>) -> Result<Self, RenderError> {
        let highlighter = Highlighter::new(assets.as_ref())?;
        Ok(Self {
            highlighter,
            pages: PageRenderer::new(assets),
        })
    }

    /// Highlight `text` under `grammar` and merge it into a full HTML page.
    pub fn render_page(&self, grammar: &str, text: &str, title: &str) -> Result<String, RenderError> {
        let highlighted = self.highlighter.highlight(grammar, text)?;
        let page = PresentationPage::new(render_table(&highlighted.html), highlighted.style, title);
        self.pages.render(&page)
    }

    pub fn highlighter(&self) -> &Highlighter {
        &self.highlighter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{EmbeddedAssets, MemoryAssets, INDEX_TEMPLATE};

    #[test]
    fn test_render_page_merges_everything() {
        let presenter = Presenter::new(Arc::new(EmbeddedAssets::new())).unwrap();
        let html = presenter
            .render_page("HTTP", "GET / HTTP/1.1\r\nHost: example.com\r\n\r\n", "HTTP request")
            .unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>HTTP request</title>"));
        assert!(html.contains("<pre><table><tr><td>1</td>"));
        assert!(html.contains("background-color:#"));
        assert!(html.contains("example.com"));
    }

    #[test]
    fn test_title_is_escaped() {
        let presenter = Presenter::new(Arc::new(EmbeddedAssets::new())).unwrap();
        let html = presenter.render_page("txt", "x", "<b>").unwrap();
        assert!(html.contains("<title>&lt;b&gt;</title>"));
    }

    #[test]
    fn test_missing_template_is_render_error() {
        let assets = MemoryAssets::from_embedded().without(INDEX_TEMPLATE);
        let presenter = Presenter::new(Arc::new(assets)).unwrap();
        let err = presenter.render_page("HTTP", "GET / HTTP/1.1\r\n", "t").unwrap_err();
        assert!(matches!(err, RenderError::Asset(_)));
        assert!(err.to_string().contains("index.html"));
    }

    #[test]
    fn test_broken_template_is_render_error() {
        let assets = MemoryAssets::from_embedded().with(INDEX_TEMPLATE, "{% if %}");
        let presenter = Presenter::new(Arc::new(assets)).unwrap();
        let err = presenter.render_page("HTTP", "x", "t").unwrap_err();
        assert!(matches!(err, RenderError::Template(_)));
    }
}
