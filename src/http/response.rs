//! Response building and error mapping.
//!
//! # Responsibilities
//! - Map every handler failure to a status code and a plain-text body
//! - Write text raw or as a rendered page, per negotiated format
//! - Hold the source page rendered once at startup
//!
//! # Design Decisions
//! - Error bodies carry the error text; this is a debugging tool
//! - Pages are rendered fully before a response is built, so a render
//!   failure never leaves a half-written page behind

use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::assets::{AssetError, AssetStore, SOURCE};
use crate::http::request::SnapshotError;
use crate::http::stream::StreamError;
use crate::render::{OutputFormat, Presenter, RenderError};

pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
pub const TEXT_HTML: &str = "text/html; charset=utf-8";

/// Everything a handler can fail with.
#[derive(Debug, Error)]
pub enum DumpError {
    /// Bad input from the client. The message is the response body.
    #[error("{0}")]
    Input(String),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("source page unavailable: {0}")]
    Source(Arc<RenderError>),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("hostname lookup failed: {0}")]
    Hostname(#[source] std::io::Error),
}

impl DumpError {
    pub fn status(&self) -> StatusCode {
        match self {
            DumpError::Input(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DumpError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Rejected request");
        }
        (status, [(header::CONTENT_TYPE, TEXT_PLAIN)], self.to_string()).into_response()
    }
}

pub fn raw_text(text: impl Into<String>) -> Response {
    ([(header::CONTENT_TYPE, TEXT_PLAIN)], text.into()).into_response()
}

pub fn html_page(html: String) -> Response {
    ([(header::CONTENT_TYPE, TEXT_HTML)], html).into_response()
}

/// Write `text` as-is, or highlighted under `grammar` inside the page
/// template.
pub fn present(
    presenter: &Presenter,
    format: OutputFormat,
    grammar: &str,
    text: String,
    title: &str,
) -> Result<Response, DumpError> {
    match format {
        OutputFormat::Raw => Ok(raw_text(text)),
        OutputFormat::Rendered => Ok(html_page(presenter.render_page(grammar, &text, title)?)),
    }
}

/// The server's own dispatcher source, raw and pre-rendered.
#[derive(Debug)]
pub struct SourcePage {
    text: String,
    rendered: Result<String, Arc<RenderError>>,
}

impl SourcePage {
    pub const TITLE: &'static str = "Source Code";
    pub const GRAMMAR: &'static str = "rs";

    /// Render the source once. A missing source asset is fatal; a render
    /// failure is kept and reported to every request for the page.
    pub fn prepare(assets: &dyn AssetStore, presenter: &Presenter) -> Result<Self, AssetError> {
        let text = assets.text(SOURCE)?.to_string();
        let rendered = presenter
            .render_page(Self::GRAMMAR, &text, Self::TITLE)
            .map_err(Arc::new);

        if let Err(e) = &rendered {
            tracing::error!(error = %e, "Failed to render source page");
        }

        Ok(Self { text, rendered })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn rendered(&self) -> Result<&str, DumpError> {
        self.rendered
            .as_deref()
            .map_err(|e| DumpError::Source(Arc::clone(e)))
    }
}
