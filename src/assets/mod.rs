//! Read-only asset store.
//!
//! Everything the server serves or renders from disk is embedded at build
//! time and looked up by name. Handlers depend on [`AssetStore`], never on
//! the storage mechanism.

use std::str::Utf8Error;
use thiserror::Error;

/// Name of the page template.
pub const INDEX_TEMPLATE: &str = "index.html";
/// Name of the favicon served at `/favicon.ico`.
pub const FAVICON: &str = "favicon.ico";
/// Name of the HTTP wire-format grammar.
pub const HTTP_SYNTAX: &str = "HTTP.sublime-syntax";
/// Name of the source shown at `/source`. Only the request dispatcher
/// (`http/handlers.rs`) is embedded, not the whole crate.
pub const SOURCE: &str = "handlers.rs";

/// Errors from asset lookups.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(String),

    #[error("asset {name} is not valid UTF-8: {source}")]
    NotText {
        name: String,
        #[source]
        source: Utf8Error,
    },
}

/// Read-only key → bytes lookup.
pub trait AssetStore: Send + Sync {
    /// Raw bytes of the asset, if present.
    fn get(&self, name: &str) -> Option<&[u8]>;

    /// The asset as UTF-8 text.
    fn text(&self, name: &str) -> Result<&str, AssetError> {
        let bytes = self
            .get(name)
            .ok_or_else(|| AssetError::NotFound(name.to_string()))?;
        std::str::from_utf8(bytes).map_err(|source| AssetError::NotText {
            name: name.to_string(),
            source,
        })
    }
}

/// Assets compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedAssets;

static EMBEDDED: &[(&str, &[u8])] = &[
    (INDEX_TEMPLATE, include_bytes!("../../assets/index.html")),
    (FAVICON, include_bytes!("../../assets/favicon.ico")),
    (HTTP_SYNTAX, include_bytes!("../../assets/HTTP.sublime-syntax")),
    (SOURCE, include_bytes!("../http/handlers.rs")),
];

impl EmbeddedAssets {
    pub fn new() -> Self {
        Self
    }

    /// Names of all embedded assets.
    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        EMBEDDED.iter().map(|(name, _)| *name)
    }
}

impl AssetStore for EmbeddedAssets {
    fn get(&self, name: &str) -> Option<&[u8]> {
        EMBEDDED
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, bytes)| *bytes)
    }
}

/// In-memory store, used to swap assets in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    entries: Vec<(String, Vec<u8>)>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a copy of the embedded assets.
    pub fn from_embedded() -> Self {
        let embedded = EmbeddedAssets::new();
        let entries = embedded
            .names()
            .filter_map(|name| embedded.get(name).map(|bytes| (name.to_string(), bytes.to_vec())))
            .collect();
        Self { entries }
    }

    /// Insert or replace an asset.
    pub fn with(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let name = name.into();
        self.entries.retain(|(key, _)| *key != name);
        self.entries.push((name, bytes.into()));
        self
    }

    /// Remove an asset.
    pub fn without(mut self, name: &str) -> Self {
        self.entries.retain(|(key, _)| key != name);
        self
    }
}

impl AssetStore for MemoryAssets {
    fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, bytes)| bytes.as_slice())
    }
}
