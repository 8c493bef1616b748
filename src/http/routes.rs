//! Route table.
//!
//! # Responsibilities
//! - List every endpoint pattern once
//! - Mount each pattern twice: behind the gzip transport, and under
//!   `/nogzip` without it
//!
//! # Design Decisions
//! - The duplicate `/nogzip` set lets clients test uncompressed responses
//!   explicitly instead of relying on `Accept-Encoding` alone
//! - Both copies point at the same handler; only the transport differs
//! - The table is plain data so it can be inspected and tested without
//!   starting a server

use axum::routing::{any, MethodRouter};
use axum::Router;
use tower_http::compression::predicate::SizeAbove;
use tower_http::compression::CompressionLayer;
use tower_http::CompressionLevel;

use crate::config::{CompressionConfig, CompressionLevelSetting};
use crate::http::handlers;
use crate::http::server::AppState;

/// Prefix of the uncompressed route set.
pub const NOGZIP_PREFIX: &str = "/nogzip";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Live,
    Version,
    Whoami,
    Source,
    FizzBuzz,
    Counter,
    Basic,
    Status,
    ContentType,
    Favicon,
    Dump,
}

/// One mounted pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub pattern: String,
    pub endpoint: Endpoint,
    pub compressed: bool,
}

/// Patterns mounted under both prefixes.
const SHARED: &[(&str, Endpoint)] = &[
    ("/live", Endpoint::Live),
    ("/version", Endpoint::Version),
    ("/source", Endpoint::Source),
    ("/whoami", Endpoint::Whoami),
    ("/whoami.txt", Endpoint::Whoami),
    ("/demo/fizzbuzz", Endpoint::FizzBuzz),
    ("/demo/fizzbuzz_stream", Endpoint::FizzBuzz),
    ("/demo/counter", Endpoint::Counter),
    ("/demo/basic/{id}/{pw}", Endpoint::Basic),
    ("/demo/status/{code}", Endpoint::Status),
    ("/demo/type/{major}", Endpoint::ContentType),
    ("/demo/type/{major}/{minor}", Endpoint::ContentType),
    ("/", Endpoint::Dump),
    ("/{*path}", Endpoint::Dump),
];

/// Patterns that only exist behind the gzip transport.
const COMPRESSED_ONLY: &[(&str, Endpoint)] = &[("/favicon.ico", Endpoint::Favicon)];

pub fn route_table() -> Vec<RouteEntry> {
    let mut entries = Vec::with_capacity(SHARED.len() * 2 + COMPRESSED_ONLY.len());

    for &(pattern, endpoint) in SHARED {
        entries.push(RouteEntry {
            pattern: pattern.to_string(),
            endpoint,
            compressed: true,
        });
        entries.push(RouteEntry {
            pattern: format!("{}{}", NOGZIP_PREFIX, pattern),
            endpoint,
            compressed: false,
        });
    }

    for &(pattern, endpoint) in COMPRESSED_ONLY {
        entries.push(RouteEntry {
            pattern: pattern.to_string(),
            endpoint,
            compressed: true,
        });
    }

    entries
}

fn handler_for(endpoint: Endpoint) -> MethodRouter<AppState> {
    match endpoint {
        Endpoint::Live => any(handlers::live),
        Endpoint::Version => any(handlers::version),
        Endpoint::Whoami => any(handlers::whoami),
        Endpoint::Source => any(handlers::source),
        Endpoint::FizzBuzz => any(handlers::fizzbuzz),
        Endpoint::Counter => any(handlers::counter),
        Endpoint::Basic => any(handlers::basic),
        Endpoint::Status => any(handlers::status),
        Endpoint::ContentType => any(handlers::content_type),
        Endpoint::Favicon => any(handlers::favicon),
        Endpoint::Dump => any(handlers::dump),
    }
}

/// Gzip transport for the plain route set.
pub fn compression_layer(config: &CompressionConfig) -> CompressionLayer<SizeAbove> {
    let level = match config.level {
        CompressionLevelSetting::Fastest => CompressionLevel::Fastest,
        CompressionLevelSetting::Default => CompressionLevel::Default,
        CompressionLevelSetting::Best => CompressionLevel::Best,
    };

    CompressionLayer::new()
        .quality(level)
        .compress_when(SizeAbove::new(config.min_size))
}

/// Build both route sets and merge them into one router.
pub fn build_routes(compression: &CompressionConfig) -> Router<AppState> {
    let mut compressed = Router::new();
    let mut uncompressed = Router::new();

    for entry in route_table() {
        let handler = handler_for(entry.endpoint);
        if entry.compressed {
            compressed = compressed.route(&entry.pattern, handler);
        } else {
            uncompressed = uncompressed.route(&entry.pattern, handler);
        }
    }

    compressed
        .layer(compression_layer(compression))
        .merge(uncompressed)
}
