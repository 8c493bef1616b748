//! HTTP request dump and demo server library

pub mod assets;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod render;

pub use config::schema::DumpConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

/// Version stamped into `/version`, fixed at build time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
