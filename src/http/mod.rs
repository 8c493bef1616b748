//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, graceful shutdown)
//!     → routes.rs (gzip set or /nogzip set, pick handler)
//!     → handlers.rs (demo behavior or request dump)
//!         → request.rs (wire-format snapshot)
//!         → stream.rs (timed, flushed output)
//!     → response.rs (raw text, rendered page, or error)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod routes;
pub mod server;
pub mod stream;

pub use request::{RequestSnapshot, HDR_ACCEPT_ENCODING};
pub use response::DumpError;
pub use routes::{route_table, Endpoint, RouteEntry};
pub use server::{AppState, HttpServer, StartupError};
pub use stream::{StreamPlan, StreamSink};
