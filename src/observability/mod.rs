//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers, streams, startup
//!     → tracing events with structured fields
//!     → logging.rs (subscriber: env filter + fmt layer)
//!     → stdout
//! ```
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level
//! - Per-request spans come from tower-http's TraceLayer

pub mod logging;
