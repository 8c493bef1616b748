//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the dump server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DumpConfig {
    /// Listener configuration (bind address and port).
    pub listener: ListenerConfig,

    /// Read and write timeouts.
    pub timeouts: TimeoutConfig,

    /// Settings for the compressing transport on the plain route set.
    pub compression: CompressionConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Address to bind (e.g., "0.0.0.0").
    pub address: String,

    /// Port number to bind.
    pub port: u16,
}

impl ListenerConfig {
    /// `address:port` as handed to the TCP listener.
    pub fn bind_address(&self) -> String {
        if self.address.contains(':') && !self.address.starts_with('[') {
            format!("[{}]:{}", self.address, self.port)
        } else {
            format!("{}:{}", self.address, self.port)
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Timeout for reading the request body, in milliseconds.
    pub read_ms: u64,

    /// Timeout for producing the response, in milliseconds.
    /// Must outlast the longest streaming demo.
    pub write_ms: u64,
}

impl TimeoutConfig {
    pub fn read(&self) -> Duration {
        Duration::from_millis(self.read_ms)
    }

    pub fn write(&self) -> Duration {
        Duration::from_millis(self.write_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read_ms: 30_000,
            write_ms: 90_000,
        }
    }
}

/// Compression level for the gzip transport.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevelSetting {
    Fastest,
    #[default]
    Default,
    Best,
}

/// Compressing transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Responses smaller than this many bytes are sent uncompressed.
    pub min_size: u16,

    /// Gzip compression level.
    pub level: CompressionLevelSetting,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            min_size: 5,
            level: CompressionLevelSetting::Default,
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body captured in a dump, in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
