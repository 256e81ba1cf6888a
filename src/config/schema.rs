//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::http::message::DEFAULT_MAX_HEAD_BYTES;

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// Where relative addresses are forwarded.
    pub origin: OriginConfig,

    /// Redirect marker and the ordered rewrite operations.
    pub rewrite: RewriteConfig,

    /// Message size limits.
    pub limits: LimitsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8180").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8180".to_string(),
            max_connections: 256,
        }
    }
}

/// Origin server settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OriginConfig {
    /// `host:port` used when a rewritten address carries no authority.
    pub default_address: String,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            default_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Rewrite chain configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RewriteConfig {
    /// Protocol part of the redirect marker.
    pub marker_protocol: String,

    /// Server part of the redirect marker.
    pub marker_server: String,

    /// Operation names, applied in this order.
    pub operations: Vec<String>,
}

impl RewriteConfig {
    /// The full marker prefix.
    pub fn marker(&self) -> String {
        format!("{}{}", self.marker_protocol, self.marker_server)
    }
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            marker_protocol: "http://".to_string(),
            marker_server: "localhost:8180".to_string(),
            operations: vec![
                "remove_redirect_marker".to_string(),
                "force_connection_close".to_string(),
            ],
        }
    }
}

/// Message size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest accepted start line + header block, in bytes.
    pub max_head_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_head_bytes: DEFAULT_MAX_HEAD_BYTES,
        }
    }
}

/// Timeout configuration. Zero disables a socket timeout.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Origin connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Socket read timeout in seconds; bounds read-to-close bodies.
    pub read_secs: u64,

    /// Socket write timeout in seconds.
    pub write_secs: u64,

    /// How long shutdown waits for in-flight exchanges, in seconds.
    pub drain_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            read_secs: 30,
            write_secs: 30,
            drain_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9190".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config: RelayConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:8180");
        assert_eq!(config.rewrite, RewriteConfig::default());
        assert_eq!(config.limits.max_head_bytes, DEFAULT_MAX_HEAD_BYTES);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: RelayConfig = toml::from_str(
            r#"
            [rewrite]
            marker_server = "proxy.local/realhost.example.com"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.rewrite.marker(), "http://proxy.local/realhost.example.com");
        assert_eq!(config.rewrite.operations.len(), 2);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.observability.log_level, "info");
    }
}
