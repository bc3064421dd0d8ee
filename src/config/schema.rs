//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::sanitize::{SanitizeOptions, DEFAULT_MAX_DEPTH, DEFAULT_OPERATOR_PREFIX};

/// Root configuration for the sanitizing gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Route definitions mapping path templates to upstreams.
    pub routes: Vec<RouteConfig>,

    /// Payload sanitizer settings.
    pub sanitizer: SanitizerConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Route configuration mapping a path template to an upstream.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Path template, e.g. "/api/jobs/{id}" or "/api/files/{*path}".
    pub path: String,

    /// Upstream address ("127.0.0.1:4000" or "http://jobs-api:4000").
    pub upstream: String,
}

/// Sanitizer configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SanitizerConfig {
    /// Run the operator-key stripping stage.
    pub strip_operator_keys: bool,

    /// Run the markup stripping stage.
    pub strip_markup: bool,

    /// Keys starting with this character are removed.
    pub operator_prefix: char,

    /// Sanitize objects and strings nested inside arrays.
    /// `false` keeps the legacy behaviour of skipping arrays entirely.
    pub descend_into_arrays: bool,

    /// Containers nested deeper than this are replaced by null.
    pub max_depth: usize,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            strip_operator_keys: true,
            strip_markup: true,
            operator_prefix: DEFAULT_OPERATOR_PREFIX,
            descend_into_arrays: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl SanitizerConfig {
    /// Traversal options for both sanitizing passes.
    pub fn options(&self) -> SanitizeOptions {
        SanitizeOptions {
            operator_prefix: self.operator_prefix,
            descend_into_arrays: self.descend_into_arrays,
            max_depth: self.max_depth,
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
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
            log_format: LogFormat::Compact,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
