//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (depth, body size, timeouts > 0)
//! - Detect conflicting or reserved routes before axum sees them
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::routing::{parse_upstream, PathTemplate};

/// Paths served by the gateway itself.
pub const RESERVED_PATHS: &[&str] = &["/status"];

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),

    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),

    #[error("duplicate route name '{0}'")]
    DuplicateRouteName(String),

    #[error("route '{route}': {reason}")]
    InvalidRoutePath { route: String, reason: String },

    #[error("route '{route}' conflicts with route '{other}'")]
    ConflictingRoutePath { route: String, other: String },

    #[error("route '{route}' uses reserved path '{path}'")]
    ReservedRoutePath { route: String, path: String },

    #[error("route '{route}': {reason}")]
    InvalidUpstream { route: String, reason: String },

    #[error("route '{route}': capture '{param}' starts with the operator prefix")]
    OperatorPrefixedParam { route: String, param: String },

    #[error("sanitizer.max_depth must be greater than 0")]
    ZeroMaxDepth,

    #[error("limits.max_body_size must be greater than 0")]
    ZeroBodyLimit,

    #[error("timeouts.{0} must be greater than 0")]
    ZeroTimeout(&'static str),

    #[error("unknown log level '{0}'")]
    InvalidLogLevel(String),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }
    if !LOG_LEVELS.contains(&observability.log_level.to_lowercase().as_str()) {
        errors.push(ValidationError::InvalidLogLevel(observability.log_level.clone()));
    }

    if config.sanitizer.max_depth == 0 {
        errors.push(ValidationError::ZeroMaxDepth);
    }
    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }

    validate_routes(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_routes(config: &GatewayConfig, errors: &mut Vec<ValidationError>) {
    let mut names = HashSet::new();
    let mut shapes: HashMap<String, &str> = HashMap::new();
    let prefix = config.sanitizer.operator_prefix;

    for route in &config.routes {
        if !names.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRouteName(route.name.clone()));
        }

        if let Err(e) = parse_upstream(&route.upstream) {
            errors.push(ValidationError::InvalidUpstream {
                route: route.name.clone(),
                reason: e.to_string(),
            });
        }

        if RESERVED_PATHS.contains(&route.path.as_str()) {
            errors.push(ValidationError::ReservedRoutePath {
                route: route.name.clone(),
                path: route.path.clone(),
            });
            continue;
        }

        let template = match PathTemplate::parse(&route.path) {
            Ok(template) => template,
            Err(e) => {
                errors.push(ValidationError::InvalidRoutePath {
                    route: route.name.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        for param in template.capture_names().filter(|name| name.starts_with(prefix)) {
            errors.push(ValidationError::OperatorPrefixedParam {
                route: route.name.clone(),
                param: param.to_string(),
            });
        }

        if let Some(other) = shapes.insert(template.shape(), route.name.as_str()) {
            errors.push(ValidationError::ConflictingRoutePath {
                route: route.name.clone(),
                other: other.to_string(),
            });
        }
    }
}
