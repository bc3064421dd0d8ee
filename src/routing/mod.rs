//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! RouteConfig (name, path template, upstream)
//!     → template.rs (parse & validate template)
//!     → RouteTarget (template + upstream base URL)
//!     → registered on the axum Router by http::server
//!     → axum matches the request and captures path params
//!     → forward renders the upstream URL from sanitized params
//! ```
//!
//! # Design Decisions
//! - Matching is delegated to axum; this module only owns templates
//! - Upstreams are plain HTTP (TLS terminates in front of the gateway)

pub mod template;

use thiserror::Error;
use url::Url;

use crate::config::RouteConfig;

pub use template::{PathTemplate, TemplateError};

/// Errors turning a route config entry into a [`RouteTarget`].
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid path template: {0}")]
    Template(#[from] TemplateError),

    #[error("invalid upstream '{upstream}': {reason}")]
    Upstream { upstream: String, reason: String },
}

/// A configured route ready to forward traffic.
#[derive(Debug, Clone)]
pub struct RouteTarget {
    pub name: String,
    pub template: PathTemplate,
    pub upstream: Url,
}

impl RouteTarget {
    pub fn from_config(route: &RouteConfig) -> Result<Self, RouteError> {
        Ok(Self {
            name: route.name.clone(),
            template: PathTemplate::parse(&route.path)?,
            upstream: parse_upstream(&route.upstream)?,
        })
    }
}

/// Parse an upstream given as `host:port` or as an `http://` URL.
pub fn parse_upstream(raw: &str) -> Result<Url, RouteError> {
    let invalid = |reason: String| RouteError::Upstream {
        upstream: raw.to_string(),
        reason,
    };

    let url = if raw.contains("://") {
        Url::parse(raw)
    } else {
        Url::parse(&format!("http://{raw}"))
    }
    .map_err(|e| invalid(e.to_string()))?;

    if url.scheme() != "http" {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_upstream_forms() {
        let bare = parse_upstream("127.0.0.1:4000").unwrap();
        assert_eq!(bare.as_str(), "http://127.0.0.1:4000/");

        let full = parse_upstream("http://jobs-api:4000").unwrap();
        assert_eq!(full.host_str(), Some("jobs-api"));
        assert_eq!(full.port(), Some(4000));
    }

    #[test]
    fn test_parse_upstream_rejects_other_schemes() {
        assert!(matches!(
            parse_upstream("https://jobs-api"),
            Err(RouteError::Upstream { .. })
        ));
        assert!(parse_upstream("not a host:port").is_err());
    }

    #[test]
    fn test_route_target_from_config() {
        let target = RouteTarget::from_config(&RouteConfig {
            name: "applications".into(),
            path: "/api/applications/{id}".into(),
            upstream: "127.0.0.1:4000".into(),
        })
        .unwrap();
        assert_eq!(target.name, "applications");
        assert_eq!(target.template.as_str(), "/api/applications/{id}");
    }
}
