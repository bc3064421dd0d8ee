//! Sanitizer middleware stages.
//!
//! Both stages rewrite the [`RequestPayload`] left by payload capture and
//! always hand the request on. They never reject and never fail.

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::config::SanitizerConfig;
use crate::http::middleware::payload::RequestPayload;
use crate::http::request_id::request_id_of;
use crate::observability::metrics;
use crate::sanitize::{strip_markup, strip_operator_keys, SanitizeOptions, SanitizeReport};

/// Which stages run and how they traverse.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizerSettings {
    pub strip_operator_keys: bool,
    pub strip_markup: bool,
    pub options: SanitizeOptions,
}

impl From<&SanitizerConfig> for SanitizerSettings {
    fn from(config: &SanitizerConfig) -> Self {
        Self {
            strip_operator_keys: config.strip_operator_keys,
            strip_markup: config.strip_markup,
            options: config.options(),
        }
    }
}

impl Default for SanitizerSettings {
    fn default() -> Self {
        Self::from(&SanitizerConfig::default())
    }
}

/// Shared, hot-swappable sanitizer settings.
///
/// Each request works on the snapshot it loaded first.
#[derive(Debug, Clone, Default)]
pub struct SanitizerHandle {
    current: Arc<ArcSwap<SanitizerSettings>>,
}

impl SanitizerHandle {
    pub fn new(settings: SanitizerSettings) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(settings)),
        }
    }

    pub fn load(&self) -> Arc<SanitizerSettings> {
        self.current.load_full()
    }

    pub fn store(&self, settings: SanitizerSettings) {
        self.current.store(Arc::new(settings));
    }
}

/// Removes operator-prefixed keys from the body and params.
pub async fn strip_operator_keys_stage(
    State(sanitizer): State<SanitizerHandle>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let settings = sanitizer.load();
    if settings.strip_operator_keys {
        let report = request
            .extensions_mut()
            .get_mut::<RequestPayload>()
            .map(|payload| payload.sanitize_with(|node| strip_operator_keys(node, &settings.options)));
        if let Some(report) = report {
            note_changes("operator_keys", &request, &report);
        }
    }
    next.run(request).await
}

/// Strips markup-shaped substrings from strings in the body and params.
pub async fn strip_markup_stage(
    State(sanitizer): State<SanitizerHandle>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let settings = sanitizer.load();
    if settings.strip_markup {
        let report = request
            .extensions_mut()
            .get_mut::<RequestPayload>()
            .map(|payload| payload.sanitize_with(|node| strip_markup(node, &settings.options)));
        if let Some(report) = report {
            note_changes("markup", &request, &report);
        }
    }
    next.run(request).await
}

fn note_changes(stage: &'static str, request: &Request<Body>, report: &SanitizeReport) {
    if report.is_clean() {
        return;
    }
    tracing::warn!(
        request_id = %request_id_of(request),
        stage,
        path = %request.uri().path(),
        keys_removed = report.keys_removed,
        strings_rewritten = report.strings_rewritten,
        subtrees_truncated = report.subtrees_truncated,
        "Sanitized request payload"
    );
    metrics::record_sanitized(stage, report);
}
