//! Payload capture middleware.
//!
//! Buffers the request body, parses it when it is JSON, and stores the body
//! together with the matched path params as a [`RequestPayload`] extension
//! for the sanitizer stages.

use axum::{
    body::Body,
    extract::{RawPathParams, State},
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use http_body_util::LengthLimitError;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::sanitize::SanitizeReport;

/// The parts of a request that get sanitized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestPayload {
    /// Parsed JSON body, `None` for empty or non-JSON bodies.
    pub body: Option<Value>,
    /// Captured path params as an object of strings, `None` when the route has none.
    pub params: Option<Value>,
}

impl RequestPayload {
    /// Run a sanitizing pass over the body and then the params.
    pub fn sanitize_with<F>(&mut self, mut pass: F) -> SanitizeReport
    where
        F: FnMut(&mut Value) -> SanitizeReport,
    {
        let mut report = SanitizeReport::default();
        if let Some(body) = self.body.as_mut() {
            report.absorb(pass(body));
        }
        if let Some(params) = self.params.as_mut() {
            report.absorb(pass(params));
        }
        report
    }
}

/// Body limits for payload capture.
#[derive(Debug, Clone)]
pub struct PayloadLimits {
    pub max_body_size: usize,
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("request body exceeds {0} bytes")]
    TooLarge(usize),

    #[error("request body could not be read")]
    Unreadable(#[source] axum::Error),

    #[error("malformed JSON body: {0}")]
    MalformedJson(#[from] serde_json::Error),
}

impl PayloadError {
    pub fn status(&self) -> StatusCode {
        match self {
            PayloadError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for PayloadError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub async fn capture_payload(
    State(limits): State<PayloadLimits>,
    params: RawPathParams,
    request: Request<Body>,
    next: Next,
) -> Result<Response, PayloadError> {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, limits.max_body_size)
        .await
        .map_err(|e| {
            if is_length_limit(&e) {
                PayloadError::TooLarge(limits.max_body_size)
            } else {
                PayloadError::Unreadable(e)
            }
        })?;

    let body = if is_json(&parts.headers) && !bytes.is_empty() {
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(path = %parts.uri.path(), error = %e, "Rejecting malformed JSON body");
                return Err(PayloadError::MalformedJson(e));
            }
        }
    } else {
        None
    };

    let captured: Map<String, Value> = params
        .iter()
        .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
        .collect();
    let params = (!captured.is_empty()).then_some(Value::Object(captured));

    let mut request = Request::from_parts(parts, Body::from(bytes));
    request.extensions_mut().insert(RequestPayload { body, params });
    Ok(next.run(request).await)
}

/// Bodies without a `Content-Length` slip past the outer limit layer and
/// hit the buffering limit here instead.
fn is_length_limit(error: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(error);
    while let Some(current) = source {
        if current.is::<LengthLimitError>() {
            return true;
        }
        source = current.source();
    }
    false
}

/// `application/json` or any `+json` media type.
pub fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json"))
}
