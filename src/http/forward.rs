//! Upstream forwarding.
//!
//! # Responsibilities
//! - Re-render the upstream path from the sanitized params
//! - Replace the body with the sanitized JSON when there is one
//! - Copy end-to-end headers, drop hop-by-hop ones
//! - Stream the upstream response back unchanged

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderName, Request, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use hyper::body::Incoming;
use serde_json::json;
use thiserror::Error;

use crate::http::middleware::RequestPayload;
use crate::http::request_id::request_id_of;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::{RouteTarget, TemplateError};

fn is_hop_by_hop(name: &HeaderName) -> bool {
    [
        header::HOST,
        header::CONTENT_LENGTH,
        header::CONNECTION,
        header::TRANSFER_ENCODING,
        header::TE,
        header::TRAILER,
        header::UPGRADE,
        header::PROXY_AUTHORIZATION,
    ]
    .contains(name)
}

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed to build upstream path: {0}")]
    Path(#[from] TemplateError),

    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("failed to encode sanitized body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
}

impl ForwardError {
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardError::Upstream(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ForwardError::Upstream(_) => "Upstream request failed",
            _ => "Failed to forward request",
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Final handler of every configured route.
pub async fn forward_handler(
    State(state): State<AppState>,
    Extension(route): Extension<Arc<RouteTarget>>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let request_id = request_id_of(&request).to_string();

    let response = match forward(&state, &route, request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(request_id = %request_id, route = %route.name, error = %e, "Forwarding failed");
            e.into_response()
        }
    };

    metrics::record_request(&method, response.status().as_u16(), &route.name, start);
    response
}

async fn forward(state: &AppState, route: &RouteTarget, request: Request<Body>) -> Result<Response, ForwardError> {
    let (mut parts, body) = request.into_parts();
    let payload = parts.extensions.remove::<RequestPayload>().unwrap_or_default();

    let mut url = route.template.render(payload.params.as_ref(), &route.upstream)?;
    url.set_query(parts.uri.query());

    let body = match &payload.body {
        Some(value) => Body::from(serde_json::to_vec(value)?),
        None => body,
    };

    let mut upstream = Request::builder()
        .method(parts.method)
        .uri(url.as_str())
        .body(body)?;
    let headers = upstream.headers_mut();
    for (name, value) in parts.headers.iter() {
        if !is_hop_by_hop(name) {
            headers.append(name.clone(), value.clone());
        }
    }

    tracing::debug!(
        request_id = %request_id_of(&upstream),
        route = %route.name,
        upstream = %url,
        "Forwarding request"
    );

    let response: hyper::Response<Incoming> = state.client.request(upstream).await?;
    let (parts, body) = response.into_parts();
    Ok(Response::from_parts(parts, Body::new(body)))
}
