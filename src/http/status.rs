//! Gateway status endpoint.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::json;

use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct GatewayStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub routes: usize,
    pub sanitizer: SanitizerStatus,
}

#[derive(Debug, Serialize)]
pub struct SanitizerStatus {
    pub strip_operator_keys: bool,
    pub strip_markup: bool,
    pub operator_prefix: char,
    pub descend_into_arrays: bool,
    pub max_depth: usize,
}

pub async fn get_status(State(state): State<AppState>) -> Json<GatewayStatus> {
    let settings = state.sanitizer.load();
    Json(GatewayStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        routes: state.route_count,
        sanitizer: SanitizerStatus {
            strip_operator_keys: settings.strip_operator_keys,
            strip_markup: settings.strip_markup,
            operator_prefix: settings.options.operator_prefix,
            descend_into_arrays: settings.options.descend_into_arrays,
            max_depth: settings.options.max_depth,
        },
    })
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "No matching route found" })))
}
