//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{body::Bytes, extract::Request, http::HeaderMap, routing::any, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use sanitizing_gateway::config::{GatewayConfig, RouteConfig};
use sanitizing_gateway::http::HttpServer;
use sanitizing_gateway::lifecycle::Shutdown;

/// Start an upstream that echoes what it received as JSON.
///
/// The reply carries `method`, `path`, `query`, `body` (parsed when it is
/// JSON, raw text otherwise) and a few request headers.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(any(echo));

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn echo(request: Request) -> Json<Value> {
    let (parts, body) = request.into_parts();
    let bytes: Bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    let text = String::from_utf8_lossy(&bytes).to_string();
    let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));

    Json(json!({
        "method": parts.method.as_str(),
        "path": parts.uri.path(),
        "query": parts.uri.query(),
        "body": body,
        "headers": echoed_headers(&parts.headers),
    }))
}

fn echoed_headers(headers: &HeaderMap) -> Value {
    let pick = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
    json!({
        "x-request-id": pick("x-request-id"),
        "content-type": pick("content-type"),
        "authorization": pick("authorization"),
    })
}

pub fn route(name: &str, path: &str, upstream: SocketAddr) -> RouteConfig {
    RouteConfig {
        name: name.into(),
        path: path.into(),
        upstream: upstream.to_string(),
    }
}

/// A running gateway bound to an ephemeral port.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub config_updates: mpsc::UnboundedSender<GatewayConfig>,
    pub shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub async fn start_gateway(mut config: GatewayConfig) -> TestGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let shutdown = Shutdown::new();
    let (config_updates, updates_rx) = mpsc::unbounded_channel();
    let server = HttpServer::new(config);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, updates_rx, server_shutdown).await;
    });

    TestGateway {
        addr,
        config_updates,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}
