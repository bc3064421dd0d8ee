//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with one route per configured path template
//! - Wire up per-route middleware (payload capture, sanitizer stages)
//! - Wire up global middleware (body limit, timeout, request ID, tracing)
//! - Bind server to listener and serve until shutdown
//! - Apply hot-reloaded sanitizer settings

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    middleware,
    routing::{any, get},
    Extension, Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::validation::RESERVED_PATHS;
use crate::config::{GatewayConfig, RouteConfig};
use crate::http::forward::forward_handler;
use crate::http::middleware::{
    capture_payload, strip_markup_stage, strip_operator_keys_stage, PayloadLimits,
    SanitizerHandle, SanitizerSettings,
};
use crate::http::request_id::{propagate_request_id_layer, request_id_of, set_request_id_layer};
use crate::http::status::{get_status, not_found};
use crate::routing::{PathTemplate, RouteTarget};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: Client<HttpConnector, Body>,
    pub sanitizer: SanitizerHandle,
    pub route_count: usize,
}

/// HTTP server for the sanitizing gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    sanitizer: SanitizerHandle,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let sanitizer = SanitizerHandle::new(SanitizerSettings::from(&config.sanitizer));

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let targets = build_targets(&config.routes);
        let state = AppState {
            client,
            sanitizer: sanitizer.clone(),
            route_count: targets.len(),
        };

        let router = Self::build_router(&config, state, targets);
        Self {
            router,
            config,
            sanitizer,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState, targets: Vec<Arc<RouteTarget>>) -> Router {
        let limits = PayloadLimits {
            max_body_size: config.limits.max_body_size,
        };

        let mut router = Router::new().route("/status", get(get_status));
        for target in targets {
            // Layers run bottom-up: capture, operator keys, markup, forward.
            let route = any(forward_handler)
                .layer::<_, std::convert::Infallible>(middleware::from_fn_with_state(state.sanitizer.clone(), strip_markup_stage))
                .layer::<_, std::convert::Infallible>(middleware::from_fn_with_state(state.sanitizer.clone(), strip_operator_keys_stage))
                .layer::<_, std::convert::Infallible>(middleware::from_fn_with_state(limits.clone(), capture_payload))
                .layer(Extension(target.clone()));
            router = router.route(target.template.as_str(), route);
        }

        router
            .fallback(not_found)
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let client = request
                    .extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.to_string())
                    .unwrap_or_default();
                tracing::info_span!(
                    "request",
                    request_id = %request_id_of(request),
                    method = %request.method(),
                    path = %request.uri().path(),
                    client = %client
                )
            }))
            .layer(set_request_id_layer())
    }

    /// The fully layered router, for serving in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Handle to the live sanitizer settings.
    pub fn sanitizer(&self) -> SanitizerHandle {
        self.sanitizer.clone()
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configuration updates received while running replace the sanitizer
    /// settings. The server stops once `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.config.routes.len(),
            "HTTP server starting"
        );

        let sanitizer = self.sanitizer.clone();
        let serving_routes = self.config.routes.clone();
        let reloader = tokio::spawn(async move {
            while let Some(next) = config_updates.recv().await {
                apply_update(&sanitizer, &serving_routes, &next);
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn build_targets(routes: &[RouteConfig]) -> Vec<Arc<RouteTarget>> {
    let mut shapes: HashSet<String> = RESERVED_PATHS.iter().map(|path| path.to_string()).collect();
    let mut targets = Vec::with_capacity(routes.len());

    for route in routes {
        let target = match RouteTarget::from_config(route) {
            Ok(target) => target,
            Err(e) => {
                tracing::warn!(route = %route.name, error = %e, "Skipping invalid route");
                continue;
            }
        };
        // axum panics on overlapping registrations.
        if !shapes.insert(target.template.shape()) {
            tracing::warn!(route = %route.name, path = %route.path, "Skipping conflicting route");
            continue;
        }
        targets.push(Arc::new(target));
    }
    targets
}

/// Swap in the sanitizer settings of `next`.
///
/// Routes are fixed for the life of the router, so a changed route table is
/// only reported, and the new operator prefix is checked against the routes
/// actually being served. Returns whether the settings were applied.
fn apply_update(sanitizer: &SanitizerHandle, serving_routes: &[RouteConfig], next: &GatewayConfig) -> bool {
    if serving_routes != next.routes.as_slice() {
        tracing::warn!("Route table changed, restart the gateway to apply it");
    }

    let prefix = next.sanitizer.operator_prefix;
    let clashes: Vec<String> = serving_routes
        .iter()
        .filter_map(|route| PathTemplate::parse(&route.path).ok().map(|template| (route, template)))
        .flat_map(|(route, template)| {
            template
                .capture_names()
                .filter(|name| name.starts_with(prefix))
                .map(|name| format!("{}:{}", route.name, name))
                .collect::<Vec<_>>()
        })
        .collect();
    if !clashes.is_empty() {
        tracing::error!(
            operator_prefix = %prefix,
            captures = ?clashes,
            "Rejecting reload: served captures start with the new operator prefix"
        );
        return false;
    }

    let settings = SanitizerSettings::from(&next.sanitizer);
    tracing::info!(
        strip_operator_keys = settings.strip_operator_keys,
        strip_markup = settings.strip_markup,
        descend_into_arrays = settings.options.descend_into_arrays,
        max_depth = settings.options.max_depth,
        "Sanitizer settings reloaded"
    );
    sanitizer.store(settings);
    true
}
