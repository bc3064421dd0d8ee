//! Sanitizing gateway library.
//!
//! An HTTP gateway that strips document-database operator keys and markup
//! from request payloads before forwarding them to backend services.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod sanitize;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
