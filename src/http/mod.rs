//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, global layers)
//!     → request_id.rs (add/propagate x-request-id)
//!     → axum route match (path template from config)
//!     → middleware/payload.rs (buffer body, parse JSON, capture params)
//!     → middleware/sanitize.rs (strip operator keys, then markup)
//!     → forward.rs (rebuild request, send upstream)
//!     → response streamed back to client
//! ```

pub mod forward;
pub mod middleware;
pub mod request_id;
pub mod server;
pub mod status;

pub use request_id::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
