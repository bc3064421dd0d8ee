//! Per-route middleware.
//!
//! Runs in this order for every configured route:
//! ```text
//! payload.rs   capture body + path params   (may reject: 400)
//! sanitize.rs  strip operator keys          (never rejects)
//! sanitize.rs  strip markup                 (never rejects)
//! ```

pub mod payload;
pub mod sanitize;

pub use payload::{capture_payload, PayloadError, PayloadLimits, RequestPayload};
pub use sanitize::{strip_markup_stage, strip_operator_keys_stage, SanitizerHandle, SanitizerSettings};
