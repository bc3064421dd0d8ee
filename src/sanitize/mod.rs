//! Request payload sanitization.
//!
//! # Data Flow
//! ```text
//! RequestPayload (body + params, serde_json::Value trees)
//!     → operator.rs (drop keys starting with the operator prefix)
//!     → markup.rs   (strip `<...>` substrings from strings)
//!     → forwarded upstream
//! ```
//!
//! Both passes share the work-list walker in `walk.rs`, so recursion depth
//! never depends on attacker-controlled nesting.
//!
//! # Design Decisions
//! - Sanitization mutates the payload in place and never fails
//! - Over-deep containers are replaced by `null` (fail closed)
//! - Array descent is a flag: `false` reproduces the legacy behaviour where
//!   objects nested inside arrays were never visited

pub mod markup;
pub mod operator;
pub mod walk;

pub use markup::{strip_markup, strip_markup_text};
pub use operator::strip_operator_keys;
pub use walk::{walk, NodeRule};

/// Default operator prefix used by document databases (`$gt`, `$where`, ...).
pub const DEFAULT_OPERATOR_PREFIX: char = '$';

/// Default maximum container nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Knobs shared by both sanitizing passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizeOptions {
    /// Keys starting with this character are removed by the operator pass.
    pub operator_prefix: char,
    /// Visit array elements. When false, arrays are left untouched.
    pub descend_into_arrays: bool,
    /// Containers nested deeper than this are replaced by `null`.
    /// The root sits at depth 0.
    pub max_depth: usize,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            operator_prefix: DEFAULT_OPERATOR_PREFIX,
            descend_into_arrays: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl SanitizeOptions {
    /// Options matching the historical middleware: arrays are not descended into.
    pub fn legacy() -> Self {
        Self {
            descend_into_arrays: false,
            ..Self::default()
        }
    }
}

/// What a sanitizing pass changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SanitizeReport {
    pub keys_removed: usize,
    pub strings_rewritten: usize,
    pub subtrees_truncated: usize,
}

impl SanitizeReport {
    /// True when the pass left the payload untouched.
    pub fn is_clean(&self) -> bool {
        self.keys_removed == 0 && self.strings_rewritten == 0 && self.subtrees_truncated == 0
    }

    /// Fold another report into this one.
    pub fn absorb(&mut self, other: SanitizeReport) {
        self.keys_removed += other.keys_removed;
        self.strings_rewritten += other.strings_rewritten;
        self.subtrees_truncated += other.subtrees_truncated;
    }
}
