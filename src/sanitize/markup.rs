//! Markup stripping.
//!
//! A crude tag filter in two passes:
//! 1. `<script>` and `<style>` elements are dropped together with their
//!    content. An unclosed element runs to the end of the string.
//! 2. Every `<`, run of non-`>` characters, `>` is deleted.
//!
//! This is not an HTML parser. Leftover `<` or `>` characters that do not
//! form a complete tag are kept. After both passes no `<` is followed by a
//! `>`, so a second run changes nothing.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::sanitize::walk::{walk, NodeRule};
use crate::sanitize::{SanitizeOptions, SanitizeReport};

lazy_static! {
    static ref RAW_TEXT_ELEMENT: Regex = Regex::new(
        r"(?is)<script\b[^>]*>.*?(?:</script\s*>|\z)|<style\b[^>]*>.*?(?:</style\s*>|\z)"
    )
    .unwrap();
    static ref MARKUP_PATTERN: Regex = Regex::new(r"<[^>]*>").unwrap();
}

/// Remove script and style elements, then every markup-shaped substring.
///
/// Borrows when there is nothing to remove.
pub fn strip_markup_text(text: &str) -> Cow<'_, str> {
    match RAW_TEXT_ELEMENT.replace_all(text, "") {
        Cow::Borrowed(text) => MARKUP_PATTERN.replace_all(text, ""),
        Cow::Owned(text) => Cow::Owned(MARKUP_PATTERN.replace_all(&text, "").into_owned()),
    }
}

struct MarkupRule;

impl NodeRule for MarkupRule {
    fn visit_string(&mut self, text: &mut String, report: &mut SanitizeReport) {
        let cleaned = match strip_markup_text(text) {
            Cow::Borrowed(_) => return,
            Cow::Owned(cleaned) => cleaned,
        };
        *text = cleaned;
        report.strings_rewritten += 1;
    }
}

/// Strip markup from every string reachable from `node`, including the
/// root itself when it is a string.
pub fn strip_markup(node: &mut Value, options: &SanitizeOptions) -> SanitizeReport {
    walk(node, options, &mut MarkupRule)
}
