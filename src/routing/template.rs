//! Path templates.
//!
//! # Responsibilities
//! - Parse route paths in axum syntax: literals, `{name}`, trailing `{*name}`
//! - Reject templates axum would panic on at registration time
//! - Re-render the upstream path from (sanitized) captured params
//!
//! # Design Decisions
//! - Captures must span a whole segment
//! - Rendering percent-encodes each segment through `url`, so a captured
//!   value can never introduce extra path segments (except a catch-all)

use std::borrow::Cow;
use std::collections::HashSet;

use serde_json::Value;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("path must start with '/'")]
    MissingLeadingSlash,

    #[error("invalid capture name '{0}'")]
    InvalidCaptureName(String),

    #[error("capture must span a whole segment: '{0}'")]
    PartialCapture(String),

    #[error("segment '{0}' uses ':'/'*' syntax, use '{{name}}' or '{{*name}}'")]
    LegacySyntax(String),

    #[error("catch-all '{0}' must be the last segment")]
    CatchAllNotLast(String),

    #[error("capture '{0}' appears more than once")]
    DuplicateCapture(String),

    #[error("upstream '{0}' cannot carry a path")]
    UnroutableBase(String),
}

/// One `/`-separated piece of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Capture(String),
    CatchAll(String),
}

/// A parsed route path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    pub fn parse(raw: &str) -> Result<Self, TemplateError> {
        let rest = raw.strip_prefix('/').ok_or(TemplateError::MissingLeadingSlash)?;
        let parts: Vec<&str> = rest.split('/').collect();
        let mut seen = HashSet::new();
        let mut segments = Vec::with_capacity(parts.len());

        for (index, part) in parts.iter().enumerate() {
            let segment = match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                Some(inner) => {
                    let (name, catch_all) = match inner.strip_prefix('*') {
                        Some(name) => (name, true),
                        None => (inner, false),
                    };
                    if !is_valid_name(name) {
                        return Err(TemplateError::InvalidCaptureName(name.to_string()));
                    }
                    if catch_all && index + 1 != parts.len() {
                        return Err(TemplateError::CatchAllNotLast(name.to_string()));
                    }
                    if !seen.insert(name) {
                        return Err(TemplateError::DuplicateCapture(name.to_string()));
                    }
                    if catch_all {
                        Segment::CatchAll(name.to_string())
                    } else {
                        Segment::Capture(name.to_string())
                    }
                }
                None if part.contains('{') || part.contains('}') => {
                    return Err(TemplateError::PartialCapture(part.to_string()));
                }
                None if part.starts_with(':') || part.starts_with('*') => {
                    return Err(TemplateError::LegacySyntax(part.to_string()));
                }
                None => Segment::Literal(part.to_string()),
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The template exactly as configured (axum route syntax).
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Names of all captures, in order.
    pub fn capture_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Capture(name) | Segment::CatchAll(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// The template with capture names erased.
    ///
    /// Two templates with the same shape match the same requests.
    pub fn shape(&self) -> String {
        let mut shape = String::new();
        for segment in &self.segments {
            shape.push('/');
            match segment {
                Segment::Literal(text) => shape.push_str(text),
                Segment::Capture(_) => shape.push_str("{}"),
                Segment::CatchAll(_) => shape.push_str("{*}"),
            }
        }
        shape
    }

    /// Build the upstream URL for this template from `params`.
    ///
    /// Missing or null params render as empty segments; non-string values
    /// render as their JSON text.
    pub fn render(&self, params: Option<&Value>, base: &Url) -> Result<Url, TemplateError> {
        let mut url = base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| TemplateError::UnroutableBase(base.to_string()))?;
            path.clear();
            for segment in &self.segments {
                match segment {
                    Segment::Literal(text) => {
                        path.push(text);
                    }
                    Segment::Capture(name) => {
                        path.push(&param_text(params, name));
                    }
                    Segment::CatchAll(name) => {
                        path.extend(param_text(params, name).split('/'));
                    }
                }
            }
        }
        Ok(url)
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn param_text<'a>(params: Option<&'a Value>, name: &str) -> Cow<'a, str> {
    match params.and_then(|params| params.get(name)) {
        Some(Value::String(text)) => Cow::Borrowed(text),
        Some(Value::Null) | None => Cow::Borrowed(""),
        Some(other) => Cow::Owned(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> Url {
        Url::parse("http://127.0.0.1:4000").unwrap()
    }

    #[test]
    fn test_parse_segments() {
        let template = PathTemplate::parse("/api/jobs/{id}/applications/{*rest}").unwrap();
        assert_eq!(
            template.segments,
            vec![
                Segment::Literal("api".into()),
                Segment::Literal("jobs".into()),
                Segment::Capture("id".into()),
                Segment::Literal("applications".into()),
                Segment::CatchAll("rest".into()),
            ]
        );
        assert_eq!(template.capture_names().collect::<Vec<_>>(), vec!["id", "rest"]);
        assert_eq!(template.shape(), "/api/jobs/{}/applications/{*}");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(PathTemplate::parse("api"), Err(TemplateError::MissingLeadingSlash));
        assert_eq!(
            PathTemplate::parse("/jobs/{}"),
            Err(TemplateError::InvalidCaptureName(String::new()))
        );
        assert_eq!(
            PathTemplate::parse("/jobs/{$id}"),
            Err(TemplateError::InvalidCaptureName("$id".into()))
        );
        assert_eq!(
            PathTemplate::parse("/jobs/id-{id}"),
            Err(TemplateError::PartialCapture("id-{id}".into()))
        );
        assert_eq!(
            PathTemplate::parse("/jobs/:id"),
            Err(TemplateError::LegacySyntax(":id".into()))
        );
        assert_eq!(
            PathTemplate::parse("/files/{*path}/raw"),
            Err(TemplateError::CatchAllNotLast("path".into()))
        );
        assert_eq!(
            PathTemplate::parse("/a/{id}/b/{id}"),
            Err(TemplateError::DuplicateCapture("id".into()))
        );
    }

    #[test]
    fn test_shape_ignores_capture_names() {
        let a = PathTemplate::parse("/api/jobs/{id}").unwrap();
        let b = PathTemplate::parse("/api/jobs/{job_id}").unwrap();
        assert_eq!(a.shape(), b.shape());
    }

    #[test]
    fn test_render_substitutes_params() {
        let template = PathTemplate::parse("/api/messages/{thread}").unwrap();
        let url = template
            .render(Some(&json!({ "thread": "42" })), &base())
            .unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:4000/api/messages/42");
    }

    #[test]
    fn test_render_encodes_capture_as_single_segment() {
        let template = PathTemplate::parse("/api/jobs/{id}").unwrap();
        let url = template
            .render(Some(&json!({ "id": "a/b c" })), &base())
            .unwrap();
        assert_eq!(url.path(), "/api/jobs/a%2Fb%20c");
    }

    #[test]
    fn test_render_catch_all_keeps_slashes() {
        let template = PathTemplate::parse("/files/{*path}").unwrap();
        let url = template
            .render(Some(&json!({ "path": "resumes/2024/cv.pdf" })), &base())
            .unwrap();
        assert_eq!(url.path(), "/files/resumes/2024/cv.pdf");
    }

    #[test]
    fn test_render_missing_param_is_empty_segment() {
        let template = PathTemplate::parse("/api/jobs/{id}").unwrap();
        let url = template.render(None, &base()).unwrap();
        assert_eq!(url.path(), "/api/jobs/");
    }

    #[test]
    fn test_render_root_and_trailing_slash() {
        let root = PathTemplate::parse("/").unwrap();
        assert_eq!(root.render(None, &base()).unwrap().path(), "/");

        let trailing = PathTemplate::parse("/api/jobs/").unwrap();
        assert_eq!(trailing.render(None, &base()).unwrap().path(), "/api/jobs/");
    }
}
