//! Handler return values and their coercion to wire responses.
//!
//! Handlers return a [`Reply`] - the tagged union of recognized shorthand
//! shapes - and [`coerce`] resolves it into a [`WireResponse`] in one place,
//! keeping handler code declarative. Variants are matched in a fixed
//! priority order:
//!
//! 1. protocol-native responses pass through unchanged,
//! 2. raw bytes become `application/octet-stream`,
//! 3. text becomes `text/html` unless it carries the `redirect:` prefix,
//! 4. JSON objects become `application/json` unless they carry the reserved
//!    `__template__` key, which selects template rendering instead,
//! 5. status codes in `[100, 600)` become bare (or message-carrying)
//!    status responses,
//! 6. anything else is stringified as `text/plain`.

use crate::templates::TemplateEngine;
use serde_json::Value;
use smallvec::SmallVec;
use std::sync::Arc;
use thiserror::Error;

/// Maximum inline headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage for the hot path.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Reserved key selecting template rendering for a JSON-object reply.
pub const TEMPLATE_KEY: &str = "__template__";

/// Reserved prefix turning a text reply into a redirect.
pub const REDIRECT_PREFIX: &str = "redirect:";

/// Inclusive-exclusive range of status codes honored by the status variants.
const STATUS_RANGE: std::ops::Range<u16> = 100..600;

/// A fully resolved wire-level response.
#[derive(Debug, Clone)]
pub struct WireResponse {
    pub status: u16,
    pub headers: HeaderVec,
    pub body: Vec<u8>,
}

impl WireResponse {
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HeaderVec::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_body(status: u16, content_type: &str, body: Vec<u8>) -> Self {
        let mut res = Self::new(status);
        res.set_header("Content-Type", content_type.to_string());
        res.body = body;
        res
    }

    /// JSON response with the value serialized as the body.
    #[must_use]
    pub fn json(status: u16, value: &Value) -> Self {
        Self::with_body(
            status,
            "application/json; charset=utf-8",
            serde_json::to_vec(value).unwrap_or_default(),
        )
    }

    /// JSON error body `{"error": message}`.
    #[must_use]
    pub fn json_error(status: u16, message: &str) -> Self {
        Self::json(status, &serde_json::json!({ "error": message }))
    }

    /// Plain-text client failure, used for all bind rejections.
    #[must_use]
    pub fn bad_request(message: &str) -> Self {
        Self::with_body(400, "text/plain; charset=utf-8", message.as_bytes().to_vec())
    }

    /// Get a header by name (case-insensitive).
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header.
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

/// The recognized shorthand return shapes of a handler.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Protocol-native response: passes through coercion unchanged.
    Raw(WireResponse),
    /// Raw byte sequence; served as `application/octet-stream`.
    Bytes(Vec<u8>),
    /// Text; `redirect:` prefix turns it into a redirect, anything else is
    /// served as `text/html`.
    Text(String),
    /// Explicit redirect to the given location.
    Redirect(String),
    /// JSON value; an object with the `__template__` key renders that
    /// template with the object as context instead.
    Json(Value),
    /// Explicit template render.
    Template { name: String, context: Value },
    /// Bare status code, no body.
    Status(u16),
    /// Status code plus stringified message body.
    StatusMessage(u16, String),
    /// Anything else: stringified as `text/plain`.
    Other(Value),
}

impl Reply {
    /// Convenience constructor for JSON object replies.
    pub fn json(value: impl serde::Serialize) -> Self {
        Reply::Json(serde_json::to_value(value).unwrap_or(Value::Null))
    }

    /// Convenience constructor for template replies.
    pub fn template(name: impl Into<String>, context: Value) -> Self {
        Reply::Template {
            name: name.into(),
            context,
        }
    }
}

/// Coercion failures; surfaced to the client as a 500.
#[derive(Debug, Error)]
pub enum CoerceError {
    #[error("template `{name}` unavailable: no template engine configured")]
    NoTemplateEngine { name: String },
    #[error(transparent)]
    Template(#[from] crate::error::TemplateError),
}

/// Resolve a [`Reply`] into a [`WireResponse`].
pub fn coerce(reply: Reply, templates: Option<&TemplateEngine>) -> Result<WireResponse, CoerceError> {
    match reply {
        Reply::Raw(res) => Ok(res),
        Reply::Bytes(bytes) => Ok(WireResponse::with_body(
            200,
            "application/octet-stream",
            bytes,
        )),
        Reply::Text(text) => match text.strip_prefix(REDIRECT_PREFIX) {
            Some(location) => Ok(redirect_to(location)),
            None => Ok(WireResponse::with_body(
                200,
                "text/html; charset=utf-8",
                text.into_bytes(),
            )),
        },
        Reply::Redirect(location) => Ok(redirect_to(&location)),
        Reply::Json(value) => {
            if let Some(template) = value
                .as_object()
                .and_then(|map| map.get(TEMPLATE_KEY))
                .and_then(|t| t.as_str())
            {
                render_template(template.to_string(), value.clone(), templates)
            } else {
                Ok(WireResponse::json(200, &value))
            }
        }
        Reply::Template { name, context } => render_template(name, context, templates),
        Reply::Status(status) if STATUS_RANGE.contains(&status) => Ok(WireResponse::new(status)),
        Reply::Status(status) => Ok(stringified(Value::from(status))),
        Reply::StatusMessage(status, message) if STATUS_RANGE.contains(&status) => {
            Ok(WireResponse::with_body(
                status,
                "text/plain; charset=utf-8",
                message.into_bytes(),
            ))
        }
        Reply::StatusMessage(status, message) => {
            Ok(stringified(Value::String(format!("({status}, {message})"))))
        }
        Reply::Other(value) => Ok(stringified(value)),
    }
}

fn redirect_to(location: &str) -> WireResponse {
    let mut res = WireResponse::new(302);
    res.set_header("Location", location.to_string());
    res
}

fn render_template(
    name: String,
    context: Value,
    templates: Option<&TemplateEngine>,
) -> Result<WireResponse, CoerceError> {
    let Some(engine) = templates else {
        return Err(CoerceError::NoTemplateEngine { name });
    };
    let html = engine.render(&name, &context)?;
    Ok(WireResponse::with_body(
        200,
        "text/html; charset=utf-8",
        html.into_bytes(),
    ))
}

fn stringified(value: Value) -> WireResponse {
    let text = match value {
        Value::String(s) => s,
        other => other.to_string(),
    };
    WireResponse::with_body(200, "text/plain; charset=utf-8", text.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn coerced(reply: Reply) -> WireResponse {
        coerce(reply, None).unwrap()
    }

    #[test]
    fn test_raw_passes_through() {
        let raw = WireResponse::with_body(418, "text/plain", b"teapot".to_vec());
        let res = coerced(Reply::Raw(raw));
        assert_eq!(res.status, 418);
        assert_eq!(res.body, b"teapot");
    }

    #[test]
    fn test_bytes_are_octet_stream() {
        let res = coerced(Reply::Bytes(vec![0xde, 0xad]));
        assert_eq!(res.get_header("content-type"), Some("application/octet-stream"));
        assert_eq!(res.body, vec![0xde, 0xad]);
    }

    #[test]
    fn test_text_is_html() {
        let res = coerced(Reply::Text("<h1>hi</h1>".to_string()));
        assert_eq!(res.status, 200);
        assert_eq!(res.get_header("content-type"), Some("text/html; charset=utf-8"));
    }

    #[test]
    fn test_redirect_prefix() {
        let res = coerced(Reply::Text("redirect:/login".to_string()));
        assert_eq!(res.status, 302);
        assert_eq!(res.get_header("location"), Some("/login"));
        assert!(res.body.is_empty());
    }

    #[test]
    fn test_json_object() {
        let res = coerced(Reply::Json(json!({"a": 1})));
        assert_eq!(res.status, 200);
        assert_eq!(
            res.get_header("content-type"),
            Some("application/json; charset=utf-8")
        );
        let round: Value = serde_json::from_slice(&res.body).unwrap();
        assert_eq!(round, json!({"a": 1}));
    }

    #[test]
    fn test_bare_status() {
        let res = coerced(Reply::Status(204));
        assert_eq!(res.status, 204);
        assert!(res.body.is_empty());
    }

    #[test]
    fn test_status_out_of_range_is_stringified() {
        let res = coerced(Reply::Status(42));
        assert_eq!(res.status, 200);
        assert_eq!(res.get_header("content-type"), Some("text/plain; charset=utf-8"));
        assert_eq!(res.body, b"42");
    }

    #[test]
    fn test_status_with_message() {
        let res = coerced(Reply::StatusMessage(404, "not found".to_string()));
        assert_eq!(res.status, 404);
        assert_eq!(res.body, b"not found");
    }

    #[test]
    fn test_other_is_plain_text() {
        let res = coerced(Reply::Other(json!(3.25)));
        assert_eq!(res.get_header("content-type"), Some("text/plain; charset=utf-8"));
        assert_eq!(res.body, b"3.25");
    }

    #[test]
    fn test_template_without_engine_fails() {
        let err = coerce(
            Reply::Json(json!({"__template__": "index.html", "name": "x"})),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CoerceError::NoTemplateEngine { .. }));
    }
}
