//! Raw request parsing.
//!
//! `parse_request` extracts method, path, headers, cookies, the raw query
//! string and the raw body bytes. Body and query stay *unparsed* here: the
//! binder decides per handler whether they are needed at all, so a handler
//! that takes no named arguments never pays for (or trips over) body
//! parsing.

use may_minihttp::Request;
use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;
use tracing::debug;

use crate::dispatcher::HeaderVec;
use crate::route::CallArgs;

/// Parsed HTTP request data used by `AppService` and the binder.
#[derive(Debug, Clone, Default)]
pub struct ParsedRequest {
    /// HTTP method (GET, POST, ...)
    pub method: String,
    /// Request path without the query string
    pub path: String,
    /// Raw query string, if any (without the leading `?`)
    pub query: Option<String>,
    /// HTTP headers (lowercase keys)
    pub headers: HashMap<String, String>,
    /// Parsed cookies from the Cookie header
    pub cookies: HashMap<String, String>,
    /// Raw body bytes, if any
    pub body: Vec<u8>,
}

impl ParsedRequest {
    /// Content-Type header value, if present.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(|s| s.as_str())
    }
}

/// Immutable snapshot of the transport request, handed to handlers that
/// declare a `request` parameter.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub method: http::Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderVec,
    pub cookies: HeaderVec,
}

impl RequestInfo {
    pub fn from_parsed(method: http::Method, parsed: &ParsedRequest) -> Self {
        let mut headers = HeaderVec::new();
        for (k, v) in &parsed.headers {
            headers.push((Arc::from(k.as_str()), v.clone()));
        }
        let mut cookies = HeaderVec::new();
        for (k, v) in &parsed.cookies {
            cookies.push((Arc::from(k.as_str()), v.clone()));
        }
        Self {
            method,
            path: parsed.path.clone(),
            query: parsed.query.clone(),
            headers,
            cookies,
        }
    }

    /// Get a header by name (case-insensitive).
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get a cookie by name.
    #[must_use]
    pub fn get_cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Parse cookies out of a lowercase header map.
pub fn parse_cookies(headers: &HashMap<String, String>) -> HashMap<String, String> {
    headers
        .get("cookie")
        .map(|c| {
            c.split(';')
                .filter_map(|pair| {
                    let mut parts = pair.trim().splitn(2, '=');
                    let name = parts.next()?.trim().to_string();
                    let value = parts.next().unwrap_or("").trim().to_string();
                    Some((name, value))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Parse a query string taking the *first* value per key.
///
/// Mirrors classic `parse_qs(...)[0]` semantics: `?a=1&a=2` binds `a` to `1`.
pub fn parse_query_first(query: &str) -> CallArgs {
    let mut out = CallArgs::new();
    for (k, v) in url::form_urlencoded::parse(query.as_bytes()) {
        out.entry(k.to_string())
            .or_insert_with(|| serde_json::Value::String(v.to_string()));
    }
    out
}

/// Parse an `application/x-www-form-urlencoded` body into string fields.
pub fn parse_form_urlencoded(body: &[u8]) -> CallArgs {
    let mut out = CallArgs::new();
    for (k, v) in url::form_urlencoded::parse(body) {
        out.insert(k.to_string(), serde_json::Value::String(v.to_string()));
    }
    out
}

/// Extract the boundary token from a `multipart/form-data` content type.
pub fn multipart_boundary(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let part = part.trim();
        part.strip_prefix("boundary=")
            .map(|b| b.trim_matches('"').to_string())
    })
}

/// Parse `multipart/form-data` text fields into a string map.
///
/// Only the field name and text payload are retained; transfer framing and
/// per-part headers beyond `Content-Disposition` are ignored. File parts
/// keep their (lossy utf-8) content under the field name.
pub fn parse_multipart_fields(body: &[u8], boundary: &str) -> CallArgs {
    let mut out = CallArgs::new();
    let text = String::from_utf8_lossy(body);
    let delimiter = format!("--{boundary}");
    for part in text.split(delimiter.as_str()) {
        let part = part.trim_start_matches("\r\n");
        if part.is_empty() || part.starts_with("--") {
            continue;
        }
        // Headers and payload are separated by a blank line.
        let Some((head, payload)) = part.split_once("\r\n\r\n") else {
            continue;
        };
        let Some(name) = head.lines().find_map(|line| {
            let (key, rest) = line.split_once(':')?;
            if !key.trim().eq_ignore_ascii_case("content-disposition") {
                return None;
            }
            rest.split(';').find_map(|attr| {
                attr.trim()
                    .strip_prefix("name=")
                    .map(|n| n.trim_matches('"').to_string())
            })
        }) else {
            continue;
        };
        let value = payload.trim_end_matches("\r\n").to_string();
        out.insert(name, serde_json::Value::String(value));
    }
    out
}

/// Parse an incoming `may_minihttp` request into a [`ParsedRequest`].
pub fn parse_request(req: Request) -> ParsedRequest {
    let method = req.method().to_string();
    let raw_path = req.path().to_string();
    let (path, query) = match raw_path.split_once('?') {
        Some((p, q)) => (p.to_string(), Some(q.to_string())),
        None => (raw_path, None),
    };

    let headers: HashMap<String, String> = req
        .headers()
        .iter()
        .map(|h| {
            (
                h.name.to_ascii_lowercase(),
                String::from_utf8_lossy(h.value).to_string(),
            )
        })
        .collect();

    let cookies = parse_cookies(&headers);

    let mut body = Vec::new();
    let _ = req.body().read_to_end(&mut body);

    debug!(
        method = %method,
        path = %path,
        header_count = headers.len(),
        body_bytes = body.len(),
        "HTTP request parsed"
    );

    ParsedRequest {
        method,
        path,
        query,
        headers,
        cookies,
        body,
    }
}
