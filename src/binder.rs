//! Per-request call-argument construction.
//!
//! Given the cached [`HandlerSignature`] and the parsed request, build the
//! [`CallArgs`] mapping the handler will be invoked with:
//!
//! - body/query are only parsed when the handler declares named parameters,
//!   a required subset, or a catch-all;
//! - POST is content-negotiated (JSON object, urlencoded form, multipart
//!   fields), GET takes the first query value per key;
//! - without a catch-all, body/query keys are filtered down to the declared
//!   parameter names before matched path parameters are overlaid on top
//!   (path parameters always win, with a warning on collision);
//! - missing required names reject the request with a 400.

use crate::error::BindRejection;
use crate::route::{CallArgs, HandlerSignature};
use crate::router::ParamVec;
use crate::server::request::{
    multipart_boundary, parse_form_urlencoded, parse_multipart_fields, parse_query_first,
    ParsedRequest,
};
use serde_json::Value;
use tracing::{debug, warn};

/// Build the call arguments for one request.
pub fn bind(
    sig: &HandlerSignature,
    req: &ParsedRequest,
    path_params: &ParamVec,
) -> Result<CallArgs, BindRejection> {
    let mut kw: Option<CallArgs> = None;

    if sig.needs_args() {
        if req.method == "POST" {
            kw = Some(parse_post_body(req)?);
        } else if req.method == "GET" {
            if let Some(query) = req.query.as_deref() {
                if !query.is_empty() {
                    kw = Some(parse_query_first(query));
                }
            }
        }
    }

    let args = match kw {
        // Body/query never parsed (or empty): arguments come purely from
        // the matched path parameters.
        None => {
            let mut args = CallArgs::new();
            for (k, v) in path_params {
                args.insert(k.to_string(), Value::String(v.clone()));
            }
            args
        }
        Some(mut args) => {
            if !sig.accepts_extra && !sig.named.is_empty() {
                // Extra keys supplied by the caller are silently dropped.
                args.retain(|k, _| sig.named.iter().any(|n| n == k));
            }
            for (k, v) in path_params {
                if args.contains_key(k.as_ref()) {
                    warn!(
                        arg = %k,
                        "Duplicate arg name in named arg and kw args"
                    );
                }
                args.insert(k.to_string(), Value::String(v.clone()));
            }
            args
        }
    };

    for name in &sig.required {
        if !args.contains_key(name) {
            return Err(BindRejection::MissingArgument(name.clone()));
        }
    }

    debug!(args = ?args, "Call arguments bound");
    Ok(args)
}

fn parse_post_body(req: &ParsedRequest) -> Result<CallArgs, BindRejection> {
    let Some(content_type) = req.content_type() else {
        return Err(BindRejection::MissingContentType);
    };
    let ct = content_type.to_ascii_lowercase();

    if ct.starts_with("application/json") {
        let value: Value = serde_json::from_slice(&req.body)
            .map_err(|_| BindRejection::JsonBodyNotObject)?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(BindRejection::JsonBodyNotObject),
        }
    } else if ct.starts_with("application/x-www-form-urlencoded") {
        Ok(parse_form_urlencoded(&req.body))
    } else if ct.starts_with("multipart/form-data") {
        let Some(boundary) = multipart_boundary(content_type) else {
            return Err(BindRejection::UnsupportedContentType(
                content_type.to_string(),
            ));
        };
        Ok(parse_multipart_fields(&req.body, &boundary))
    } else {
        Err(BindRejection::UnsupportedContentType(
            content_type.to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::SignatureSpec;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn sig(params: Vec<&'static str>, required: Vec<&'static str>, extra: bool) -> HandlerSignature {
        HandlerSignature::derive(
            "t",
            &SignatureSpec {
                params,
                required,
                accepts_extra: extra,
            },
        )
        .unwrap()
    }

    fn post_json(body: &str) -> ParsedRequest {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        ParsedRequest {
            method: "POST".to_string(),
            path: "/t".to_string(),
            headers,
            body: body.as_bytes().to_vec(),
            ..Default::default()
        }
    }

    fn path_params(pairs: &[(&str, &str)]) -> ParamVec {
        let mut p = ParamVec::new();
        for (k, v) in pairs {
            p.push((Arc::from(*k), v.to_string()));
        }
        p
    }

    #[test]
    fn test_no_named_params_skips_body_parsing() {
        // Malformed JSON body and no Content-Type: a handler without named
        // parameters must never trip over either.
        let req = ParsedRequest {
            method: "POST".to_string(),
            path: "/t".to_string(),
            body: b"{not json".to_vec(),
            ..Default::default()
        };
        let args = bind(&sig(vec![], vec![], false), &req, &path_params(&[("id", "7")])).unwrap();
        assert_eq!(args["id"], "7");
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn test_post_missing_content_type() {
        let req = ParsedRequest {
            method: "POST".to_string(),
            body: b"{}".to_vec(),
            ..Default::default()
        };
        let err = bind(&sig(vec!["name"], vec![], false), &req, &ParamVec::new()).unwrap_err();
        assert_eq!(err, BindRejection::MissingContentType);
        assert_eq!(err.to_string(), "Missing Content-Type.");
    }

    #[test]
    fn test_post_unsupported_content_type() {
        let mut req = post_json("{}");
        req.headers
            .insert("content-type".to_string(), "text/csv".to_string());
        let err = bind(&sig(vec!["name"], vec![], false), &req, &ParamVec::new()).unwrap_err();
        assert_eq!(err, BindRejection::UnsupportedContentType("text/csv".to_string()));
    }

    #[test]
    fn test_post_json_non_object_rejected() {
        let req = post_json("[1, 2, 3]");
        let err = bind(&sig(vec!["name"], vec![], false), &req, &ParamVec::new()).unwrap_err();
        assert_eq!(err, BindRejection::JsonBodyNotObject);
    }

    #[test]
    fn test_post_json_object_bound() {
        let req = post_json(r#"{"name": "alice", "age": 30}"#);
        let args = bind(
            &sig(vec!["name", "age"], vec!["name"], false),
            &req,
            &ParamVec::new(),
        )
        .unwrap();
        assert_eq!(args["name"], "alice");
        assert_eq!(args["age"], 30);
    }

    #[test]
    fn test_extra_keys_dropped_without_catch_all() {
        let req = post_json(r#"{"name": "alice", "spurious": true}"#);
        let args = bind(&sig(vec!["name"], vec![], false), &req, &ParamVec::new()).unwrap();
        assert!(args.contains_key("name"));
        assert!(!args.contains_key("spurious"));
    }

    #[test]
    fn test_extra_keys_kept_with_catch_all() {
        let req = post_json(r#"{"name": "alice", "spurious": true}"#);
        let args = bind(&sig(vec!["name"], vec![], true), &req, &ParamVec::new()).unwrap();
        assert!(args.contains_key("spurious"));
    }

    #[test]
    fn test_path_params_override_body() {
        let req = post_json(r#"{"id": "from-body", "name": "alice"}"#);
        let args = bind(
            &sig(vec!["id", "name"], vec![], false),
            &req,
            &path_params(&[("id", "from-path")]),
        )
        .unwrap();
        assert_eq!(args["id"], "from-path");
        assert_eq!(args["name"], "alice");
    }

    #[test]
    fn test_get_query_first_value() {
        let req = ParsedRequest {
            method: "GET".to_string(),
            query: Some("page=1&page=2&q=rust".to_string()),
            ..Default::default()
        };
        let args = bind(&sig(vec!["page", "q"], vec![], false), &req, &ParamVec::new()).unwrap();
        assert_eq!(args["page"], "1");
        assert_eq!(args["q"], "rust");
    }

    #[test]
    fn test_get_empty_query_falls_back_to_path_params() {
        let req = ParsedRequest {
            method: "GET".to_string(),
            query: None,
            ..Default::default()
        };
        let args = bind(
            &sig(vec!["id"], vec![], false),
            &req,
            &path_params(&[("id", "9")]),
        )
        .unwrap();
        assert_eq!(args["id"], "9");
    }

    #[test]
    fn test_missing_required_argument() {
        let req = ParsedRequest {
            method: "GET".to_string(),
            query: Some("other=1".to_string()),
            ..Default::default()
        };
        let err = bind(&sig(vec!["id", "other"], vec!["id"], false), &req, &ParamVec::new())
            .unwrap_err();
        assert_eq!(err, BindRejection::MissingArgument("id".to_string()));
        assert_eq!(err.to_string(), "Missing argument: id");
    }

    #[test]
    fn test_form_urlencoded_body_bound() {
        let mut headers = HashMap::new();
        headers.insert(
            "content-type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        );
        let req = ParsedRequest {
            method: "POST".to_string(),
            headers,
            body: b"name=bob&city=zurich".to_vec(),
            ..Default::default()
        };
        let args = bind(
            &sig(vec!["name", "city"], vec!["name"], false),
            &req,
            &ParamVec::new(),
        )
        .unwrap();
        assert_eq!(args["name"], "bob");
        assert_eq!(args["city"], "zurich");
    }

    #[test]
    fn test_multipart_body_bound() {
        let mut headers = HashMap::new();
        headers.insert(
            "content-type".to_string(),
            "multipart/form-data; boundary=SEP".to_string(),
        );
        let body =
            "--SEP\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nhi\r\n--SEP--\r\n";
        let req = ParsedRequest {
            method: "POST".to_string(),
            headers,
            body: body.as_bytes().to_vec(),
            ..Default::default()
        };
        let args = bind(&sig(vec!["title"], vec!["title"], false), &req, &ParamVec::new()).unwrap();
        assert_eq!(args["title"], "hi");
    }
}
