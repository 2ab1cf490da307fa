//! Tests for the coroutine dispatcher.
//!
//! Covers handler registration and lookup, reply coercion at the dispatch
//! boundary, API-error conversion, panic recovery, and middleware
//! short-circuiting.

mod common;

use gantry::dispatcher::{Dispatcher, HandlerRequest};
use gantry::error::ApiError;
use gantry::middleware::Middleware;
use gantry::reply::{Reply, WireResponse};
use gantry::route::{RouteDef, SignatureSpec};
use gantry::router::{RouteMatch, Router};
use gantry::{CallArgs, Method};
use serde_json::json;
use std::sync::Arc;

fn register(
    router: &mut Router,
    dispatcher: &mut Dispatcher,
    def: RouteDef,
) {
    router.register(&def).expect("register route");
    unsafe {
        dispatcher.register_handler(def.name, def.handler.clone());
    }
}

fn matched(router: &Router, method: Method, path: &str) -> RouteMatch {
    router.route(method, path).expect("route match")
}

fn args(pairs: &[(&str, serde_json::Value)]) -> CallArgs {
    let mut map = CallArgs::new();
    for (k, v) in pairs {
        map.insert(k.to_string(), v.clone());
    }
    map
}

#[test]
fn test_dispatch_json_reply() {
    common::setup_runtime();
    let mut router = Router::new();
    let mut dispatcher = Dispatcher::new();
    register(
        &mut router,
        &mut dispatcher,
        RouteDef::new(
            "echo",
            Arc::new(|mut ctx| {
                let name: String = ctx.take("name")?;
                Ok(Reply::Json(json!({ "name": name })))
            }),
        )
        .with_method(Method::GET)
        .with_path("/echo")
        .with_signature(SignatureSpec {
            params: vec!["name"],
            required: vec!["name"],
            accepts_extra: false,
        }),
    );

    let m = matched(&router, Method::GET, "/echo");
    let res = dispatcher
        .dispatch(&m, args(&[("name", json!("zoe"))]), None)
        .expect("dispatch");
    assert_eq!(res.status, 200);
    assert_eq!(
        res.get_header("content-type"),
        Some("application/json; charset=utf-8")
    );
    let body: serde_json::Value = serde_json::from_slice(&res.body).unwrap();
    assert_eq!(body, json!({ "name": "zoe" }));
}

#[test]
fn test_dispatch_unregistered_handler_is_none() {
    common::setup_runtime();
    let mut router = Router::new();
    let dispatcher = Dispatcher::new();
    router
        .register(
            &RouteDef::new("ghost", Arc::new(|_| Ok(Reply::Status(204))))
                .with_method(Method::GET)
                .with_path("/ghost"),
        )
        .unwrap();
    let m = matched(&router, Method::GET, "/ghost");
    assert!(dispatcher.dispatch(&m, CallArgs::new(), None).is_none());
}

#[test]
fn test_api_error_becomes_structured_body() {
    common::setup_runtime();
    let mut router = Router::new();
    let mut dispatcher = Dispatcher::new();
    register(
        &mut router,
        &mut dispatcher,
        RouteDef::new(
            "fails",
            Arc::new(|_| Err(ApiError::value_invalid("email", "malformed address").into())),
        )
        .with_method(Method::GET)
        .with_path("/fails"),
    );

    let m = matched(&router, Method::GET, "/fails");
    let res = dispatcher.dispatch(&m, CallArgs::new(), None).unwrap();
    // Application-declared failures keep HTTP 200 with a JSON error body.
    assert_eq!(res.status, 200);
    let body: serde_json::Value = serde_json::from_slice(&res.body).unwrap();
    assert_eq!(body["error"], "value: invalid");
    assert_eq!(body["data"], "email");
    assert_eq!(body["message"], "malformed address");
}

#[test]
fn test_bad_request_from_handler() {
    common::setup_runtime();
    let mut router = Router::new();
    let mut dispatcher = Dispatcher::new();
    register(
        &mut router,
        &mut dispatcher,
        RouteDef::new(
            "picky",
            Arc::new(|mut ctx| {
                let _n: i64 = ctx.take("n")?;
                Ok(Reply::Status(204))
            }),
        )
        .with_method(Method::GET)
        .with_path("/picky")
        .with_signature(SignatureSpec {
            params: vec!["n"],
            required: vec!["n"],
            accepts_extra: false,
        }),
    );

    let m = matched(&router, Method::GET, "/picky");
    let res = dispatcher
        .dispatch(&m, args(&[("n", json!("not-a-number"))]), None)
        .unwrap();
    assert_eq!(res.status, 400);
    assert!(String::from_utf8_lossy(&res.body).contains("Invalid argument: n"));
}

#[test]
fn test_panic_handler_returns_500() {
    common::setup_runtime();
    let mut router = Router::new();
    let mut dispatcher = Dispatcher::new();
    register(
        &mut router,
        &mut dispatcher,
        RouteDef::new("boom", Arc::new(|_| panic!("boom")))
            .with_method(Method::GET)
            .with_path("/boom"),
    );

    let m = matched(&router, Method::GET, "/boom");
    let res = dispatcher.dispatch(&m, CallArgs::new(), None).unwrap();
    assert_eq!(res.status, 500);
    let body: serde_json::Value = serde_json::from_slice(&res.body).unwrap();
    assert!(body.get("error").is_some());
}

struct DenyAll;

impl Middleware for DenyAll {
    fn before(&self, _req: &HandlerRequest) -> Option<Reply> {
        Some(Reply::StatusMessage(403, "denied".to_string()))
    }
}

struct Stamp;

impl Middleware for Stamp {
    fn after(&self, _req: &HandlerRequest, res: &mut WireResponse, _latency: std::time::Duration) {
        res.set_header("X-Stamp", "1".to_string());
    }
}

#[test]
fn test_middleware_short_circuit_and_after() {
    common::setup_runtime();
    let mut router = Router::new();
    let mut dispatcher = Dispatcher::new();
    register(
        &mut router,
        &mut dispatcher,
        RouteDef::new("open", Arc::new(|_| Ok(Reply::Text("hi".to_string()))))
            .with_method(Method::GET)
            .with_path("/open"),
    );
    dispatcher.add_middleware(Arc::new(DenyAll));
    dispatcher.add_middleware(Arc::new(Stamp));

    let m = matched(&router, Method::GET, "/open");
    let res = dispatcher.dispatch(&m, CallArgs::new(), None).unwrap();
    assert_eq!(res.status, 403);
    assert_eq!(res.body, b"denied");
    // after() still runs on short-circuited responses
    assert_eq!(res.get_header("x-stamp"), Some("1"));
}

#[test]
fn test_handler_replacement_last_wins() {
    common::setup_runtime();
    let mut dispatcher = Dispatcher::new();
    unsafe {
        dispatcher.register_handler("dup", Arc::new(|_| Ok(Reply::Text("one".to_string()))));
        dispatcher.register_handler("dup", Arc::new(|_| Ok(Reply::Text("two".to_string()))));
    }
    assert!(dispatcher.has_handler("dup"));

    let mut router = Router::new();
    router
        .register(
            &RouteDef::new("dup", Arc::new(|_| Ok(Reply::Status(204))))
                .with_method(Method::GET)
                .with_path("/dup"),
        )
        .unwrap();
    let m = matched(&router, Method::GET, "/dup");
    let res = dispatcher.dispatch(&m, CallArgs::new(), None).unwrap();
    assert_eq!(res.body, b"two");
}
