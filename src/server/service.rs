use super::request::{parse_request, ParsedRequest, RequestInfo};
use super::response::{write_bad_request, write_json_error, write_wire_response};
use crate::binder;
use crate::dispatcher::Dispatcher;
use crate::router::Router;
use crate::static_files::StaticFiles;
use http::Method;
use may_minihttp::{HttpService, Request, Response};
use serde_json::json;
use std::io;
use std::sync::{Arc, RwLock};

/// URL prefix under which static files are served.
pub const STATIC_PREFIX: &str = "/static/";

/// The request-handling service: route lookup, argument binding, dispatch
/// and response writing for one incoming request at a time.
pub struct AppService {
    pub router: Arc<RwLock<Router>>,
    pub dispatcher: Arc<RwLock<Dispatcher>>,
    pub static_files: Option<StaticFiles>,
}

impl Clone for AppService {
    fn clone(&self) -> Self {
        Self {
            router: self.router.clone(),
            dispatcher: self.dispatcher.clone(),
            static_files: self.static_files.clone(),
        }
    }
}

impl AppService {
    pub fn new(
        router: Arc<RwLock<Router>>,
        dispatcher: Arc<RwLock<Dispatcher>>,
        static_files: Option<StaticFiles>,
    ) -> Self {
        Self {
            router,
            dispatcher,
            static_files,
        }
    }
}

/// Basic health check endpoint returning `{ "status": "ok" }`.
fn health_endpoint(res: &mut Response) -> io::Result<()> {
    res.status_code(200, "OK");
    res.header("Content-Type: application/json; charset=utf-8");
    res.body_vec(br#"{"status":"ok"}"#.to_vec());
    Ok(())
}

fn static_endpoint(res: &mut Response, files: &StaticFiles, path: &str) -> io::Result<()> {
    let rel = path.trim_start_matches(STATIC_PREFIX);
    match files.load(rel) {
        Ok((bytes, content_type)) => {
            res.status_code(200, "OK");
            let header = format!("Content-Type: {content_type}").into_boxed_str();
            res.header(Box::leak(header));
            res.body_vec(bytes);
        }
        Err(_) => {
            write_json_error(res, 404, json!({ "error": "Not Found", "path": path }));
        }
    }
    Ok(())
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let parsed: ParsedRequest = parse_request(req);

        // Only GET and POST are recognized by this layer.
        let method = match parsed.method.as_str() {
            "GET" => Method::GET,
            "POST" => Method::POST,
            other => {
                write_json_error(
                    res,
                    405,
                    json!({ "error": "Method Not Allowed", "method": other }),
                );
                return Ok(());
            }
        };

        if method == Method::GET && parsed.path == "/health" {
            return health_endpoint(res);
        }

        if method == Method::GET && parsed.path.starts_with(STATIC_PREFIX) {
            if let Some(files) = &self.static_files {
                return static_endpoint(res, files, &parsed.path);
            }
        }

        let route_match = {
            let router = self.router.read().unwrap();
            router.route(method.clone(), &parsed.path)
        };
        let Some(route_match) = route_match else {
            write_json_error(
                res,
                404,
                json!({ "error": "Not Found", "method": parsed.method, "path": parsed.path }),
            );
            return Ok(());
        };

        let signature = route_match.entry.signature.clone();
        let args = match binder::bind(&signature, &parsed, &route_match.path_params) {
            Ok(args) => args,
            Err(rejection) => {
                write_bad_request(res, &rejection.to_string());
                return Ok(());
            }
        };
        let request_info = signature
            .wants_request
            .then(|| RequestInfo::from_parsed(method, &parsed));

        let wire = {
            let dispatcher = self.dispatcher.read().unwrap();
            dispatcher.dispatch(&route_match, args, request_info)
        };
        match wire {
            Some(wire) => write_wire_response(res, wire),
            None => {
                write_json_error(
                    res,
                    500,
                    json!({
                        "error": "Handler failed or not registered",
                        "method": parsed.method,
                        "path": parsed.path
                    }),
                );
            }
        }
        Ok(())
    }
}
