//! Dispatcher core - the request-dispatch hot path.

use crate::error::HandlerError;
use crate::ids::RequestId;
use crate::middleware::Middleware;
use crate::reply::{coerce, Reply, WireResponse};
use crate::route::{CallArgs, HandlerFn};
use crate::router::RouteMatch;
use crate::runtime_config::RuntimeConfig;
use crate::server::request::RequestInfo;
use crate::templates::TemplateEngine;
use crate::context::HandlerContext;
use http::Method;
use may::coroutine;
use may::sync::mpsc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Request data passed to a handler coroutine.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// Unique request ID for log correlation
    pub request_id: RequestId,
    /// HTTP method (GET or POST)
    pub method: Method,
    /// Matched route pattern
    pub path: String,
    /// Name of the handler that should process this request
    pub handler_name: String,
    /// Call arguments built by the binder
    pub args: CallArgs,
    /// Raw request snapshot, present when the handler declared `request`
    pub request: Option<RequestInfo>,
    /// Channel for sending the reply back to the dispatcher
    pub reply_tx: mpsc::Sender<Reply>,
}

/// Type alias for a channel sender that feeds requests to a handler.
pub type HandlerSender = mpsc::Sender<HandlerRequest>;

/// Dispatcher that routes bound requests to registered handler coroutines.
#[derive(Clone, Default)]
pub struct Dispatcher {
    handlers: HashMap<String, HandlerSender>,
    middlewares: Vec<Arc<dyn Middleware>>,
    templates: Option<Arc<TemplateEngine>>,
}

impl Dispatcher {
    /// Create a new empty dispatcher; handlers are added with
    /// [`register_handler`](Self::register_handler).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the template engine used to coerce templated replies.
    pub fn set_templates(&mut self, templates: Arc<TemplateEngine>) {
        self.templates = Some(templates);
    }

    /// Add middleware to the processing pipeline. Middleware runs in the
    /// order it was added.
    pub fn add_middleware(&mut self, mw: Arc<dyn Middleware>) {
        self.middlewares.push(mw);
    }

    /// Whether a handler with this name is registered.
    #[must_use]
    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Register a handler and spawn its coroutine.
    ///
    /// Replacing an existing handler drops the old sender, which closes its
    /// channel and lets the old coroutine exit.
    ///
    /// # Safety
    ///
    /// `may::coroutine::Builder::spawn` is unsafe in the `may` runtime; the
    /// caller must ensure the runtime is initialized and that registration
    /// happens during startup, before requests flow.
    pub unsafe fn register_handler(&mut self, name: &str, handler: HandlerFn) {
        let (tx, rx) = mpsc::channel::<HandlerRequest>();
        let name = name.to_string();
        let coroutine_name = name.clone();
        let stack_size = RuntimeConfig::from_env().stack_size;

        if self.handlers.remove(&name).is_some() {
            warn!(
                handler_name = %name,
                "Replaced existing handler - old coroutine will exit"
            );
        }

        let spawn_result = coroutine::Builder::new()
            .stack_size(stack_size)
            .spawn(move || {
                debug!(handler_name = %coroutine_name, stack_size, "Handler coroutine start");
                for req in rx.iter() {
                    let reply_tx = req.reply_tx.clone();
                    let request_id = req.request_id;
                    let handler_name = req.handler_name.clone();

                    let started = Instant::now();
                    let ctx = HandlerContext::new(req.args, req.request);
                    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                        handler(ctx)
                    }));

                    let reply = match outcome {
                        Ok(Ok(reply)) => reply,
                        Ok(Err(HandlerError::BadRequest(message))) => {
                            debug!(
                                request_id = %request_id,
                                handler_name = %handler_name,
                                message = %message,
                                "Handler rejected request"
                            );
                            Reply::Raw(WireResponse::bad_request(&message))
                        }
                        Ok(Err(HandlerError::Api(api))) => {
                            // Application-declared failure: structured JSON
                            // body, not a transport-level fault.
                            info!(
                                request_id = %request_id,
                                handler_name = %handler_name,
                                error = %api.error,
                                "Handler raised API error"
                            );
                            Reply::Json(api.to_body())
                        }
                        Err(panic) => {
                            error!(
                                request_id = %request_id,
                                handler_name = %handler_name,
                                panic = ?panic,
                                "Handler panicked"
                            );
                            Reply::Raw(WireResponse::json_error(500, "Handler panicked"))
                        }
                    };

                    info!(
                        request_id = %request_id,
                        handler_name = %handler_name,
                        execution_time_ms = started.elapsed().as_millis() as u64,
                        "Handler execution complete"
                    );
                    let _ = reply_tx.send(reply);
                }
            });

        if let Err(e) = spawn_result {
            error!(
                handler_name = %name,
                error = %e,
                stack_size,
                "Failed to spawn handler coroutine"
            );
            return;
        }

        self.handlers.insert(name, tx);
    }

    /// Dispatch a bound request to its handler and coerce the reply.
    ///
    /// Returns `None` when no handler is registered for the matched route.
    #[must_use]
    pub fn dispatch(
        &self,
        route_match: &RouteMatch,
        args: CallArgs,
        request: Option<RequestInfo>,
    ) -> Option<WireResponse> {
        let (reply_tx, reply_rx) = mpsc::channel();
        let handler_name = route_match.entry.handler_name.clone();

        let tx = match self.handlers.get(&handler_name) {
            Some(tx) => tx,
            None => {
                error!(
                    handler_name = %handler_name,
                    available_handlers = self.handlers.len(),
                    "Handler not found"
                );
                return None;
            }
        };

        let request_id = RequestId::new();
        let handler_request = HandlerRequest {
            request_id,
            method: route_match.entry.method.clone(),
            path: route_match.entry.path_pattern.clone(),
            handler_name,
            args,
            request,
            reply_tx,
        };

        let mut early: Option<Reply> = None;
        for mw in &self.middlewares {
            if early.is_none() {
                early = mw.before(&handler_request);
            }
        }

        let started = Instant::now();
        let reply = match early {
            Some(reply) => reply,
            None => {
                if tx.send(handler_request.clone()).is_err() {
                    error!(
                        request_id = %request_id,
                        handler_name = %handler_request.handler_name,
                        "Failed to send request to handler"
                    );
                    return Some(WireResponse::json_error(
                        503,
                        "Handler is not accepting requests",
                    ));
                }
                match reply_rx.recv() {
                    Ok(reply) => reply,
                    Err(_) => {
                        error!(
                            request_id = %request_id,
                            handler_name = %handler_request.handler_name,
                            "Handler reply channel closed"
                        );
                        return Some(WireResponse::json_error(
                            503,
                            "Handler is not responding",
                        ));
                    }
                }
            }
        };
        let latency = started.elapsed();

        let mut response = match coerce(reply, self.templates.as_deref()) {
            Ok(res) => res,
            Err(e) => {
                error!(request_id = %request_id, error = %e, "Reply coercion failed");
                WireResponse::with_body(
                    500,
                    "text/plain; charset=utf-8",
                    e.to_string().into_bytes(),
                )
            }
        };

        for mw in &self.middlewares {
            mw.after(&handler_request, &mut response, latency);
        }

        Some(response)
    }
}
