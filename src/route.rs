//! Route definitions and handler signature descriptors.
//!
//! A [`RouteDef`] is the registration currency of the framework: handler
//! metadata (method + path), a declared [`SignatureSpec`], and the handler
//! itself. The `#[get]`/`#[post]` attribute macros produce these; they can
//! also be built by hand for dynamic registration.
//!
//! At registration time the declared spec is compiled into a
//! [`HandlerSignature`], the cached per-handler view the binder consults on
//! every request.

use crate::context::HandlerContext;
use crate::error::{HandlerError, RegistrationError};
use crate::reply::Reply;
use http::Method;
use std::sync::Arc;

/// Per-request mapping of resolved named values passed to a handler.
pub type CallArgs = serde_json::Map<String, serde_json::Value>;

/// Outcome of a handler invocation.
pub type HandlerResult = Result<Reply, HandlerError>;

/// A registered handler function.
pub type HandlerFn = Arc<dyn Fn(HandlerContext) -> HandlerResult + Send + Sync>;

/// Declared handler signature: which named arguments the handler wants.
///
/// This is configuration, not reflection - the attribute macros derive it
/// from the Rust parameter list, and hand-built routes state it explicitly.
/// `params` lists named parameters in declaration order and may contain the
/// reserved name `request`; `required` must be a subset of `params`.
#[derive(Debug, Clone, Default)]
pub struct SignatureSpec {
    pub params: Vec<&'static str>,
    pub required: Vec<&'static str>,
    pub accepts_extra: bool,
}

/// A route definition awaiting registration.
///
/// `method` and `path` are optional on purpose: a definition without them
/// mirrors a handler that was never decorated, and registering it is a
/// startup failure rather than a silent skip.
#[derive(Clone)]
pub struct RouteDef {
    pub name: &'static str,
    pub method: Option<Method>,
    pub path: Option<&'static str>,
    pub signature: SignatureSpec,
    pub handler: HandlerFn,
}

impl RouteDef {
    pub fn new(name: &'static str, handler: HandlerFn) -> Self {
        Self {
            name,
            method: None,
            path: None,
            signature: SignatureSpec::default(),
            handler,
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_path(mut self, path: &'static str) -> Self {
        self.path = Some(path);
        self
    }

    pub fn with_signature(mut self, signature: SignatureSpec) -> Self {
        self.signature = signature;
        self
    }
}

impl std::fmt::Debug for RouteDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteDef")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("signature", &self.signature)
            .finish()
    }
}

/// Cached per-handler signature, derived once at registration.
#[derive(Debug, Clone, Default)]
pub struct HandlerSignature {
    /// Handler wants the raw request snapshot.
    pub wants_request: bool,
    /// Handler accepts arbitrary extra named arguments.
    pub accepts_extra: bool,
    /// Named parameters in declaration order, excluding `request`.
    pub named: Vec<String>,
    /// Required subset of `named`, in declaration order.
    pub required: Vec<String>,
}

impl HandlerSignature {
    /// Compile a declared spec, validating the `request` position invariant:
    /// no named parameter may follow `request`.
    pub fn derive(handler: &str, spec: &SignatureSpec) -> Result<Self, RegistrationError> {
        if let Some(pos) = spec.params.iter().position(|p| *p == "request") {
            if pos + 1 != spec.params.len() {
                return Err(RegistrationError::RequestParamPosition(handler.to_string()));
            }
        }
        let named: Vec<String> = spec
            .params
            .iter()
            .filter(|p| **p != "request")
            .map(|p| p.to_string())
            .collect();
        for req in &spec.required {
            if !named.iter().any(|n| n == req) {
                return Err(RegistrationError::UnknownRequired {
                    handler: handler.to_string(),
                    required: req.to_string(),
                });
            }
        }
        Ok(Self {
            wants_request: spec.params.contains(&"request"),
            accepts_extra: spec.accepts_extra,
            named,
            required: spec.required.iter().map(|r| r.to_string()).collect(),
        })
    }

    /// Whether the binder must parse body/query at all for this handler.
    pub fn needs_args(&self) -> bool {
        self.accepts_extra || !self.named.is_empty() || !self.required.is_empty()
    }
}
