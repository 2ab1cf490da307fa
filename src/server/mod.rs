//! # Server Module
//!
//! The HTTP surface over `may_minihttp`: request parsing, the
//! [`AppService`] that drives route lookup, argument binding and dispatch,
//! the wire-level response writer, and the [`HttpServer`] wrapper.

pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{parse_request, ParsedRequest, RequestInfo};
pub use service::AppService;
