//! # Middleware Module
//!
//! Middleware runs inside the dispatcher around each handler invocation:
//! `before` may short-circuit with a [`Reply`], `after` observes (and may
//! mutate) the coerced wire response.

mod core;
mod request_log;

pub use core::Middleware;
pub use request_log::RequestLogMiddleware;
