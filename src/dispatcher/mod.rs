//! # Dispatcher Module
//!
//! Coroutine-based handler dispatch. Each registered handler runs in its
//! own `may` coroutine consuming requests from an MPSC channel; responses
//! travel back on a per-request reply channel. The dispatcher owns the
//! middleware chain and the template engine handle, so a handler's [`Reply`]
//! is coerced to a wire response at the dispatch boundary.
//!
//! Error containment:
//! - handler panics are caught and become 500 responses,
//! - a lost reply channel becomes a 503,
//! - application-declared [`ApiError`]s become the structured JSON body
//!   `{error, data, message}`.
//!
//! [`Reply`]: crate::reply::Reply
//! [`ApiError`]: crate::error::ApiError

mod core;

pub use core::{Dispatcher, HandlerRequest, HandlerSender};
pub use crate::reply::{HeaderVec, MAX_INLINE_HEADERS};
