//! # Router Module
//!
//! Path matching and route resolution. Route patterns use `{name}` segments
//! (e.g. `/blog/{id}`) which are compiled into regexes at registration time;
//! matching an incoming request extracts the named path parameters.
//!
//! The route table is built once at startup from [`RouteDef`]s and is
//! immutable afterwards. Registering two routes for the same
//! `(method, path)` pair keeps the last one and emits a warning.
//!
//! [`RouteDef`]: crate::route::RouteDef

mod core;

pub use core::{ParamVec, RouteEntry, RouteMatch, Router, MAX_INLINE_PARAMS};
