//! # Gantry
//!
//! **Gantry** is a lightweight, coroutine-powered web framework for Rust
//! built on `may_minihttp`, with a minimal active-record layer over MySQL.
//! It is a thin convenience layer: routing, argument binding and response
//! coercion on top of the HTTP server, schema descriptors and query
//! templates on top of the database client.
//!
//! ## Architecture
//!
//! - **[`router`]** - path matching and route resolution using regex-based
//!   matchers built from `{name}` patterns
//! - **[`binder`]** - per-request call-argument construction from body,
//!   query and path parameters, driven by declared handler signatures
//! - **[`dispatcher`]** - coroutine-based handler dispatch with panic
//!   recovery and a middleware chain
//! - **[`reply`]** - the tagged union of handler return shapes and its
//!   coercion to wire responses (JSON, HTML, redirects, bare statuses)
//! - **[`templates`]** - minijinja environment for templated replies
//! - **[`server`]** - HTTP service built on `may_minihttp`
//! - **[`config`]** - layered TOML configuration
//! - **[`db`]** - pool handle, entity schemas and active-record operations
//! - **[`monitor`]** - file-watcher-triggered process restart for
//!   development
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use gantry::{get, post, App, AppConfig, Reply};
//! use serde_json::json;
//!
//! #[get("/blog/{id}")]
//! fn get_blog(id: String) -> gantry::HandlerResult {
//!     Ok(Reply::Json(json!({ "__template__": "blog.html", "id": id })))
//! }
//!
//! #[post("/api/blog")]
//! fn create_blog(title: String, body: Option<String>) -> gantry::HandlerResult {
//!     Ok(Reply::Json(json!({ "title": title, "body": body })))
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     gantry::logging::init();
//!     let mut app = App::new(AppConfig::load("config.toml")?)?;
//!     app.mount(vec![get_blog(), create_blog()])?;
//!     app.serve()?.join().ok();
//!     Ok(())
//! }
//! ```
//!
//! ## Handlers
//!
//! A handler is a plain function bound to one `(method, path)` pair with
//! `#[get("/path")]` or `#[post("/path")]`. Its parameter list declares
//! which named arguments the binder must provide: plain types are required,
//! `Option<T>` is optional, a parameter named `request` receives the raw
//! request snapshot, and a trailing [`CallArgs`] parameter collects
//! everything else. Handlers return a [`Reply`] shorthand - a JSON map, a
//! template selection, a `redirect:` string, a status code - and the
//! coercer resolves it into the wire response in one place.
//!
//! ## Runtime
//!
//! Gantry runs on the `may` coroutine runtime: handlers are synchronous
//! functions executing in lightweight coroutines, suspending only at I/O.
//! Stack size is tunable via `GANTRY_STACK_SIZE`.

pub mod app;
pub mod binder;
pub mod config;
pub mod context;
pub mod db;
pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod monitor;
pub mod reply;
pub mod route;
pub mod router;
pub mod runtime_config;
pub mod server;
pub mod static_files;
pub mod templates;

pub use app::App;
pub use config::{AppConfig, DbConfig};
pub use context::HandlerContext;
pub use error::{ApiError, BindRejection, HandlerError, RegistrationError};
pub use gantry_macros::{get, post};
pub use http::Method;
pub use reply::{Reply, WireResponse};
pub use route::{CallArgs, HandlerFn, HandlerResult, RouteDef, SignatureSpec};
pub use server::request::RequestInfo;
