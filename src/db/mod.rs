//! # Database Module
//!
//! A minimal active-record layer over the MySQL client:
//!
//! - [`Database`] - an explicitly owned, cloneable pool handle (no global
//!   state); `select`/`execute` with literal `?` positional placeholders
//!   and rollback-then-reraise semantics for non-autocommit execution.
//! - [`Schema`] - per-entity schema descriptors built once at program
//!   initialization from typed [`FieldDef`]s, validating exactly one
//!   primary key and pre-rendering the four SQL templates
//!   (select/insert/update/delete).
//! - [`registry`] - process-wide schema registry keyed by entity type
//!   identity.
//! - [`Entity`] - serde-backed entity trait with `save`/`update`/`delete`/
//!   `find`/`find_all`/`find_number` operations on [`Database`].

pub mod model;
pub mod pool;
pub mod registry;
pub mod schema;

pub use model::{Entity, Limit, QueryOptions};
pub use pool::Database;
pub use schema::{FieldDef, Schema, SchemaBuilder, SchemaRef};
