//! # Pagila Core Types
//!
//! The shared vocabulary of the workspace: the reflected schema model and the
//! dynamically shaped rows produced by ad-hoc statements.
//!
//! ## Public API
//!
//! - `SchemaModel`, `Table`, `Column`, `ForeignKey`: a snapshot of the catalog,
//!   rebuilt on every request and never cached.
//! - `RelationshipEdge`: a borrowed view of one foreign key, derived on demand.
//! - `ScalarValue`: one cell (or one bound parameter) of unknown type.
//! - `QueryRow`, `QueryResult`: ordered, name-keyed rows whose shape is decided
//!   by the statement that produced them.
//! - `CoreError`: the specific error types that can be returned from this crate.

pub mod error;
pub mod result;
pub mod schema;
pub mod value;

// Re-export the core types to provide a clean public API.
pub use error::CoreError;
pub use result::{QueryResult, QueryRow};
pub use schema::{Column, ForeignKey, ForeignKeyTarget, RelationshipEdge, SchemaModel, Table};
pub use value::ScalarValue;
