//! # Pagila Diagram Crate
//!
//! Projects the foreign-key edges of a reflected `SchemaModel` into a Mermaid
//! `erDiagram` text block.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** no I/O and no knowledge of the database. It depends only
//!   on `core-types` and never sees SQL.
//! - **Relationships only:** entity and attribute blocks are intentionally
//!   left out; with a schema the size of Pagila the attribute-level diagram
//!   is unreadable.
//!
//! ## Public API
//!
//! - `render`: the diagram text for a schema model.
//! - `relationship_line`: the single line for one edge.

pub mod mermaid;

pub use mermaid::{relationship_line, render, HEADER, MANY_TO_ONE};
