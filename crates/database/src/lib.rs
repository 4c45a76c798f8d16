//! # Pagila Database Crate
//!
//! Everything that talks to PostgreSQL: the connection pool, catalog
//! reflection, the ad-hoc statement executor and the payment aggregation.
//!
//! ## Architectural Principles
//!
//! - **Explicit pool, scoped sessions:** there is no global engine handle.
//!   Callers pass a `PgPool` in, and each operation checks out one connection
//!   and releases it on drop, whichever way the operation ends.
//! - **Traits at the I/O seams:** `CatalogReader` and `StatementEngine` are the
//!   only places that touch the wire, so the schema builder and the result
//!   normalization can be tested against in-memory fakes.
//! - **All-or-nothing reflection:** a catalog failure anywhere aborts the whole
//!   schema build.
//!
//! ## Public API
//!
//! - `connect`: establishes the pool from `DATABASE_URL` and `DatabaseSettings`.
//! - `DbRepository`: pool owner with `ping`, `reflect_schema`,
//!   `get_customer_payment_totals` and `ad_hoc_executor`.
//! - `CatalogReader` / `PgCatalogReader`, `SchemaModelBuilder`: reflection.
//! - `AdHocQueryExecutor`, `StatementEngine`, `NamedStatement`: free-form
//!   statements with `:name` parameters.
//! - `DbError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod catalog;
pub mod connection;
pub mod decode;
pub mod error;
pub mod executor;
pub mod params;
pub mod repository;
pub mod schema_builder;

// Re-export the key components to create a clean, public-facing API.
pub use catalog::{CatalogReader, PgCatalogReader};
pub use connection::connect;
pub use error::DbError;
pub use executor::{AdHocQueryExecutor, PgStatementEngine, StatementEngine, TabularRows};
pub use params::NamedStatement;
pub use repository::{CustomerPaymentSummary, DbRepository};
pub use schema_builder::SchemaModelBuilder;
