//! # Pagila Analyzer
//!
//! Ranks grouped aggregation results and cuts them into top-N and bottom-N
//! slices. Today that is the customer payment analysis.
//!
//! ## Public API
//!
//! - `top_and_bottom`: the slicing rule on an already-ranked list.
//! - `PaymentAnalyzer`: fetches payment totals from a `PaymentSource` and
//!   slices them.
//! - `AnalyzerError`: the specific error types that can be returned from this crate.

pub mod error;
pub mod ranking;

pub use error::AnalyzerError;
pub use ranking::{top_and_bottom, PaymentAnalysis, PaymentAnalyzer, PaymentSource};
