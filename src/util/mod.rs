//! Shared utilities.

pub mod query_error;

pub use query_error::format_query_error;
