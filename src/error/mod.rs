//! Error handling for mongoq.
//!
//! Two layers:
//! - [`MongoqError`]: crate-level errors from the driver, configuration and
//!   connection code, propagated with `?`
//! - [`QueryError`]: the dispatcher's user-facing taxonomy; every dispatcher
//!   operation reports failure as a `QueryError` value
//!
//! # Example
//!
//! ```rust
//! use mongoq::error::{QueryError, Stage};
//!
//! let err = QueryError::downstream(Stage::Aggregate, "unknown stage $foo");
//! assert_eq!(err.to_string(), "Aggregate query error: unknown stage $foo");
//! ```

pub mod kinds;
pub mod query;

// Re-export commonly used types
pub use kinds::{ConfigError, ConnectionError, ExecutionError, MongoqError, Result};
pub use query::{NOT_CONNECTED_MSG, QueryError, QueryResult, Stage};
