//! mongoq library
//!
//! Normalizes loosely written MongoDB shell query text into strict JSON and
//! dispatches `find`/`aggregate` calls with server-side pagination.
//!
//! # Modules
//!
//! - `cli`: Command-line interface and argument parsing
//! - `config`: Configuration management
//! - `connection`: Connection profiles and the driver-backed backend
//! - `error`: Error types and handling
//! - `executor`: Query dispatcher, pagination and index operations
//! - `formatter`: Output formatting and display
//! - `parser`: Query text preprocessing and classification
//! - `utils`: Utility functions and helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use mongoq::{ConnectionManager, Pagination, QueryDispatcher, config::Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let mut manager = ConnectionManager::new(
//!         "mongodb://localhost:27017".to_string(),
//!         config.connection.clone(),
//!     );
//!     manager.connect().await?;
//!
//!     let mut dispatcher = QueryDispatcher::with_limits(config.query_limits());
//!     dispatcher.connect(Arc::new(manager.backend()?), "test");
//!
//!     let rows = dispatcher
//!         .execute("db.users.find({age: {$gt: 21}})", Pagination::default(), false)
//!         .await?;
//!     println!("{} rows", rows.len());
//!
//!     manager.disconnect().await;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
pub mod formatter;
pub mod parser;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use connection::{ConnectionManager, ConnectionProfile, MongoBackend};
pub use error::{MongoqError, QueryError, QueryResult, Result};
pub use executor::{DatabaseBackend, Pagination, QueryDispatcher, QueryOutcome};
pub use formatter::Formatter;
pub use parser::preprocess;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
pub fn version() -> &'static str {
    VERSION
}
