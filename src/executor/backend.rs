//! Database backend contract
//!
//! The dispatcher never talks to the driver directly. It builds requests and
//! hands them to a [`DatabaseBackend`]; the MongoDB implementation lives in
//! [`crate::connection::MongoBackend`].

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};

use super::index::IndexSpec;
use super::result::QueryOutcome;
use crate::error::Result;

/// A filtered read over one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct FindRequest {
    pub database: String,
    pub collection: String,
    pub filter: Document,
    /// Documents to skip before the first returned row
    pub skip: Option<i64>,
    /// Maximum number of rows
    pub limit: Option<i64>,
    /// Return the query plan instead of rows
    pub explain: bool,
}

/// A staged aggregation over one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRequest {
    pub database: String,
    pub collection: String,
    pub pipeline: Vec<Document>,
    /// Cursor batch size
    pub batch_size: Option<u32>,
    /// Return the query plan instead of rows
    pub explain: bool,
}

/// Operations the dispatcher needs from a database connection.
///
/// Every call may fail; the dispatcher reports the error message.
#[async_trait]
pub trait DatabaseBackend: Send + Sync {
    /// Run a find (or explain it).
    async fn find(&self, request: FindRequest) -> Result<QueryOutcome>;

    /// Run an aggregation (or explain it).
    async fn aggregate(&self, request: AggregateRequest) -> Result<QueryOutcome>;

    /// Collection names in `database`.
    async fn list_collections(&self, database: &str) -> Result<Vec<String>>;

    /// Index descriptions for a collection.
    async fn list_indexes(&self, database: &str, collection: &str) -> Result<Vec<Document>>;

    /// Create an index and return its name.
    async fn create_index(&self, database: &str, collection: &str, spec: &IndexSpec)
    -> Result<String>;

    /// Drop an index by name.
    async fn drop_index(&self, database: &str, collection: &str, name: &str) -> Result<()>;

    /// Replace the document whose `_id` equals `id`. Returns whether a
    /// document was modified.
    async fn replace_document(
        &self,
        database: &str,
        collection: &str,
        id: Bson,
        replacement: Document,
    ) -> Result<bool>;
}
