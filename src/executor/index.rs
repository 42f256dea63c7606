//! Index management on the dispatcher
//!
//! `update_index` is drop-then-create and not atomic: when the create step
//! fails after a successful drop, the index stays dropped.

use std::fmt;
use std::str::FromStr;

use mongodb::bson::{Bson, Document};
use tracing::{debug, info};

use super::{QueryDispatcher, report};
use crate::error::{QueryResult, Stage};

/// Key type of one indexed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexDirection {
    Ascending,
    Descending,
    Text,
    Hashed,
    Geo2dSphere,
}

impl IndexDirection {
    /// Value stored in the index key document.
    pub fn to_bson(&self) -> Bson {
        match self {
            IndexDirection::Ascending => Bson::Int32(1),
            IndexDirection::Descending => Bson::Int32(-1),
            IndexDirection::Text => Bson::String("text".to_string()),
            IndexDirection::Hashed => Bson::String("hashed".to_string()),
            IndexDirection::Geo2dSphere => Bson::String("2dsphere".to_string()),
        }
    }
}

impl FromStr for IndexDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "asc" | "ascending" => Ok(IndexDirection::Ascending),
            "-1" | "desc" | "descending" => Ok(IndexDirection::Descending),
            "text" => Ok(IndexDirection::Text),
            "hashed" => Ok(IndexDirection::Hashed),
            "2dsphere" => Ok(IndexDirection::Geo2dSphere),
            other => Err(format!("unknown index direction '{other}'")),
        }
    }
}

impl fmt::Display for IndexDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_bson() {
            Bson::Int32(n) => write!(f, "{n}"),
            Bson::String(s) => f.write_str(&s),
            other => write!(f, "{other}"),
        }
    }
}

/// Definition of an index to create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSpec {
    /// Indexed fields in key order
    pub keys: Vec<(String, IndexDirection)>,

    /// Explicit index name; the server derives one when absent
    pub name: Option<String>,

    pub unique: bool,

    pub sparse: bool,

    /// TTL in seconds
    pub expire_after_secs: Option<u64>,
}

impl IndexSpec {
    pub fn new(keys: Vec<(String, IndexDirection)>) -> Self {
        Self {
            keys,
            ..Self::default()
        }
    }

    /// Parse `field` or `field:direction` (e.g. `age:-1`, `bio:text`).
    pub fn parse_key(arg: &str) -> Result<(String, IndexDirection), String> {
        let (field, direction) = match arg.rsplit_once(':') {
            Some((field, direction)) => (field, direction.parse()?),
            None => (arg, IndexDirection::Ascending),
        };

        let field = field.trim();
        if field.is_empty() {
            return Err(format!("missing field name in '{arg}'"));
        }
        Ok((field.to_string(), direction))
    }

    /// Key document in field order, e.g. `{ "name": 1, "age": -1 }`.
    pub fn keys_document(&self) -> Document {
        let mut keys = Document::new();
        for (field, direction) in &self.keys {
            keys.insert(field.clone(), direction.to_bson());
        }
        keys
    }
}

impl QueryDispatcher {
    /// Index descriptions of `collection` in the current database.
    pub async fn list_indexes(&self, collection: &str) -> QueryResult<Vec<Document>> {
        let session = self.session()?;
        debug!(
            "Listing indexes for collection '{}' in database '{}'",
            collection, session.database
        );

        session
            .backend
            .list_indexes(session.database, collection)
            .await
            .map_err(report(Stage::ListIndexes))
    }

    /// Create an index and return the name the server assigned.
    pub async fn create_index(&self, collection: &str, spec: &IndexSpec) -> QueryResult<String> {
        let session = self.session()?;
        info!(
            "Creating index on collection '{}' with keys: {:?}",
            collection,
            spec.keys_document()
        );

        session
            .backend
            .create_index(session.database, collection, spec)
            .await
            .map_err(report(Stage::CreateIndex))
    }

    /// Drop the index named `index_name`.
    pub async fn drop_index(&self, collection: &str, index_name: &str) -> QueryResult<()> {
        let session = self.session()?;
        info!(
            "Dropping index '{}' on collection '{}'",
            index_name, collection
        );

        session
            .backend
            .drop_index(session.database, collection, index_name)
            .await
            .map_err(report(Stage::DropIndex))
    }

    /// Replace an index: drop `index_name`, then create `spec`.
    ///
    /// A failed drop is returned as-is and nothing is created.
    pub async fn update_index(
        &self,
        collection: &str,
        index_name: &str,
        spec: &IndexSpec,
    ) -> QueryResult<String> {
        self.drop_index(collection, index_name).await?;
        self.create_index(collection, spec).await
    }
}
