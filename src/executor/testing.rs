//! In-memory backend that records every request, for dispatcher tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mongodb::bson::{Bson, Document, doc};

use super::backend::{AggregateRequest, DatabaseBackend, FindRequest};
use super::index::IndexSpec;
use super::result::QueryOutcome;
use super::QueryDispatcher;
use crate::error::{MongoqError, Result};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Find(FindRequest),
    Aggregate(AggregateRequest),
    ListCollections {
        database: String,
    },
    ListIndexes {
        database: String,
        collection: String,
    },
    CreateIndex {
        database: String,
        collection: String,
        spec: IndexSpec,
    },
    DropIndex {
        database: String,
        collection: String,
        name: String,
    },
    Replace {
        database: String,
        collection: String,
        id: Bson,
        replacement: Document,
    },
}

#[derive(Default)]
pub(crate) struct RecordingBackend {
    calls: Mutex<Vec<Call>>,
    documents: Vec<Document>,
    failures: HashMap<&'static str, String>,
    modified: bool,
}

impl RecordingBackend {
    /// Backend whose reads return `documents`.
    pub(crate) fn with_documents(documents: Vec<Document>) -> Self {
        Self {
            documents,
            ..Self::default()
        }
    }

    /// Make operation `op` (trait method name) fail with `message`.
    pub(crate) fn failing(mut self, op: &'static str, message: &str) -> Self {
        self.failures.insert(op, message.to_string());
        self
    }

    /// Report replacements as modifying a document.
    pub(crate) fn modifying(mut self) -> Self {
        self.modified = true;
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn record(&self, op: &'static str, call: Call) -> Result<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        match self.failures.get(op) {
            Some(message) => Err(MongoqError::Generic(message.clone())),
            None => Ok(()),
        }
    }
}

/// Dispatcher attached to `backend` with current database `test`.
pub(crate) fn connected(backend: &Arc<RecordingBackend>) -> QueryDispatcher {
    let mut dispatcher = QueryDispatcher::new();
    dispatcher.connect(backend.clone(), "test");
    dispatcher
}

#[async_trait]
impl DatabaseBackend for RecordingBackend {
    async fn find(&self, request: FindRequest) -> Result<QueryOutcome> {
        let explain = request.explain;
        let namespace = format!("{}.{}", request.database, request.collection);
        self.record("find", Call::Find(request))?;

        if explain {
            Ok(QueryOutcome::Plan(
                doc! {"queryPlanner": {"namespace": namespace}},
            ))
        } else {
            Ok(QueryOutcome::Documents(self.documents.clone()))
        }
    }

    async fn aggregate(&self, request: AggregateRequest) -> Result<QueryOutcome> {
        let explain = request.explain;
        let stages = request.pipeline.len() as i64;
        self.record("aggregate", Call::Aggregate(request))?;

        if explain {
            Ok(QueryOutcome::Plan(doc! {"stages": stages}))
        } else {
            Ok(QueryOutcome::Documents(self.documents.clone()))
        }
    }

    async fn list_collections(&self, database: &str) -> Result<Vec<String>> {
        self.record(
            "list_collections",
            Call::ListCollections {
                database: database.to_string(),
            },
        )?;
        Ok(vec!["orders".to_string(), "users".to_string()])
    }

    async fn list_indexes(&self, database: &str, collection: &str) -> Result<Vec<Document>> {
        self.record(
            "list_indexes",
            Call::ListIndexes {
                database: database.to_string(),
                collection: collection.to_string(),
            },
        )?;
        Ok(self.documents.clone())
    }

    async fn create_index(
        &self,
        database: &str,
        collection: &str,
        spec: &IndexSpec,
    ) -> Result<String> {
        self.record(
            "create_index",
            Call::CreateIndex {
                database: database.to_string(),
                collection: collection.to_string(),
                spec: spec.clone(),
            },
        )?;

        let derived = spec
            .keys
            .iter()
            .map(|(field, direction)| format!("{field}_{direction}"))
            .collect::<Vec<_>>()
            .join("_");
        Ok(spec.name.clone().unwrap_or(derived))
    }

    async fn drop_index(&self, database: &str, collection: &str, name: &str) -> Result<()> {
        self.record(
            "drop_index",
            Call::DropIndex {
                database: database.to_string(),
                collection: collection.to_string(),
                name: name.to_string(),
            },
        )
    }

    async fn replace_document(
        &self,
        database: &str,
        collection: &str,
        id: Bson,
        replacement: Document,
    ) -> Result<bool> {
        self.record(
            "replace_document",
            Call::Replace {
                database: database.to_string(),
                collection: collection.to_string(),
                id,
                replacement,
            },
        )?;
        Ok(self.modified)
    }
}
