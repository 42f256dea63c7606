//! Query dispatch for mongoq
//!
//! This module turns query text into database requests. It includes:
//! - The [`QueryDispatcher`] with its connection guard
//! - Pagination policy for find filters and aggregation pipelines
//! - Index management and structured (already parsed) operations
//! - The [`DatabaseBackend`] contract the dispatcher delegates to
//!
//! Every dispatcher operation reports failure as a [`QueryError`] value.

mod backend;
mod index;
mod pagination;
mod result;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use mongodb::bson::{Bson, Document};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{MongoqError, QueryError, QueryResult, Stage};
use crate::parser::{ParsedQuery, QueryKind, preprocess};
use crate::utils::convert::convert_to_object_id;

pub use backend::{AggregateRequest, DatabaseBackend, FindRequest};
pub use index::{IndexDirection, IndexSpec};
pub use pagination::{
    DEFAULT_PAGE_SIZE, LIMIT_STAGE, Pagination, SKIP_STAGE, Window, has_window_marker,
    is_self_paginated, paginate_pipeline,
};
pub use result::QueryOutcome;

/// Hard cap on rows returned by [`QueryDispatcher::run_query`].
pub const MAX_QUERY_LIMIT: i64 = 1000;

/// Result-size limits applied by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    /// Row cap for structured queries
    pub max_query_limit: i64,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            max_query_limit: MAX_QUERY_LIMIT,
        }
    }
}

/// Classifies query text and runs it against the attached backend.
///
/// Holds at most one backend and one current database name. Queries take
/// `&self`; attaching or detaching a backend takes `&mut self`.
#[derive(Default)]
pub struct QueryDispatcher {
    /// Attached database backend
    backend: Option<Arc<dyn DatabaseBackend>>,

    /// Current database name
    current_db: Option<String>,

    limits: QueryLimits,
}

/// Backend and database borrowed for one operation.
#[derive(Clone, Copy)]
struct Session<'a> {
    backend: &'a dyn DatabaseBackend,
    database: &'a str,
}

/// Map a backend error to a dispatcher error for `stage`, logging it.
pub(crate) fn report(stage: Stage) -> impl FnOnce(MongoqError) -> QueryError {
    move |err| {
        let err = QueryError::downstream(stage, err);
        warn!("{}", err);
        err
    }
}

impl QueryDispatcher {
    /// Create a dispatcher with no backend attached
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dispatcher with custom result limits
    pub fn with_limits(limits: QueryLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    /// Attach a backend and select the current database
    pub fn connect(&mut self, backend: Arc<dyn DatabaseBackend>, database: impl Into<String>) {
        let database = database.into();
        info!("Dispatcher attached to database '{}'", database);
        self.backend = Some(backend);
        self.current_db = Some(database);
    }

    /// Detach the backend and forget the current database
    pub fn disconnect(&mut self) {
        debug!("Dispatcher detached");
        self.backend = None;
        self.current_db = None;
    }

    /// Switch the current database
    pub fn use_database(&mut self, database: impl Into<String>) {
        self.current_db = Some(database.into());
    }

    pub fn current_database(&self) -> Option<&str> {
        self.current_db.as_deref()
    }

    pub fn limits(&self) -> QueryLimits {
        self.limits
    }

    /// Whether both a backend and a non-empty database name are set
    pub fn is_connected(&self) -> bool {
        self.session().is_ok()
    }

    /// Connection guard run first by every operation.
    fn session(&self) -> QueryResult<Session<'_>> {
        match (&self.backend, self.current_db.as_deref()) {
            (Some(backend), Some(database)) if !database.is_empty() => Ok(Session {
                backend: backend.as_ref(),
                database,
            }),
            _ => Err(QueryError::NotConnected),
        }
    }

    /// Run shell-style query text.
    ///
    /// The text is normalized with [`preprocess`], classified as a find or
    /// an aggregation, paginated unless it carries its own `$skip`/`$limit`,
    /// and sent to the backend. With `explain` the query plan is returned
    /// instead of rows.
    ///
    /// # Arguments
    /// * `query_text` - e.g. `db.users.find({age: {$gt: 21}})`
    /// * `pagination` - zero-based page and page size
    /// * `explain` - request the query plan
    pub async fn execute(
        &self,
        query_text: &str,
        pagination: Pagination,
        explain: bool,
    ) -> QueryResult<QueryOutcome> {
        let session = self.session()?;

        let text = preprocess(query_text);
        let kind = QueryKind::classify(&text).ok_or(QueryError::UnsupportedQueryType)?;
        let query = ParsedQuery::extract(kind, &text).ok_or(QueryError::InvalidFormat(kind))?;

        info!(
            "Executing {} on {}.{} (page {}, size {}, explain: {})",
            kind, session.database, query.collection, pagination.page, pagination.page_size, explain
        );

        match kind {
            QueryKind::Find => self.execute_find(session, query, pagination, explain).await,
            QueryKind::Aggregate => {
                self.execute_aggregate(session, query, pagination, explain)
                    .await
            }
        }
    }

    async fn execute_find(
        &self,
        session: Session<'_>,
        query: ParsedQuery,
        pagination: Pagination,
        explain: bool,
    ) -> QueryResult<QueryOutcome> {
        let filter = if query.has_empty_body() {
            Document::new()
        } else {
            parse_filter(&query.body)?
        };

        let window = if has_window_marker(&filter) {
            debug!("Filter carries its own $skip/$limit, not paginating");
            None
        } else {
            Some(pagination.window()?)
        };

        let request = FindRequest {
            database: session.database.to_string(),
            collection: query.collection,
            filter,
            skip: window.map(|w| w.skip),
            limit: window.map(|w| w.limit),
            explain,
        };
        debug!("Find request: {:?}", request);

        session
            .backend
            .find(request)
            .await
            .map_err(report(Stage::Find))
    }

    async fn execute_aggregate(
        &self,
        session: Session<'_>,
        query: ParsedQuery,
        pagination: Pagination,
        explain: bool,
    ) -> QueryResult<QueryOutcome> {
        let pipeline = parse_pipeline(&query.body)?;
        let pipeline = if is_self_paginated(&pipeline) {
            debug!("Pipeline carries its own $skip and $limit, not paginating");
            pipeline
        } else {
            paginate_pipeline(pipeline, pagination.window()?)
        };

        let request = AggregateRequest {
            database: session.database.to_string(),
            collection: query.collection,
            pipeline,
            batch_size: explain
                .then(|| u32::try_from(pagination.page_size).unwrap_or(u32::MAX)),
            explain,
        };
        debug!("Aggregate request: {:?}", request);

        session
            .backend
            .aggregate(request)
            .await
            .map_err(report(Stage::Aggregate))
    }

    /// Run an already-built filter, capped at the configured row limit.
    pub async fn run_query(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
    ) -> QueryResult<Vec<Document>> {
        let session = self.session()?;
        debug!("run_query on {}.{}: {}", database, collection, filter);

        let request = FindRequest {
            database: database.to_string(),
            collection: collection.to_string(),
            filter,
            skip: None,
            limit: Some(self.limits.max_query_limit),
            explain: false,
        };

        session
            .backend
            .find(request)
            .await
            .map(QueryOutcome::into_documents)
            .map_err(report(Stage::Direct))
    }

    /// Run an already-built pipeline as given.
    pub async fn run_aggregate(
        &self,
        database: &str,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> QueryResult<Vec<Document>> {
        let session = self.session()?;
        debug!(
            "run_aggregate on {}.{} with {} stages",
            database,
            collection,
            pipeline.len()
        );

        let request = AggregateRequest {
            database: database.to_string(),
            collection: collection.to_string(),
            pipeline,
            batch_size: None,
            explain: false,
        };

        session
            .backend
            .aggregate(request)
            .await
            .map(QueryOutcome::into_documents)
            .map_err(report(Stage::Direct))
    }

    /// Replace the document with `_id == id` in the current database.
    ///
    /// A 24-character string id is tried as an `ObjectId` first. Returns
    /// `Ok(false)` when nothing was modified.
    pub async fn update_document(
        &self,
        collection: &str,
        id: Bson,
        replacement: Document,
    ) -> QueryResult<bool> {
        let session = self.session()?;
        let id = convert_to_object_id(id);
        info!("Replacing document {} in collection '{}'", id, collection);

        session
            .backend
            .replace_document(session.database, collection, id, replacement)
            .await
            .map_err(report(Stage::Direct))
    }

    /// Collection names of the current database.
    pub async fn list_collections(&self) -> QueryResult<Vec<String>> {
        let session = self.session()?;

        session
            .backend
            .list_collections(session.database)
            .await
            .map_err(report(Stage::Direct))
    }
}

fn parse_filter(body: &str) -> QueryResult<Document> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| QueryError::downstream(Stage::Find, e))?;

    match value {
        Value::Object(_) => json_to_document(value),
        _ => Err(QueryError::downstream(
            Stage::Find,
            "filter must be a JSON object",
        )),
    }
}

fn parse_pipeline(body: &str) -> QueryResult<Vec<Document>> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| QueryError::downstream(Stage::Aggregate, e))?;
    let Value::Array(stages) = value else {
        return Err(QueryError::MalformedPipeline);
    };

    stages
        .into_iter()
        .enumerate()
        .map(|(i, stage)| match stage {
            Value::Object(_) => json_to_document(stage),
            _ => Err(QueryError::downstream(
                Stage::Aggregate,
                format!("pipeline stage {i} must be a JSON object"),
            )),
        })
        .collect()
}

/// Extended-JSON aware conversion (`{"$oid": ...}` becomes an ObjectId).
fn json_to_document(value: Value) -> QueryResult<Document> {
    match Bson::try_from(value) {
        Ok(Bson::Document(doc)) => Ok(doc),
        Ok(other) => Err(QueryError::downstream(
            Stage::Execution,
            format!("expected a document, got {other}"),
        )),
        Err(e) => Err(QueryError::downstream(Stage::Execution, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;
    use mongodb::bson::oid::ObjectId;

    use super::testing::{Call, RecordingBackend, connected};

    fn find_request(filter: Document, skip: Option<i64>, limit: Option<i64>) -> FindRequest {
        FindRequest {
            database: "test".into(),
            collection: "users".into(),
            filter,
            skip,
            limit,
            explain: false,
        }
    }

    fn sent_pipeline(backend: &RecordingBackend) -> Vec<Document> {
        match backend.calls().pop() {
            Some(Call::Aggregate(request)) => request.pipeline,
            other => panic!("expected an aggregate call, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_every_operation_requires_connection() {
        let dispatcher = QueryDispatcher::new();
        assert!(!dispatcher.is_connected());

        for text in ["not a query", "db.users.find({})", "db.c.aggregate([])"] {
            let err = dispatcher
                .execute(text, Pagination::default(), false)
                .await
                .unwrap_err();
            assert_eq!(err, QueryError::NotConnected);
            assert_eq!(err.to_string(), "Not connected to database");
        }

        assert_eq!(
            dispatcher.run_query("test", "users", doc! {}).await,
            Err(QueryError::NotConnected)
        );
        assert_eq!(
            dispatcher.run_aggregate("test", "users", vec![]).await,
            Err(QueryError::NotConnected)
        );
        assert_eq!(
            dispatcher
                .update_document("users", Bson::Int32(1), doc! {})
                .await,
            Err(QueryError::NotConnected)
        );
        assert_eq!(
            dispatcher.list_collections().await,
            Err(QueryError::NotConnected)
        );
    }

    #[tokio::test]
    async fn test_empty_database_name_is_not_connected() {
        let backend = Arc::new(RecordingBackend::default());
        let mut dispatcher = QueryDispatcher::new();
        dispatcher.connect(backend.clone(), "");

        assert!(!dispatcher.is_connected());
        assert_eq!(
            dispatcher.list_collections().await,
            Err(QueryError::NotConnected)
        );
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_and_use_database() {
        let backend = Arc::new(RecordingBackend::default());
        let mut dispatcher = connected(&backend);
        assert!(dispatcher.is_connected());

        dispatcher.use_database("shop");
        assert_eq!(dispatcher.current_database(), Some("shop"));
        dispatcher.list_collections().await.unwrap();
        assert_eq!(
            backend.calls(),
            vec![Call::ListCollections {
                database: "shop".into()
            }]
        );

        dispatcher.disconnect();
        assert_eq!(dispatcher.current_database(), None);
        assert_eq!(
            dispatcher.list_collections().await,
            Err(QueryError::NotConnected)
        );
    }

    #[tokio::test]
    async fn test_unsupported_query_type() {
        let backend = Arc::new(RecordingBackend::default());
        let dispatcher = connected(&backend);

        let err = dispatcher
            .execute("not a query", Pagination::default(), false)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Unsupported query type");
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_format() {
        let backend = Arc::new(RecordingBackend::default());
        let dispatcher = connected(&backend);

        let err = dispatcher
            .execute("users.find({})", Pagination::default(), false)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid find query format");

        let err = dispatcher
            .execute("aggregate([])", Pagination::default(), false)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid aggregate query format");
    }

    #[tokio::test]
    async fn test_find_injects_pagination() {
        let backend = Arc::new(RecordingBackend::with_documents(vec![
            doc! {"name": "John"},
        ]));
        let dispatcher = connected(&backend);

        let outcome = dispatcher
            .execute(r#"db.users.find({name:"John"})"#, Pagination::new(1, 50), false)
            .await
            .unwrap();
        assert_eq!(outcome, QueryOutcome::Documents(vec![doc! {"name": "John"}]));

        assert_eq!(
            backend.calls(),
            vec![Call::Find(find_request(
                doc! {"name": "John"},
                Some(50),
                Some(50)
            ))]
        );
    }

    #[tokio::test]
    async fn test_find_without_filter() {
        let backend = Arc::new(RecordingBackend::default());
        let dispatcher = connected(&backend);

        dispatcher
            .execute("db.users.find( )", Pagination::default(), false)
            .await
            .unwrap();
        dispatcher
            .execute("db.users.find({})", Pagination::default(), false)
            .await
            .unwrap();

        let expected = Call::Find(find_request(doc! {}, Some(0), Some(50)));
        assert_eq!(backend.calls(), vec![expected.clone(), expected]);
    }

    #[tokio::test]
    async fn test_find_with_window_marker_is_not_paginated() {
        let backend = Arc::new(RecordingBackend::default());
        let dispatcher = connected(&backend);

        dispatcher
            .execute("db.users.find({$limit: 5})", Pagination::new(3, 10), false)
            .await
            .unwrap();

        assert_eq!(
            backend.calls(),
            vec![Call::Find(find_request(doc! {"$limit": 5}, None, None))]
        );
    }

    #[tokio::test]
    async fn test_find_explain_returns_plan() {
        let backend = Arc::new(RecordingBackend::default());
        let dispatcher = connected(&backend);

        let outcome = dispatcher
            .execute("db.users.find({age: 30})", Pagination::default(), true)
            .await
            .unwrap();
        assert!(outcome.is_plan());

        match &backend.calls()[0] {
            Call::Find(request) => assert!(request.explain),
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_find_errors_are_prefixed() {
        let backend = Arc::new(RecordingBackend::default().failing("find", "connection reset"));
        let dispatcher = connected(&backend);

        // bare identifier value is not JSON
        let err = dispatcher
            .execute("db.users.find({name: John})", Pagination::default(), false)
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Find));
        assert!(err.to_string().starts_with("Find query error: "));

        let err = dispatcher
            .execute("db.users.find([1])", Pagination::default(), false)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Find query error: filter must be a JSON object"
        );

        let err = dispatcher
            .execute("db.users.find({a: 1})", Pagination::default(), false)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Find query error: connection reset");
    }

    #[tokio::test]
    async fn test_find_extended_json() {
        let backend = Arc::new(RecordingBackend::default());
        let dispatcher = connected(&backend);
        let hex = "507f1f77bcf86cd799439011";

        let query = format!(r#"db.users.find({{_id: {{"$oid": "{hex}"}}}})"#);
        dispatcher
            .execute(&query, Pagination::default(), false)
            .await
            .unwrap();
        assert_eq!(
            backend.calls(),
            vec![Call::Find(find_request(
                doc! {"_id": ObjectId::parse_str(hex).unwrap()},
                Some(0),
                Some(50)
            ))]
        );

        let err = dispatcher
            .execute(
                r#"db.users.find({_id: {"$oid": "nope"}})"#,
                Pagination::default(),
                false,
            )
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Execution));
        assert!(err.to_string().starts_with("Query execution error: "));
    }

    #[tokio::test]
    async fn test_page_out_of_range() {
        let backend = Arc::new(RecordingBackend::default());
        let dispatcher = connected(&backend);

        let err = dispatcher
            .execute("db.users.find({})", Pagination::new(u64::MAX, 2), false)
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Execution));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_aggregate_appends_skip_and_limit() {
        let backend = Arc::new(RecordingBackend::default());
        let dispatcher = connected(&backend);

        dispatcher
            .execute(
                r#"db.orders.aggregate([{"$match":{}}])"#,
                Pagination::new(2, 20),
                false,
            )
            .await
            .unwrap();

        assert_eq!(
            sent_pipeline(&backend),
            vec![
                doc! {"$match": {}},
                doc! {"$skip": 40_i64},
                doc! {"$limit": 20_i64},
            ]
        );
    }

    #[tokio::test]
    async fn test_self_paginated_aggregate_ignores_page_range() {
        let backend = Arc::new(RecordingBackend::default());
        let dispatcher = connected(&backend);

        dispatcher
            .execute(
                "db.orders.aggregate([{$skip: 10}, {$limit: 5}])",
                Pagination::new(u64::MAX, 50),
                false,
            )
            .await
            .unwrap();
        assert_eq!(
            sent_pipeline(&backend),
            vec![doc! {"$skip": 10}, doc! {"$limit": 5}]
        );

        // a missing stage still needs the window
        let err = dispatcher
            .execute(
                "db.orders.aggregate([{$limit: 5}])",
                Pagination::new(u64::MAX, 50),
                false,
            )
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Execution));
    }

    #[tokio::test]
    async fn test_multiline_queries() {
        let backend = Arc::new(RecordingBackend::default());
        let dispatcher = connected(&backend);

        dispatcher
            .execute(
                "db.users.find({\n  name: \"John\",\n  age: 30\n})",
                Pagination::default(),
                false,
            )
            .await
            .unwrap();
        assert_eq!(
            backend.calls(),
            vec![Call::Find(find_request(
                doc! {"name": "John", "age": 30},
                Some(0),
                Some(50)
            ))]
        );

        dispatcher
            .execute(
                "db.orders.aggregate([\n  {$match: {status: \"A\"}},\n  {$group: {_id: \"$cust\"}}\n])",
                Pagination::default(),
                false,
            )
            .await
            .unwrap();
        assert_eq!(
            sent_pipeline(&backend),
            vec![
                doc! {"$match": {"status": "A"}},
                doc! {"$group": {"_id": "$cust"}},
                doc! {"$skip": 0_i64},
                doc! {"$limit": 50_i64},
            ]
        );
    }

    #[tokio::test]
    async fn test_aggregate_keeps_existing_limit() {
        let backend = Arc::new(RecordingBackend::default());
        let dispatcher = connected(&backend);

        dispatcher
            .execute(
                "db.orders.aggregate([{$match: {}}, {$limit: 5}])",
                Pagination::default(),
                false,
            )
            .await
            .unwrap();

        let pipeline = sent_pipeline(&backend);
        assert_eq!(
            pipeline,
            vec![
                doc! {"$match": {}},
                doc! {"$limit": 5},
                doc! {"$skip": 0_i64},
            ]
        );
        assert_eq!(
            pipeline
                .iter()
                .filter(|stage| stage.contains_key("$limit"))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_aggregate_explain_sets_batch_size() {
        let backend = Arc::new(RecordingBackend::default());
        let dispatcher = connected(&backend);

        let outcome = dispatcher
            .execute(
                "db.orders.aggregate([{$match: {status: \"A\"}}])",
                Pagination::new(0, 20),
                true,
            )
            .await
            .unwrap();
        assert!(outcome.is_plan());

        match backend.calls().pop() {
            Some(Call::Aggregate(request)) => {
                assert!(request.explain);
                assert_eq!(request.batch_size, Some(20));
                assert_eq!(request.collection, "orders");
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_aggregate_errors() {
        let backend = Arc::new(RecordingBackend::default().failing("aggregate", "unknown stage"));
        let dispatcher = connected(&backend);

        let err = dispatcher
            .execute(
                r#"db.orders.aggregate({"$match":{}})"#,
                Pagination::default(),
                false,
            )
            .await
            .unwrap_err();
        assert_eq!(err, QueryError::MalformedPipeline);
        assert_eq!(err.to_string(), "Pipeline must be a list");

        let err = dispatcher
            .execute("db.orders.aggregate([1])", Pagination::default(), false)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Aggregate query error: pipeline stage 0 must be a JSON object"
        );

        let err = dispatcher
            .execute("db.orders.aggregate()", Pagination::default(), false)
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Aggregate));

        let err = dispatcher
            .execute("db.orders.aggregate([])", Pagination::default(), false)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Aggregate query error: unknown stage");
    }

    #[tokio::test]
    async fn test_run_query_caps_results() {
        let backend = Arc::new(RecordingBackend::with_documents(vec![doc! {"a": 1}]));
        let dispatcher = connected(&backend);

        let rows = dispatcher
            .run_query("other", "users", doc! {"a": 1})
            .await
            .unwrap();
        assert_eq!(rows, vec![doc! {"a": 1}]);

        assert_eq!(
            backend.calls(),
            vec![Call::Find(FindRequest {
                database: "other".into(),
                ..find_request(doc! {"a": 1}, None, Some(MAX_QUERY_LIMIT))
            })]
        );
    }

    #[tokio::test]
    async fn test_run_query_uses_configured_limit() {
        let backend = Arc::new(RecordingBackend::default());
        let mut dispatcher = QueryDispatcher::with_limits(QueryLimits { max_query_limit: 10 });
        dispatcher.connect(backend.clone(), "test");

        dispatcher.run_query("test", "users", doc! {}).await.unwrap();
        match &backend.calls()[0] {
            Call::Find(request) => assert_eq!(request.limit, Some(10)),
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_structured_errors_have_no_prefix() {
        let backend = Arc::new(
            RecordingBackend::default()
                .failing("find", "boom")
                .failing("aggregate", "bad pipeline")
                .failing("replace_document", "E11000 duplicate key")
                .failing("list_collections", "unauthorized"),
        );
        let dispatcher = connected(&backend);

        let err = dispatcher.run_query("test", "users", doc! {}).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");

        let err = dispatcher
            .run_aggregate("test", "users", vec![])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "bad pipeline");

        let err = dispatcher
            .update_document("users", Bson::Int32(1), doc! {})
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "E11000 duplicate key");

        let err = dispatcher.list_collections().await.unwrap_err();
        assert_eq!(err.to_string(), "unauthorized");
    }

    #[tokio::test]
    async fn test_run_aggregate_is_not_paginated() {
        let backend = Arc::new(RecordingBackend::default());
        let dispatcher = connected(&backend);
        let pipeline = vec![doc! {"$group": {"_id": "$status"}}];

        dispatcher
            .run_aggregate("test", "orders", pipeline.clone())
            .await
            .unwrap();
        assert_eq!(sent_pipeline(&backend), pipeline);
    }

    #[tokio::test]
    async fn test_update_document_converts_id() {
        let backend = Arc::new(RecordingBackend::default().modifying());
        let dispatcher = connected(&backend);
        let hex = "507f1f77bcf86cd799439011";

        let updated = dispatcher
            .update_document("users", Bson::String(hex.into()), doc! {"name": "Ann"})
            .await
            .unwrap();
        assert!(updated);

        assert_eq!(
            backend.calls(),
            vec![Call::Replace {
                database: "test".into(),
                collection: "users".into(),
                id: Bson::ObjectId(ObjectId::parse_str(hex).unwrap()),
                replacement: doc! {"name": "Ann"},
            }]
        );
    }

    #[tokio::test]
    async fn test_update_document_not_modified() {
        let backend = Arc::new(RecordingBackend::default());
        let dispatcher = connected(&backend);

        let updated = dispatcher
            .update_document("users", Bson::String("x".repeat(24)), doc! {})
            .await
            .unwrap();
        assert!(!updated);

        match &backend.calls()[0] {
            Call::Replace { id, .. } => assert_eq!(id, &Bson::String("x".repeat(24))),
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_collections() {
        let backend = Arc::new(RecordingBackend::default());
        let dispatcher = connected(&backend);

        assert_eq!(
            dispatcher.list_collections().await.unwrap(),
            vec!["orders".to_string(), "users".to_string()]
        );
    }
}
