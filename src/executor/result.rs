//! Query outcome types
//!
//! A successful query yields either result rows or, when an explain was
//! requested, the server's query plan.

use mongodb::bson::Document;

/// Successful result of a query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// Materialized result rows
    Documents(Vec<Document>),

    /// Query plan returned by an explain
    Plan(Document),
}

impl QueryOutcome {
    /// Number of returned documents (a plan counts as one).
    pub fn len(&self) -> usize {
        match self {
            QueryOutcome::Documents(docs) => docs.len(),
            QueryOutcome::Plan(_) => 1,
        }
    }

    /// Whether no rows were returned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_plan(&self) -> bool {
        matches!(self, QueryOutcome::Plan(_))
    }

    /// Consume into a list of documents; a plan becomes a single element.
    pub fn into_documents(self) -> Vec<Document> {
        match self {
            QueryOutcome::Documents(docs) => docs,
            QueryOutcome::Plan(plan) => vec![plan],
        }
    }
}
