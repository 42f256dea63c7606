//! Errors reported by the query dispatcher.
//!
//! Every dispatcher operation returns a [`QueryResult`]. The `Display` output
//! of [`QueryError`] is the human-readable message shown to the user, so the
//! wording of each variant is part of the public contract.

use std::fmt;

use crate::parser::QueryKind;

/// Result type returned by every dispatcher-level operation.
pub type QueryResult<T> = std::result::Result<T, QueryError>;

pub const NOT_CONNECTED_MSG: &str = "Not connected to database";

/// Failure of a dispatcher operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// No backend attached, or no current database selected.
    NotConnected,

    /// Query text is neither a `find(` nor an `aggregate(` call.
    UnsupportedQueryType,

    /// The call was recognized but collection/body extraction failed.
    InvalidFormat(QueryKind),

    /// Aggregate body parsed, but not into an array.
    MalformedPipeline,

    /// JSON parse failure or backend failure, tagged with the call site.
    Downstream { stage: Stage, message: String },
}

/// Call site of a downstream failure. Determines the message prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Find,
    Aggregate,
    Execution,
    ListIndexes,
    CreateIndex,
    DropIndex,
    /// Structured operations (`run_query`, `run_aggregate`, ...) report the
    /// bare message.
    Direct,
}

impl Stage {
    /// Prefix prepended to the downstream message.
    pub fn prefix(&self) -> &'static str {
        match self {
            Stage::Find => "Find query error: ",
            Stage::Aggregate => "Aggregate query error: ",
            Stage::Execution => "Query execution error: ",
            Stage::ListIndexes => "List indexes error: ",
            Stage::CreateIndex => "Create index error: ",
            Stage::DropIndex => "Drop index error: ",
            Stage::Direct => "",
        }
    }
}

impl QueryError {
    /// Build a downstream error from anything displayable.
    pub fn downstream(stage: Stage, err: impl fmt::Display) -> Self {
        QueryError::Downstream {
            stage,
            message: err.to_string(),
        }
    }

    /// Call site of a downstream failure, if this is one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            QueryError::Downstream { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::NotConnected => f.write_str(NOT_CONNECTED_MSG),
            QueryError::UnsupportedQueryType => f.write_str("Unsupported query type"),
            QueryError::InvalidFormat(kind) => {
                write!(f, "Invalid {} query format", kind.verb())
            }
            QueryError::MalformedPipeline => f.write_str("Pipeline must be a list"),
            QueryError::Downstream { stage, message } => {
                write!(f, "{}{message}", stage.prefix())
            }
        }
    }
}

impl std::error::Error for QueryError {}
