//! Classification and extraction of normalized query text
//!
//! Works on preprocessor output. A query is a `find` when the text contains
//! `find(`, otherwise an `aggregate` when it contains `aggregate(`. The
//! collection name and the raw body are pulled out with a greedy pattern, so
//! the body runs up to the last `)` on the line.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static FIND_QUERY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"db\.(\w+)\.find\((.*)\)").expect("find pattern is valid"));

static AGGREGATE_QUERY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"db\.(\w+)\.aggregate\((.*)\)").expect("aggregate pattern is valid")
});

/// Shape of a dispatchable query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Find,
    Aggregate,
}

impl QueryKind {
    /// Classify normalized query text. `find(` wins over `aggregate(`.
    pub fn classify(text: &str) -> Option<Self> {
        if text.contains("find(") {
            Some(QueryKind::Find)
        } else if text.contains("aggregate(") {
            Some(QueryKind::Aggregate)
        } else {
            None
        }
    }

    /// Shell method name for this kind.
    pub fn verb(&self) -> &'static str {
        match self {
            QueryKind::Find => "find",
            QueryKind::Aggregate => "aggregate",
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            QueryKind::Find => &FIND_QUERY,
            QueryKind::Aggregate => &AGGREGATE_QUERY,
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// A query split into its parts. The body is still JSON text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    pub kind: QueryKind,
    pub collection: String,
    pub body: String,
}

impl ParsedQuery {
    /// Extract collection and trimmed body for `kind`, or `None` when the
    /// text does not have the `db.<collection>.<verb>(...)` shape.
    pub fn extract(kind: QueryKind, text: &str) -> Option<Self> {
        let caps = kind.pattern().captures(text)?;
        Some(Self {
            kind,
            collection: caps[1].to_string(),
            body: caps[2].trim().to_string(),
        })
    }

    /// Body is absent or the literal empty object.
    pub fn has_empty_body(&self) -> bool {
        self.body.is_empty() || self.body == "{}"
    }
}
