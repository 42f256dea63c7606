//! Server-side pagination policy
//!
//! Pages are zero-based. A query that already carries its own `$skip` or
//! `$limit` is left alone; otherwise the page window is injected.

use mongodb::bson::Document;

use crate::error::{QueryError, QueryResult, Stage};

pub const SKIP_STAGE: &str = "$skip";
pub const LIMIT_STAGE: &str = "$limit";

pub const DEFAULT_PAGE_SIZE: u64 = 50;

/// Requested page of a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Zero-based page number
    pub page: u64,

    /// Rows per page
    pub page_size: u64,
}

/// Skip/limit pair derived from a [`Pagination`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub skip: i64,
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn new(page: u64, page_size: u64) -> Self {
        Self { page, page_size }
    }

    /// Compute `skip = page * page_size`, `limit = page_size`.
    ///
    /// Fails when either value does not fit a BSON 64-bit integer.
    pub fn window(&self) -> QueryResult<Window> {
        let too_large = || {
            QueryError::downstream(
                Stage::Execution,
                format!(
                    "page {} with page size {} is out of range",
                    self.page, self.page_size
                ),
            )
        };

        let skip = self
            .page
            .checked_mul(self.page_size)
            .and_then(|skip| i64::try_from(skip).ok())
            .ok_or_else(too_large)?;
        let limit = i64::try_from(self.page_size).map_err(|_| too_large())?;

        Ok(Window { skip, limit })
    }
}

/// Whether a find filter carries its own `$skip`/`$limit` key.
pub fn has_window_marker(filter: &Document) -> bool {
    filter.contains_key(SKIP_STAGE) || filter.contains_key(LIMIT_STAGE)
}

/// Whether some stage has `$skip` and some stage has `$limit`, so that
/// [`paginate_pipeline`] would add nothing.
pub fn is_self_paginated(pipeline: &[Document]) -> bool {
    pipeline.iter().any(|stage| stage.contains_key(SKIP_STAGE))
        && pipeline.iter().any(|stage| stage.contains_key(LIMIT_STAGE))
}

/// Append `$skip` and/or `$limit` stages unless some stage already has one.
///
/// Only top-level stage keys are inspected. Existing stage order is kept and
/// the new stages go last, `$skip` before `$limit`.
pub fn paginate_pipeline(mut pipeline: Vec<Document>, window: Window) -> Vec<Document> {
    let has_skip = pipeline.iter().any(|stage| stage.contains_key(SKIP_STAGE));
    let has_limit = pipeline.iter().any(|stage| stage.contains_key(LIMIT_STAGE));

    if !has_skip {
        pipeline.push(single_stage(SKIP_STAGE, window.skip));
    }
    if !has_limit {
        pipeline.push(single_stage(LIMIT_STAGE, window.limit));
    }

    pipeline
}

fn single_stage(operator: &str, value: i64) -> Document {
    let mut stage = Document::new();
    stage.insert(operator, value);
    stage
}
