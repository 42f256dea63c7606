//! Query text parsing for mongoq
//!
//! The parser is split into focused modules:
//! - `scan`: depth-aware scanner shared by the splitter and the colon finder
//! - `preprocessor`: rewrites shell-style query text into strict JSON
//! - `query_text`: classifies normalized text and extracts collection/body
//!
//! # Examples
//!
//! ```
//! use mongoq::parser::{ParsedQuery, QueryKind, preprocess};
//!
//! let text = preprocess("db.logs.aggregate([{ $match: {} }])");
//! assert_eq!(text, r#"db.logs.aggregate([{ "$match": {} }])"#);
//!
//! let kind = QueryKind::classify(&text).unwrap();
//! let parsed = ParsedQuery::extract(kind, &text).unwrap();
//! assert_eq!(parsed.collection, "logs");
//! ```

mod preprocessor;
mod query_text;
mod scan;

// Re-export public API
pub use preprocessor::{
    fix_array_objects, fix_key_value_pair, fix_object_keys, make_json_compliant, preprocess,
    quote_if_needed,
};
pub use query_text::{ParsedQuery, QueryKind};
pub use scan::{ScanState, find_main_colon, split_top_level};
