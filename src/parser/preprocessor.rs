//! Query text preprocessor
//!
//! Rewrites MongoDB shell-style query text into strict JSON:
//! - unquoted identifier keys get double quotes (`{name:1}` → `{"name":1}`)
//! - nested objects and arrays are repaired recursively
//! - the `db.<collection>.<verb>(...)` wrapper is kept around the repaired
//!   arguments
//!
//! The preprocessor never fails. Anything it does not recognize is returned
//! verbatim, so malformed input surfaces later when the JSON is parsed.
//!
//! Edits are made in place: whitespace around every key, value and element
//! is kept as the user typed it, except that line breaks are folded away so
//! the repaired call fits on one line. Strict single-line JSON therefore
//! passes through untouched and running the preprocessor twice is a no-op.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use super::scan::{find_main_colon, split_top_level};

static FIND_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)db\.(\w+)\.(find|findOne)\s*\(\s*(.+?)\s*\)(?:\s*\.\s*|\s*$)")
        .expect("find call pattern is valid")
});

static AGGREGATE_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)db\.(\w+)\.aggregate\s*\(\s*(.+?)\s*\)(?:\s*\.\s*|\s*$)")
        .expect("aggregate call pattern is valid")
});

/// Normalize a query so that its JSON parts are strict JSON.
///
/// Input starting with `db.` must look like `db.<coll>.find(...)`,
/// `db.<coll>.findOne(...)` or `db.<coll>.aggregate(...)`; the arguments are
/// repaired and the call is re-emitted without any trailing method chain.
/// Unrecognized `db.` input is returned unchanged. Any other input is
/// repaired as a bare JSON fragment.
///
/// # Example
///
/// ```
/// use mongoq::parser::preprocess;
///
/// assert_eq!(
///     preprocess(r#"db.users.find({name:"John", age:25})"#),
///     r#"db.users.find({"name":"John", "age":25})"#
/// );
/// ```
pub fn preprocess(query: &str) -> String {
    let normalized = if query.trim().starts_with("db.") {
        rewrite_call(query).unwrap_or_else(|| query.to_string())
    } else {
        make_json_compliant(query)
    };

    trace!("Preprocessed query: {:?} -> {:?}", query, normalized);
    normalized
}

/// Repair the arguments of a recognized `db.` call.
fn rewrite_call(query: &str) -> Option<String> {
    if let Some(caps) = FIND_CALL.captures(query) {
        let args = make_json_compliant(&caps[3]);
        return Some(format!("db.{}.{}({})", &caps[1], &caps[2], args));
    }

    AGGREGATE_CALL.captures(query).map(|caps| {
        let args = make_json_compliant(&caps[2]);
        format!("db.{}.aggregate({})", &caps[1], args)
    })
}

/// Repair a JSON fragment: arrays and objects recursively, primitives as-is.
pub fn make_json_compliant(text: &str) -> String {
    let text = text.trim();

    if is_bounded(text, '[', ']') {
        fix_array_objects(text)
    } else if is_bounded(text, '{', '}') {
        fix_object_keys(text)
    } else {
        text.to_string()
    }
}

/// Quote the keys of an object literal and repair its values.
///
/// Blank members (from trailing or doubled commas) are dropped.
pub fn fix_object_keys(obj: &str) -> String {
    let Some(inner) = strip_bounds(obj, '{', '}') else {
        return obj.to_string();
    };
    if inner.trim().is_empty() {
        return obj.to_string();
    }

    let pairs: Vec<String> = split_top_level(inner, ',')
        .into_iter()
        .filter(|pair| !pair.trim().is_empty())
        .enumerate()
        .map(|(i, pair)| rewrite_trimmed(pair, i > 0, fix_key_value_pair))
        .collect();

    format!("{{{}}}", pairs.join(","))
}

/// Repair every element of an array literal.
pub fn fix_array_objects(arr: &str) -> String {
    let Some(inner) = strip_bounds(arr, '[', ']') else {
        return arr.to_string();
    };
    if inner.trim().is_empty() {
        return arr.to_string();
    }

    let elements: Vec<String> = split_top_level(inner, ',')
        .into_iter()
        .enumerate()
        .map(|(i, element)| rewrite_trimmed(element, i > 0, fix_array_element))
        .collect();

    format!("[{}]", elements.join(","))
}

fn fix_array_element(element: &str) -> String {
    if is_bounded(element, '{', '}') {
        fix_object_keys(element)
    } else {
        make_json_compliant(element)
    }
}

/// Quote the key of one `key: value` member and repair its value.
///
/// A member without a top-level colon is returned unchanged.
pub fn fix_key_value_pair(pair: &str) -> String {
    let Some(colon) = find_main_colon(pair) else {
        return pair.to_string();
    };

    let key = rewrite_trimmed(&pair[..colon], false, quote_if_needed);
    let value = rewrite_trimmed(&pair[colon + 1..], true, make_json_compliant);
    format!("{key}:{value}")
}

/// Wrap `key` in double quotes when it is a bare identifier.
///
/// Keys already wrapped in `"` or `'` are left alone, as are keys that are
/// not identifiers (dotted paths, hyphens, leading digits).
pub fn quote_if_needed(key: &str) -> String {
    let key = key.trim();
    let already_quoted = (key.starts_with('"') && key.ends_with('"'))
        || (key.starts_with('\'') && key.ends_with('\''));

    if !already_quoted && is_identifier(key) {
        format!("\"{key}\"")
    } else {
        key.to_string()
    }
}

/// `^[A-Za-z_$][A-Za-z0-9_$]*$`
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn is_bounded(text: &str, open: char, close: char) -> bool {
    text.starts_with(open) && text.ends_with(close)
}

fn strip_bounds(text: &str, open: char, close: char) -> Option<&str> {
    text.strip_prefix(open)?.strip_suffix(close)
}

/// Apply `repair` to the trimmed core of `raw`, keeping the surrounding
/// whitespace unless it spans a line break.
///
/// `after_separator` tells whether `raw` follows a `,` or `:`.
fn rewrite_trimmed(
    raw: &str,
    after_separator: bool,
    repair: impl FnOnce(&str) -> String,
) -> String {
    let core = raw.trim();
    if core.is_empty() {
        return fold_line_break(raw, after_separator).to_string();
    }

    let lead = raw.len() - raw.trim_start().len();
    let tail = &raw[lead + core.len()..];
    format!(
        "{}{}{}",
        fold_line_break(&raw[..lead], after_separator),
        repair(core),
        fold_line_break(tail, false)
    )
}

/// A whitespace run containing a line break becomes one space after a
/// separator and nothing elsewhere. Other runs are kept.
fn fold_line_break(gap: &str, after_separator: bool) -> &str {
    if !gap.contains(['\n', '\r']) {
        gap
    } else if after_separator {
        " "
    } else {
        ""
    }
}
