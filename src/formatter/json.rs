//! JSON formatting for MongoDB documents
//!
//! Documents are rendered as relaxed extended JSON, so ObjectIds, dates and
//! 64-bit integers stay distinguishable (`{"$oid": ...}`) and the output can
//! be pasted back into a query.

use colored_json::prelude::*;
use mongodb::bson::{Bson, Document};

/// JSON formatter with pretty printing support
pub struct JsonFormatter {
    /// Enable pretty printing
    pretty: bool,

    /// Indentation width
    indent: usize,

    /// Enable colored output
    use_colors: bool,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    ///
    /// # Arguments
    /// * `pretty` - Enable pretty printing
    /// * `use_colors` - Enable colored output
    /// * `indent` - Indentation width for pretty output
    pub fn new(pretty: bool, use_colors: bool, indent: usize) -> Self {
        Self {
            pretty,
            indent,
            use_colors,
        }
    }

    /// Format documents.
    ///
    /// Pretty output is one JSON array. Compact output is one document per
    /// line, ready for piping.
    pub fn format_documents(&self, docs: &[Document]) -> String {
        if !self.pretty {
            return docs
                .iter()
                .map(|doc| to_json(doc).to_string())
                .collect::<Vec<_>>()
                .join("\n");
        }

        let json_docs: Vec<serde_json::Value> = docs.iter().map(to_json).collect();
        self.render(&serde_json::Value::Array(json_docs))
    }

    /// Format single document as JSON object
    pub fn format_document(&self, doc: &Document) -> String {
        if self.pretty {
            self.render(&to_json(doc))
        } else {
            to_json(doc).to_string()
        }
    }

    /// Format a list of names as a JSON array of strings
    pub fn format_names(&self, names: &[String]) -> String {
        let value = serde_json::Value::from(names.to_vec());
        if self.pretty {
            self.render(&value)
        } else {
            value.to_string()
        }
    }

    /// Pretty-print with the configured indent, colored when enabled
    fn render(&self, value: &serde_json::Value) -> String {
        let json_str = self
            .to_pretty_string(value)
            .unwrap_or_else(|_| value.to_string());

        // Compact JSON is never colored, it is meant for piping
        if self.use_colors {
            json_str.to_colored_json_auto().unwrap_or(json_str)
        } else {
            json_str
        }
    }

    /// Convert a value to pretty-printed JSON with custom indentation
    fn to_pretty_string<T: serde::Serialize>(
        &self,
        value: &T,
    ) -> std::result::Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let indent = " ".repeat(self.indent);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        value.serialize(&mut ser)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new(true, false, 2)
    }
}

fn to_json(doc: &Document) -> serde_json::Value {
    Bson::Document(doc.clone()).into_relaxed_extjson()
}
