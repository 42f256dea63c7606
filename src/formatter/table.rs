//! Table formatting for query results using tabled
//!
//! Columns are the union of the field names of every row, so documents with
//! differing shapes still line up. Cells hold plain scalars, nested values
//! are shown as relaxed extended JSON.

use mongodb::bson::Document;
use serde::{Deserialize, Serialize};
use tabled::{
    Table,
    builder::Builder,
    settings::{
        Alignment, Color, Modify, Style,
        object::{Columns, Rows},
        width::Width,
    },
};

use crate::utils::convert::bson_to_string;

/// Maximum width for a single column (characters)
pub const DEFAULT_MAX_COLUMN_WIDTH: usize = 40;

/// Table formatter for documents and name lists
pub struct TableFormatter {
    /// Maximum column width, longer cells wrap
    max_column_width: usize,

    /// Table style
    style: TableStyle,

    /// Enable colored output
    use_colors: bool,
}

/// Available table styles, chosen with `[display] table_style`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStyle {
    /// Modern style with box drawing characters
    Modern,
    /// ASCII style with basic characters
    Ascii,
    /// Psql style
    Psql,
}

impl TableFormatter {
    /// Create a new table formatter
    ///
    /// # Arguments
    /// * `max_column_width` - Width at which cells wrap
    /// * `use_colors` - Enable colored header
    pub fn new(max_column_width: usize, use_colors: bool) -> Self {
        Self {
            max_column_width: max_column_width.max(1),
            style: TableStyle::Modern,
            use_colors,
        }
    }

    /// Set the table style
    pub fn with_style(mut self, style: TableStyle) -> Self {
        self.style = style;
        self
    }

    /// Format documents, one row per document
    pub fn format_documents(&self, docs: &[Document]) -> String {
        if docs.is_empty() {
            return "(empty result set)".to_string();
        }

        let fields = extract_field_names(docs);
        if fields.is_empty() {
            return "(no fields found)".to_string();
        }

        let mut builder = Builder::default();
        builder.push_record(fields.clone());

        for doc in docs {
            let row: Vec<String> = fields
                .iter()
                .map(|field| doc.get(field).map(bson_to_string).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }

        self.finish(builder.build(), fields.len())
    }

    /// Format a list of names as a single-column table
    pub fn format_names(&self, header: &str, names: &[String]) -> String {
        if names.is_empty() {
            return "(empty result set)".to_string();
        }

        let mut builder = Builder::default();
        builder.push_record([header]);
        for name in names {
            builder.push_record([name.as_str()]);
        }

        self.finish(builder.build(), 1)
    }

    fn finish(&self, mut table: Table, columns: usize) -> String {
        match self.style {
            TableStyle::Modern => table.with(Style::modern()),
            TableStyle::Ascii => table.with(Style::ascii()),
            TableStyle::Psql => table.with(Style::psql()),
        };

        // Wrap long values instead of truncating them
        for i in 0..columns {
            table.with(Modify::new(Columns::new(i..=i)).with(Width::wrap(self.max_column_width)));
        }

        table.with(Modify::new(Rows::first()).with(Alignment::center()));

        if self.use_colors {
            table.modify(Rows::first(), Color::FG_CYAN | Color::BOLD);
        }

        table.to_string()
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_COLUMN_WIDTH, false)
    }
}

/// Collect the unique field names of all documents, sorted, with `_id` first
fn extract_field_names(docs: &[Document]) -> Vec<String> {
    let mut fields = std::collections::BTreeSet::new();

    for doc in docs {
        for key in doc.keys() {
            fields.insert(key.clone());
        }
    }

    let mut field_vec: Vec<String> = fields.into_iter().collect();

    if let Some(pos) = field_vec.iter().position(|f| f == "_id") {
        field_vec.remove(pos);
        field_vec.insert(0, "_id".to_string());
    }

    field_vec
}
