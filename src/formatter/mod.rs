//! Output formatting for query results
//!
//! This module renders dispatcher results for the terminal:
//! - JSON formatting (compact and pretty-printed, relaxed extended JSON)
//! - Table formatting for document collections
//! - Color highlighting when writing to a terminal

mod json;
mod table;

pub use json::JsonFormatter;
pub use table::{DEFAULT_MAX_COLUMN_WIDTH, TableFormatter, TableStyle};

use mongodb::bson::Document;

use crate::config::{DisplayConfig, OutputFormat};
use crate::executor::QueryOutcome;

/// Main formatter for query results
pub struct Formatter {
    /// Output format type
    format_type: OutputFormat,

    json: JsonFormatter,

    table: TableFormatter,
}

impl Formatter {
    /// Create a new formatter
    ///
    /// # Arguments
    /// * `format_type` - Output format type
    /// * `use_colors` - Enable colored output
    pub fn new(format_type: OutputFormat, use_colors: bool) -> Self {
        Self {
            format_type,
            json: JsonFormatter::new(format_type == OutputFormat::JsonPretty, use_colors, 2),
            table: TableFormatter::new(DEFAULT_MAX_COLUMN_WIDTH, use_colors),
        }
    }

    /// Create a formatter from the display section of the configuration
    pub fn from_config(display: &DisplayConfig) -> Self {
        let mut formatter = Self::new(display.format, display.color_output);
        formatter.table = TableFormatter::new(display.max_cell_width, display.color_output)
            .with_style(display.table_style);
        formatter
    }

    pub fn format_type(&self) -> OutputFormat {
        self.format_type
    }

    /// Format a dispatcher result.
    ///
    /// A query plan is a single nested document, so it is always shown as
    /// JSON even in table mode.
    pub fn format_outcome(&self, outcome: &QueryOutcome) -> String {
        match outcome {
            QueryOutcome::Documents(docs) => self.format_documents(docs),
            QueryOutcome::Plan(plan) => match self.format_type {
                OutputFormat::Table => JsonFormatter::default().format_document(plan),
                _ => self.json.format_document(plan),
            },
        }
    }

    /// Format a list of documents
    pub fn format_documents(&self, docs: &[Document]) -> String {
        match self.format_type {
            OutputFormat::Table => self.table.format_documents(docs),
            _ => self.json.format_documents(docs),
        }
    }

    /// Format a list of names (collections) under the given column header
    pub fn format_names(&self, header: &str, names: &[String]) -> String {
        match self.format_type {
            OutputFormat::Table => self.table.format_names(header, names),
            _ => self.json.format_names(names),
        }
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(OutputFormat::JsonPretty, false)
    }
}
