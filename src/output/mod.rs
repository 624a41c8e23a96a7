//! Writers for parsed messages and analytics results.
//!
//! - [`write_json`] / [`to_json`] - pretty JSON of any result type
//! - [`write_jsonl`] / [`to_jsonl`] - one message per line
//! - [`write_csv`] / [`to_csv`] - semicolon-separated tables, requires the
//!   `csv-output` feature
//!
//! Anything implementing [`CsvTable`] can be written as CSV: message lists,
//! [`PeriodSeries`](crate::analytics::PeriodSeries) and
//! [`WordComparison`](crate::analytics::WordComparison).
//!
//! # Example
//!
//! ```rust
//! use chatlens::output::{OutputFormat, to_format_string};
//! use chatlens::ChatMessage;
//! use chrono::Utc;
//!
//! let messages = vec![ChatMessage::new("Alice", "Hello!", Utc::now())];
//! let jsonl = to_format_string(&messages, OutputFormat::Jsonl)?;
//! assert!(jsonl.contains("\"user\":\"Alice\""));
//!
//! assert_eq!(OutputFormat::from_path("out.ndjson")?, OutputFormat::Jsonl);
//! # Ok::<(), chatlens::ChatlensError>(())
//! ```

#[cfg(feature = "csv-output")]
mod csv_writer;
mod json_writer;
mod jsonl_writer;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ChatlensError, Result};
use crate::message::ChatMessage;

#[cfg(feature = "csv-output")]
pub use csv_writer::{to_csv, write_csv};
pub use json_writer::{to_json, write_json};
pub use jsonl_writer::{to_jsonl, write_jsonl};

/// A result that can be laid out as a flat table.
pub trait CsvTable {
    /// Column names.
    fn header(&self) -> Vec<String>;

    /// Rows, each as long as the header.
    fn rows(&self) -> Vec<Vec<String>>;
}

/// File format for [`write_to_format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum OutputFormat {
    /// Semicolon-separated table
    Csv,
    /// Pretty JSON array
    #[default]
    Json,
    /// One JSON object per line
    Jsonl,
}

impl OutputFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Jsonl => "jsonl",
        }
    }

    /// MIME type.
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Csv => "text/csv",
            OutputFormat::Json => "application/json",
            OutputFormat::Jsonl => "application/x-ndjson",
        }
    }

    /// All formats.
    pub fn all() -> &'static [OutputFormat] {
        &[OutputFormat::Csv, OutputFormat::Json, OutputFormat::Jsonl]
    }

    /// Detects the format from a file extension.
    ///
    /// ```rust
    /// use chatlens::output::OutputFormat;
    ///
    /// assert_eq!(OutputFormat::from_path("trend.CSV").unwrap(), OutputFormat::Csv);
    /// assert!(OutputFormat::from_path("notes.txt").is_err());
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();
        ext.parse()
            .map_err(|_| ChatlensError::unsupported_output(format!("unknown file extension '.{ext}'")))
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "CSV"),
            OutputFormat::Json => write!(f, "JSON"),
            OutputFormat::Jsonl => write!(f, "JSONL"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "jsonl" | "ndjson" => Ok(OutputFormat::Jsonl),
            _ => Err(format!("Unknown format: '{s}'. Expected one of: csv, json, jsonl")),
        }
    }
}

/// Writes messages to `path` in `format`.
///
/// # Errors
///
/// [`ChatlensError::UnsupportedOutput`] for CSV when the `csv-output`
/// feature is disabled, or any I/O or serialization error.
pub fn write_to_format(messages: &[ChatMessage], path: impl AsRef<Path>, format: OutputFormat) -> Result<()> {
    match format {
        #[cfg(feature = "csv-output")]
        OutputFormat::Csv => write_csv(messages, path),
        OutputFormat::Json => write_json(messages, path),
        OutputFormat::Jsonl => write_jsonl(messages, path),
        #[allow(unreachable_patterns)]
        _ => Err(csv_disabled()),
    }
}

/// Renders messages as a string in `format`.
pub fn to_format_string(messages: &[ChatMessage], format: OutputFormat) -> Result<String> {
    match format {
        #[cfg(feature = "csv-output")]
        OutputFormat::Csv => to_csv(messages),
        OutputFormat::Json => to_json(messages),
        OutputFormat::Jsonl => to_jsonl(messages),
        #[allow(unreachable_patterns)]
        _ => Err(csv_disabled()),
    }
}

fn csv_disabled() -> ChatlensError {
    ChatlensError::unsupported_output("CSV output requires the 'csv-output' feature")
}
