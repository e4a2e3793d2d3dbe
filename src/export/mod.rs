//! Export of result rows to downloadable artifacts.

mod csv;
mod sink;
mod xml;

pub use sink::{DirectorySink, ExportSink};

use crate::clock::{Clock, format_timestamp};
use crate::rules::Row;
use crate::state::FilterState;
use chrono::{DateTime, Local, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Export format '{0}' is not supported yet")]
    UnsupportedFormat(ExportFormat),
    #[error("Failed to serialize export: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to write '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
    Xml,
    Excel,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Xml => "xml",
            ExportFormat::Excel => "xlsx",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
            ExportFormat::Xml => "application/xml",
            ExportFormat::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Xml => "xml",
            ExportFormat::Excel => "excel",
            ExportFormat::Pdf => "pdf",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DateFormat {
    /// Leave timestamps as they are.
    #[default]
    Iso,
    /// Epoch milliseconds.
    Unix,
    /// Local time, human readable.
    Locale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    Comma,
    Semicolon,
    Tab,
}

impl Delimiter {
    pub fn as_char(&self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Semicolon => ';',
            Delimiter::Tab => '\t',
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub include_headers: bool,
    /// Output columns in order; all columns of the first row when empty.
    pub selected_columns: Vec<String>,
    pub date_format: DateFormat,
    pub delimiter: Delimiter,
    pub include_metadata: bool,
    /// Filter recorded in the metadata block.
    pub filters: Option<FilterState>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_headers: true,
            selected_columns: Vec::new(),
            date_format: DateFormat::Iso,
            delimiter: Delimiter::Comma,
            include_metadata: false,
            filters: None,
        }
    }
}

impl ExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include_headers(mut self, include: bool) -> Self {
        self.include_headers = include;
        self
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn date_format(mut self, format: DateFormat) -> Self {
        self.date_format = format;
        self
    }

    pub fn delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn include_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }

    pub fn filters(mut self, filters: Option<FilterState>) -> Self {
        self.filters = filters;
        self
    }
}

/// A named file ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

/// Serialize `rows` to an `export-<epoch-millis>.<ext>` artifact.
///
/// Empty input produces an empty (headers-only or bare) artifact.
pub fn export_data(
    rows: &[Row],
    format: ExportFormat,
    options: &ExportOptions,
    clock: &dyn Clock,
) -> Result<Artifact, ExportError> {
    let now = clock.now();
    let projected = project_rows(rows, options);
    let columns = columns_for(&projected, options);

    let body = match format {
        ExportFormat::Csv => csv::render(&projected, &columns, options),
        ExportFormat::Json => render_json(&projected, options, now)?,
        ExportFormat::Xml => xml::render(&projected, options, now),
        ExportFormat::Excel | ExportFormat::Pdf => {
            return Err(ExportError::UnsupportedFormat(format));
        }
    };

    tracing::debug!(
        rows = projected.len(),
        format = %format,
        "rendered export"
    );

    Ok(Artifact {
        filename: format!("export-{}.{}", now.timestamp_millis(), format.extension()),
        mime_type: format.mime_type().to_string(),
        bytes: body.into_bytes(),
    })
}

fn project_rows(rows: &[Row], options: &ExportOptions) -> Vec<Row> {
    rows.iter()
        .map(|row| {
            let projected: Row = if options.selected_columns.is_empty() {
                row.clone()
            } else {
                options
                    .selected_columns
                    .iter()
                    .filter_map(|col| row.get(col).map(|v| (col.clone(), v.clone())))
                    .collect()
            };

            projected
                .into_iter()
                .map(|(k, v)| (k, format_date_value(v, options.date_format)))
                .collect()
        })
        .collect()
}

fn columns_for(rows: &[Row], options: &ExportOptions) -> Vec<String> {
    if !options.selected_columns.is_empty() {
        return options.selected_columns.clone();
    }
    rows.first()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default()
}

/// Only strings that parse as RFC 3339 timestamps count as dates.
fn format_date_value(value: Value, format: DateFormat) -> Value {
    if format == DateFormat::Iso {
        return value;
    }
    let Some(ts) = value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
    else {
        return value;
    };

    match format {
        DateFormat::Iso => value,
        DateFormat::Unix => json!(ts.timestamp_millis()),
        DateFormat::Locale => Value::String(
            ts.with_timezone(&Local)
                .format("%-m/%-d/%Y, %-I:%M:%S %p")
                .to_string(),
        ),
    }
}

fn render_json(
    rows: &[Row],
    options: &ExportOptions,
    now: DateTime<Utc>,
) -> Result<String, ExportError> {
    let data: Vec<Value> = rows.iter().cloned().map(Value::Object).collect();
    let doc = if options.include_metadata {
        json!({
            "metadata": {
                "exportDate": format_timestamp(&now),
                "recordCount": rows.len(),
                "filters": options.filters,
            },
            "data": data,
        })
    } else {
        Value::Array(data)
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Scalar cell text shared by the CSV and XML writers.
/// Text shown for a row cell: strings unquoted, null and missing empty.
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    fn rows(value: Value) -> Vec<Row> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn projection_keeps_requested_order() {
        let projected = project_rows(
            &rows(json!([{ "a": 1, "b": 2, "c": 3 }])),
            &ExportOptions::new().columns(["c", "a"]),
        );
        let keys: Vec<_> = projected[0].keys().cloned().collect();
        assert_eq!(keys, vec!["c", "a"]);
    }

    #[test]
    fn unix_dates_become_epoch_millis() {
        let value = format_date_value(json!("2026-01-01T00:00:01.000Z"), DateFormat::Unix);
        assert_eq!(value, json!(1_767_225_601_000_i64));
        assert_eq!(
            format_date_value(json!("not a date"), DateFormat::Unix),
            json!("not a date")
        );
    }

    #[test]
    fn unsupported_formats_are_reported() {
        let clock = FixedClock::parse("2026-10-18T00:00:00Z").unwrap();
        let result = export_data(&[], ExportFormat::Pdf, &ExportOptions::new(), &clock);
        assert!(matches!(
            result,
            Err(ExportError::UnsupportedFormat(ExportFormat::Pdf))
        ));
    }
}
