use super::{ExportOptions, cell_text};
use crate::clock::format_timestamp;
use crate::rules::Row;
use chrono::{DateTime, Utc};
use std::fmt::Write;

pub(super) fn render(rows: &[Row], options: &ExportOptions, now: DateTime<Utc>) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<records>\n");

    if options.include_metadata {
        let _ = writeln!(out, "  <metadata>");
        let _ = writeln!(out, "    <exportDate>{}</exportDate>", format_timestamp(&now));
        let _ = writeln!(out, "    <recordCount>{}</recordCount>", rows.len());
        if let Some(filters) = &options.filters {
            let json = serde_json::to_string(filters).unwrap_or_default();
            let _ = writeln!(out, "    <filters>{}</filters>", escape(&json));
        }
        let _ = writeln!(out, "  </metadata>");
    }

    for row in rows {
        let _ = writeln!(out, "  <record>");
        for (field, value) in row {
            let name = element_name(field);
            let _ = writeln!(
                out,
                "    <{name}>{}</{name}>",
                escape(&cell_text(Some(value)))
            );
        }
        let _ = writeln!(out, "  </record>");
    }

    out.push_str("</records>");
    out
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Field names become element names; characters XML does not allow there
/// are replaced with `_`.
fn element_name(field: &str) -> String {
    let mut name: String = field
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if !name.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        name.insert(0, '_');
    }
    name
}
