//! Terminal rendering for the CLI: colored headings, tables, pretty JSON.

use crate::export::cell_text;
use crate::facets::{Facet, FacetKind};
use crate::presets::{FilterPreset, HistoryEntry};
use crate::rules::Row;
use crate::schema::FieldDef;
use crate::serializer::RenderedQuery;
use colored::Colorize;
use comfy_table::{Cell, Table};
use serde::Serialize;

pub fn heading(text: &str) {
    println!("{}", text.bold().bright_blue());
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("{} {}", "warning:".yellow().bold(), warning);
    }
}

pub fn print_queries(rendered: &RenderedQuery) -> anyhow::Result<()> {
    if let Some(sql) = &rendered.sql {
        heading("SQL");
        if sql.is_empty() {
            println!("{}", "(no conditions)".dimmed());
        } else {
            println!("{sql}");
        }
    }
    if let Some(mongo) = &rendered.mongo {
        heading("Mongo");
        println!("{}", serde_json::to_string_pretty(mongo)?);
    }
    Ok(())
}

/// Columns in first-seen order across all rows.
fn row_columns(rows: &[Row]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

pub fn rows_table(rows: &[Row]) -> Table {
    let columns = row_columns(rows);
    let mut table = Table::new();
    table.set_header(columns.iter().map(|c| Cell::new(c)));
    for row in rows {
        table.add_row(columns.iter().map(|c| Cell::new(cell_text(row.get(c)))));
    }
    table
}

pub fn fields_table(fields: &[FieldDef]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Field", "Label", "Type", "Operators", "Values"]);
    for field in fields {
        let operators: Vec<&str> = field.operators.iter().map(|op| op.as_str()).collect();
        table.add_row(vec![
            Cell::new(&field.name),
            Cell::new(&field.label),
            Cell::new(format!("{:?}", field.field_type).to_lowercase()),
            Cell::new(operators.join(" ")),
            Cell::new(field.values.as_deref().map(|v| v.join(", ")).unwrap_or_default()),
        ]);
    }
    table
}

pub fn print_facets(facets: &[Facet]) {
    for facet in facets {
        heading(&format!("{} ({})", facet.label, facet.field));
        match facet.kind {
            FacetKind::Checkbox => {
                let mut table = Table::new();
                table.set_header(vec!["", "Value", "Count"]);
                for value in &facet.values {
                    table.add_row(vec![
                        Cell::new(if value.selected { "x" } else { "" }),
                        Cell::new(&value.value),
                        Cell::new(value.count),
                    ]);
                }
                println!("{table}");
            }
            FacetKind::Range => {
                if let Some([min, max]) = facet.range {
                    println!("  {min} .. {max}");
                }
            }
            FacetKind::Date => {
                let bounds = facet.dates.clone().unwrap_or_default();
                println!(
                    "  {} .. {}",
                    bounds.start.as_deref().unwrap_or("*"),
                    bounds.end.as_deref().unwrap_or("*")
                );
            }
        }
    }
}

pub fn presets_table(presets: &[FilterPreset]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Id", "Name", "Description", "Tags", "Public", "Created"]);
    for preset in presets {
        table.add_row(vec![
            Cell::new(&preset.id),
            Cell::new(&preset.name),
            Cell::new(&preset.description),
            Cell::new(preset.tags.join(", ")),
            Cell::new(if preset.is_public { "yes" } else { "no" }),
            Cell::new(preset.created_at.format("%Y-%m-%d %H:%M")),
        ]);
    }
    table
}

pub fn history_table(entries: &[HistoryEntry]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["When", "Query", "Results"]);
    for entry in entries {
        table.add_row(vec![
            Cell::new(entry.timestamp.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(&entry.query),
            Cell::new(entry.result_count),
        ]);
    }
    table
}
