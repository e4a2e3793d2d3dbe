use super::{ExportOptions, cell_text};
use crate::rules::Row;

pub(super) fn render(rows: &[Row], columns: &[String], options: &ExportOptions) -> String {
    let delimiter = options.delimiter.as_char();
    let mut lines = Vec::with_capacity(rows.len() + 1);

    if options.include_headers && !columns.is_empty() {
        lines.push(join(columns.iter().cloned(), delimiter));
    }
    for row in rows {
        lines.push(join(
            columns.iter().map(|col| cell_text(row.get(col))),
            delimiter,
        ));
    }

    lines.join("\n")
}

fn join(cells: impl Iterator<Item = String>, delimiter: char) -> String {
    cells
        .map(|cell| quote_cell(&cell, delimiter))
        .collect::<Vec<_>>()
        .join(&delimiter.to_string())
}

/// Quote cells holding the delimiter, quotes or line breaks.
fn quote_cell(cell: &str, delimiter: char) -> String {
    if cell.contains(delimiter) || cell.contains(['"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::Delimiter;
    use serde_json::json;

    #[test]
    fn quotes_cells_that_need_it() {
        let rows: Vec<Row> = serde_json::from_value(json!([
            { "name": "example.com", "value": "v=spf1 \"quoted\"; -all" }
        ]))
        .unwrap();
        let columns = vec!["name".to_string(), "value".to_string()];
        let options = ExportOptions::new().delimiter(Delimiter::Semicolon);

        assert_eq!(
            render(&rows, &columns, &options),
            "name;value\nexample.com;\"v=spf1 \"\"quoted\"\"; -all\""
        );
    }
}
