//! Output formatters for query results.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use projql_core::{ProjectionPage, Row};
use projql_proto::Value;
use serde_json::{json, Map, Value as Json};

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Renders result rows.
pub trait Formatter: Send + Sync {
    /// Format all rows of an unpaged query.
    fn format_rows(&self, columns: &[String], rows: &[Row]) -> String;

    /// Format one page of results.
    fn format_page(&self, columns: &[String], page: &ProjectionPage<Row>) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Csv => Box::new(CsvFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl TableFormatter {
    fn table(columns: &[String], rows: &[Row]) -> Table {
        let mut table = Table::new();
        table.set_header(columns.iter().map(Cell::new).collect::<Vec<_>>());
        for row in rows {
            let cells: Vec<Cell> = columns
                .iter()
                .map(|c| Cell::new(row.get(c).map(format_value).unwrap_or_default()))
                .collect();
            table.add_row(cells);
        }
        table
    }
}

impl Formatter for TableFormatter {
    fn format_rows(&self, columns: &[String], rows: &[Row]) -> String {
        if rows.is_empty() {
            return "No results".to_string();
        }
        format!("{}\n{} row(s)", Self::table(columns, rows), rows.len())
    }

    fn format_page(&self, columns: &[String], page: &ProjectionPage<Row>) -> String {
        let footer = format!(
            "page {} of {} ({} total)",
            page.page_number + 1,
            page.total_pages().max(1),
            page.total_elements
        );
        if page.is_empty() {
            return format!("No results\n{footer}");
        }
        format!("{}\n{footer}", Self::table(columns, &page.content))
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_rows(&self, columns: &[String], rows: &[Row]) -> String {
        let rows = rows_to_json(columns, rows);
        serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_page(&self, columns: &[String], page: &ProjectionPage<Row>) -> String {
        let doc = json!({
            "content": rows_to_json(columns, &page.content),
            "total_elements": page.total_elements,
            "total_pages": page.total_pages(),
            "page_number": page.page_number,
            "page_size": page.page_size,
        });
        serde_json::to_string_pretty(&doc).unwrap_or_else(|_| "{}".to_string())
    }
}

/// CSV formatter.
pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format_rows(&self, columns: &[String], rows: &[Row]) -> String {
        let mut output = columns.join(",");
        output.push('\n');
        for row in rows {
            let cells: Vec<String> = columns
                .iter()
                .map(|c| row.get(c).map(format_value_csv).unwrap_or_default())
                .collect();
            output.push_str(&cells.join(","));
            output.push('\n');
        }
        output
    }

    fn format_page(&self, columns: &[String], page: &ProjectionPage<Row>) -> String {
        self.format_rows(columns, &page.content)
    }
}

fn rows_to_json(columns: &[String], rows: &[Row]) -> Vec<Json> {
    rows.iter()
        .map(|row| {
            let mut obj = Map::new();
            for column in columns {
                let value = row.get(column).map(value_to_json).unwrap_or(Json::Null);
                obj.insert(column.clone(), value);
            }
            Json::Object(obj)
        })
        .collect()
}

/// Format a Value as a display string.
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bytes(b) => format!("<{} bytes>", b.len()),
        other => other.to_string(),
    }
}

/// Format a Value for CSV output.
fn format_value_csv(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => format!("\"{}\"", escape_csv(s)),
        other => other.to_string(),
    }
}

/// Convert a Value to JSON. Bytes become an array of numbers, as in fixtures.
fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int32(i) => Json::Number((*i).into()),
        Value::Int64(i) | Value::Timestamp(i) => Json::Number((*i).into()),
        Value::Float32(f) => serde_json::Number::from_f64(*f as f64)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Value::Float64(f) => serde_json::Number::from_f64(*f)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Value::String(s) => Json::String(s.clone()),
        Value::Bytes(b) => Json::Array(b.iter().map(|byte| Json::Number((*byte).into())).collect()),
        Value::Uuid(_) => Json::String(value.to_string()),
    }
}

/// Escape a string for CSV.
fn escape_csv(s: &str) -> String {
    s.replace('"', "\"\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<String> {
        vec!["id".to_string(), "name".to_string()]
    }

    fn rows() -> Vec<Row> {
        vec![
            Row::new().with("id", 7i64).with("name", "Ann \"A\""),
            Row::new().with("id", 8i64).with("name", Value::Null),
        ]
    }

    #[test]
    fn test_table_format() {
        let out = TableFormatter.format_rows(&columns(), &rows());
        assert!(out.contains("Ann"));
        assert!(out.contains("NULL"));
        assert!(out.ends_with("2 row(s)"));
        assert_eq!(TableFormatter.format_rows(&columns(), &[]), "No results");
    }

    #[test]
    fn test_json_format() {
        let out = JsonFormatter.format_rows(&columns(), &rows());
        let parsed: Json = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["id"], json!(7));
        assert_eq!(parsed[1]["name"], Json::Null);
    }

    #[test]
    fn test_csv_format() {
        let out = CsvFormatter.format_rows(&columns(), &rows());
        assert_eq!(out, "id,name\n7,\"Ann \"\"A\"\"\"\n8,\n");
    }

    #[test]
    fn test_page_footer() {
        let page = ProjectionPage::of(rows(), 5, Some(projql_proto::Pagination::new(2, 2)));
        let out = TableFormatter.format_page(&columns(), &page);
        assert!(out.ends_with("page 2 of 3 (5 total)"));

        let doc: Json = serde_json::from_str(&JsonFormatter.format_page(&columns(), &page)).unwrap();
        assert_eq!(doc["total_pages"], json!(3));
        assert_eq!(doc["content"][0]["name"], json!("Ann \"A\""));
    }
}
