use serde::Serialize;
use serde_json::{Map, Value};

use crate::cli::OutputFormat;
use crate::ui;

pub mod table;

use table::{Table, TableOptions};

/// Columns shown first, in this order, when present.
const LEADING_COLUMNS: &[&str] = &[
    "id",
    "incident_id",
    "title",
    "status",
    "severity",
    "entry_type",
    "source",
    "external_id",
    "category",
    "tag",
    "message",
    "body",
];

/// Render a serializable response to a string in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Table => render_table(&serde_json::to_value(value)?),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a serializable response in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

fn table_options() -> TableOptions {
    let prefs = ui::prefs();
    TableOptions {
        max_width: prefs.term_width,
        color: prefs.table_color,
    }
}

fn render_table(value: &Value) -> anyhow::Result<String> {
    let options = table_options();
    let table = match value {
        Value::Array(items) if items.is_empty() => return Ok(String::from("(no rows)")),
        Value::Array(items) if items.iter().all(Value::is_object) => {
            let maps = items.iter().filter_map(Value::as_object).collect::<Vec<_>>();
            let columns = ordered_columns(&maps);
            let mut table = Table::new(columns.clone());
            for map in maps {
                table.push(
                    columns
                        .iter()
                        .map(|column| map.get(column).map_or_else(|| "-".to_string(), cell))
                        .collect(),
                );
            }
            table
        }
        Value::Array(items) => {
            let mut table = Table::new(vec!["value".to_string()]);
            for item in items {
                table.push(vec![cell(item)]);
            }
            table
        }
        Value::Object(map) => {
            let mut table = Table::new(vec!["field".to_string(), "value".to_string()]);
            for key in ordered_columns(&[map]) {
                if let Some(value) = map.get(&key) {
                    table.push(vec![key, cell(value)]);
                }
            }
            table
        }
        scalar => {
            let mut table = Table::new(vec!["value".to_string()]);
            table.push(vec![cell(scalar)]);
            table
        }
    };
    Ok(table.render(options))
}

/// Union of keys across `maps`: leading columns first, the rest sorted.
fn ordered_columns(maps: &[&Map<String, Value>]) -> Vec<String> {
    let mut rest = maps
        .iter()
        .flat_map(|map| map.keys())
        .filter(|key| !LEADING_COLUMNS.contains(&key.as_str()))
        .cloned()
        .collect::<Vec<_>>();
    rest.sort();
    rest.dedup();

    LEADING_COLUMNS
        .iter()
        .filter(|column| maps.iter().any(|map| map.contains_key(**column)))
        .map(|column| (*column).to_string())
        .chain(rest)
        .collect()
}

/// Single-line cell text. Nested collections collapse to a count.
fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::from("-"),
        Value::Bool(v) => v.to_string(),
        Value::Number(v) => v.to_string(),
        Value::String(v) => v.replace('\n', " "),
        Value::Array(items) => format!("[{} items]", items.len()),
        Value::Object(map) => match map.get("id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => format!("{{{} fields}}", map.len()),
        },
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde::Serialize;
    use serde_json::json;

    use super::{cell, ordered_columns, render};
    use crate::cli::OutputFormat;

    #[derive(Serialize)]
    struct Row {
        title: &'static str,
        id: &'static str,
        zeta: u32,
        status: &'static str,
    }

    fn row() -> Row {
        Row {
            title: "DB down",
            id: "inc-1",
            zeta: 7,
            status: "new",
        }
    }

    #[test]
    fn json_render_is_valid_json() {
        let out = render(&row(), OutputFormat::Json).expect("json render should work");
        let parsed: serde_json::Value = serde_json::from_str(&out).expect("json should parse");
        assert_eq!(parsed["id"], "inc-1");
        assert_eq!(parsed["zeta"], 7);
    }

    #[test]
    fn raw_render_is_single_line_json() {
        let out = render(&row(), OutputFormat::Raw).expect("raw render should work");
        assert!(!out.contains('\n'));
        let parsed: serde_json::Value = serde_json::from_str(&out).expect("json should parse");
        assert_eq!(parsed["status"], "new");
    }

    #[test]
    fn object_table_lists_fields_with_id_first() {
        let out = render(&row(), OutputFormat::Table).expect("table render should work");
        let lines = out.lines().collect::<Vec<_>>();
        assert!(lines[0].starts_with("field"));
        assert!(lines[2].starts_with("id"));
        assert!(lines[3].starts_with("title"));
    }

    #[test]
    fn array_table_orders_columns() {
        let out = render(&vec![row(), row()], OutputFormat::Table).expect("table render should work");
        let header = out.lines().next().expect("header line");
        let id = header.find("id").expect("id column");
        let title = header.find("title").expect("title column");
        let zeta = header.find("zeta").expect("zeta column");
        assert!(id < title && title < zeta);
        assert_eq!(out.lines().count(), 4);
    }

    #[test]
    fn empty_array_renders_placeholder() {
        let rows: Vec<serde_json::Value> = Vec::new();
        assert_eq!(render(&rows, OutputFormat::Table).unwrap(), "(no rows)");
    }

    #[test]
    fn nested_values_collapse() {
        assert_eq!(cell(&json!([1, 2, 3])), "[3 items]");
        assert_eq!(cell(&json!({"id": "inc-1", "title": "x"})), "inc-1");
        assert_eq!(cell(&json!({"a": 1})), "{1 fields}");
        assert_eq!(cell(&json!(null)), "-");
        assert_eq!(cell(&json!("two\nlines")), "two lines");
    }

    #[test]
    fn columns_union_across_rows() {
        let a = json!({"id": "x", "b": 1});
        let b = json!({"id": "y", "a": 2, "severity": "sev1"});
        let maps = [a.as_object().unwrap(), b.as_object().unwrap()];
        assert_eq!(ordered_columns(&maps), vec!["id", "severity", "a", "b"]);
    }
}
