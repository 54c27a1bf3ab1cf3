//! JSON-lines files: one object per line, nested objects flattened with `.`.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use super::table::{Table, TabularFigure};
use super::{Figure, SourceError};

fn flatten(prefix: &str, value: &Value, out: &mut Vec<(String, Option<String>)>) {
    let cell = match value {
        Value::Object(map) => {
            for (key, inner) in map {
                let key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&key, inner, out);
            }
            return;
        }
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) => Some(value.to_string()),
    };
    out.push((prefix.to_owned(), cell));
}

/// Parse JSON-lines text. Lines that are not JSON objects are skipped.
pub(crate) fn parse_jsonl(text: &str) -> Result<Table, SourceError> {
    let mut names: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut rows: Vec<Vec<Option<String>>> = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = match serde_json::from_str(line) {
            Ok(value @ Value::Object(_)) => value,
            Ok(_) => {
                debug!(line = line_no, "skipping non-object json line");
                continue;
            }
            Err(e) => {
                debug!(line = line_no, error = %e, "skipping unparsable json line");
                continue;
            }
        };

        let mut fields = Vec::new();
        flatten("", &value, &mut fields);

        let mut row = vec![None; names.len()];
        for (name, cell) in fields {
            let col = *index.entry(name.clone()).or_insert_with(|| {
                names.push(name);
                names.len().saturating_sub(1)
            });
            if row.len() <= col {
                row.resize(col.saturating_add(1), None);
            }
            if let Some(slot) = row.get_mut(col) {
                *slot = cell;
            }
        }
        rows.push(row);
    }

    Ok(Table::from_rows(names, &rows))
}

/// One Figure for a JSON-lines file.
pub(crate) fn open(path: &Path) -> Result<Box<dyn Figure>, SourceError> {
    Ok(Box::new(TabularFigure::from_file(path, parse_jsonl)?))
}
