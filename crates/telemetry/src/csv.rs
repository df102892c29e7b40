//! Decoder for the annotated CSV the query API returns.
//!
//! The query is issued with an empty annotation list, so each result
//! table is a header row followed by data rows, tables separated by
//! blank lines. Lines starting with `#` (annotations) are skipped.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// One decoded data row, keyed by column name.
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: HashMap<String, String>,
}

impl Record {
    /// Get a column as a string, treating empty cells as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(|v| v.as_str()).filter(|v| !v.is_empty())
    }

    /// Get a column as f64, falling back when missing or unparseable.
    pub fn f64_or(&self, key: &str, default: f64) -> f64 {
        self.get(key)
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(default)
    }

    /// Get a column as an RFC 3339 timestamp.
    pub fn time(&self, key: &str) -> Option<DateTime<Utc>> {
        self.get(key)
            .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Decode a CSV response body into records.
pub fn decode(body: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let mut header: Option<Vec<String>> = None;

    for line in body.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            // Table boundary; next non-empty line is a new header.
            header = None;
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        let cells = split_line(line);
        match &header {
            None => header = Some(cells),
            Some(columns) => {
                let mut fields = HashMap::with_capacity(columns.len());
                for (column, cell) in columns.iter().zip(cells) {
                    if !column.is_empty() {
                        fields.insert(column.clone(), cell);
                    }
                }
                records.push(Record { fields });
            }
        }
    }

    records
}

/// Split one CSV line, honoring double-quoted cells with `""` escapes.
fn split_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                cells.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    cells.push(current);
    cells
}
