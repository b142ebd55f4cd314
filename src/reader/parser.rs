// Copyright (c) 2025 ADBC Drivers Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Page decoding and row parsing.
//!
//! A page body is decoded once into a [`WuResultResponse`]; its rows are then
//! laid out column by column in the order fixed by the structure probe.
//! Cells stay as raw text here. Typing happens once per assembled column in
//! [`assembler`](crate::reader::assembler).

use crate::error::{Error, Result};
use crate::types::dataset::{DatasetStructure, RowShape, LINE_FIELD};
use crate::types::wu_result::{WireRow, WuResultEnvelope, WuResultResponse};
use serde_json::Value;
use tracing::warn;

/// Raw cells of one chunk, one vector per column in structure order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChunkTable {
    pub columns: Vec<Vec<Option<String>>>,
}

impl ChunkTable {
    pub fn with_columns(num_columns: usize) -> Self {
        Self {
            columns: vec![Vec::new(); num_columns],
        }
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(Vec::len).unwrap_or(0)
    }

    fn push_row(&mut self, cells: impl IntoIterator<Item = Option<String>>) {
        for (column, cell) in self.columns.iter_mut().zip(cells) {
            column.push(cell);
        }
    }
}

/// Decode a `WUResult` page body.
///
/// Malformed JSON or a missing envelope is a [`Error::Parse`]; an exception
/// block reported by the service is a [`Error::Service`].
pub fn decode_page(body: &str) -> Result<WuResultResponse> {
    let envelope: WuResultEnvelope = serde_json::from_str(body)
        .map_err(|e| Error::Parse(format!("Failed to decode WUResult page: {}", e)))?;
    let response = envelope.response;

    if let Some(message) = response.exception_message() {
        return Err(Error::Service(message));
    }

    Ok(response)
}

/// Text form of a wire value. `null` is a missing cell; nested child
/// datasets are kept as compact JSON.
pub fn raw_cell(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        nested @ (Value::Array(_) | Value::Object(_)) => Some(nested.to_string()),
    }
}

/// The raw text of a delimited-line row, if it has any.
fn line_of(row: &WireRow) -> Option<&str> {
    match row.get(LINE_FIELD)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.as_str()),
        _ => None,
    }
}

/// Split a delimited line into column names.
pub fn header_columns(line: &str, delimiter: char) -> Vec<String> {
    line.trim_end_matches(['\r', '\n'])
        .split(delimiter)
        .map(|token| token.trim().to_string())
        .collect()
}

/// Lay out `rows` as columns.
///
/// `first_row_index` is the absolute remote index of `rows[0]`; rows before
/// `structure.first_data_row` are header rows and are dropped. In
/// delimited-line mode a row without a usable line is skipped with a warning,
/// so the result may hold fewer rows than were fetched.
pub fn parse_rows(
    rows: &[WireRow],
    first_row_index: u64,
    structure: &DatasetStructure,
    shape: RowShape,
) -> ChunkTable {
    let num_columns = structure.column_names.len();
    let mut table = ChunkTable::with_columns(num_columns);

    for (offset, row) in rows.iter().enumerate() {
        let row_index = first_row_index + offset as u64;
        if row_index < structure.first_data_row {
            continue;
        }

        match shape {
            RowShape::Structured => {
                table.push_row(
                    structure
                        .column_names
                        .iter()
                        .map(|name| row.get(name).and_then(raw_cell)),
                );
            }
            RowShape::DelimitedLine { delimiter } => {
                let Some(line) = line_of(row) else {
                    warn!("Skipping row {}: no line content", row_index);
                    continue;
                };

                let line = line.trim_end_matches(['\r', '\n']);
                let tokens: Vec<&str> = line.split(delimiter).collect();
                if tokens.len() > num_columns {
                    warn!(
                        "Row {} has {} fields, expected {}; dropping the extra fields",
                        row_index,
                        tokens.len(),
                        num_columns
                    );
                }

                table.push_row(
                    (0..num_columns).map(|i| tokens.get(i).map(|token| token.to_string())),
                );
            }
        }
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(value: Value) -> Vec<WireRow> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    fn structure(columns: &[&str], first_data_row: u64) -> DatasetStructure {
        DatasetStructure {
            column_names: columns.iter().map(|c| c.to_string()).collect(),
            row_count: 100,
            first_data_row,
        }
    }

    fn cells(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    #[test]
    fn test_decode_page_rejects_malformed_json() {
        let err = decode_page("<html>Service Unavailable</html>").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_decode_page_surfaces_service_exception() {
        let body = json!({
            "WUResultResponse": {
                "Exceptions": {"Exception": [{"Code": 2, "Message": "File not found"}]}
            }
        })
        .to_string();
        let err = decode_page(&body).unwrap_err();
        assert!(matches!(err, Error::Service(ref m) if m.contains("File not found")));
    }

    #[test]
    fn test_raw_cell_conversions() {
        assert_eq!(raw_cell(&json!("abc")).as_deref(), Some("abc"));
        assert_eq!(raw_cell(&json!(42)).as_deref(), Some("42"));
        assert_eq!(raw_cell(&json!(1.5)).as_deref(), Some("1.5"));
        assert_eq!(raw_cell(&json!(true)).as_deref(), Some("true"));
        assert_eq!(raw_cell(&json!(null)), None);
        assert_eq!(
            raw_cell(&json!({"Row": [{"x": 1}]})).as_deref(),
            Some(r#"{"Row":[{"x":1}]}"#)
        );
    }

    #[test]
    fn test_parse_structured_rows() {
        let page = rows(json!([
            {"name": "ann", "age": 31},
            {"age": 45, "name": "bob"},
            {"name": "cy"}
        ]));
        let table = parse_rows(&page, 0, &structure(&["name", "age"], 0), RowShape::Structured);

        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.columns[0], cells(&[Some("ann"), Some("bob"), Some("cy")]));
        // Missing field is an empty cell, not an error
        assert_eq!(table.columns[1], cells(&[Some("31"), Some("45"), None]));
    }

    #[test]
    fn test_parse_delimited_rows_skips_header() {
        let page = rows(json!([
            {"line": "id,name"},
            {"line": "1,ann"},
            {"line": "2,bob"}
        ]));
        let table = parse_rows(&page, 0, &structure(&["id", "name"], 1), RowShape::csv());

        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.columns[0], cells(&[Some("1"), Some("2")]));
        assert_eq!(table.columns[1], cells(&[Some("ann"), Some("bob")]));
    }

    #[test]
    fn test_parse_delimited_rows_past_header_keep_first_row() {
        let page = rows(json!([{"line": "3,cy"}]));
        let table = parse_rows(&page, 5, &structure(&["id", "name"], 1), RowShape::csv());
        assert_eq!(table.num_rows(), 1);
    }

    #[test]
    fn test_parse_delimited_skips_null_and_blank_lines() {
        let page = rows(json!([
            {"line": "1,ann"},
            {"line": null},
            {"line": "   "},
            {},
            {"line": "2,bob"}
        ]));
        let table = parse_rows(&page, 10, &structure(&["id", "name"], 1), RowShape::csv());

        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.columns[1], cells(&[Some("ann"), Some("bob")]));
    }

    #[test]
    fn test_parse_delimited_aligns_short_and_long_lines() {
        let page = rows(json!([
            {"line": "1"},
            {"line": "2,bob,extra"}
        ]));
        let shape = RowShape::DelimitedLine { delimiter: ',' };
        let table = parse_rows(&page, 1, &structure(&["id", "name"], 1), shape);

        assert_eq!(table.columns[0], cells(&[Some("1"), Some("2")]));
        assert_eq!(table.columns[1], cells(&[None, Some("bob")]));
    }

    #[test]
    fn test_parse_delimited_custom_delimiter() {
        let page = rows(json!([{"line": "a|b|c\r\n"}]));
        let shape = RowShape::DelimitedLine { delimiter: '|' };
        let table = parse_rows(&page, 1, &structure(&["x", "y", "z"], 1), shape);
        assert_eq!(table.columns[2], cells(&[Some("c")]));
    }

    #[test]
    fn test_header_columns_trims_tokens() {
        assert_eq!(
            header_columns(" id , name,age\r\n", ','),
            vec!["id".to_string(), "name".to_string(), "age".to_string()]
        );
    }

    #[test]
    fn test_empty_structure_yields_zero_columns() {
        let page = rows(json!([{"a": 1}]));
        let table = parse_rows(&page, 0, &structure(&[], 0), RowShape::Structured);
        assert!(table.columns.is_empty());
        assert_eq!(table.num_rows(), 0);
    }
}
