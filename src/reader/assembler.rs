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

//! Reassembly of chunk tables into one typed result.
//!
//! Chunks are concatenated in plan order, then each full column is typed
//! once: blanks become nulls, and the column becomes `Int64`, `Float64`,
//! `Boolean` or stays `Utf8`. Typing per column rather than per chunk keeps a
//! column from being numeric in one chunk and text in another.

use crate::error::{Error, Result};
use crate::reader::parser::ChunkTable;
use arrow_array::{
    ArrayRef, BooleanArray, Float64Array, Int64Array, RecordBatch, RecordBatchOptions,
    StringArray,
};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use std::sync::Arc;

/// Column type chosen by inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferredType {
    Int64,
    Float64,
    Boolean,
    Utf8,
}

impl InferredType {
    pub fn data_type(&self) -> DataType {
        match self {
            InferredType::Int64 => DataType::Int64,
            InferredType::Float64 => DataType::Float64,
            InferredType::Boolean => DataType::Boolean,
            InferredType::Utf8 => DataType::Utf8,
        }
    }
}

/// Assembled dataset, returned to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    batch: RecordBatch,
}

impl ResultTable {
    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn column(&self, name: &str) -> Option<&ArrayRef> {
        self.batch.column_by_name(name)
    }

    pub fn record_batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn into_record_batch(self) -> RecordBatch {
        self.batch
    }
}

/// `None` for blank or whitespace-only text.
pub fn normalize_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn parse_int(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok()
}

/// Finite floats only, so words like `inf` or `NaN` stay text.
pub fn parse_float(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
}

pub fn parse_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Pick the narrowest type every non-null value converts to.
///
/// Expects blanks already normalized to `None`. An all-null column is `Utf8`.
pub fn infer_column_type(values: &[Option<String>]) -> InferredType {
    let mut present = values.iter().flatten().peekable();
    if present.peek().is_none() {
        return InferredType::Utf8;
    }

    let all = |f: fn(&str) -> bool| values.iter().flatten().all(|v| f(v));

    if all(|v| parse_int(v).is_some()) {
        InferredType::Int64
    } else if all(|v| parse_float(v).is_some()) {
        InferredType::Float64
    } else if all(|v| parse_bool(v).is_some()) {
        InferredType::Boolean
    } else {
        InferredType::Utf8
    }
}

fn build_array(values: &[Option<String>], inferred: InferredType) -> ArrayRef {
    match inferred {
        InferredType::Int64 => Arc::new(
            values
                .iter()
                .map(|v| v.as_deref().and_then(parse_int))
                .collect::<Int64Array>(),
        ),
        InferredType::Float64 => Arc::new(
            values
                .iter()
                .map(|v| v.as_deref().and_then(parse_float))
                .collect::<Float64Array>(),
        ),
        InferredType::Boolean => Arc::new(
            values
                .iter()
                .map(|v| v.as_deref().and_then(parse_bool))
                .collect::<BooleanArray>(),
        ),
        InferredType::Utf8 => Arc::new(values.iter().map(|v| v.as_deref()).collect::<StringArray>()),
    }
}

/// Concatenate `chunks` in order and type each column.
///
/// Every chunk must carry one column per entry of `column_names`.
pub fn assemble(column_names: &[String], chunks: Vec<ChunkTable>) -> Result<ResultTable> {
    let num_rows: usize = chunks.iter().map(ChunkTable::num_rows).sum();
    let mut columns: Vec<Vec<Option<String>>> = column_names
        .iter()
        .map(|_| Vec::with_capacity(num_rows))
        .collect();

    for (index, chunk) in chunks.into_iter().enumerate() {
        if chunk.columns.len() != column_names.len() {
            return Err(Error::Internal(format!(
                "Chunk {} has {} columns, expected {}",
                index,
                chunk.columns.len(),
                column_names.len()
            )));
        }
        for (column, values) in columns.iter_mut().zip(chunk.columns) {
            column.extend(values.into_iter().map(normalize_blank));
        }
    }

    let mut fields = Vec::with_capacity(column_names.len());
    let mut arrays = Vec::with_capacity(column_names.len());
    for (name, values) in column_names.iter().zip(&columns) {
        let inferred = infer_column_type(values);
        fields.push(Field::new(name, inferred.data_type(), true));
        arrays.push(build_array(values, inferred));
    }

    let options = RecordBatchOptions::new().with_row_count(Some(num_rows));
    let batch = RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)
        .map_err(|e| Error::Internal(format!("Failed to build result table: {}", e)))?;

    Ok(ResultTable { batch })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_array::cast::AsArray;
    use arrow_array::types::{Float64Type, Int64Type};
    use arrow_array::Array;

    fn values(raw: &[&str]) -> Vec<Option<String>> {
        raw.iter()
            .map(|v| normalize_blank(Some(v.to_string())))
            .collect()
    }

    fn chunk(columns: Vec<Vec<&str>>) -> ChunkTable {
        ChunkTable {
            columns: columns
                .into_iter()
                .map(|col| col.into_iter().map(|v| Some(v.to_string())).collect())
                .collect(),
        }
    }

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_infer_integers() {
        assert_eq!(infer_column_type(&values(&["1", "2", "3"])), InferredType::Int64);
        assert_eq!(infer_column_type(&values(&["-7", " 42 "])), InferredType::Int64);
    }

    #[test]
    fn test_infer_floats() {
        assert_eq!(infer_column_type(&values(&["1", "2.5"])), InferredType::Float64);
        assert_eq!(infer_column_type(&values(&["1e3", "0.1"])), InferredType::Float64);
    }

    #[test]
    fn test_infer_booleans_case_insensitive() {
        assert_eq!(infer_column_type(&values(&["true", "false"])), InferredType::Boolean);
        assert_eq!(
            infer_column_type(&values(&["TRUE", "", "False"])),
            InferredType::Boolean
        );
    }

    #[test]
    fn test_infer_mixed_stays_text() {
        assert_eq!(infer_column_type(&values(&["1", "a"])), InferredType::Utf8);
        assert_eq!(infer_column_type(&values(&["true", "1"])), InferredType::Utf8);
        assert_eq!(infer_column_type(&values(&["NaN", "inf"])), InferredType::Utf8);
    }

    #[test]
    fn test_infer_all_blank_is_text() {
        assert_eq!(infer_column_type(&values(&["", "  "])), InferredType::Utf8);
        assert_eq!(infer_column_type(&[]), InferredType::Utf8);
    }

    #[test]
    fn test_blanks_do_not_block_numeric_inference() {
        assert_eq!(infer_column_type(&values(&["1", "", "3"])), InferredType::Int64);
    }

    #[test]
    fn test_assemble_concatenates_in_chunk_order() {
        let chunks = vec![
            chunk(vec![vec!["1", "2"], vec!["a", "b"]]),
            chunk(vec![vec!["3"], vec!["c"]]),
        ];
        let table = assemble(&names(&["id", "name"]), chunks).unwrap();

        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.column_names(), names(&["id", "name"]));

        let ids = table.column("id").unwrap().as_primitive::<Int64Type>();
        assert_eq!(ids.values().to_vec(), vec![1, 2, 3]);
        let labels = table.column("name").unwrap().as_string::<i32>();
        assert_eq!(labels.value(2), "c");
    }

    #[test]
    fn test_assemble_types_whole_column_across_chunks() {
        // Integral in the first chunk, fractional in the second
        let chunks = vec![chunk(vec![vec!["1", "2"]]), chunk(vec![vec!["2.5"]])];
        let table = assemble(&names(&["x"]), chunks).unwrap();

        let field = table.schema().field(0).clone();
        assert_eq!(field.data_type(), &DataType::Float64);
        let xs = table.column("x").unwrap().as_primitive::<Float64Type>();
        assert_eq!(xs.value(0), 1.0);
        assert_eq!(xs.value(2), 2.5);
    }

    #[test]
    fn test_assemble_blank_becomes_null() {
        let chunks = vec![
            chunk(vec![vec!["true", ""], vec!["1", ""]]),
            chunk(vec![vec!["false"], vec!["x"]]),
        ];
        let table = assemble(&names(&["flag", "mixed"]), chunks).unwrap();

        let flags = table.column("flag").unwrap().as_boolean();
        assert!(flags.value(0));
        assert!(flags.is_null(1));
        assert!(!flags.value(2));

        let mixed = table.column("mixed").unwrap().as_string::<i32>();
        assert_eq!(table.schema().field(1).data_type(), &DataType::Utf8);
        assert!(mixed.is_null(1));
    }

    #[test]
    fn test_assemble_missing_cells_are_null() {
        let chunks = vec![ChunkTable {
            columns: vec![vec![Some("5".to_string()), None]],
        }];
        let table = assemble(&names(&["n"]), chunks).unwrap();
        let ns = table.column("n").unwrap();
        assert_eq!(ns.data_type(), &DataType::Int64);
        assert!(ns.is_null(1));
    }

    #[test]
    fn test_assemble_zero_columns() {
        let table = assemble(&[], vec![]).unwrap();
        assert_eq!(table.num_columns(), 0);
        assert_eq!(table.num_rows(), 0);
    }

    #[test]
    fn test_assemble_columns_without_rows() {
        let table = assemble(&names(&["a", "b"]), vec![ChunkTable::with_columns(2)]).unwrap();
        assert_eq!(table.num_rows(), 0);
        assert_eq!(table.column_names(), names(&["a", "b"]));
    }

    #[test]
    fn test_assemble_rejects_misshapen_chunk() {
        let chunks = vec![chunk(vec![vec!["1"]])];
        assert!(matches!(
            assemble(&names(&["a", "b"]), chunks),
            Err(Error::Internal(_))
        ));
    }

    #[test]
    fn test_into_record_batch() {
        let table = assemble(&names(&["a"]), vec![chunk(vec![vec!["1"]])]).unwrap();
        let batch = table.clone().into_record_batch();
        assert_eq!(&batch, table.record_batch());
    }
}
