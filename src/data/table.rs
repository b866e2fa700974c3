//! Shared Data Relation
//!
//! A small row-oriented table built from the `shared_data` section of a
//! metadata document. Cells are JSON values; null and missing cells are both
//! stored as `None`.
//!
//! # Example YAML Format
//!
//! Rows, with per-library `runs` expanded into one row each:
//!
//! ```yaml
//! shared_data:
//!   - library_name: L1
//!     sample: liver
//!     runs:
//!       - run_id: R1
//!         fastq1: L1_R1_1.fq.gz
//!         fastq2: L1_R1_2.fq.gz
//!       - run_id: R2
//!         fastq1: L1_R2_1.fq.gz
//! ```
//!
//! or columns of equal length:
//!
//! ```yaml
//! shared_data:
//!   library_name: [L1, L2]
//!   fastq1: [a.fq.gz, b.fq.gz]
//! ```

use serde_json::{Map, Value};

use crate::error::DataQueryError;

/// Name given to the table built from a metadata document.
pub const SHARED_DATA: &str = "shared_data";

/// Column added by [`SharedTable::left_outer_join`] when an indicator is requested.
pub const INDICATOR_COLUMN: &str = "_merge";

const RUNS_KEY: &str = "runs";
const LEFT_SUFFIX: &str = "_x";
const RIGHT_SUFFIX: &str = "_y";

/// Provenance of a joined row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeIndicator {
    LeftOnly,
    Both,
}

impl MergeIndicator {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeIndicator::LeftOnly => "left_only",
            MergeIndicator::Both => "both",
        }
    }
}

type Row = Vec<Option<Value>>;

/// Named table with ordered columns and rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SharedTable {
    name: String,
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl SharedTable {
    /// Creates an empty table. `name` is used in error messages.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Builds a table from records. Columns appear in first-seen order and
    /// records lacking a column get an empty cell.
    pub fn from_records<I>(name: impl Into<String>, records: I) -> Self
    where
        I: IntoIterator<Item = Map<String, Value>>,
    {
        let mut table = Self::new(name);
        for record in records {
            table.push_record(record);
        }
        table
    }

    /// Builds the relation from a `shared_data` section.
    ///
    /// Accepts null (empty table), a list of row mappings, or a mapping of
    /// column name to a list of values.
    pub fn from_value(value: Value) -> Result<Self, DataQueryError> {
        match value {
            Value::Null => Ok(Self::new(SHARED_DATA)),
            Value::Array(entries) => Self::from_entries(entries),
            Value::Object(columns) => Self::from_columns(columns),
            other => Err(invalid(format!(
                "expected a list of rows or a mapping of columns, found {}",
                kind_of(&other)
            ))),
        }
    }

    fn from_entries(entries: Vec<Value>) -> Result<Self, DataQueryError> {
        let mut table = Self::new(SHARED_DATA);

        for (index, entry) in entries.into_iter().enumerate() {
            let Value::Object(mut entry) = entry else {
                return Err(invalid(format!("entry {index} is not a mapping")));
            };

            if !entry.get(RUNS_KEY).is_some_and(Value::is_array) {
                table.push_record(entry);
                continue;
            }

            let runs = match entry.shift_remove(RUNS_KEY) {
                Some(Value::Array(runs)) => runs,
                _ => Vec::new(),
            };
            if runs.is_empty() {
                table.push_record(entry);
                continue;
            }

            for (run_index, run) in runs.into_iter().enumerate() {
                let Value::Object(run) = run else {
                    return Err(invalid(format!(
                        "run {run_index} of entry {index} is not a mapping"
                    )));
                };
                let mut row = entry.clone();
                row.extend(run);
                table.push_record(row);
            }
        }

        Ok(table)
    }

    fn from_columns(columns: Map<String, Value>) -> Result<Self, DataQueryError> {
        let mut table = Self::new(SHARED_DATA);
        let mut values_by_column = Vec::with_capacity(columns.len());
        let mut length = None;

        for (column, values) in columns {
            let Value::Array(values) = values else {
                return Err(invalid(format!("column '{column}' is not a list")));
            };
            match length {
                None => length = Some(values.len()),
                Some(expected) if expected != values.len() => {
                    return Err(invalid(format!(
                        "column '{column}' has {} value(s), expected {expected}",
                        values.len()
                    )));
                }
                Some(_) => {}
            }
            table.columns.push(column);
            values_by_column.push(values);
        }

        let width = table.columns.len();
        table.rows = (0..length.unwrap_or(0))
            .map(|_| Vec::with_capacity(width))
            .collect();
        for values in values_by_column {
            for (row, value) in table.rows.iter_mut().zip(values) {
                row.push(normalize(value));
            }
        }

        Ok(table)
    }

    /// Appends a record, widening the table for unseen columns.
    pub fn push_record(&mut self, record: Map<String, Value>) {
        let mut row: Row = vec![None; self.columns.len()];
        for (column, value) in record {
            let index = match self.column_index(&column) {
                Some(index) => index,
                None => {
                    self.columns.push(column);
                    for existing in &mut self.rows {
                        existing.push(None);
                    }
                    row.push(None);
                    self.columns.len() - 1
                }
            };
            row[index] = normalize(value);
        }
        self.rows.push(row);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    /// Cell at `row` in `column`; `None` when empty or out of range.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)?.as_ref()
    }

    /// Row `index` as a record, with empty cells as null.
    pub fn record(&self, index: usize) -> Option<Map<String, Value>> {
        let row = self.rows.get(index)?;
        Some(
            self.columns
                .iter()
                .cloned()
                .zip(row.iter().map(|cell| cell.clone().unwrap_or(Value::Null)))
                .collect(),
        )
    }

    pub fn records(&self) -> Vec<Map<String, Value>> {
        (0..self.rows.len()).filter_map(|i| self.record(i)).collect()
    }

    /// The table as a JSON list of row objects.
    pub fn to_value(&self) -> Value {
        Value::Array(self.records().into_iter().map(Value::Object).collect())
    }

    /// Keeps the rows whose `column` equals `value`. A null `value` matches
    /// empty cells.
    pub fn filter_eq(&self, column: &str, value: &Value) -> Result<SharedTable, DataQueryError> {
        let index = self.require_column(column)?;
        let rows = self
            .rows
            .iter()
            .filter(|row| match (&row[index], value) {
                (None, Value::Null) => true,
                (Some(cell), value) => cells_equal(cell, value),
                (None, _) => false,
            })
            .cloned()
            .collect();

        Ok(SharedTable {
            name: self.name.clone(),
            columns: self.columns.clone(),
            rows,
        })
    }

    /// Values of `column`, in row order.
    pub fn project(&self, column: &str) -> Result<Vec<Option<&Value>>, DataQueryError> {
        let index = self.require_column(column)?;
        Ok(self.rows.iter().map(|row| row[index].as_ref()).collect())
    }

    /// Left outer join with `other` on `join_keys`.
    ///
    /// Every row of `self` is kept, in order, followed by its matches in
    /// `other` order; a row without matches appears once with empty cells
    /// for `other`'s columns. Empty key cells never match. Non-key columns
    /// present in both tables are suffixed `_x` and `_y`; a suffixed name
    /// that clashes with another output column is a `ColumnConflict`. With
    /// `with_indicator`, a `_merge` column holds `left_only` or `both`.
    pub fn left_outer_join(
        &self,
        other: &SharedTable,
        join_keys: &[&str],
        with_indicator: bool,
    ) -> Result<SharedTable, DataQueryError> {
        let left_keys = join_keys
            .iter()
            .map(|key| self.require_column(key))
            .collect::<Result<Vec<_>, _>>()?;
        let right_keys = join_keys
            .iter()
            .map(|key| other.require_column(key))
            .collect::<Result<Vec<_>, _>>()?;

        if with_indicator {
            if let Some(table) = [self, other].into_iter().find(|t| t.has_column(INDICATOR_COLUMN)) {
                return Err(DataQueryError::IndicatorConflict {
                    column: format!("{}.{}", table.name, INDICATOR_COLUMN),
                });
            }
        }

        let is_key = |column: &str| join_keys.contains(&column);
        let right_extra: Vec<usize> = (0..other.columns.len())
            .filter(|&i| !is_key(other.columns[i].as_str()))
            .collect();

        let mut columns: Vec<String> = self
            .columns
            .iter()
            .map(|column| {
                if !is_key(column.as_str()) && other.has_column(column) {
                    format!("{column}{LEFT_SUFFIX}")
                } else {
                    column.clone()
                }
            })
            .collect();
        columns.extend(right_extra.iter().map(|&i| {
            let column = &other.columns[i];
            if self.has_column(column) {
                format!("{column}{RIGHT_SUFFIX}")
            } else {
                column.clone()
            }
        }));
        if let Some(column) = first_duplicate(&columns) {
            return Err(DataQueryError::ColumnConflict {
                column: column.to_string(),
            });
        }
        if with_indicator {
            columns.push(INDICATOR_COLUMN.to_string());
        }

        let mut rows = Vec::with_capacity(self.rows.len());
        for left in &self.rows {
            let matches: Vec<&Row> = other
                .rows
                .iter()
                .filter(|right| keys_match(left, &left_keys, right, &right_keys))
                .collect();

            if matches.is_empty() {
                let mut row = left.clone();
                row.extend(std::iter::repeat(None).take(right_extra.len()));
                if with_indicator {
                    row.push(Some(Value::from(MergeIndicator::LeftOnly.as_str())));
                }
                rows.push(row);
                continue;
            }

            for right in matches {
                let mut row = left.clone();
                row.extend(right_extra.iter().map(|&i| right[i].clone()));
                if with_indicator {
                    row.push(Some(Value::from(MergeIndicator::Both.as_str())));
                }
                rows.push(row);
            }
        }

        Ok(SharedTable {
            name: format!("{}+{}", self.name, other.name),
            columns,
            rows,
        })
    }

    fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    fn require_column(&self, column: &str) -> Result<usize, DataQueryError> {
        self.column_index(column)
            .ok_or_else(|| DataQueryError::UnknownColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }
}

fn first_duplicate(columns: &[String]) -> Option<&str> {
    columns
        .iter()
        .enumerate()
        .find(|(i, column)| columns[..*i].contains(column))
        .map(|(_, column)| column.as_str())
}

fn keys_match(left: &Row, left_keys: &[usize], right: &Row, right_keys: &[usize]) -> bool {
    left_keys
        .iter()
        .zip(right_keys)
        .all(|(&l, &r)| match (&left[l], &right[r]) {
            (Some(a), Some(b)) => cells_equal(a, b),
            _ => false,
        })
}

/// Equality that treats `1` and `1.0` as the same number. Two integers
/// compare exactly.
fn cells_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_f64() || y.is_f64() => {
            x.as_f64() == y.as_f64()
        }
        _ => a == b,
    }
}

fn normalize(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        other => Some(other),
    }
}

fn invalid(reason: String) -> DataQueryError {
    DataQueryError::InvalidSharedData { reason }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
