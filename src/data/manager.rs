//! Workflow Metadata Manager
//!
//! [`DataManager`] holds the metadata document of a workflow: a shared table
//! of sample/library/run records queried by many rules, and one free-form
//! record per rule.
//!
//! # Example YAML Format
//!
//! ```yaml
//! shared_data:
//!   - library_name: L1
//!     runs:
//!       - run_id: R1
//!         fastq1: L1_R1_1.fq.gz
//! rule_data:
//!   - rule_name: align_reads
//!     index:
//!       prefix: refs/hg38
//! ```

use log::{debug, info};
use serde::Serialize;
use serde_json::Value;

use super::table::{SharedTable, SHARED_DATA};
use crate::attrdict::{AttrDict, Node};
use crate::error::{ConfigLoadError, DataQueryError, KeyPathError, Result, RuleLookupError};
use crate::schema::{validate, SchemaRegistry, SchemaType};

const RULE_DATA: &str = "rule_data";
const LABEL: &str = "metadata";

/// Answer to a shared data query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SharedValue {
    /// The target cell of the single matching row.
    Scalar(Value),
    /// Target cells of several rows, or empty when nothing usable matched.
    Sequence(Vec<Value>),
}

impl SharedValue {
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            SharedValue::Scalar(value) => Some(value),
            SharedValue::Sequence(_) => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            SharedValue::Scalar(_) => None,
            SharedValue::Sequence(values) => Some(values),
        }
    }

    /// True for the empty sequence.
    pub fn is_empty(&self) -> bool {
        matches!(self, SharedValue::Sequence(values) if values.is_empty())
    }

    pub fn into_value(self) -> Value {
        match self {
            SharedValue::Scalar(value) => value,
            SharedValue::Sequence(values) => Value::Array(values),
        }
    }
}

/// Validated metadata for one workflow.
#[derive(Debug, Clone)]
pub struct DataManager {
    schema: SchemaType,
    shared: SharedTable,
    rule_data: Vec<Node>,
    rule_names: Vec<String>,
}

impl DataManager {
    /// Validates `metadata` against the schema named by `schema_type`
    /// (`META_DEFAULT` when `None`) and builds the shared table and rule
    /// records.
    pub fn new(metadata: Value, schema_type: Option<&str>) -> Result<Self> {
        let keyword = schema_type.unwrap_or(SchemaType::MetaDefault.keyword());
        let schema = SchemaRegistry::global().get_schema(Some(keyword));
        let metadata = validate(metadata, schema, LABEL)?;

        let Value::Object(mut sections) = metadata else {
            return Err(ConfigLoadError::NotAMapping {
                source_name: LABEL.to_string(),
                index: 0,
            }
            .into());
        };

        let shared_data = sections.shift_remove(SHARED_DATA).unwrap_or(Value::Null);
        let shared = SharedTable::from_value(shared_data)?;

        let entries = match sections.shift_remove(RULE_DATA) {
            Some(Value::Array(entries)) => entries,
            Some(Value::Null) | None => Vec::new(),
            Some(_) => {
                return Err(DataQueryError::InvalidRuleData {
                    reason: "expected a list of rule records".to_string(),
                }
                .into())
            }
        };

        let mut rule_data = Vec::with_capacity(entries.len());
        let mut rule_names = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            let name = entry
                .get("rule_name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| DataQueryError::InvalidRuleData {
                    reason: format!("entry {index} has no string 'rule_name'"),
                })?;
            let record =
                AttrDict::from_value(entry).ok_or_else(|| DataQueryError::InvalidRuleData {
                    reason: format!("entry {index} is not a mapping"),
                })?;
            rule_names.push(name);
            rule_data.push(Node::Dict(record));
        }

        info!(
            "Loaded metadata: {} shared row(s), {} rule record(s)",
            shared.len(),
            rule_data.len()
        );

        Ok(Self {
            schema: schema.kind(),
            shared,
            rule_data,
            rule_names,
        })
    }

    /// Resolves `key_path` inside the metadata record of `rule_name`.
    ///
    /// An empty path returns the whole record. Numeric segments index lists.
    pub fn get_rule_data<S: AsRef<str>>(&self, rule_name: &str, key_path: &[S]) -> Result<&Node> {
        let index = self
            .rule_names
            .iter()
            .position(|name| name == rule_name)
            .ok_or_else(|| RuleLookupError {
                rule_name: rule_name.to_string(),
                known: self.rule_names.clone(),
            })?;

        let mut node = &self.rule_data[index];
        for segment in key_path {
            let segment = segment.as_ref();
            node = node.child(segment).ok_or_else(|| KeyPathError {
                rule_name: rule_name.to_string(),
                path: key_path.iter().map(|s| s.as_ref().to_string()).collect(),
                segment: segment.to_string(),
            })?;
        }

        debug!(
            "Resolved {} key(s) in rule data for '{}'",
            key_path.len(),
            rule_name
        );
        Ok(node)
    }

    /// Filters the shared table by each `(column, value)` equality in turn
    /// and projects `target`.
    ///
    /// One matching row gives its cell as a scalar, or the empty sequence if
    /// the cell is empty. Several rows give their cells in row order with
    /// empty cells as `""`, or the empty sequence if every cell is empty.
    /// No matching rows give the empty sequence.
    pub fn get_shared_data<I, K, V>(&self, conditions: I, target: &str) -> Result<SharedValue>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut selected = self.shared.clone();
        for (column, value) in conditions {
            selected = selected.filter_eq(column.as_ref(), &value.into())?;
        }

        let cells = selected.project(target)?;
        debug!("Shared data query on '{}' matched {} row(s)", target, cells.len());

        let answer = match cells.as_slice() {
            [] => SharedValue::Sequence(Vec::new()),
            [Some(cell)] => SharedValue::Scalar((*cell).clone()),
            [None] => SharedValue::Sequence(Vec::new()),
            _ if cells.iter().all(Option::is_none) => SharedValue::Sequence(Vec::new()),
            _ => SharedValue::Sequence(
                cells
                    .iter()
                    .map(|cell| cell.cloned().unwrap_or_else(|| Value::from("")))
                    .collect(),
            ),
        };
        Ok(answer)
    }

    /// Left outer join of the shared table with `other` on `join_keys`.
    /// See [`SharedTable::left_outer_join`].
    pub fn loj_shared_data(
        &self,
        other: &SharedTable,
        join_keys: &[&str],
        with_indicator: bool,
    ) -> Result<SharedTable> {
        Ok(self.shared.left_outer_join(other, join_keys, with_indicator)?)
    }

    pub fn shared_data(&self) -> &SharedTable {
        &self.shared
    }

    pub fn rule_names(&self) -> &[String] {
        &self.rule_names
    }

    pub fn schema(&self) -> SchemaType {
        self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::{json, Map};

    fn metadata() -> Value {
        json!({
            "shared_data": [
                {
                    "library_name": "L1",
                    "runs": [
                        {"run_id": "R1", "fastq1": "L1_R1_1.fq.gz", "fastq2": null}
                    ]
                },
                {
                    "library_name": "L2",
                    "runs": [
                        {"run_id": "R2", "fastq1": "L2_R2_1.fq.gz", "fastq2": null},
                        {"run_id": "R3", "fastq1": "L2_R3_1.fq.gz", "fastq2": "L2_R3_2.fq.gz"}
                    ]
                },
                {
                    "library_name": "L3",
                    "runs": [
                        {"run_id": "R4", "fastq1": "L3_R4_1.fq.gz"},
                        {"run_id": "R5", "fastq1": "L3_R5_1.fq.gz"}
                    ]
                }
            ],
            "rule_data": [
                {"rule_name": "align_reads", "index": {"prefix": "refs/hg38", "parts": ["a", "b"]}},
                {"rule_name": "call_peaks", "qvalue": 0.01},
                {"rule_name": "align_reads", "index": {"prefix": "shadowed"}}
            ]
        })
    }

    fn manager() -> DataManager {
        DataManager::new(metadata(), Some("META_GARDNER_SEQ_BASIC")).unwrap()
    }

    #[test]
    fn test_new_builds_table_and_records() {
        let dm = manager();
        assert_eq!(dm.shared_data().len(), 5);
        assert_eq!(dm.rule_names(), &["align_reads", "call_peaks", "align_reads"]);
        assert_eq!(dm.schema(), SchemaType::MetaGardnerSeqBasic);
    }

    #[test]
    fn test_strict_schema_rejects_bad_metadata() {
        let err = DataManager::new(json!({"rule_data": []}), Some("META_GARDNER_SEQ_BASIC")).unwrap_err();
        assert!(matches!(err, Error::Schema(_)));

        let err = DataManager::new(
            json!({"shared_data": [{"library_name": "L1"}], "rule_data": []}),
            Some("META_GARDNER_SEQ_BASIC"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn test_permissive_schema_accepts_missing_sections() {
        let dm = DataManager::new(json!({"notes": "x"}), None).unwrap();
        assert!(dm.shared_data().is_empty());
        assert!(dm.rule_names().is_empty());
        assert_eq!(dm.schema(), SchemaType::MetaDefault);
    }

    #[test]
    fn test_rule_data_needs_names() {
        let err = DataManager::new(json!({"rule_data": [{"qvalue": 1}]}), None).unwrap_err();
        assert!(matches!(err, Error::DataQuery(DataQueryError::InvalidRuleData { .. })));
    }

    #[test]
    fn test_get_rule_data() {
        let dm = manager();
        assert_eq!(*dm.get_rule_data("align_reads", &["index", "prefix"]).unwrap(), "refs/hg38");
        assert_eq!(*dm.get_rule_data("align_reads", &["index", "parts", "1"]).unwrap(), "b");
        assert_eq!(*dm.get_rule_data("call_peaks", &["qvalue"]).unwrap(), 0.01);

        let whole = dm.get_rule_data::<&str>("call_peaks", &[]).unwrap();
        assert_eq!(whole["rule_name"], "call_peaks");
    }

    #[test]
    fn test_get_rule_data_errors() {
        let dm = manager();
        match dm.get_rule_data("missing", &["index"]).unwrap_err() {
            Error::RuleLookup(err) => assert_eq!(err.rule_name, "missing"),
            other => panic!("unexpected error: {other}"),
        }

        match dm.get_rule_data("align_reads", &["index", "suffix", "x"]).unwrap_err() {
            Error::KeyPath(err) => {
                assert_eq!(err.segment, "suffix");
                assert_eq!(err.path, vec!["index", "suffix", "x"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_single_row_returns_scalar() {
        let dm = manager();
        let value = dm.get_shared_data([("library_name", "L1")], "fastq1").unwrap();
        assert_eq!(value, SharedValue::Scalar(json!("L1_R1_1.fq.gz")));

        let value = dm.get_shared_data([("library_name", "L1")], "fastq2").unwrap();
        assert_eq!(value, SharedValue::Sequence(vec![]));
    }

    #[test]
    fn test_multiple_rows_return_sequence() {
        let dm = manager();
        let value = dm.get_shared_data([("library_name", "L2")], "fastq1").unwrap();
        assert_eq!(
            value.as_sequence().unwrap(),
            &[json!("L2_R2_1.fq.gz"), json!("L2_R3_1.fq.gz")]
        );

        let value = dm.get_shared_data([("library_name", "L2")], "fastq2").unwrap();
        assert_eq!(value.as_sequence().unwrap(), &[json!(""), json!("L2_R3_2.fq.gz")]);

        let value = dm.get_shared_data([("library_name", "L3")], "fastq2").unwrap();
        assert!(value.is_empty());
    }

    #[test]
    fn test_conditions_apply_in_order() {
        let dm = manager();
        let value = dm
            .get_shared_data([("library_name", "L2"), ("run_id", "R3")], "fastq2")
            .unwrap();
        assert_eq!(value.into_value(), json!("L2_R3_2.fq.gz"));

        let value = dm
            .get_shared_data([("library_name", "L1"), ("run_id", "R3")], "fastq1")
            .unwrap();
        assert!(value.is_empty());
    }

    #[test]
    fn test_unknown_column() {
        let dm = manager();
        let err = dm.get_shared_data([("flowcell", "X")], "fastq1").unwrap_err();
        assert!(matches!(err, Error::DataQuery(DataQueryError::UnknownColumn { .. })));

        let err = dm.get_shared_data([("library_name", "L1")], "bam").unwrap_err();
        assert!(matches!(err, Error::DataQuery(DataQueryError::UnknownColumn { .. })));
    }

    #[test]
    fn test_loj_shared_data() {
        let dm = manager();
        let mut bam = Map::new();
        bam.insert("run_id".to_string(), json!("R2"));
        bam.insert("bam".to_string(), json!("R2.bam"));
        let other = SharedTable::from_records("alignments", [bam]);

        let joined = dm.loj_shared_data(&other, &["run_id"], true).unwrap();
        assert!(joined.len() >= dm.shared_data().len());
        for i in 0..dm.shared_data().len() {
            for column in dm.shared_data().columns() {
                assert_eq!(joined.cell(i, column), dm.shared_data().cell(i, column));
            }
        }
        assert_eq!(joined.cell(1, "bam"), Some(&json!("R2.bam")));
        assert_eq!(joined.cell(1, "_merge"), Some(&json!("both")));
        assert_eq!(joined.cell(0, "_merge"), Some(&json!("left_only")));
    }
}
