//! Single-Document Config Helper
//!
//! [`ConfigHelper`] serves workflows that keep their whole configuration in
//! one document: workflow-wide keys at the top level and a `rule_params`
//! list of rule entries.
//!
//! ```yaml
//! analysis_id: chip_2022_05
//! workdir: /scratch/chip
//! rule_params:
//!   - rule_name: call_peaks
//!     parameters:
//!       qvalue: 0.01
//!     resources:
//!       walltime: "02:00:00"
//!       nodes: 1
//!       processors_per_node: 4
//!       total_memory: 8000
//!       log_dir: logs/
//!       job_id: PEAKS
//! ```

use std::path::PathBuf;

use log::debug;
use serde_json::Value;

use crate::attrdict::{AttrDict, Node};
use crate::error::{ConfigLoadError, ParamError, Result, RuleLookupError};
use crate::fileops::{verify_path, PathKind};
use crate::schema::{validate, SchemaRegistry};

/// Resource keys copied from a rule by [`ConfigHelper::get_rule_resources`].
pub const RESOURCE_KEYS: [&str; 3] = ["walltime", "nodes", "processors_per_node"];

const RULE_PARAMS_KEY: &str = "rule_params";
const LABEL: &str = "config";

/// Accessors over a validated single-document configuration.
#[derive(Debug, Clone)]
pub struct ConfigHelper {
    globals: AttrDict,
    rules: Vec<AttrDict>,
    rule_names: Vec<String>,
}

impl ConfigHelper {
    /// Validates `config` against the schema named by `schema_type` (unknown
    /// or `None` means permissive) and splits it into globals and rules.
    pub fn new(config: Value, schema_type: Option<&str>) -> Result<Self> {
        let schema = SchemaRegistry::global().get_schema(schema_type);
        let config = validate(config, schema, LABEL)?;

        let Value::Object(mut globals) = config else {
            return Err(ConfigLoadError::NotAMapping {
                source_name: LABEL.to_string(),
                index: 0,
            }
            .into());
        };

        let entries = match globals.shift_remove(RULE_PARAMS_KEY) {
            Some(Value::Array(entries)) => entries,
            Some(Value::Null) | None => Vec::new(),
            Some(_) => return Err(not_a_mapping(RULE_PARAMS_KEY)),
        };

        let mut rules = Vec::with_capacity(entries.len());
        let mut rule_names = Vec::with_capacity(entries.len());
        for entry in entries {
            let rule = match AttrDict::from_value(entry) {
                Some(rule) if !rule.is_empty() => rule,
                _ => return Err(not_a_mapping(RULE_PARAMS_KEY)),
            };
            let Some(name) = rule.get("rule_name").and_then(Node::as_str) else {
                return Err(not_a_mapping("rule_name"));
            };
            rule_names.push(name.to_string());
            rules.push(rule);
        }

        debug!(
            "Config helper holds {} global key(s) and {} rule(s)",
            globals.len(),
            rules.len()
        );

        Ok(Self {
            globals: AttrDict::from(globals),
            rules,
            rule_names,
        })
    }

    /// Returns a top-level parameter.
    pub fn get_global_param(&self, param: &str) -> std::result::Result<&Node, ParamError> {
        self.globals.get(param).ok_or_else(|| ParamError::Global {
            param: param.to_string(),
        })
    }

    /// Returns a top-level parameter resolved as a filesystem path.
    pub fn get_global_path(
        &self,
        param: &str,
        kind: PathKind,
        require_exists: bool,
    ) -> Result<PathBuf> {
        let value = self.get_global_param(param)?;
        Ok(verify_path(&value.to_string(), kind, require_exists)?)
    }

    /// Returns a key of a rule entry.
    pub fn get_rule_param(&self, rule: &str, param: &str) -> Result<&Node> {
        let entry = self.rule(rule)?;
        entry.get(param).ok_or_else(|| {
            ParamError::Rule {
                rule: rule.to_string(),
                param: param.to_string(),
            }
            .into()
        })
    }

    /// Returns a key of a rule entry resolved as a filesystem path.
    pub fn get_rule_path(
        &self,
        rule: &str,
        param: &str,
        kind: PathKind,
        require_exists: bool,
    ) -> Result<PathBuf> {
        let value = self.get_rule_param(rule, param)?;
        Ok(verify_path(&value.to_string(), kind, require_exists)?)
    }

    /// Builds the scheduler resource set for `rule`.
    ///
    /// `walltime`, `nodes` and `processors_per_node` come from the rule's
    /// `resources` section (or the rule entry itself if it has none);
    /// `log_dir` and `job_id` come from the arguments.
    pub fn get_rule_resources(&self, rule: &str, log_dir: &str, job_id: &str) -> Result<AttrDict> {
        let entry = self.rule(rule)?;
        let section = entry
            .get("resources")
            .and_then(Node::as_dict)
            .unwrap_or(entry);

        let mut resources = AttrDict::new();
        resources.set("log_dir", log_dir);
        resources.set("job_id", job_id);
        for key in RESOURCE_KEYS {
            let value = section.get(key).ok_or_else(|| ParamError::Rule {
                rule: rule.to_string(),
                param: key.to_string(),
            })?;
            resources.set(key, value.clone());
        }
        Ok(resources)
    }

    pub fn globals(&self) -> &AttrDict {
        &self.globals
    }

    pub fn rule_names(&self) -> &[String] {
        &self.rule_names
    }

    /// First rule entry named `rule`.
    fn rule(&self, rule: &str) -> std::result::Result<&AttrDict, RuleLookupError> {
        self.rule_names
            .iter()
            .position(|name| name == rule)
            .map(|idx| &self.rules[idx])
            .ok_or_else(|| RuleLookupError {
                rule_name: rule.to_string(),
                known: self.rule_names.clone(),
            })
    }
}

fn not_a_mapping(key: &str) -> crate::error::Error {
    ConfigLoadError::SectionNotMapping {
        source_name: LABEL.to_string(),
        index: 0,
        key: key.to_string(),
    }
    .into()
}
