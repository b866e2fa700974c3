//! Workflow Configuration
//!
//! [`Configuration`] loads a multi-document YAML stream into one
//! [`GlobalParams`] record and an ordered list of [`RuleParams`].
//!
//! Each document declares what it is through its `DOC_TYPE` key:
//!
//! - `GLOBAL_CONFIG`: at most one per stream; requires `analysis_name`,
//!   `working_directory` and `files`. Any other top-level key (apart from
//!   `DOC_TYPE`) is kept in `misc`.
//! - `RULE_CONFIG`: requires `rule_name`, `resources` and `parameters`.
//!   Other keys are ignored.
//!
//! Every document is checked against the selected schema before it is
//! classified. A failed load returns an error and no instance.

use log::{debug, info};
use serde_json::{Map, Value};

use super::model::{
    DocType, GlobalParams, RuleParams, DOC_TYPE_KEY, GLOBAL_REQUIRED_KEYS, RULE_REQUIRED_KEYS,
};
use crate::attrdict::AttrDict;
use crate::error::{ConfigLoadError, Result, RuleLookupError};
use crate::fileops::read_documents;
use crate::schema::{validate, SchemaRegistry, SchemaType};

/// Global and per-rule parameters for one workflow.
#[derive(Debug, Clone)]
pub struct Configuration {
    source: String,
    schema: SchemaType,
    global_params: Option<GlobalParams>,
    /// Stream position of the GLOBAL_CONFIG document.
    global_index: Option<usize>,
    rule_params: Vec<RuleParams>,
    /// Parallel to `rule_params`.
    rule_names: Vec<String>,
}

impl Configuration {
    /// Creates an empty configuration for `source` (a file path, or any
    /// label when documents are supplied directly).
    ///
    /// Documents are checked against the permissive `CFG_DEFAULT` schema
    /// unless [`with_schema`](Self::with_schema) selects another.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            schema: SchemaType::CfgDefault,
            global_params: None,
            global_index: None,
            rule_params: Vec::new(),
            rule_names: Vec::new(),
        }
    }

    pub fn with_schema(mut self, schema: SchemaType) -> Self {
        self.schema = schema;
        self
    }

    /// Reads `path` and loads every document in it.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use gardnersnake::Configuration;
    ///
    /// fn main() -> gardnersnake::Result<()> {
    ///     let config = Configuration::from_file("workflow_config.yaml")?;
    ///     let align = config.get_rule_params("align_reads")?;
    ///     println!("walltime: {:?}", align.resources.get("walltime"));
    ///     Ok(())
    /// }
    /// ```
    pub fn from_file(path: &str) -> Result<Self> {
        Self::new(path).load()
    }

    /// Reads the source file and loads its documents.
    pub fn load(self) -> Result<Self> {
        info!("Loading configuration from: {}", self.source);
        let documents = read_documents(&self.source)?;
        self.load_documents(documents)
    }

    /// Loads already-parsed documents, in stream order.
    pub fn load_documents(mut self, documents: Vec<Value>) -> Result<Self> {
        let schema = SchemaRegistry::global().schema(self.schema);

        for (index, document) in documents.into_iter().enumerate() {
            let label = format!("{}[document {}]", self.source, index);
            let document = validate(document, schema, &label)?;

            let Value::Object(map) = document else {
                return Err(ConfigLoadError::NotAMapping {
                    source_name: self.source.clone(),
                    index,
                }
                .into());
            };

            let tag = map.get(DOC_TYPE_KEY).and_then(Value::as_str);
            match tag.and_then(DocType::from_tag) {
                Some(DocType::GlobalConfig) => self.load_global_params(index, map)?,
                Some(DocType::RuleConfig) => self.load_rule_params(index, map)?,
                None => {
                    let found = map.get(DOC_TYPE_KEY).map(describe_tag);
                    return Err(ConfigLoadError::UnknownDocType {
                        source_name: self.source.clone(),
                        index,
                        found,
                        document: Box::new(Value::Object(map)),
                    }
                    .into());
                }
            }
        }

        info!(
            "Configuration loaded: {} rule(s), global params {}",
            self.rule_params.len(),
            if self.global_params.is_some() { "present" } else { "absent" }
        );
        Ok(self)
    }

    fn load_global_params(&mut self, index: usize, mut doc: Map<String, Value>) -> Result<()> {
        if let Some(first) = self.global_index {
            return Err(ConfigLoadError::DuplicateGlobal {
                source_name: self.source.clone(),
                first,
                second: index,
            }
            .into());
        }

        let missing = missing_keys(&doc, &GLOBAL_REQUIRED_KEYS);
        if !missing.is_empty() {
            return Err(ConfigLoadError::MissingKeys {
                section: "GLOBAL_CONFIG",
                source_name: self.source.clone(),
                missing,
                document: Box::new(Value::Object(doc)),
            }
            .into());
        }

        let analysis_name = scalar_string(doc.shift_remove("analysis_name"));
        let working_directory = scalar_string(doc.shift_remove("working_directory"));
        let files = self.section(index, "files", doc.shift_remove("files"))?;

        doc.shift_remove(DOC_TYPE_KEY);
        let misc = if doc.is_empty() {
            None
        } else {
            Some(AttrDict::from(doc))
        };

        debug!(
            "Global params for '{}' (working directory {})",
            analysis_name, working_directory
        );
        self.global_params = Some(GlobalParams {
            analysis_name,
            working_directory,
            files,
            misc,
        });
        self.global_index = Some(index);
        Ok(())
    }

    fn load_rule_params(&mut self, index: usize, mut doc: Map<String, Value>) -> Result<()> {
        let missing = missing_keys(&doc, &RULE_REQUIRED_KEYS);
        if !missing.is_empty() {
            return Err(ConfigLoadError::MissingKeys {
                section: "RULE_CONFIG",
                source_name: self.source.clone(),
                missing,
                document: Box::new(Value::Object(doc)),
            }
            .into());
        }

        let rule_name = match doc.shift_remove("rule_name") {
            Some(Value::String(name)) => name,
            _ => {
                return Err(ConfigLoadError::RuleNameNotString {
                    source_name: self.source.clone(),
                    index,
                }
                .into())
            }
        };
        let parameters = self.section(index, "parameters", doc.shift_remove("parameters"))?;
        let resources = self.section(index, "resources", doc.shift_remove("resources"))?;

        debug!("Rule params for '{}'", rule_name);
        self.rule_names.push(rule_name.clone());
        self.rule_params.push(RuleParams {
            rule_name,
            parameters,
            resources,
        });
        Ok(())
    }

    fn section(&self, index: usize, key: &str, value: Option<Value>) -> Result<AttrDict> {
        AttrDict::from_value(value.unwrap_or(Value::Null)).ok_or_else(|| {
            ConfigLoadError::SectionNotMapping {
                source_name: self.source.clone(),
                index,
                key: key.to_string(),
            }
            .into()
        })
    }

    /// Returns the parameters of `rule_name`.
    ///
    /// When several rules share a name, the first one loaded wins.
    pub fn get_rule_params(&self, rule_name: &str) -> std::result::Result<&RuleParams, RuleLookupError> {
        self.rule_names
            .iter()
            .position(|name| name == rule_name)
            .map(|idx| &self.rule_params[idx])
            .ok_or_else(|| RuleLookupError {
                rule_name: rule_name.to_string(),
                known: self.rule_names.clone(),
            })
    }

    pub fn global_params(&self) -> Option<&GlobalParams> {
        self.global_params.as_ref()
    }

    pub fn rule_params(&self) -> &[RuleParams] {
        &self.rule_params
    }

    pub fn rule_names(&self) -> &[String] {
        &self.rule_names
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn schema(&self) -> SchemaType {
        self.schema
    }
}

fn missing_keys(doc: &Map<String, Value>, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|key| !doc.contains_key(**key))
        .map(|key| key.to_string())
        .collect()
}

/// Strings are taken as-is, null becomes empty, anything else is rendered
/// as JSON text.
fn scalar_string(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn describe_tag(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
