//! Configuration Data Model
//!
//! Typed records for the two kinds of configuration document.
//!
//! # Example YAML Format
//!
//! ```yaml
//! DOC_TYPE: GLOBAL_CONFIG
//! analysis_name: rnaseq_batch_1
//! working_directory: /scratch/rnaseq
//! files:
//!   genome: refs/hg38.fa
//!   annotation: refs/gencode.gtf
//! conda_env: envs/rnaseq.yaml
//! ---
//! DOC_TYPE: RULE_CONFIG
//! rule_name: align_reads
//! parameters:
//!   threads: 8
//! resources:
//!   walltime: "04:00:00"
//!   nodes: 1
//!   processors_per_node: 8
//!   total_memory: 32000
//!   log_dir: logs/
//!   job_id: ALIGN
//! ```

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::attrdict::{AttrDict, Node};
use crate::error::PathVerificationError;
use crate::fileops::{verify_path, PathKind};

/// Key holding the document type discriminator.
pub const DOC_TYPE_KEY: &str = "DOC_TYPE";

/// Keys every GLOBAL_CONFIG document must carry.
pub const GLOBAL_REQUIRED_KEYS: [&str; 3] = ["analysis_name", "working_directory", "files"];

/// Keys every RULE_CONFIG document must carry.
pub const RULE_REQUIRED_KEYS: [&str; 3] = ["rule_name", "resources", "parameters"];

/// Kind of document in a configuration stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocType {
    GlobalConfig,
    RuleConfig,
}

impl DocType {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "GLOBAL_CONFIG" => Some(DocType::GlobalConfig),
            "RULE_CONFIG" => Some(DocType::RuleConfig),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            DocType::GlobalConfig => "GLOBAL_CONFIG",
            DocType::RuleConfig => "RULE_CONFIG",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Workflow-wide parameters from the GLOBAL_CONFIG document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalParams {
    /// Name of this workflow instance.
    pub analysis_name: String,

    /// Directory the workflow should run from.
    pub working_directory: String,

    /// Named workflow files, arbitrarily nested.
    pub files: AttrDict,

    /// Every other top-level key, or `None` when there are none.
    pub misc: Option<AttrDict>,
}

impl GlobalParams {
    /// Looks up a file entry by key path (e.g. `&["refs", "genome"]`).
    pub fn file<S: AsRef<str>>(&self, path: &[S]) -> Option<&Node> {
        self.files.lookup(path)
    }

    /// Looks up a file entry and runs it through path verification.
    ///
    /// Returns `Ok(None)` when the entry is missing or not a string.
    pub fn verified_file<S: AsRef<str>>(
        &self,
        path: &[S],
        kind: PathKind,
        require_exists: bool,
    ) -> Result<Option<PathBuf>, PathVerificationError> {
        match self.file(path).and_then(Node::as_str) {
            Some(candidate) => verify_path(candidate, kind, require_exists).map(Some),
            None => Ok(None),
        }
    }

    /// Resolves the working directory to an absolute path.
    pub fn verified_working_directory(
        &self,
        require_exists: bool,
    ) -> Result<PathBuf, PathVerificationError> {
        verify_path(&self.working_directory, PathKind::Directory, require_exists)
    }

    /// Looks up an extra top-level key.
    pub fn misc_value(&self, key: &str) -> Option<&Node> {
        self.misc.as_ref().and_then(|misc| misc.get(key))
    }
}

/// Parameters and resources for one rule, from a RULE_CONFIG document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleParams {
    pub rule_name: String,

    /// Values passed through to the rule's `params:` section.
    pub parameters: AttrDict,

    /// Scheduler resources: `walltime`, `nodes`, `processors_per_node`,
    /// `total_memory`, `log_dir`, `job_id`.
    pub resources: AttrDict,
}

impl RuleParams {
    pub fn parameter(&self, key: &str) -> Option<&Node> {
        self.parameters.get(key)
    }

    pub fn resource(&self, key: &str) -> Option<&Node> {
        self.resources.get(key)
    }

    /// Parses the `walltime` resource, if present and well formed.
    pub fn walltime(&self) -> Option<Duration> {
        self.resource("walltime")
            .and_then(Node::as_str)
            .and_then(parse_walltime)
    }

    pub fn nodes(&self) -> Option<u64> {
        self.resource("nodes").and_then(Node::as_u64)
    }

    pub fn processors_per_node(&self) -> Option<u64> {
        self.resource("processors_per_node").and_then(Node::as_u64)
    }
}

/// Parses a scheduler walltime of the form `[[DD:]HH:]MM:SS`.
///
/// Returns `None` for anything else, including empty fields, seconds or
/// minutes of 60 and above when a larger unit is present, and totals that
/// overflow a `u64` of seconds.
pub fn parse_walltime(text: &str) -> Option<Duration> {
    let fields: Vec<u64> = text
        .trim()
        .split(':')
        .map(|f| f.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;

    let (days, hours, minutes, seconds) = match fields.as_slice() {
        [m, s] => (0, 0, *m, *s),
        [h, m, s] => (0, *h, *m, *s),
        [d, h, m, s] => (*d, *h, *m, *s),
        _ => return None,
    };

    if seconds >= 60 || (fields.len() > 2 && minutes >= 60) || (fields.len() > 3 && hours >= 24) {
        return None;
    }

    let total = days
        .checked_mul(24)?
        .checked_add(hours)?
        .checked_mul(60)?
        .checked_add(minutes)?
        .checked_mul(60)?
        .checked_add(seconds)?;
    Some(Duration::from_secs(total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn rule() -> RuleParams {
        RuleParams {
            rule_name: "align".to_string(),
            parameters: AttrDict::from_value(json!({"threads": 8})).unwrap(),
            resources: AttrDict::from_value(json!({
                "walltime": "04:30:00",
                "nodes": 1,
                "processors_per_node": 8
            }))
            .unwrap(),
        }
    }

    #[test]
    fn test_doc_type_tags() {
        assert_eq!(DocType::from_tag("GLOBAL_CONFIG"), Some(DocType::GlobalConfig));
        assert_eq!(DocType::from_tag("RULE_CONFIG"), Some(DocType::RuleConfig));
        assert_eq!(DocType::from_tag("rule_config"), None);
        assert_eq!(DocType::RuleConfig.to_string(), "RULE_CONFIG");
    }

    #[test]
    fn test_parse_walltime_forms() {
        assert_eq!(parse_walltime("30:00"), Some(Duration::from_secs(1800)));
        assert_eq!(parse_walltime("02:00:00"), Some(Duration::from_secs(7200)));
        assert_eq!(parse_walltime("1:00:00:01"), Some(Duration::from_secs(86401)));
        assert_eq!(parse_walltime("120:00:00"), Some(Duration::from_secs(432000)));
    }

    #[test]
    fn test_parse_walltime_rejects_malformed() {
        assert_eq!(parse_walltime(""), None);
        assert_eq!(parse_walltime("2h"), None);
        assert_eq!(parse_walltime("01:61:00"), None);
        assert_eq!(parse_walltime("00:00:60"), None);
        assert_eq!(parse_walltime("1:2:3:4:5"), None);
        assert_eq!(parse_walltime("1::00"), None);
    }

    #[test]
    fn test_parse_walltime_rejects_overflow() {
        assert_eq!(parse_walltime("999999999999999999:00:00:00"), None);
        assert_eq!(parse_walltime("18446744073709551615:00"), None);
        assert_eq!(parse_walltime("0:18446744073709551615"), None);
    }

    #[test]
    fn test_rule_resource_accessors() {
        let rule = rule();
        assert_eq!(rule.walltime(), Some(Duration::from_secs(4 * 3600 + 1800)));
        assert_eq!(rule.nodes(), Some(1));
        assert_eq!(rule.processors_per_node(), Some(8));
        assert_eq!(rule.parameter("threads"), Some(&Node::from(8i64)));
        assert!(rule.resource("job_id").is_none());
    }

    #[test]
    fn test_global_file_lookup_and_verification() {
        let dir = tempdir().unwrap();
        let genome = dir.path().join("hg38.fa");
        std::fs::write(&genome, ">chr1\nACGT\n").unwrap();

        let globals = GlobalParams {
            analysis_name: "demo".to_string(),
            working_directory: dir.path().to_str().unwrap().to_string(),
            files: AttrDict::from_value(json!({
                "refs": {"genome": genome.to_str().unwrap(), "missing": "nope.fa"}
            }))
            .unwrap(),
            misc: None,
        };

        assert!(globals.file(&["refs", "genome"]).is_some());
        let verified = globals
            .verified_file(&["refs", "genome"], PathKind::File, true)
            .unwrap();
        assert!(verified.unwrap().ends_with("hg38.fa"));
        assert!(globals
            .verified_file(&["refs", "missing"], PathKind::File, true)
            .is_err());
        assert_eq!(
            globals.verified_file(&["refs", "absent"], PathKind::File, true).unwrap(),
            None
        );
        assert!(globals.verified_working_directory(true).is_ok());
        assert!(globals.misc_value("anything").is_none());
    }
}
