//! End-to-end: one YAML file carrying a configuration stream, a second
//! carrying metadata, both loaded through the strict schemas.

use std::fs;

use gardnersnake::fileops::{read_documents, read_extended_config};
use gardnersnake::{ConfigHelper, Configuration, DataManager, Error, PathKind, SchemaType};
use serde_json::json;
use tempfile::tempdir;

const CONFIG: &str = r#"
DOC_TYPE: GLOBAL_CONFIG
analysis_name: rnaseq_batch_1
working_directory: WORKDIR
files:
  refs:
    genome: WORKDIR/hg38.fa
conda_env: envs/rnaseq.yaml
---
DOC_TYPE: RULE_CONFIG
rule_name: align_reads
parameters:
  threads: 8
resources:
  walltime: "04:00:00"
  nodes: 1
  processors_per_node: 8
  total_memory: 32000
  log_dir: logs/
  job_id: ALIGN
"#;

const METADATA: &str = r#"
shared_data:
  - library_name: L1
    runs:
      - run_id: R1
        fastq1: L1_R1_1.fq.gz
        fastq2: ~
  - library_name: L2
    runs:
      - run_id: R2
        fastq1: L2_R2_1.fq.gz
      - run_id: R3
        fastq1: L2_R3_1.fq.gz
rule_data:
  - rule_name: align_reads
    index:
      prefix: refs/hg38
"#;

#[test]
fn test_config_and_metadata_pipeline() {
    let dir = tempdir().unwrap();
    let workdir = dir.path().to_str().unwrap();
    fs::write(dir.path().join("hg38.fa"), ">chr1\nACGT\n").unwrap();

    let config_path = dir.path().join("config.yaml");
    fs::write(&config_path, CONFIG.replace("WORKDIR", workdir)).unwrap();
    let metadata_path = dir.path().join("metadata.yaml");
    fs::write(&metadata_path, METADATA).unwrap();

    let config = Configuration::new(config_path.to_str().unwrap())
        .with_schema(SchemaType::CfgGardnerBasic)
        .load()
        .unwrap();

    let globals = config.global_params().unwrap();
    assert_eq!(globals.analysis_name, "rnaseq_batch_1");
    assert_eq!(globals.misc_value("conda_env").unwrap(), &"envs/rnaseq.yaml");
    assert!(globals
        .verified_file(&["refs", "genome"], PathKind::File, true)
        .unwrap()
        .is_some());

    let align = config.get_rule_params("align_reads").unwrap();
    assert_eq!(align.parameters["threads"], 8);
    assert_eq!(align.nodes(), Some(1));
    assert!(config.get_rule_params("sort_bam").is_err());

    let metadata = read_documents(&metadata_path).unwrap().remove(0);
    let data = DataManager::new(metadata, Some("META_GARDNER_SEQ_BASIC")).unwrap();

    assert_eq!(
        data.get_shared_data([("library_name", "L1")], "fastq1")
            .unwrap()
            .into_value(),
        json!("L1_R1_1.fq.gz")
    );
    assert!(data
        .get_shared_data([("library_name", "L1")], "fastq2")
        .unwrap()
        .is_empty());
    assert_eq!(
        data.get_shared_data([("library_name", "L2")], "fastq1")
            .unwrap()
            .into_value(),
        json!(["L2_R2_1.fq.gz", "L2_R3_1.fq.gz"])
    );
    assert_eq!(
        *data.get_rule_data("align_reads", &["index", "prefix"]).unwrap(),
        "refs/hg38"
    );
}

#[test]
fn test_extended_config_with_helper() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.yaml");
    fs::write(
        &path,
        r#"
analysis_id: chip_2022_05
workdir: /scratch/chip
rule_params:
  - rule_name: call_peaks
    parameters:
      qvalue: 0.01
    resources:
      walltime: "02:00:00"
      nodes: 1
      processors_per_node: 4
      total_memory: 8000
      log_dir: logs/
      job_id: PEAKS
---
shared_data:
  - library_name: L1
    runs:
      - run_id: R1
rule_data:
  - rule_name: call_peaks
"#,
    )
    .unwrap();

    let (config, metadata) = read_extended_config(path.to_str().unwrap()).unwrap();
    let helper = ConfigHelper::new(config, Some("CFG_GARDNER_HELPER")).unwrap();
    let resources = helper.get_rule_resources("call_peaks", "logs/peaks", "7").unwrap();
    assert_eq!(resources["processors_per_node"], 4);
    assert_eq!(resources["job_id"], "7");

    let data = DataManager::new(metadata, Some("META_GARDNER_SEQ_BASIC")).unwrap();
    assert_eq!(data.shared_data().len(), 1);
}

#[test]
fn test_invalid_stream_aborts_load() {
    let err = Configuration::new("inline")
        .with_schema(SchemaType::CfgGardnerBasic)
        .load_documents(vec![json!({
            "DOC_TYPE": "GLOBAL_CONFIG",
            "analysis_name": "demo",
            "files": {}
        })])
        .unwrap_err();
    assert!(matches!(err, Error::Schema(_)));
    err.report();
}
