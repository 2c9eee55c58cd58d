use super::*;

#[test]
fn defaults_validate() {
    let cfg = HarnessConfig::default();
    cfg.validate().unwrap();
    assert_eq!(cfg.max_files, 128);
    assert_eq!(cfg.max_partitions, 100);
    assert_eq!(cfg.topk_policy, TopKPolicy::Exact);
}

#[test]
fn validate_rejects_zero_threads_and_dotted_extension() {
    let mut cfg = HarnessConfig {
        threads: Some(0),
        ..HarnessConfig::default()
    };
    assert!(cfg.validate().is_err());

    cfg.threads = Some(2);
    cfg.scene_extension = ".svg".to_string();
    assert!(cfg.validate().is_err());

    cfg.scene_extension = "svg".to_string();
    cfg.max_files = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn paths_follow_layout() {
    let cfg = HarnessConfig {
        corpus_root: PathBuf::from("corpus"),
        partition_prefix: "p".to_string(),
        output_root: PathBuf::from("out"),
        ..HarnessConfig::default()
    };
    let id = PartitionId::new(7).unwrap();
    assert_eq!(cfg.partition_dir(id), Path::new("corpus").join("p7"));
    assert_eq!(
        cfg.checkpoint_path(id),
        Path::new("out").join("status").join("stats7.txt")
    );
    assert_eq!(cfg.baseline_dir(), Path::new("out").join("baseline"));
    assert_eq!(cfg.candidate_dir(), Path::new("out").join("candidate"));
}

#[test]
fn partial_json_keeps_defaults() {
    let cfg: HarnessConfig = serde_json::from_str(
        r#"{
            "max_files": 4,
            "topk_policy": "replace_first_smaller",
            "denylist": [{ "partition": 1, "scene": "bad.svg" }]
        }"#,
    )
    .unwrap();
    assert_eq!(cfg.max_files, 4);
    assert_eq!(cfg.topk_policy, TopKPolicy::ReplaceFirstSmaller);
    assert_eq!(cfg.denylist.len(), 1);
    assert_eq!(cfg.partition_prefix, "slave");

    assert!(serde_json::from_str::<HarnessConfig>(r#"{ "bogus": 1 }"#).is_err());
}

#[test]
fn prepare_output_dirs_is_repeatable() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = HarnessConfig {
        output_root: tmp.path().join("out"),
        ..HarnessConfig::default()
    };
    cfg.prepare_output_dirs().unwrap();
    cfg.prepare_output_dirs().unwrap();
    assert!(cfg.baseline_dir().is_dir());
    assert!(cfg.candidate_dir().is_dir());
    assert!(tmp.path().join("out").join("status").is_dir());
}
