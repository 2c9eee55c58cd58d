use super::*;

fn name(s: &str) -> SceneName {
    SceneName::new(s).unwrap()
}

fn pid(n: u32) -> PartitionId {
    PartitionId::new(n).unwrap()
}

fn result(scene: &str, err: u64, time: i64) -> EvaluationResult {
    EvaluationResult {
        partition: pid(3),
        scene: name(scene),
        dissimilarity: err,
        timing_delta: time,
        render_scale: 2,
    }
}

#[test]
fn parse_accepts_well_formed_log() {
    let text = "a.svg 0 0\nb.svg 1200 -42\nc.svg 7 31\n";
    let entries = parse_checkpoint(text, Path::new("stats1.txt")).unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[1].scene.as_str(), "b.svg");
    assert_eq!(entries[1].dissimilarity, 1200);
    assert_eq!(entries[1].timing_delta, -42);
    assert_eq!(entries[1].to_line(), "b.svg 1200 -42\n");
    assert!(parse_checkpoint("", Path::new("x")).unwrap().is_empty());
}

#[test]
fn parse_rejects_unterminated_last_line() {
    let err = parse_checkpoint("a.svg 1 2\nb.svg 3 4", Path::new("stats2.txt")).unwrap_err();
    match err {
        HarnessError::Checkpoint { line, path, .. } => {
            assert_eq!(line, 2);
            assert_eq!(path, PathBuf::from("stats2.txt"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn parse_rejects_malformed_fields() {
    for bad in [
        "a.svg\n",
        "a.svg 1\n",
        "a.svg x 2\n",
        "a.svg -1 2\n",
        "a.svg 1 +2\n",
        "a.svg 1 2 3\n",
        "a.svg  1 2\n",
        " 1 2\n",
        "a.svg 1 -\n",
    ] {
        let err = parse_checkpoint(bad, Path::new("s")).unwrap_err();
        assert!(
            matches!(err, HarnessError::Checkpoint { line: 1, .. }),
            "{bad:?} -> {err}"
        );
    }
}

#[test]
fn load_missing_file_is_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let entries = load_checkpoint(&tmp.path().join("stats9.txt")).unwrap();
    assert!(entries.is_empty());
}

#[test]
fn replay_stops_at_first_mismatch() {
    let entries = parse_checkpoint("a.svg 5 1\nb.svg 6 2\nc.svg 7 3\n", Path::new("s")).unwrap();
    let mut replay = CheckpointReplay::new(pid(1), entries);

    let a = replay.try_match(&name("a.svg")).unwrap();
    assert_eq!(a.dissimilarity, 5);
    assert_eq!(a.render_scale, 1);
    assert_eq!(replay.remaining(), 2);

    // "b.svg" was removed from the corpus.
    assert!(replay.try_match(&name("c.svg")).is_none());
    assert!(replay.diverged());
    assert!(replay.try_match(&name("b.svg")).is_none());
    assert_eq!(replay.remaining(), 0);
}

#[test]
fn replay_misses_unrecorded_scene_without_diverging() {
    let entries = parse_checkpoint("a.svg 5 1\nc.svg 7 3\n", Path::new("s")).unwrap();
    let mut replay = CheckpointReplay::new(pid(1), entries);
    assert!(replay.try_match(&name("a.svg")).is_some());
    // "b.svg" failed last run and has no entry.
    assert!(replay.try_match(&name("b.svg")).is_none());
    assert!(!replay.diverged());
    assert_eq!(replay.try_match(&name("c.svg")).unwrap().dissimilarity, 7);
}

#[test]
fn replay_runs_out_without_diverging() {
    let entries = parse_checkpoint("a.svg 5 1\n", Path::new("s")).unwrap();
    let mut replay = CheckpointReplay::new(pid(1), entries);
    assert!(replay.try_match(&name("a.svg")).is_some());
    assert!(replay.try_match(&name("b.svg")).is_none());
    assert!(!replay.diverged());
}

#[test]
fn store_truncates_on_first_append_and_round_trips() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("stats3.txt");
    std::fs::write(&path, "a.svg 1 1\nold.svg 9 9\n").unwrap();

    let mut store = CheckpointStore::open(pid(3), &path).unwrap();
    let replayed = store.try_match(&name("a.svg")).unwrap();
    // Nothing written yet: the previous log is untouched.
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "a.svg 1 1\nold.svg 9 9\n"
    );

    store.append(&replayed).unwrap();
    store.append(&result("b.svg", 1200, -42)).unwrap();
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "a.svg 1 1\nb.svg 1200 -42\n"
    );

    let back = load_checkpoint(&path).unwrap();
    assert_eq!(back[1], CheckpointEntry::from(&result("b.svg", 1200, -42)));
}

#[test]
fn store_open_surfaces_corrupt_log() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("stats4.txt");
    std::fs::write(&path, "a.svg 1 1\nbroken\n").unwrap();
    let err = CheckpointStore::open(pid(4), &path).unwrap_err();
    assert!(matches!(err, HarnessError::Checkpoint { line: 2, .. }));
}
