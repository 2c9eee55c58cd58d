use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        HarnessError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(HarnessError::decode("x").to_string().contains("decode error:"));
    assert!(
        HarnessError::allocation("x")
            .to_string()
            .contains("allocation error:")
    );
    assert!(HarnessError::encode("x").to_string().contains("encode error:"));
}

#[test]
fn checkpoint_error_names_file_and_line() {
    let err = HarnessError::checkpoint("status/stats3.txt", 7, "missing timing field");
    let msg = err.to_string();
    assert!(msg.contains("stats3.txt:7"), "{msg}");
    assert!(msg.contains("missing timing field"), "{msg}");
}

#[test]
fn only_decode_and_allocation_are_scene_local() {
    assert!(HarnessError::decode("x").is_scene_local());
    assert!(HarnessError::allocation("x").is_scene_local());
    assert!(!HarnessError::validation("x").is_scene_local());
    assert!(!HarnessError::checkpoint("a", 1, "b").is_scene_local());
    assert!(!HarnessError::encode("x").is_scene_local());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = HarnessError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
