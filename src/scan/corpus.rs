use std::path::Path;

use anyhow::Context as _;

use crate::foundation::{core::SceneName, error::HarnessResult};

/// Scene files with extension `ext` (case-insensitive) directly inside `dir`, sorted by name.
///
/// Names that are not valid [`SceneName`]s are logged and left out.
pub fn list_scenes(dir: &Path, ext: &str) -> HarnessResult<Vec<SceneName>> {
    let mut names = Vec::new();
    let rd = std::fs::read_dir(dir).with_context(|| format!("read_dir '{}'", dir.display()))?;
    for e in rd {
        let e = e.with_context(|| format!("read_dir entry in '{}'", dir.display()))?;
        let path = e.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        if !file_ext.eq_ignore_ascii_case(ext) {
            continue;
        }
        let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
            tracing::warn!(path = %path.display(), "skipping scene with non UTF-8 name");
            continue;
        };
        match SceneName::new(name) {
            Ok(n) => names.push(n),
            Err(err) => tracing::warn!(path = %path.display(), %err, "skipping scene"),
        }
    }
    names.sort();
    Ok(names)
}
