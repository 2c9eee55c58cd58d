use std::fmt;

use crate::foundation::error::{HarnessError, HarnessResult};

/// Longest scene name, in bytes, that the harness accepts.
pub const MAX_SCENE_NAME_BYTES: usize = 127;

/// One-based index of a corpus partition.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "u32", into = "u32")]
pub struct PartitionId(u32);

impl PartitionId {
    /// Build a partition id; zero is rejected.
    pub fn new(id: u32) -> HarnessResult<Self> {
        if id == 0 {
            return Err(HarnessError::validation("partition id must be >= 1"));
        }
        Ok(Self(id))
    }

    /// Raw index.
    pub fn get(self) -> u32 {
        self.0
    }

    /// Every partition id in `1..=max`.
    pub fn range(max: u32) -> impl Iterator<Item = PartitionId> {
        (1..=max).map(PartitionId)
    }
}

impl TryFrom<u32> for PartitionId {
    type Error = HarnessError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PartitionId> for u32 {
    fn from(value: PartitionId) -> Self {
        value.0
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// File name of a scene inside its partition directory.
///
/// Names are non-empty, at most [`MAX_SCENE_NAME_BYTES`] long and free of whitespace, since the
/// checkpoint log ends a name at the first space and a record at LF.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SceneName(String);

impl SceneName {
    /// Validate and wrap a scene name.
    pub fn new(name: impl Into<String>) -> HarnessResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(HarnessError::validation("scene name must be non-empty"));
        }
        if name.len() > MAX_SCENE_NAME_BYTES {
            return Err(HarnessError::validation(format!(
                "scene name is {} bytes (max {MAX_SCENE_NAME_BYTES}): '{name}'",
                name.len()
            )));
        }
        if name.chars().any(|c| c.is_ascii_whitespace()) {
            return Err(HarnessError::validation(format!(
                "scene name must not contain whitespace: '{name}'"
            )));
        }
        Ok(Self(name))
    }

    /// Borrow the name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name with its extension replaced by `ext` (or `ext` appended when there is none).
    pub fn with_extension(&self, ext: &str) -> String {
        let stem = match self.0.rfind('.') {
            Some(dot) if dot > 0 => &self.0[..dot],
            _ => self.0.as_str(),
        };
        format!("{stem}.{ext}")
    }
}

impl TryFrom<String> for SceneName {
    type Error = HarnessError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SceneName> for String {
    fn from(value: SceneName) -> Self {
        value.0
    }
}

impl fmt::Display for SceneName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of evaluating (or replaying) one scene.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EvaluationResult {
    /// Partition the scene belongs to.
    pub partition: PartitionId,
    /// Scene file name.
    pub scene: SceneName,
    /// Metric engine score between the two renderings.
    pub dissimilarity: u64,
    /// Baseline time minus candidate time, in microseconds.
    pub timing_delta: i64,
    /// Power-of-two downscale used for the renderings.
    pub render_scale: u32,
}

impl EvaluationResult {
    /// One-line progress description used in logs.
    pub fn progress(&self) -> String {
        let mut out = format!("dir={} {}", self.partition, self.scene);
        if self.dissimilarity != 0 {
            out.push_str(&format!(" err={}", self.dissimilarity));
        }
        if self.timing_delta != 0 {
            out.push_str(&format!(" time={}", self.timing_delta));
        }
        if self.render_scale != 1 {
            out.push_str(&format!(" scale={}", self.render_scale));
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
