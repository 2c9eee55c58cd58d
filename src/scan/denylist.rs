use std::collections::HashSet;

use crate::foundation::core::{PartitionId, SceneName};

/// Scenes known to crash or hang the renderer, as `(partition, file name)`.
const KNOWN_BROKEN: &[(u32, &str)] = &[
    (1, "http___elpais_com_.svg"),
    (1, "http___namecheap_com_.svg"),
    (1, "http___www_alrakoba_net_.svg"),
    (1, "http___www_briian_com_.svg"),
    (1, "http___www_cityads_ru_.svg"),
    (3, "http___www_abeautifulmess_com_.svg"),
    (1, "http___www_dealnews_com_.svg"),
    (1, "http___www_inmotionhosting_com.svg"),
];

/// A `(partition, scene)` pair excluded from scanning.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct DenyEntry {
    /// Partition holding the scene.
    pub partition: PartitionId,
    /// Scene file name.
    pub scene: String,
}

/// Set of scenes the workers skip without evaluating.
#[derive(Clone, Debug, Default)]
pub struct Denylist {
    entries: HashSet<(u32, String)>,
}

impl Denylist {
    /// Built-in entries only.
    pub fn builtin() -> Self {
        Self {
            entries: KNOWN_BROKEN
                .iter()
                .map(|&(p, s)| (p, s.to_string()))
                .collect(),
        }
    }

    /// Built-in entries plus `extra`.
    pub fn with_extra<'a>(extra: impl IntoIterator<Item = &'a DenyEntry>) -> Self {
        let mut out = Self::builtin();
        out.entries
            .extend(extra.into_iter().map(|e| (e.partition.get(), e.scene.clone())));
        out
    }

    /// Whether `scene` in `partition` must be skipped.
    pub fn contains(&self, partition: PartitionId, scene: &SceneName) -> bool {
        self.entries
            .contains(&(partition.get(), scene.as_str().to_string()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
