use crate::foundation::core::EvaluationResult;

/// How a full [`TopKList`] decides which entry an incoming result displaces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopKPolicy {
    /// Keep the `capacity` largest keys: once full, the first-stored minimum is replaced when the
    /// incoming key is strictly greater.
    #[default]
    Exact,
    /// Replace the first stored entry with a strictly smaller key, else append while not full.
    ///
    /// Cheaper to reason about in storage order but not a true top-K: a full list can keep a
    /// small key behind a larger one that got displaced first.
    ReplaceFirstSmaller,
}

/// Which field of an [`EvaluationResult`] a list ranks by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ranking {
    /// Largest dissimilarity first.
    Dissimilarity,
    /// Largest timing delta first.
    Timing,
}

impl Ranking {
    /// Ranking key of `r`.
    pub fn key(self, r: &EvaluationResult) -> i64 {
        match self {
            Self::Dissimilarity => i64::try_from(r.dissimilarity).unwrap_or(i64::MAX),
            Self::Timing => r.timing_delta,
        }
    }

    /// Short label used in logs.
    pub fn label(self) -> &'static str {
        match self {
            Self::Dissimilarity => "worst",
            Self::Timing => "slowest",
        }
    }
}

/// Bounded list of the highest-keyed results for one [`Ranking`].
#[derive(Clone, Debug)]
pub struct TopKList {
    ranking: Ranking,
    policy: TopKPolicy,
    capacity: usize,
    entries: Vec<EvaluationResult>,
}

impl TopKList {
    /// Empty list holding at most `capacity` results.
    pub fn new(ranking: Ranking, capacity: usize, policy: TopKPolicy) -> Self {
        Self {
            ranking,
            policy,
            capacity,
            entries: Vec::with_capacity(capacity.min(1024)),
        }
    }

    /// Offer `r`; returns whether the list changed.
    ///
    /// Results whose key is not positive are never kept.
    pub fn offer(&mut self, r: &EvaluationResult) -> bool {
        let key = self.ranking.key(r);
        if key <= 0 || self.capacity == 0 {
            return false;
        }
        match self.policy {
            TopKPolicy::Exact => self.offer_exact(r, key),
            TopKPolicy::ReplaceFirstSmaller => self.offer_first_smaller(r, key),
        }
    }

    fn offer_exact(&mut self, r: &EvaluationResult, key: i64) -> bool {
        if self.entries.len() < self.capacity {
            self.entries.push(r.clone());
            return true;
        }
        let ranking = self.ranking;
        // `min_by_key` keeps the last minimum; scan for the first one instead.
        let mut min_at = 0;
        for (i, e) in self.entries.iter().enumerate() {
            if ranking.key(e) < ranking.key(&self.entries[min_at]) {
                min_at = i;
            }
        }
        if key > ranking.key(&self.entries[min_at]) {
            self.entries[min_at] = r.clone();
            return true;
        }
        false
    }

    fn offer_first_smaller(&mut self, r: &EvaluationResult, key: i64) -> bool {
        let ranking = self.ranking;
        if let Some(slot) = self.entries.iter_mut().find(|e| ranking.key(e) < key) {
            *slot = r.clone();
            return true;
        }
        if self.entries.len() < self.capacity {
            self.entries.push(r.clone());
            return true;
        }
        false
    }

    /// Ranking of this list.
    pub fn ranking(&self) -> Ranking {
        self.ranking
    }

    /// Number of stored results.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored results in storage order.
    pub fn entries(&self) -> &[EvaluationResult] {
        &self.entries
    }

    /// Stored results, largest key first. Equal keys keep storage order.
    pub fn sorted_desc(&self) -> Vec<EvaluationResult> {
        let mut out = self.entries.clone();
        out.sort_by_key(|e| std::cmp::Reverse(self.ranking.key(e)));
        out
    }
}

/// The pair of ranked lists kept by a scan: worst dissimilarity and largest timing delta.
#[derive(Clone, Debug)]
pub struct TopKTracker {
    worst: TopKList,
    slowest: TopKList,
}

impl TopKTracker {
    /// Two empty lists of `capacity` each.
    pub fn new(capacity: usize, policy: TopKPolicy) -> Self {
        Self {
            worst: TopKList::new(Ranking::Dissimilarity, capacity, policy),
            slowest: TopKList::new(Ranking::Timing, capacity, policy),
        }
    }

    /// Offer `r` to both lists; returns whether either changed.
    pub fn offer(&mut self, r: &EvaluationResult) -> bool {
        let a = self.worst.offer(r);
        let b = self.slowest.offer(r);
        a || b
    }

    /// Fold another tracker in: its worst entries into the worst list, its slowest entries into
    /// the slowest list, each in storage order.
    pub fn merge_from(&mut self, other: &TopKTracker) {
        for r in other.worst.entries() {
            self.worst.offer(r);
        }
        for r in other.slowest.entries() {
            self.slowest.offer(r);
        }
    }

    /// Worst-dissimilarity list.
    pub fn worst(&self) -> &TopKList {
        &self.worst
    }

    /// Largest-timing-delta list.
    pub fn slowest(&self) -> &TopKList {
        &self.slowest
    }
}

#[cfg(test)]
#[path = "../../tests/unit/rank/topk.rs"]
mod tests;
