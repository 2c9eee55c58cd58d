//! Per-partition checkpoint log.
//!
//! Each evaluated scene is recorded as one line, `<scene> <dissimilarity> <timing_delta>\n`. A
//! later run over the same partition replays those lines positionally instead of re-evaluating,
//! and rewrites them into a fresh log so the log keeps covering every processed scene.

use std::{
    fs::File,
    io::{BufWriter, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::foundation::{
    core::{EvaluationResult, PartitionId, SceneName},
    error::{HarnessError, HarnessResult},
};

/// One recorded evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckpointEntry {
    /// Scene file name.
    pub scene: SceneName,
    /// Recorded dissimilarity.
    pub dissimilarity: u64,
    /// Recorded timing delta, in microseconds.
    pub timing_delta: i64,
}

impl CheckpointEntry {
    /// Serialized form, including the trailing LF.
    pub fn to_line(&self) -> String {
        format!(
            "{} {} {}\n",
            self.scene, self.dissimilarity, self.timing_delta
        )
    }

    /// Attach the entry to `partition`. The log does not record the downscale, so replayed
    /// results report 1.
    pub fn into_result(self, partition: PartitionId) -> EvaluationResult {
        EvaluationResult {
            partition,
            scene: self.scene,
            dissimilarity: self.dissimilarity,
            timing_delta: self.timing_delta,
            render_scale: 1,
        }
    }
}

impl From<&EvaluationResult> for CheckpointEntry {
    fn from(r: &EvaluationResult) -> Self {
        Self {
            scene: r.scene.clone(),
            dissimilarity: r.dissimilarity,
            timing_delta: r.timing_delta,
        }
    }
}

/// Parse a whole log. `path` is only used in error messages.
///
/// Grammar per line: `name SP digits SP ['-'] digits LF`. Any deviation, including a last line
/// without its LF, is an error.
pub fn parse_checkpoint(text: &str, path: &Path) -> HarnessResult<Vec<CheckpointEntry>> {
    let mut entries = Vec::new();
    let mut rest = text;
    let mut line_no = 0usize;
    while !rest.is_empty() {
        line_no += 1;
        let Some(end) = rest.find('\n') else {
            return Err(HarnessError::checkpoint(path, line_no, "line is not LF-terminated"));
        };
        entries.push(parse_line(&rest[..end], path, line_no)?);
        rest = &rest[end + 1..];
    }
    Ok(entries)
}

fn parse_line(line: &str, path: &Path, line_no: usize) -> HarnessResult<CheckpointEntry> {
    let bad = |msg: &str| HarnessError::checkpoint(path, line_no, msg);

    let (name, rest) = line.split_once(' ').ok_or_else(|| bad("missing scene name"))?;
    let scene = SceneName::new(name).map_err(|e| bad(&e.to_string()))?;
    let (err_field, time_field) = rest
        .split_once(' ')
        .ok_or_else(|| bad("missing timing field"))?;

    if !is_digits(err_field) {
        return Err(bad(&format!("dissimilarity is not a number: '{err_field}'")));
    }
    let dissimilarity = err_field
        .parse::<u64>()
        .map_err(|e| bad(&format!("dissimilarity: {e}")))?;

    let (negative, magnitude) = match time_field.strip_prefix('-') {
        Some(m) => (true, m),
        None => (false, time_field),
    };
    if !is_digits(magnitude) {
        return Err(bad(&format!("timing is not a number: '{time_field}'")));
    }
    let magnitude = magnitude
        .parse::<i64>()
        .map_err(|e| bad(&format!("timing: {e}")))?;

    Ok(CheckpointEntry {
        scene,
        dissimilarity,
        timing_delta: if negative { -magnitude } else { magnitude },
    })
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Read the log at `path`. A missing file is an empty log.
pub fn load_checkpoint(path: &Path) -> HarnessResult<Vec<CheckpointEntry>> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("read checkpoint '{}'", path.display()))
                .into());
        }
    };
    parse_checkpoint(&text, path)
}

/// Positional replay over previously recorded entries.
#[derive(Debug)]
pub struct CheckpointReplay {
    partition: PartitionId,
    entries: Vec<CheckpointEntry>,
    cursor: usize,
    diverged: bool,
}

impl CheckpointReplay {
    /// Replay over `entries`, in order.
    pub fn new(partition: PartitionId, entries: Vec<CheckpointEntry>) -> Self {
        Self {
            partition,
            entries,
            cursor: 0,
            diverged: false,
        }
    }

    /// Return the next recorded result if it belongs to `scene`.
    ///
    /// The cursor only moves forward. Scenes are requested in name order, so a name sorting
    /// before the next entry was never recorded (it failed or is new) and simply misses. Any
    /// other mismatch stops replay for good: the corpus no longer lines up with the log, so every
    /// later scene is evaluated fresh.
    pub fn try_match(&mut self, scene: &SceneName) -> Option<EvaluationResult> {
        if self.diverged {
            return None;
        }
        let next = self.entries.get(self.cursor)?;
        if *scene < next.scene {
            return None;
        }
        if next.scene != *scene {
            tracing::warn!(
                partition = %self.partition,
                expected = %next.scene,
                found = %scene,
                "checkpoint out of step with corpus, replay disabled for the rest of the partition"
            );
            self.diverged = true;
            return None;
        }
        self.cursor += 1;
        Some(next.clone().into_result(self.partition))
    }

    /// Entries not yet replayed.
    pub fn remaining(&self) -> usize {
        if self.diverged {
            0
        } else {
            self.entries.len() - self.cursor
        }
    }

    /// Whether replay stopped on a mismatch.
    pub fn diverged(&self) -> bool {
        self.diverged
    }
}

/// Append-only writer. The file is truncated when the first line of the run is written.
#[derive(Debug)]
pub struct CheckpointWriter {
    path: PathBuf,
    out: Option<BufWriter<File>>,
}

impl CheckpointWriter {
    /// Writer for the log at `path`; nothing is touched until the first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            out: None,
        }
    }

    /// Write one entry and flush it.
    pub fn append(&mut self, entry: &CheckpointEntry) -> HarnessResult<()> {
        let out = match &mut self.out {
            Some(out) => out,
            slot => {
                let f = File::create(&self.path).with_context(|| {
                    format!("create checkpoint '{}'", self.path.display())
                })?;
                slot.insert(BufWriter::new(f))
            }
        };
        out.write_all(entry.to_line().as_bytes())
            .and_then(|()| out.flush())
            .with_context(|| format!("append checkpoint '{}'", self.path.display()))?;
        Ok(())
    }
}

/// Checkpoint state of one partition: the replay cursor plus the writer for this run.
#[derive(Debug)]
pub struct CheckpointStore {
    replay: CheckpointReplay,
    writer: CheckpointWriter,
}

impl CheckpointStore {
    /// Load the previous log of `partition` from `path` and prepare to rewrite it.
    pub fn open(partition: PartitionId, path: &Path) -> HarnessResult<Self> {
        let entries = load_checkpoint(path)?;
        Ok(Self {
            replay: CheckpointReplay::new(partition, entries),
            writer: CheckpointWriter::new(path),
        })
    }

    /// See [`CheckpointReplay::try_match`].
    pub fn try_match(&mut self, scene: &SceneName) -> Option<EvaluationResult> {
        self.replay.try_match(scene)
    }

    /// Record `result` in this run's log.
    pub fn append(&mut self, result: &EvaluationResult) -> HarnessResult<()> {
        self.writer.append(&CheckpointEntry::from(result))
    }

    /// Replay cursor state.
    pub fn replay(&self) -> &CheckpointReplay {
        &self.replay
    }
}

#[cfg(test)]
#[path = "../../tests/unit/checkpoint/store.rs"]
mod tests;
