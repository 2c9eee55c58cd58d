use std::path::PathBuf;

/// Result alias used across the harness.
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Error type returned by every fallible harness operation.
#[derive(thiserror::Error, Debug)]
pub enum HarnessError {
    /// Invalid configuration or input value.
    #[error("validation error: {0}")]
    Validation(String),

    /// A scene could not be read or parsed.
    #[error("decode error: {0}")]
    Decode(String),

    /// No viable surface size could be allocated.
    #[error("allocation error: {0}")]
    Allocation(String),

    /// A checkpoint log line did not match the log grammar.
    #[error("checkpoint error: {}:{line}: {msg}", path.display())]
    Checkpoint {
        /// Log file being parsed.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// What was wrong with the line.
        msg: String,
    },

    /// An output image could not be written.
    #[error("encode error: {0}")]
    Encode(String),

    /// Anything else, usually I/O with context attached.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HarnessError {
    /// Build a [`HarnessError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`HarnessError::Decode`].
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`HarnessError::Allocation`].
    pub fn allocation(msg: impl Into<String>) -> Self {
        Self::Allocation(msg.into())
    }

    /// Build a [`HarnessError::Checkpoint`].
    pub fn checkpoint(path: impl Into<PathBuf>, line: usize, msg: impl Into<String>) -> Self {
        Self::Checkpoint {
            path: path.into(),
            line,
            msg: msg.into(),
        }
    }

    /// Build a [`HarnessError::Encode`].
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Whether the failure only concerns the scene being evaluated.
    ///
    /// Scene-local failures are logged and the scene is left out of the results; everything
    /// else aborts the partition.
    pub fn is_scene_local(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::Allocation(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
