//! Error types for MAFE Core
//!
//! Provides error handling for:
//! - Intent resolution failures (abort the whole instruction)
//! - Language capability failures (contained to one file)
//! - Registry lookups, registration, and commits
//! - Configuration loading
//!
//! Per-file failures never surface as `Err`; they are folded into an
//! [`ErrorInfo`] stored on the file's outcome.

use crate::types::FileId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Intent resolution errors
///
/// Every variant fails closed: no agent runs for the instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionError {
    /// The instruction does not name any file and no target could be inferred
    #[error("no target file could be resolved from the instruction")]
    NoTargetResolved,

    /// Several files are equally likely targets
    #[error("instruction is ambiguous between {} files: {}", candidates.len(), join_ids(candidates))]
    AmbiguousTarget {
        /// Files the instruction could plausibly refer to
        candidates: Vec<FileId>,
    },

    /// Instruction text is blank
    #[error("instruction is empty")]
    EmptyInstruction,
}

fn join_ids(ids: &[FileId]) -> String {
    ids.iter().map(FileId::as_str).collect::<Vec<_>>().join(", ")
}

/// Errors returned by a language capability call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapabilityError {
    /// The capability declined to perform the transformation
    #[error("capability refused: {0}")]
    Refused(String),

    /// The capability could not be reached or is overloaded
    #[error("capability unavailable: {0}")]
    Unavailable(String),

    /// The capability did not answer in time
    #[error("capability timed out")]
    Timeout,

    /// The capability answered with something that cannot be interpreted
    #[error("malformed capability response: {0}")]
    Malformed(String),
}

impl CapabilityError {
    /// Check if error is retryable
    ///
    /// Only an unavailable capability is retried; refusals and malformed
    /// answers would only repeat.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Classification used in task outcomes
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Refused(_) => ErrorKind::CapabilityRefusal,
            Self::Unavailable(_) => ErrorKind::CapabilityUnavailable,
            Self::Timeout => ErrorKind::Timeout,
            Self::Malformed(_) => ErrorKind::MalformedResponse,
        }
    }
}

impl From<CapabilityError> for ErrorInfo {
    fn from(error: CapabilityError) -> Self {
        ErrorInfo::new(error.kind(), error.to_string())
    }
}

/// File registry errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No file with this id is registered
    #[error("file not found: {0}")]
    NotFound(FileId),

    /// A commit was based on a stale version
    #[error("version conflict on {id}: expected {expected}, found {actual}")]
    VersionConflict {
        /// File being committed
        id: FileId,
        /// Version the caller read
        expected: u64,
        /// Version currently stored
        actual: u64,
    },

    /// Working set is full
    #[error("working set is full (max: {limit})")]
    CapacityExceeded {
        /// Configured working-set cap
        limit: usize,
    },

    /// A file with this id is already registered
    #[error("file already registered: {0}")]
    AlreadyRegistered(FileId),

    /// File id is empty or whitespace
    #[error("file id must not be empty")]
    InvalidId,
}

impl RegistryError {
    /// Classification used when a commit fails inside a task
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::VersionConflict { .. } => ErrorKind::ConcurrentModification,
            _ => ErrorKind::NotFound,
        }
    }
}

impl From<RegistryError> for ErrorInfo {
    fn from(error: RegistryError) -> Self {
        ErrorInfo::new(error.kind(), error.to_string())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config at {path}: {source}")]
    Io {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Config is not valid TOML for [`crate::EngineConfig`]
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Failure classification stored on a failed outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Agent or aggregation deadline elapsed
    Timeout,
    /// Capability declined the edit
    CapabilityRefusal,
    /// Capability stayed unreachable after retries
    CapabilityUnavailable,
    /// Capability answer could not be interpreted
    MalformedResponse,
    /// File changed between snapshot and commit
    ConcurrentModification,
    /// File was unregistered before commit
    NotFound,
    /// Caller cancelled the instruction before this file finished
    Cancelled,
    /// Worker ended without reporting (panic or abort)
    Aborted,
}

/// Failure attached to a task outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Classification
    pub kind: ErrorKind,
    /// Human-readable detail
    pub message: String,
}

impl ErrorInfo {
    /// Create new error info
    #[inline]
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Timeout after `duration`
    #[must_use]
    pub fn timeout(duration: std::time::Duration) -> Self {
        Self::new(
            ErrorKind::Timeout,
            format!("no result within {}ms", duration.as_millis()),
        )
    }

    /// Cancelled by caller
    #[must_use]
    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "instruction cancelled")
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}
