//! Core types for MAFE
//!
//! Defines the data model shared by every component:
//! - File records and their bounded edit history
//! - Instructions and resolved per-file tasks
//! - Task outcomes and the per-instruction report

use crate::error::{ErrorInfo, RegistryError, ResolutionError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use ulid::Ulid;

/// Opaque file identifier, unique within a registry
///
/// `From` conversions are unchecked; [`FileId::parse`] rejects blank ids up
/// front, and `FileRegistry::register` rejects them at the latest.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    /// Checked constructor
    ///
    /// # Errors
    /// Returns `RegistryError::InvalidId` if `s` is empty or whitespace.
    pub fn parse(s: impl Into<String>) -> Result<Self, RegistryError> {
        let id = Self(s.into());
        if id.is_blank() {
            return Err(RegistryError::InvalidId);
        }
        Ok(id)
    }

    /// Borrow as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id is blank
    #[inline]
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Unwrap into the owned string
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<&str> for FileId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FileId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique instruction identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstructionId(pub Ulid);

impl InstructionId {
    /// Generate new instruction ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for InstructionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InstructionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One committed edit in a file's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Version produced by this edit
    pub version: u64,
    /// Directive that produced it
    pub directive: String,
    /// Commit time
    pub committed_at: DateTime<Utc>,
}

/// A file in the working set
///
/// Owned by the registry; everyone else holds clones (snapshots).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Identity
    pub id: FileId,
    /// Display name, usually the uploaded file name
    pub name: String,
    /// Current text content
    pub content: String,
    /// Incremented on every committed mutation
    pub version: u64,
    /// Most recent committed edits, oldest first
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl FileRecord {
    /// Create new record at version 0
    #[inline]
    #[must_use]
    pub fn new(id: FileId, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            content: content.into(),
            version: 0,
            history: Vec::new(),
        }
    }
}

/// A natural-language edit instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// Instruction identifier
    pub id: InstructionId,
    /// Text as issued by the user
    pub raw_text: String,
    /// Issue time
    pub issued_at: DateTime<Utc>,
}

impl Instruction {
    /// Create new instruction issued now
    #[inline]
    #[must_use]
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            id: InstructionId::new(),
            raw_text: raw_text.into(),
            issued_at: Utc::now(),
        }
    }
}

/// One unit of work for one file agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTask {
    /// Target file
    pub file_id: FileId,
    /// Instruction text the agent executes against this file
    pub directive: String,
}

impl ResolvedTask {
    /// Create new resolved task
    #[inline]
    #[must_use]
    pub fn new(file_id: FileId, directive: impl Into<String>) -> Self {
        Self {
            file_id,
            directive: directive.into(),
        }
    }
}

/// How a resolved set was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    /// Files named exactly; raw instruction passed through
    Exact,
    /// Files named exactly; instruction split into per-file directives
    Segmented,
    /// Single strongest partial-name match
    Fuzzy,
    /// Language capability picked among candidates
    Disambiguated,
    /// Instruction explicitly addressed every file
    Broadcast,
}

/// Output of intent resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSet {
    /// Tasks in resolution order
    pub tasks: Vec<ResolvedTask>,
    /// Instruction explicitly targets the whole working set
    pub broadcast: bool,
    /// Resolution path taken
    pub method: ResolutionMethod,
}

impl ResolvedSet {
    /// Target ids in resolution order
    #[must_use]
    pub fn file_ids(&self) -> Vec<FileId> {
        self.tasks.iter().map(|t| t.file_id.clone()).collect()
    }

    /// Number of tasks
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no task was produced
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Terminal status of one file's processing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// New content was committed
    Succeeded {
        /// Content now stored in the registry
        new_content: String,
        /// Version after commit
        version: u64,
        /// Unified diff from the snapshot
        diff: String,
    },
    /// Nothing committed
    Failed {
        /// What went wrong
        error: ErrorInfo,
    },
    /// Agent ran but there was nothing to commit
    Skipped {
        /// Why nothing was committed
        reason: String,
    },
}

/// Result of one file agent execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutcome {
    /// Target file
    pub file_id: FileId,
    /// Directive that was executed
    pub directive: String,
    /// Terminal status
    #[serde(flatten)]
    pub status: OutcomeStatus,
    /// Wall time spent on this file
    pub duration: Duration,
    /// Capability calls made (retries included)
    pub attempts: u32,
}

impl TaskOutcome {
    /// Failed outcome with no capability call recorded
    #[must_use]
    pub fn failed(task: &ResolvedTask, error: ErrorInfo, duration: Duration) -> Self {
        Self {
            file_id: task.file_id.clone(),
            directive: task.directive.clone(),
            status: OutcomeStatus::Failed { error },
            duration,
            attempts: 0,
        }
    }

    /// Whether the outcome committed new content
    #[inline]
    #[must_use]
    pub fn is_succeeded(&self) -> bool {
        matches!(self.status, OutcomeStatus::Succeeded { .. })
    }

    /// Whether the outcome failed
    #[inline]
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed { .. })
    }

    /// Error, if failed
    #[inline]
    #[must_use]
    pub fn error(&self) -> Option<&ErrorInfo> {
        match &self.status {
            OutcomeStatus::Failed { error } => Some(error),
            _ => None,
        }
    }

    /// Committed content, if succeeded
    #[inline]
    #[must_use]
    pub fn new_content(&self) -> Option<&str> {
        match &self.status {
            OutcomeStatus::Succeeded { new_content, .. } => Some(new_content),
            _ => None,
        }
    }
}

/// Per-instruction report returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// The instruction processed
    pub instruction: Instruction,
    /// Whether resolution produced a broadcast
    pub broadcast: bool,
    /// One outcome per resolved task, in resolution order
    pub outcomes: Vec<TaskOutcome>,
    /// Set when resolution failed; outcomes are then empty
    pub resolution_error: Option<ResolutionError>,
    /// Processing start
    pub started_at: DateTime<Utc>,
    /// Processing end
    pub finished_at: DateTime<Utc>,
}

impl Report {
    /// True only if at least one file was targeted and every one succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.resolution_error.is_none()
            && !self.outcomes.is_empty()
            && self.outcomes.iter().all(TaskOutcome::is_succeeded)
    }

    /// Number of succeeded outcomes
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_succeeded()).count()
    }

    /// Number of failed outcomes
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    /// Number of skipped outcomes
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Skipped { .. }))
            .count()
    }

    /// Outcome for a file, if it was targeted
    #[must_use]
    pub fn outcome(&self, file_id: &FileId) -> Option<&TaskOutcome> {
        self.outcomes.iter().find(|o| &o.file_id == file_id)
    }

    /// Wall time from start to finish
    #[must_use]
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
