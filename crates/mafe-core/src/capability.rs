//! Language capability seams
//!
//! The engine never talks to a model provider directly. It is handed two
//! single-method traits:
//! - [`LanguageCapability`] rewrites one file according to a directive
//! - [`TargetDisambiguator`] picks target files when names alone do not
//!
//! Implementations are remote, slow, and unreliable: calls may hang, fail,
//! or return different content for identical requests.

use crate::error::CapabilityError;
use crate::types::{FileId, FileRecord, HistoryEntry};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Everything a capability needs to edit one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformRequest {
    /// Target file
    pub file_id: FileId,
    /// Display name, for prompting
    pub file_name: String,
    /// Snapshot content
    pub content: String,
    /// Edit to perform
    pub directive: String,
    /// Earlier committed edits to this file, oldest first
    pub history: Vec<HistoryEntry>,
    /// Time the caller is willing to wait
    pub timeout: Duration,
}

impl TransformRequest {
    /// Build from a registry snapshot
    #[must_use]
    pub fn from_snapshot(snapshot: &FileRecord, directive: &str, timeout: Duration) -> Self {
        Self {
            file_id: snapshot.id.clone(),
            file_name: snapshot.name.clone(),
            content: snapshot.content.clone(),
            directive: directive.to_string(),
            history: snapshot.history.clone(),
            timeout,
        }
    }
}

/// Rewrites file content according to a directive
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageCapability: Send + Sync {
    /// Return the full replacement content, or why it cannot be produced
    async fn transform(&self, request: TransformRequest) -> Result<String, CapabilityError>;
}

/// A file offered to the disambiguator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// File id; the only value accepted back
    pub id: FileId,
    /// Display name
    pub name: String,
}

impl From<&FileRecord> for Candidate {
    fn from(record: &FileRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
        }
    }
}

/// Question put to the disambiguator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisambiguationRequest {
    /// Raw instruction text
    pub instruction: String,
    /// Files the answer must be drawn from
    pub candidates: Vec<Candidate>,
}

/// Disambiguator answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disambiguation {
    /// These files are the targets
    Selected(Vec<FileId>),
    /// No confident choice
    Undetermined,
}

/// Chooses target files for an instruction that names none unambiguously
#[async_trait]
pub trait TargetDisambiguator: Send + Sync {
    /// Pick targets among `request.candidates`
    async fn disambiguate(
        &self,
        request: DisambiguationRequest,
    ) -> Result<Disambiguation, CapabilityError>;
}
