//! In-memory file registry
//!
//! Catalogue of the active working set. [`FileRegistry::commit`] is the only
//! way content changes. It is atomic per id and unrelated ids commit in
//! parallel.
//!
//! # Locking
//!
//! - `records` (sharded map) guards content; a commit holds only its own
//!   entry.
//! - `order` guards membership and insertion order; register and unregister
//!   take it first, commit never takes it.

use crate::config::{EngineConfig, WORKING_SET_LIMIT};
use crate::error::RegistryError;
use crate::types::{FileId, FileRecord, HistoryEntry};
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;

/// Registry of the files currently open for editing
#[derive(Debug)]
pub struct FileRegistry {
    /// Working-set cap
    max_files: usize,
    /// History entries kept per file
    history_limit: usize,
    /// Ids in insertion order
    order: Mutex<Vec<FileId>>,
    /// Records by id
    records: DashMap<FileId, FileRecord>,
}

impl FileRegistry {
    /// Create empty registry with the given cap, clamped to the working-set limit
    #[inline]
    #[must_use]
    pub fn new(max_files: usize) -> Self {
        Self {
            max_files: max_files.min(WORKING_SET_LIMIT),
            history_limit: 0,
            order: Mutex::new(Vec::new()),
            records: DashMap::new(),
        }
    }

    /// Create registry sized from configuration
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.max_files).with_history_limit(config.history_limit)
    }

    /// With history limit
    #[inline]
    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Add a file to the working set at version 0
    ///
    /// # Errors
    /// - `RegistryError::InvalidId` if the id is blank
    /// - `RegistryError::AlreadyRegistered` if the id is taken
    /// - `RegistryError::CapacityExceeded` if the set is full
    pub fn register(
        &self,
        id: FileId,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<FileRecord, RegistryError> {
        if id.is_blank() {
            return Err(RegistryError::InvalidId);
        }

        let mut order = self.order.lock();
        if self.records.contains_key(&id) {
            return Err(RegistryError::AlreadyRegistered(id));
        }
        if order.len() >= self.max_files {
            return Err(RegistryError::CapacityExceeded {
                limit: self.max_files,
            });
        }

        let record = FileRecord::new(id.clone(), name, content);
        self.records.insert(id.clone(), record.clone());
        order.push(id);

        tracing::debug!(file_id = %record.id, "registered file");
        Ok(record)
    }

    /// Remove a file from the working set
    pub fn unregister(&self, id: &FileId) -> Result<FileRecord, RegistryError> {
        let mut order = self.order.lock();
        let (_, record) = self
            .records
            .remove(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        order.retain(|existing| existing != id);

        tracing::debug!(file_id = %id, "unregistered file");
        Ok(record)
    }

    /// Snapshot of one file
    pub fn get(&self, id: &FileId) -> Result<FileRecord, RegistryError> {
        self.records
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }

    /// Snapshot of every file in insertion order
    #[must_use]
    pub fn list(&self) -> Vec<FileRecord> {
        let order = self.order.lock().clone();
        order
            .iter()
            .filter_map(|id| self.records.get(id).map(|entry| entry.value().clone()))
            .collect()
    }

    /// Replace content if the stored version still equals `expected_version`
    ///
    /// # Errors
    /// - `RegistryError::NotFound` if the file was unregistered
    /// - `RegistryError::VersionConflict` if another commit raced ahead
    pub fn commit(
        &self,
        id: &FileId,
        new_content: impl Into<String>,
        expected_version: u64,
    ) -> Result<FileRecord, RegistryError> {
        self.commit_edit(id, new_content, expected_version, None)
    }

    /// [`Self::commit`], recording `directive` in the file's history
    pub fn commit_edit(
        &self,
        id: &FileId,
        new_content: impl Into<String>,
        expected_version: u64,
        directive: Option<&str>,
    ) -> Result<FileRecord, RegistryError> {
        let mut entry = self
            .records
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        let record = entry.value_mut();

        if record.version != expected_version {
            return Err(RegistryError::VersionConflict {
                id: id.clone(),
                expected: expected_version,
                actual: record.version,
            });
        }

        record.content = new_content.into();
        record.version += 1;

        if self.history_limit > 0 {
            record.history.push(HistoryEntry {
                version: record.version,
                directive: directive.unwrap_or_default().to_string(),
                committed_at: Utc::now(),
            });
            let excess = record.history.len().saturating_sub(self.history_limit);
            record.history.drain(..excess);
        }

        tracing::debug!(file_id = %id, version = record.version, "committed file");
        Ok(record.clone())
    }

    /// Whether a file is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &FileId) -> bool {
        self.records.contains_key(id)
    }

    /// Number of registered files
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.lock().len()
    }

    /// Whether the working set is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Working-set cap
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.max_files
    }
}

impl Default for FileRegistry {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn id(s: &str) -> FileId {
        FileId::from(s)
    }

    #[test]
    fn list_preserves_insertion_order() {
        let registry = FileRegistry::default();
        for name in ["c.txt", "a.txt", "b.txt"] {
            registry.register(id(name), name, "x").unwrap();
        }
        let ids: Vec<_> = registry.list().into_iter().map(|r| r.id.into_inner()).collect();
        assert_eq!(ids, vec!["c.txt", "a.txt", "b.txt"]);
    }

    #[test]
    fn register_beyond_cap_leaves_set_unchanged() {
        let registry = FileRegistry::new(50);
        for i in 0..50 {
            registry.register(id(&format!("file_{i}")), "n", "c").unwrap();
        }

        let err = registry.register(id("file_50"), "n", "c").unwrap_err();
        assert_eq!(err, RegistryError::CapacityExceeded { limit: 50 });
        assert_eq!(registry.len(), 50);
        assert!(!registry.contains(&id("file_50")));
    }

    #[test]
    fn cap_is_clamped_to_working_set_limit() {
        assert_eq!(FileRegistry::new(500).capacity(), WORKING_SET_LIMIT);
    }

    #[test]
    fn duplicate_and_blank_ids_rejected() {
        let registry = FileRegistry::default();
        registry.register(id("a"), "a", "1").unwrap();
        assert_eq!(
            registry.register(id("a"), "a", "2").unwrap_err(),
            RegistryError::AlreadyRegistered(id("a"))
        );
        assert_eq!(registry.register(id(" "), "b", "2").unwrap_err(), RegistryError::InvalidId);
        assert_eq!(registry.get(&id("a")).unwrap().content, "1");
    }

    #[test]
    fn commit_bumps_version_once() {
        let registry = FileRegistry::default();
        registry.register(id("a"), "a", "hello").unwrap();

        let updated = registry.commit(&id("a"), "hello.", 0).unwrap();
        assert_eq!(updated.version, 1);
        assert_eq!(registry.get(&id("a")).unwrap().content, "hello.");
    }

    #[test]
    fn stale_commit_is_a_conflict() {
        let registry = FileRegistry::default();
        registry.register(id("a"), "a", "hello").unwrap();
        registry.commit(&id("a"), "v1", 0).unwrap();

        let err = registry.commit(&id("a"), "v1-stale", 0).unwrap_err();
        assert_eq!(
            err,
            RegistryError::VersionConflict { id: id("a"), expected: 0, actual: 1 }
        );
        assert_eq!(registry.get(&id("a")).unwrap().content, "v1");
    }

    #[test]
    fn commit_to_unregistered_file_is_not_found() {
        let registry = FileRegistry::default();
        registry.register(id("a"), "a", "x").unwrap();
        registry.unregister(&id("a")).unwrap();

        assert_eq!(
            registry.commit(&id("a"), "y", 0).unwrap_err(),
            RegistryError::NotFound(id("a"))
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn racing_commits_on_one_id_admit_exactly_one() {
        let registry = FileRegistry::default();
        registry.register(id("a"), "a", "base").unwrap();
        let wins = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for i in 0..16 {
                let registry = &registry;
                let wins = &wins;
                s.spawn(move || {
                    if registry.commit(&id("a"), format!("writer {i}"), 0).is_ok() {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(wins.load(Ordering::SeqCst), 1);
        assert_eq!(registry.get(&id("a")).unwrap().version, 1);
    }

    #[test]
    fn history_is_bounded_and_ordered() {
        let registry = FileRegistry::new(10).with_history_limit(2);
        registry.register(id("a"), "a", "0").unwrap();
        for v in 0..3u64 {
            registry
                .commit_edit(&id("a"), format!("{}", v + 1), v, Some(&format!("edit {v}")))
                .unwrap();
        }

        let history = registry.get(&id("a")).unwrap().history;
        let directives: Vec<_> = history.iter().map(|h| h.directive.as_str()).collect();
        assert_eq!(directives, vec!["edit 1", "edit 2"]);
        assert_eq!(history.last().unwrap().version, 3);
    }

    #[test]
    fn history_disabled_by_default_constructor() {
        let registry = FileRegistry::new(10);
        registry.register(id("a"), "a", "0").unwrap();
        registry.commit(&id("a"), "1", 0).unwrap();
        assert!(registry.get(&id("a")).unwrap().history.is_empty());
    }
}
