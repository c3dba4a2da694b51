//! Result aggregation
//!
//! Buffers outcomes in completion order and re-emits them in resolution
//! order. The result always has exactly one outcome per resolved task: a
//! task that never reported is synthesized as a failure in its slot.

use crate::error::{ErrorInfo, ErrorKind};
use crate::types::{FileId, ResolvedTask, TaskOutcome};
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedReceiver;

/// Why collection stopped before every outcome arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shortfall {
    /// Deadline elapsed
    Deadline,
    /// Every sender dropped without reporting
    Closed,
}

/// Orders concurrently produced outcomes
#[derive(Debug)]
pub struct ResultAggregator {
    /// Tasks in resolution order
    tasks: Vec<ResolvedTask>,
    /// Outcomes received so far
    received: HashMap<FileId, TaskOutcome>,
    /// Set when collection ended early
    shortfall: Option<Shortfall>,
    /// Creation time, for synthesized durations
    started: Instant,
}

impl ResultAggregator {
    /// Create aggregator for `tasks` in resolution order
    #[must_use]
    pub fn new(tasks: &[ResolvedTask]) -> Self {
        Self {
            tasks: tasks.to_vec(),
            received: HashMap::with_capacity(tasks.len()),
            shortfall: None,
            started: Instant::now(),
        }
    }

    /// Accept one outcome; returns `false` for unknown or duplicate files
    pub fn record(&mut self, outcome: TaskOutcome) -> bool {
        if !self.tasks.iter().any(|t| t.file_id == outcome.file_id) {
            tracing::warn!(file_id = %outcome.file_id, "dropping outcome for unresolved file");
            return false;
        }
        if self.received.contains_key(&outcome.file_id) {
            tracing::warn!(file_id = %outcome.file_id, "dropping duplicate outcome");
            return false;
        }
        self.received.insert(outcome.file_id.clone(), outcome);
        true
    }

    /// Whether every task has reported
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.received.len() == self.tasks.len()
    }

    /// Number of outcomes received
    #[inline]
    #[must_use]
    pub fn received(&self) -> usize {
        self.received.len()
    }

    /// Receive outcomes until complete, all senders are gone, or `deadline`
    pub async fn collect(
        &mut self,
        rx: &mut UnboundedReceiver<TaskOutcome>,
        deadline: tokio::time::Instant,
    ) {
        while !self.is_complete() {
            match tokio::time::timeout_at(deadline, rx.recv()).await {
                Ok(Some(outcome)) => {
                    self.record(outcome);
                }
                Ok(None) => {
                    self.shortfall = Some(Shortfall::Closed);
                    break;
                }
                Err(_) => {
                    tracing::warn!(
                        received = self.received.len(),
                        expected = self.tasks.len(),
                        "aggregation deadline elapsed"
                    );
                    self.shortfall = Some(Shortfall::Deadline);
                    break;
                }
            }
        }
    }

    /// Take whatever is already queued without waiting
    pub fn drain(&mut self, rx: &mut UnboundedReceiver<TaskOutcome>) {
        while let Ok(outcome) = rx.try_recv() {
            self.record(outcome);
        }
    }

    /// Outcomes in resolution order, synthesizing any that are missing
    #[must_use]
    pub fn finish(mut self) -> Vec<TaskOutcome> {
        let elapsed = self.started.elapsed();
        let shortfall = self.shortfall;
        self.tasks
            .iter()
            .map(|task| {
                self.received.remove(&task.file_id).unwrap_or_else(|| {
                    let error = match shortfall {
                        Some(Shortfall::Closed) => {
                            ErrorInfo::new(ErrorKind::Aborted, "worker ended without reporting")
                        }
                        _ => ErrorInfo::timeout(elapsed),
                    };
                    tracing::warn!(file_id = %task.file_id, kind = ?error.kind, "synthesized outcome");
                    TaskOutcome::failed(task, error, elapsed)
                })
            })
            .collect()
    }
}

/// Collect outcomes from `rx` into resolution order, bounded by `deadline`
pub async fn aggregate(
    tasks: &[ResolvedTask],
    rx: &mut UnboundedReceiver<TaskOutcome>,
    deadline: tokio::time::Instant,
) -> Vec<TaskOutcome> {
    let mut aggregator = ResultAggregator::new(tasks);
    aggregator.collect(rx, deadline).await;
    aggregator.drain(rx);
    aggregator.finish()
}
