//! Coordinator
//!
//! Orchestrates one instruction end-to-end:
//! - Snapshots the registry and resolves targets
//! - Fans out one file agent per resolved task under a concurrency cap
//! - Commits each successful proposal against its snapshot version
//! - Aggregates outcomes into a report in resolution order
//!
//! Files are isolated from each other: a failure, conflict, or timeout on
//! one never aborts or rolls back another. Cancellation stops unfinished
//! agents but keeps everything already committed.

use crate::agent::FileAgent;
use crate::aggregator::ResultAggregator;
use crate::capability::{LanguageCapability, TargetDisambiguator};
use crate::config::EngineConfig;
use crate::error::{ErrorInfo, ErrorKind, RegistryError, ResolutionError};
use crate::registry::FileRegistry;
use crate::resolver::IntentResolver;
use crate::types::{
    FileId, FileRecord, Instruction, OutcomeStatus, Report, ResolvedSet, ResolvedTask, TaskOutcome,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Entry point for instruction processing
#[derive(Debug)]
pub struct Coordinator {
    /// Configuration
    config: EngineConfig,
    /// Shared working set
    registry: Arc<FileRegistry>,
    /// Target resolution
    resolver: IntentResolver,
    /// Per-file worker template
    agent: FileAgent,
}

impl Coordinator {
    /// Create coordinator with an empty registry sized from `config`
    #[must_use]
    pub fn new(config: EngineConfig, capability: Arc<dyn LanguageCapability>) -> Self {
        Self {
            registry: Arc::new(FileRegistry::from_config(&config)),
            resolver: IntentResolver::new().with_disambiguation_timeout(config.agent_timeout()),
            agent: FileAgent::from_config(capability, &config),
            config,
        }
    }

    /// With disambiguator for instructions that do not name their files
    #[must_use]
    pub fn with_disambiguator(mut self, disambiguator: Arc<dyn TargetDisambiguator>) -> Self {
        self.resolver = self.resolver.with_disambiguator(disambiguator);
        self
    }

    /// With an existing registry
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<FileRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<FileRegistry> {
        &self.registry
    }

    /// Add a file to the working set
    ///
    /// # Errors
    /// `RegistryError::CapacityExceeded` once the working set is full.
    pub fn register_file(
        &self,
        id: impl Into<FileId>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<FileRecord, RegistryError> {
        self.registry.register(id.into(), name, content)
    }

    /// Remove a file from the working set
    pub fn unregister_file(&self, id: &FileId) -> Result<FileRecord, RegistryError> {
        self.registry.unregister(id)
    }

    /// Resolve targets against the current working set without running agents
    pub async fn resolve(&self, instruction: &Instruction) -> Result<ResolvedSet, ResolutionError> {
        self.resolver.resolve(instruction, &self.registry.list()).await
    }

    /// Process instruction text issued now
    pub async fn submit_instruction(&self, text: impl Into<String>) -> Report {
        self.process(Instruction::new(text)).await
    }

    /// Process an instruction to completion
    pub async fn process(&self, instruction: Instruction) -> Report {
        self.process_with_cancel(instruction, CancellationToken::new())
            .await
    }

    /// Process an instruction, stopping unfinished agents when `cancel` fires
    ///
    /// Outcomes already committed stay committed; unfinished files are
    /// reported as `Cancelled`.
    #[tracing::instrument(skip_all, fields(instruction_id = %instruction.id))]
    pub async fn process_with_cancel(
        &self,
        instruction: Instruction,
        cancel: CancellationToken,
    ) -> Report {
        let started_at = Utc::now();
        let snapshot = self.registry.list();
        tracing::info!(files = snapshot.len(), "processing instruction");

        let resolved = match self.resolver.resolve(&instruction, &snapshot).await {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::warn!(error = %e, "resolution failed");
                return Report {
                    instruction,
                    broadcast: false,
                    outcomes: Vec::new(),
                    resolution_error: Some(e),
                    started_at,
                    finished_at: Utc::now(),
                };
            }
        };
        tracing::debug!(
            tasks = resolved.len(),
            method = ?resolved.method,
            broadcast = resolved.broadcast,
            "resolved targets"
        );

        let outcomes = self.fan_out(&resolved.tasks, &snapshot, &cancel).await;

        let report = Report {
            instruction,
            broadcast: resolved.broadcast,
            outcomes,
            resolution_error: None,
            started_at,
            finished_at: Utc::now(),
        };
        tracing::info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            skipped = report.skipped(),
            "instruction finished"
        );
        report
    }

    /// Run one worker per task and gather their outcomes in task order
    async fn fan_out(
        &self,
        tasks: &[ResolvedTask],
        snapshot: &[FileRecord],
        cancel: &CancellationToken,
    ) -> Vec<TaskOutcome> {
        let concurrency = self.config.concurrency_for(tasks.len());
        let deadline = tokio::time::Instant::now() + self.budget(tasks.len(), concurrency);
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let stop = cancel.child_token();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut workers = JoinSet::new();
        for task in tasks {
            let Some(record) = snapshot.iter().find(|f| f.id == task.file_id).cloned() else {
                // resolver only emits ids from the snapshot
                let error = ErrorInfo::new(ErrorKind::NotFound, "file missing from snapshot");
                report(&tx, TaskOutcome::failed(task, error, Duration::ZERO));
                continue;
            };
            let worker = Worker {
                agent: self.agent.clone(),
                registry: Arc::clone(&self.registry),
                semaphore: Arc::clone(&semaphore),
                caller: cancel.clone(),
                stop: stop.clone(),
                tx: tx.clone(),
                timeout: self.config.agent_timeout(),
            };
            workers.spawn(worker.run(task.clone(), record));
        }
        drop(tx);

        let mut aggregator = ResultAggregator::new(tasks);
        aggregator.collect(&mut rx, deadline).await;

        // Stop stragglers, let them report, then take what raced in.
        stop.cancel();
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "file agent task panicked");
            }
        }
        aggregator.drain(&mut rx);
        aggregator.finish()
    }

    /// Deadline for `tasks` run `concurrency` at a time
    fn budget(&self, tasks: usize, concurrency: usize) -> Duration {
        let waves = u32::try_from(tasks.div_ceil(concurrency).max(1)).unwrap_or(u32::MAX);
        self.config
            .agent_timeout()
            .saturating_mul(waves)
            .saturating_add(self.config.aggregation_margin())
    }
}

/// Everything one spawned file worker owns
struct Worker {
    agent: FileAgent,
    registry: Arc<FileRegistry>,
    semaphore: Arc<Semaphore>,
    /// Caller's token, to tell cancellation from deadline
    caller: CancellationToken,
    /// Fires on caller cancellation or deadline
    stop: CancellationToken,
    tx: UnboundedSender<TaskOutcome>,
    timeout: Duration,
}

impl Worker {
    async fn run(self, task: ResolvedTask, snapshot: FileRecord) {
        let started = Instant::now();

        let permit = tokio::select! {
            biased;
            () = self.stop.cancelled() => {
                self.report(TaskOutcome::failed(&task, self.stop_reason(), started.elapsed()));
                return;
            }
            permit = Arc::clone(&self.semaphore).acquire_owned() => permit,
        };
        let Ok(_permit) = permit else {
            let error = ErrorInfo::new(ErrorKind::Aborted, "worker pool closed");
            self.report(TaskOutcome::failed(&task, error, started.elapsed()));
            return;
        };

        tracing::debug!(file_id = %task.file_id, "file agent started");
        // Completed work wins a tie with cancellation so it still commits.
        let outcome = tokio::select! {
            biased;
            outcome = self.agent.execute(&snapshot, &task.directive, self.timeout) => {
                self.commit(outcome, &snapshot)
            }
            () = self.stop.cancelled() => {
                TaskOutcome::failed(&task, self.stop_reason(), started.elapsed())
            }
        };
        self.report(outcome);
    }

    /// Commit a successful proposal against the snapshot version
    fn commit(&self, mut outcome: TaskOutcome, snapshot: &FileRecord) -> TaskOutcome {
        let committed = match &outcome.status {
            OutcomeStatus::Succeeded { new_content, .. } => Some(self.registry.commit_edit(
                &snapshot.id,
                new_content.as_str(),
                snapshot.version,
                Some(outcome.directive.as_str()),
            )),
            _ => None,
        };

        match committed {
            Some(Ok(record)) => {
                if let OutcomeStatus::Succeeded { version, .. } = &mut outcome.status {
                    *version = record.version;
                }
            }
            Some(Err(e)) => {
                tracing::warn!(file_id = %snapshot.id, error = %e, "commit rejected");
                outcome.status = OutcomeStatus::Failed { error: e.into() };
            }
            None => {}
        }
        outcome
    }

    fn stop_reason(&self) -> ErrorInfo {
        if self.caller.is_cancelled() {
            ErrorInfo::cancelled()
        } else {
            ErrorInfo::timeout(self.timeout)
        }
    }

    fn report(&self, outcome: TaskOutcome) {
        report(&self.tx, outcome);
    }
}

fn report(tx: &UnboundedSender<TaskOutcome>, outcome: TaskOutcome) {
    if let Err(mpsc::error::SendError(outcome)) = tx.send(outcome) {
        tracing::debug!(file_id = %outcome.file_id, "aggregator gone; outcome dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::MockLanguageCapability;

    fn coordinator(config: EngineConfig) -> Coordinator {
        let mut mock = MockLanguageCapability::new();
        mock.expect_transform()
            .returning(|req| Ok(format!("{}!", req.content)));
        Coordinator::new(config, Arc::new(mock))
    }

    #[test]
    fn budget_counts_waves() {
        let c = coordinator(
            EngineConfig::new()
                .with_agent_timeout(Duration::from_secs(10))
                .with_max_concurrency(2),
        );
        let margin = c.config().aggregation_margin();
        assert_eq!(c.budget(1, 2), Duration::from_secs(10) + margin);
        assert_eq!(c.budget(4, 2), Duration::from_secs(20) + margin);
        assert_eq!(c.budget(5, 2), Duration::from_secs(30) + margin);
    }

    #[tokio::test]
    async fn resolution_failure_short_circuits() {
        let c = coordinator(EngineConfig::new());
        c.register_file("file_1", "file_1", "hello").unwrap();

        let report = c.submit_instruction("make it nicer").await;

        assert!(report.outcomes.is_empty());
        assert_eq!(report.resolution_error, Some(ResolutionError::NoTargetResolved));
        assert!(!report.is_success());
        assert_eq!(c.registry().get(&FileId::from("file_1")).unwrap().version, 0);
    }

    #[tokio::test]
    async fn commit_records_directive_in_history() {
        let c = coordinator(EngineConfig::new());
        c.register_file("file_1", "file_1", "hello").unwrap();

        let report = c.submit_instruction("shout in file_1").await;

        assert!(report.is_success());
        let record = c.registry().get(&FileId::from("file_1")).unwrap();
        assert_eq!(record.content, "hello!");
        assert_eq!(record.history.len(), 1);
        assert_eq!(record.history[0].directive, "shout in file_1");
    }

    #[tokio::test]
    async fn task_missing_from_snapshot_fails_alone() {
        let c = coordinator(EngineConfig::new());
        let known = c.register_file("a", "a", "x").unwrap();
        let tasks = vec![
            ResolvedTask::new(FileId::from("ghost"), "edit ghost"),
            ResolvedTask::new(FileId::from("a"), "edit a"),
        ];

        let outcomes = c.fan_out(&tasks, &[known], &CancellationToken::new()).await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].file_id, FileId::from("ghost"));
        assert!(matches!(
            &outcomes[0].status,
            OutcomeStatus::Failed { error } if error.kind == ErrorKind::NotFound
        ));
        assert!(matches!(outcomes[1].status, OutcomeStatus::Succeeded { .. }));
    }

    #[test]
    fn report_after_receiver_dropped_is_silent() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let task = ResolvedTask::new(FileId::from("a"), "edit a");
        report(&tx, TaskOutcome::failed(&task, ErrorInfo::cancelled(), Duration::ZERO));
    }

    #[tokio::test]
    async fn register_and_unregister_round_trip() {
        let c = coordinator(EngineConfig::new().with_max_files(1));
        c.register_file("a", "a", "x").unwrap();
        assert!(matches!(
            c.register_file("b", "b", "y"),
            Err(RegistryError::CapacityExceeded { limit: 1 })
        ));
        c.unregister_file(&FileId::from("a")).unwrap();
        c.register_file("b", "b", "y").unwrap();
        assert_eq!(c.registry().len(), 1);
    }
}
