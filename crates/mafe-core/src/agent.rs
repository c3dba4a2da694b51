//! File agent
//!
//! Executes one directive against one file snapshot:
//! - Calls the language capability with the snapshot content
//! - Retries an unavailable capability with bounded backoff
//! - Enforces the per-file timeout over all attempts
//! - Produces a [`TaskOutcome`] proposing the new content
//!
//! The agent never touches the registry. A `Succeeded` outcome carries the
//! version the file will have once the coordinator commits it.

use crate::capability::{LanguageCapability, TransformRequest};
use crate::config::{EngineConfig, RetryPolicy};
use crate::error::{CapabilityError, ErrorInfo};
use crate::types::{FileRecord, OutcomeStatus, TaskOutcome};
use similar::TextDiff;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Stateless worker for single-file edits
#[derive(Clone)]
pub struct FileAgent {
    /// Backing language capability
    capability: Arc<dyn LanguageCapability>,
    /// Backoff for an unavailable capability
    retry: RetryPolicy,
    /// Unwrap replies wrapped in a code fence
    strip_code_fences: bool,
}

impl FileAgent {
    /// Create new agent with default retry policy
    #[inline]
    #[must_use]
    pub fn new(capability: Arc<dyn LanguageCapability>) -> Self {
        Self {
            capability,
            retry: RetryPolicy::default(),
            strip_code_fences: true,
        }
    }

    /// Create agent from engine configuration
    #[must_use]
    pub fn from_config(capability: Arc<dyn LanguageCapability>, config: &EngineConfig) -> Self {
        Self::new(capability)
            .with_retry(config.retry)
            .with_code_fence_stripping(config.strip_code_fences)
    }

    /// With retry policy
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// With code-fence stripping on or off
    #[inline]
    #[must_use]
    pub fn with_code_fence_stripping(mut self, enabled: bool) -> Self {
        self.strip_code_fences = enabled;
        self
    }

    /// Execute `directive` against `snapshot`, bounded by `timeout`
    ///
    /// Never fails: every error becomes a `Failed` outcome. Two calls with
    /// the same inputs may propose different content.
    pub async fn execute(
        &self,
        snapshot: &FileRecord,
        directive: &str,
        timeout: Duration,
    ) -> TaskOutcome {
        let started = Instant::now();
        let request = TransformRequest::from_snapshot(snapshot, directive, timeout);
        let mut attempts = 0u32;

        let result =
            tokio::time::timeout(timeout, self.transform_with_retry(&request, &mut attempts)).await;

        let status = match result {
            Err(_) => {
                tracing::warn!(file_id = %snapshot.id, attempts, "agent timed out");
                OutcomeStatus::Failed {
                    error: ErrorInfo::timeout(timeout),
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(file_id = %snapshot.id, attempts, error = %e, "agent failed");
                OutcomeStatus::Failed { error: e.into() }
            }
            Ok(Ok(reply)) => self.propose(snapshot, reply),
        };

        TaskOutcome {
            file_id: snapshot.id.clone(),
            directive: directive.to_string(),
            status,
            duration: started.elapsed(),
            attempts,
        }
    }

    /// Call the capability, retrying only while it is unavailable
    async fn transform_with_retry(
        &self,
        request: &TransformRequest,
        attempts: &mut u32,
    ) -> Result<String, CapabilityError> {
        loop {
            *attempts += 1;
            match self.capability.transform(request.clone()).await {
                Ok(content) => return Ok(content),
                Err(e) if e.is_retryable() && *attempts <= self.retry.max_retries => {
                    let delay = self.retry.backoff(*attempts);
                    tracing::warn!(
                        file_id = %request.file_id,
                        attempt = *attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "capability unavailable, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Turn a capability reply into a proposed outcome status
    fn propose(&self, snapshot: &FileRecord, reply: String) -> OutcomeStatus {
        let new_content = if self.strip_code_fences {
            strip_code_fence(&reply).to_string()
        } else {
            reply
        };

        if new_content == snapshot.content {
            tracing::debug!(file_id = %snapshot.id, "capability returned unchanged content");
            return OutcomeStatus::Skipped {
                reason: "content unchanged".to_string(),
            };
        }

        let diff = unified_diff(&snapshot.name, &snapshot.content, &new_content);
        OutcomeStatus::Succeeded {
            new_content,
            version: snapshot.version + 1,
            diff,
        }
    }
}

impl std::fmt::Debug for FileAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileAgent")
            .field("retry", &self.retry)
            .field("strip_code_fences", &self.strip_code_fences)
            .finish_non_exhaustive()
    }
}

/// Body of a reply wrapped in a single markdown code fence, else the reply
#[must_use]
pub fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    if !trimmed.starts_with("```") || !trimmed.ends_with("```") || trimmed.len() < 6 {
        return reply;
    }
    let Some((_, after_opening)) = trimmed.split_once('\n') else {
        return reply;
    };
    after_opening
        .strip_suffix("```")
        .map_or(reply, |body| body.strip_suffix('\n').unwrap_or(body))
}

/// Unified diff with `a/` and `b/` headers and three lines of context
#[must_use]
pub fn unified_diff(name: &str, old: &str, new: &str) -> String {
    TextDiff::from_lines(old, new)
        .unified_diff()
        .header(&format!("a/{name}"), &format!("b/{name}"))
        .context_radius(3)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::MockLanguageCapability;
    use crate::error::ErrorKind;
    use crate::types::FileId;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn snapshot(content: &str) -> FileRecord {
        FileRecord::new(FileId::from("file_1"), "file_1", content)
    }

    fn agent(mock: MockLanguageCapability) -> FileAgent {
        FileAgent::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn success_proposes_next_version_with_diff() {
        let mut mock = MockLanguageCapability::new();
        mock.expect_transform()
            .times(1)
            .returning(|req| Ok(format!("{}.", req.content)));

        let outcome = agent(mock)
            .execute(&snapshot("hello"), "add a period", Duration::from_secs(1))
            .await;

        match outcome.status {
            OutcomeStatus::Succeeded { new_content, version, diff } => {
                assert_eq!(new_content, "hello.");
                assert_eq!(version, 1);
                assert!(diff.contains("-hello"));
                assert!(diff.contains("+hello."));
                assert!(diff.starts_with("--- a/file_1"));
            }
            other => panic!("expected success, got {other:?}"),
        }
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.directive, "add a period");
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_is_retried_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let mut mock = MockLanguageCapability::new();
        mock.expect_transform().times(3).returning(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(CapabilityError::Unavailable("503".into()))
            } else {
                Ok("done".into())
            }
        });

        let outcome = agent(mock)
            .execute(&snapshot("x"), "d", Duration::from_secs(10))
            .await;

        assert!(outcome.is_succeeded());
        assert_eq!(outcome.attempts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_gives_up_after_max_retries() {
        let mut mock = MockLanguageCapability::new();
        mock.expect_transform()
            .times(3)
            .returning(|_| Err(CapabilityError::Unavailable("down".into())));

        let outcome = agent(mock)
            .execute(&snapshot("x"), "d", Duration::from_secs(10))
            .await;

        assert_eq!(outcome.error().unwrap().kind, ErrorKind::CapabilityUnavailable);
        assert_eq!(outcome.attempts, 3);
    }

    #[tokio::test]
    async fn refusal_is_not_retried() {
        let mut mock = MockLanguageCapability::new();
        mock.expect_transform()
            .times(1)
            .returning(|_| Err(CapabilityError::Refused("policy".into())));

        let outcome = agent(mock)
            .execute(&snapshot("x"), "d", Duration::from_secs(1))
            .await;

        assert_eq!(outcome.error().unwrap().kind, ErrorKind::CapabilityRefusal);
        assert_eq!(outcome.attempts, 1);
    }

    #[tokio::test]
    async fn unchanged_reply_is_skipped() {
        let mut mock = MockLanguageCapability::new();
        mock.expect_transform()
            .returning(|_| Ok("```text\nsame\n```".into()));

        let outcome = agent(mock)
            .execute(&snapshot("same"), "d", Duration::from_secs(1))
            .await;

        assert!(matches!(outcome.status, OutcomeStatus::Skipped { .. }));
    }

    struct Stalled;

    #[async_trait]
    impl LanguageCapability for Stalled {
        async fn transform(&self, _request: TransformRequest) -> Result<String, CapabilityError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("late".into())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_capability_times_out() {
        let outcome = FileAgent::new(Arc::new(Stalled))
            .execute(&snapshot("x"), "d", Duration::from_secs(2))
            .await;

        assert_eq!(outcome.error().unwrap().kind, ErrorKind::Timeout);
        assert_eq!(outcome.attempts, 1);
    }

    #[test]
    fn code_fence_is_unwrapped() {
        assert_eq!(strip_code_fence("```rust\nfn main() {}\n```"), "fn main() {}");
        assert_eq!(strip_code_fence("```\na\nb\n```\n"), "a\nb");
        assert_eq!(strip_code_fence("plain text"), "plain text");
        assert_eq!(strip_code_fence("```inline```"), "```inline```");
    }
}
