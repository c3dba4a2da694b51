//! Testing utilities for MAFE workspace
//!
//! Scripted capabilities, fixed disambiguators, and registry fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use mafe_core::{
    CapabilityError, Coordinator, Disambiguation, DisambiguationRequest, EngineConfig, FileId,
    FileRegistry, LanguageCapability, TargetDisambiguator, TransformRequest,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// What a scripted capability does with one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Behavior {
    /// Append the text to the current content
    Append(String),
    /// Replace the whole content
    Replace(String),
    /// Return the content unchanged
    Echo,
    /// Refuse with the reason
    Refuse(String),
    /// Report unavailable this many times, then append `!`
    UnavailableTimes(u32),
    /// Never answer
    Hang,
}

type Hook = Arc<dyn Fn(&TransformRequest) + Send + Sync>;

#[derive(Clone)]
struct Script {
    behavior: Behavior,
    delay: Duration,
    hook: Option<Hook>,
}

impl Script {
    fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            delay: Duration::ZERO,
            hook: None,
        }
    }
}

/// Language capability driven by per-file scripts
///
/// Unscripted files get the default behavior, `Append("!")`.
pub struct ScriptedCapability {
    default: Script,
    scripts: Mutex<HashMap<FileId, Script>>,
    failures: Mutex<HashMap<FileId, u32>>,
    calls: Mutex<Vec<TransformRequest>>,
}

impl ScriptedCapability {
    pub fn new() -> Self {
        Self {
            default: Script::new(Behavior::Append("!".to_string())),
            scripts: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Behavior for unscripted files
    pub fn with_default(mut self, behavior: Behavior) -> Self {
        self.default.behavior = behavior;
        self
    }

    /// Behavior for one file
    pub fn with_behavior(self, file: &str, behavior: Behavior) -> Self {
        self.update(file, |script| script.behavior = behavior);
        self
    }

    /// Delay before answering for one file
    pub fn with_delay(self, file: &str, delay: Duration) -> Self {
        self.update(file, |script| script.delay = delay);
        self
    }

    /// Run `hook` when the capability is called for `file`, before any delay
    pub fn with_hook(
        self,
        file: &str,
        hook: impl Fn(&TransformRequest) + Send + Sync + 'static,
    ) -> Self {
        let hook: Hook = Arc::new(hook);
        self.update(file, |script| script.hook = Some(hook));
        self
    }

    /// Every request received, in call order
    pub fn calls(&self) -> Vec<TransformRequest> {
        self.calls.lock().clone()
    }

    /// Number of calls received for `file`
    pub fn calls_for(&self, file: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|r| r.file_id.as_str() == file)
            .count()
    }

    fn update(&self, file: &str, f: impl FnOnce(&mut Script)) {
        let mut scripts = self.scripts.lock();
        let script = scripts
            .entry(FileId::from(file))
            .or_insert_with(|| self.default.clone());
        f(script);
    }

    fn script_for(&self, file: &FileId) -> Script {
        self.scripts
            .lock()
            .get(file)
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }
}

impl Default for ScriptedCapability {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScriptedCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedCapability")
            .field("calls", &self.calls.lock().len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LanguageCapability for ScriptedCapability {
    async fn transform(&self, request: TransformRequest) -> Result<String, CapabilityError> {
        self.calls.lock().push(request.clone());
        let script = self.script_for(&request.file_id);

        if let Some(hook) = &script.hook {
            hook(&request);
        }
        if !script.delay.is_zero() {
            tokio::time::sleep(script.delay).await;
        }

        match script.behavior {
            Behavior::Append(suffix) => Ok(format!("{}{suffix}", request.content)),
            Behavior::Replace(content) => Ok(content),
            Behavior::Echo => Ok(request.content),
            Behavior::Refuse(reason) => Err(CapabilityError::Refused(reason)),
            Behavior::UnavailableTimes(times) => {
                let mut failures = self.failures.lock();
                let seen = failures.entry(request.file_id.clone()).or_insert(0);
                if *seen < times {
                    *seen += 1;
                    Err(CapabilityError::Unavailable("scripted outage".to_string()))
                } else {
                    Ok(format!("{}!", request.content))
                }
            }
            Behavior::Hang => {
                std::future::pending::<()>().await;
                Err(CapabilityError::Timeout)
            }
        }
    }
}

/// Disambiguator that always gives the same answer
#[derive(Debug)]
pub struct FixedDisambiguator {
    answer: Result<Disambiguation, CapabilityError>,
    requests: Mutex<Vec<DisambiguationRequest>>,
}

impl FixedDisambiguator {
    pub fn selecting(ids: &[&str]) -> Self {
        Self::answering(Ok(Disambiguation::Selected(
            ids.iter().map(|id| FileId::from(*id)).collect(),
        )))
    }

    pub fn undetermined() -> Self {
        Self::answering(Ok(Disambiguation::Undetermined))
    }

    pub fn answering(answer: Result<Disambiguation, CapabilityError>) -> Self {
        Self {
            answer,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received, in call order
    pub fn requests(&self) -> Vec<DisambiguationRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl TargetDisambiguator for FixedDisambiguator {
    async fn disambiguate(
        &self,
        request: DisambiguationRequest,
    ) -> Result<Disambiguation, CapabilityError> {
        self.requests.lock().push(request);
        self.answer.clone()
    }
}

/// Registry holding `files` as `(id, content)`, with the id as display name
pub fn registry_with(files: &[(&str, &str)]) -> Arc<FileRegistry> {
    let registry = FileRegistry::default();
    for (id, content) in files {
        registry
            .register(FileId::from(*id), *id, *content)
            .expect("fixture file registers");
    }
    Arc::new(registry)
}

/// Coordinator over `files` backed by `capability`
pub fn coordinator_with(
    config: EngineConfig,
    capability: Arc<ScriptedCapability>,
    files: &[(&str, &str)],
) -> Coordinator {
    let coordinator = Coordinator::new(config, capability);
    for (id, content) in files {
        coordinator
            .register_file(*id, *id, *content)
            .expect("fixture file registers");
    }
    coordinator
}

/// Content of `id` in the coordinator's registry
pub fn content_of(coordinator: &Coordinator, id: &str) -> String {
    coordinator
        .registry()
        .get(&FileId::from(id))
        .expect("fixture file exists")
        .content
}

/// Version of `id` in the coordinator's registry
pub fn version_of(coordinator: &Coordinator, id: &str) -> u64 {
    coordinator
        .registry()
        .get(&FileId::from(id))
        .expect("fixture file exists")
        .version
}
