//! MAFE Core - Multi-Agent File Editor
//!
//! Applies one natural-language instruction to a working set of files:
//! - Resolves which files the instruction targets
//! - Runs one isolated file agent per target, concurrently
//! - Commits each edit with optimistic versioning
//! - Reports per-file outcomes in a deterministic order
//!
//! # Example
//!
//! ```rust,ignore
//! use mafe_core::{Coordinator, EngineConfig};
//! use std::sync::Arc;
//!
//! # async fn example(capability: Arc<dyn mafe_core::LanguageCapability>) {
//! let coordinator = Coordinator::new(EngineConfig::new(), capability);
//! coordinator.register_file("file_1", "file_1", "hello").unwrap();
//!
//! let report = coordinator.submit_instruction("add a period in file_1").await;
//! println!("{} succeeded, {} failed", report.succeeded(), report.failed());
//! # }
//! ```

pub mod agent;
pub mod aggregator;
pub mod capability;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod types;

// Re-exports for convenience
pub use agent::{strip_code_fence, unified_diff, FileAgent};
pub use aggregator::{aggregate, ResultAggregator};
pub use capability::{
    Candidate, Disambiguation, DisambiguationRequest, LanguageCapability, TargetDisambiguator,
    TransformRequest,
};
pub use config::{EngineConfig, RetryPolicy, WORKING_SET_LIMIT};
pub use coordinator::Coordinator;
pub use error::{
    CapabilityError, ConfigError, ErrorInfo, ErrorKind, RegistryError, ResolutionError,
};
pub use registry::FileRegistry;
pub use resolver::{is_broadcast, IntentResolver};
pub use types::{
    FileId, FileRecord, HistoryEntry, Instruction, InstructionId, OutcomeStatus, Report,
    ResolutionMethod, ResolvedSet, ResolvedTask, TaskOutcome,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving the engine
    pub use crate::{
        Coordinator, EngineConfig, FileId, FileRecord, Instruction, LanguageCapability,
        OutcomeStatus, Report, TargetDisambiguator, TaskOutcome,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
