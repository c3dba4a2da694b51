//! MAFE LLM - Gemini backend for file agents
//!
//! Implements `mafe_core::LanguageCapability` and
//! `mafe_core::TargetDisambiguator` over a `generateContent` HTTP endpoint.
//!
//! # Example
//!
//! ```rust,ignore
//! use mafe_llm::{GeminiCapability, GeminiConfig};
//!
//! let capability = GeminiCapability::new(GeminiConfig::from_env())?;
//! ```

pub mod config;
pub mod error;
pub mod gemini;
pub mod prompt;

pub use config::GeminiConfig;
pub use error::LlmError;
pub use gemini::GeminiCapability;
pub use prompt::{disambiguation_prompt, parse_selection, transform_prompt};
