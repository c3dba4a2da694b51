//! Adapter construction errors
//!
//! Call failures are reported as `mafe_core::CapabilityError`; this covers
//! only what can go wrong before the first call.

/// Errors building a Gemini client
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// No API key configured or in the environment
    #[error("no API key: set GOOGLE_API_KEY or llm.api_key")]
    MissingApiKey,

    /// HTTP client could not be built
    #[error("http client: {0}")]
    Client(#[from] reqwest::Error),
}
