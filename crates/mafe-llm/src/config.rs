//! Gemini adapter configuration

use serde::{Deserialize, Serialize};

/// Default model
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variable holding the API key
pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";

/// Environment variable overriding the model
pub const MODEL_VAR: &str = "MAFE_MODEL";

/// Connection settings for a `generateContent` endpoint
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key; falls back to `GOOGLE_API_KEY`
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// API base URL, overridable for testing
    pub base_url: String,
}

impl GeminiConfig {
    /// Defaults overlaid with `GOOGLE_API_KEY` and `MAFE_MODEL`
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_fallback()
    }

    /// Fill unset fields from the process environment
    #[must_use]
    pub fn with_env_fallback(self) -> Self {
        self.with_fallback(|key| std::env::var(key).ok())
    }

    /// Fill unset fields from `lookup`
    ///
    /// The API key is taken only if none is configured; a non-empty model
    /// variable always wins over the default model.
    #[must_use]
    pub fn with_fallback(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if self.api_key.as_deref().map_or(true, str::is_empty) {
            self.api_key = lookup(API_KEY_VAR).filter(|k| !k.is_empty());
        }
        if self.model == DEFAULT_MODEL {
            if let Some(model) = lookup(MODEL_VAR).filter(|m| !m.trim().is_empty()) {
                self.model = model;
            }
        }
        self
    }

    /// With API key
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// With model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// With base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.3,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

// Keeps the key out of logs.
impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_hosted_model() {
        let config = GeminiConfig::default();
        assert_eq!(config.model, "gemini-2.0-flash-exp");
        assert!((config.temperature - 0.3).abs() < f32::EPSILON);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn environment_fills_missing_fields() {
        let config = GeminiConfig::default()
            .with_fallback(env(&[(API_KEY_VAR, "k-1"), (MODEL_VAR, "gemini-pro")]));
        assert_eq!(config.api_key.as_deref(), Some("k-1"));
        assert_eq!(config.model, "gemini-pro");
    }

    #[test]
    fn configured_values_win_over_environment() {
        let config = GeminiConfig::default()
            .with_api_key("from-file")
            .with_model("custom")
            .with_fallback(env(&[(API_KEY_VAR, "k-1"), (MODEL_VAR, "gemini-pro")]));
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
        assert_eq!(config.model, "custom");
    }

    #[test]
    fn debug_redacts_key() {
        let rendered = format!("{:?}", GeminiConfig::default().with_api_key("secret"));
        assert!(!rendered.contains("secret"));
    }
}
