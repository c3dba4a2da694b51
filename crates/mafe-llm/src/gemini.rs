//! Gemini `generateContent` adapter
//!
//! Implements both engine capability traits over one HTTP client. Failures
//! are classified for the engine's retry policy:
//! - connection errors, 429 and 5xx are `Unavailable` (retried)
//! - client-side timeouts are `Timeout`
//! - blocked prompts and safety stops are `Refused`
//! - anything that does not parse is `Malformed`

use crate::config::GeminiConfig;
use crate::error::LlmError;
use crate::prompt::{disambiguation_prompt, parse_selection, transform_prompt};
use async_trait::async_trait;
use mafe_core::{
    CapabilityError, Disambiguation, DisambiguationRequest, LanguageCapability,
    TargetDisambiguator, TransformRequest,
};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Finish reasons that mean the model declined to answer
const REFUSAL_REASONS: &[&str] = &["SAFETY", "RECITATION", "BLOCKLIST", "PROHIBITED_CONTENT", "SPII"];

// -- generateContent request/response types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseCandidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

/// Language capability backed by a Gemini model
pub struct GeminiCapability {
    client: Client,
    config: GeminiConfig,
    api_key: String,
}

impl GeminiCapability {
    /// Create adapter from configuration
    ///
    /// # Errors
    /// `LlmError::MissingApiKey` if no key is configured.
    pub fn new(config: GeminiConfig) -> Result<Self, LlmError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or(LlmError::MissingApiKey)?;
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    /// Get configuration
    #[must_use]
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Send one single-turn prompt and return the reply text
    async fn generate(
        &self,
        prompt: String,
        timeout: Option<Duration>,
    ) -> Result<String, CapabilityError> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: Some(prompt) }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
            },
        };

        let mut request = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(classify_transport)?;
        let status = response.status();
        let text = response.text().await.map_err(classify_transport)?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "model endpoint returned an error");
            return Err(classify_status(status, &text));
        }

        let parsed: GenerateResponse = serde_json::from_str(&text)
            .map_err(|e| CapabilityError::Malformed(format!("response body: {e}")))?;
        extract_text(parsed)
    }
}

impl std::fmt::Debug for GeminiCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiCapability")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LanguageCapability for GeminiCapability {
    async fn transform(&self, request: TransformRequest) -> Result<String, CapabilityError> {
        tracing::debug!(file_id = %request.file_id, model = %self.config.model, "requesting edit");
        self.generate(transform_prompt(&request), Some(request.timeout))
            .await
    }
}

#[async_trait]
impl TargetDisambiguator for GeminiCapability {
    async fn disambiguate(
        &self,
        request: DisambiguationRequest,
    ) -> Result<Disambiguation, CapabilityError> {
        let reply = self.generate(disambiguation_prompt(&request), None).await?;
        parse_selection(&reply, &request.candidates)
    }
}

fn classify_transport(error: reqwest::Error) -> CapabilityError {
    if error.is_timeout() {
        CapabilityError::Timeout
    } else if error.is_decode() {
        CapabilityError::Malformed(error.to_string())
    } else {
        CapabilityError::Unavailable(error.to_string())
    }
}

/// Map a non-success HTTP status and body onto a capability error
fn classify_status(status: StatusCode, body: &str) -> CapabilityError {
    let detail = serde_json::from_str::<ApiErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());
    let reason = format!("HTTP {}: {detail}", status.as_u16());

    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        CapabilityError::Unavailable(reason)
    } else if status == StatusCode::REQUEST_TIMEOUT {
        CapabilityError::Timeout
    } else {
        CapabilityError::Refused(reason)
    }
}

/// Text of the first candidate, or why there is none
fn extract_text(response: GenerateResponse) -> Result<String, CapabilityError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(CapabilityError::Refused(format!("prompt blocked: {reason}")));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| CapabilityError::Malformed("no candidates in response".to_string()))?;

    if let Some(reason) = candidate
        .finish_reason
        .as_deref()
        .filter(|r| REFUSAL_REASONS.contains(r))
    {
        return Err(CapabilityError::Refused(format!("generation stopped: {reason}")));
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.is_empty() {
        return Err(CapabilityError::Malformed("candidate has no text".to_string()));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn response(json: &str) -> GenerateResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn text_parts_are_concatenated() {
        let parsed = response(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello "},{"text":"world"}]},"finishReason":"STOP"}]}"#,
        );
        assert_eq!(extract_text(parsed).unwrap(), "Hello world");
    }

    #[test]
    fn blocked_prompt_is_refused() {
        let parsed = response(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#);
        assert!(matches!(extract_text(parsed), Err(CapabilityError::Refused(_))));
    }

    #[test]
    fn safety_stop_is_refused() {
        let parsed = response(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#);
        assert!(matches!(extract_text(parsed), Err(CapabilityError::Refused(_))));
    }

    #[test]
    fn empty_candidates_are_malformed() {
        assert!(matches!(
            extract_text(response(r#"{"candidates":[]}"#)),
            Err(CapabilityError::Malformed(_))
        ));
        assert!(matches!(
            extract_text(response(r#"{"candidates":[{"content":{"parts":[]}}]}"#)),
            Err(CapabilityError::Malformed(_))
        ));
    }

    #[test]
    fn overload_is_retryable_and_bad_request_is_not() {
        let overloaded = classify_status(StatusCode::SERVICE_UNAVAILABLE, "");
        assert!(overloaded.is_retryable());
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS, "").is_retryable());

        let rejected = classify_status(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"code":400,"message":"API key not valid"}}"#,
        );
        assert_eq!(
            rejected,
            CapabilityError::Refused("HTTP 400: API key not valid".to_string())
        );
    }

    #[test]
    fn request_uses_camel_case_wire_names() {
        let body = GenerateRequest {
            contents: vec![Content {
                role: Some("user".into()),
                parts: vec![Part { text: Some("hi".into()) }],
            }],
            generation_config: GenerationConfig { temperature: 0.5 },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["generationConfig"]["temperature"], 0.5);
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hi");
    }

    #[test]
    fn missing_key_is_rejected() {
        assert!(matches!(
            GeminiCapability::new(GeminiConfig::default()),
            Err(LlmError::MissingApiKey)
        ));
    }

    #[test]
    fn endpoint_includes_model() {
        let capability = GeminiCapability::new(
            GeminiConfig::default()
                .with_api_key("k")
                .with_base_url("http://localhost:9/v1beta/"),
        )
        .unwrap();
        assert_eq!(
            capability.endpoint(),
            "http://localhost:9/v1beta/models/gemini-2.0-flash-exp:generateContent"
        );
    }
}
