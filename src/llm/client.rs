//! OpenAI-compatible chat-completions client.
//!
//! Both supported providers expose the same chat-completions wire format,
//! so a single client covers them; only the base URL, key and model differ.
//! Transient failures (rate limits, 5xx, network errors) are retried with a
//! fixed small budget before surfacing as an [`LlmError`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::{LlmProviderKind, Settings};
use crate::error::LlmError;

/// HTTP timeout for a single model call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Fixed retry budget for transient failures.
const MAX_RETRIES: u32 = 5;

/// Base delay between retries; doubled on each attempt.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// A message in a conversation with an LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (e.g., "system", "user", "assistant").
    pub role: String,
    /// Content of the message.
    pub content: String,
}

impl Message {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Request for text generation from an LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model identifier; empty means the client's configured default.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<Message>,
    /// Sampling temperature (0.0 - 2.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Maximum number of tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl GenerationRequest {
    /// Create a new generation request with default parameters.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set the temperature for this request.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the max tokens for this request.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Response from an LLM generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Unique identifier for this response.
    pub id: String,
    /// Model that generated this response.
    pub model: String,
    /// Generated choices/completions.
    pub choices: Vec<Choice>,
    /// Token usage statistics.
    pub usage: Usage,
}

impl GenerationResponse {
    /// Get the content of the first choice, if available.
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

/// A single generated choice from the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    /// Index of this choice in the response.
    pub index: u32,
    /// Generated message.
    pub message: Message,
    /// Reason the generation stopped (e.g., "stop", "length").
    pub finish_reason: String,
}

/// Token usage statistics for a generation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Number of tokens in the prompt.
    pub prompt_tokens: u32,
    /// Number of tokens generated.
    pub completion_tokens: u32,
    /// Total tokens used.
    pub total_tokens: u32,
}

/// Trait for LLM providers that can generate text.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a response for the given request.
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError>;
}

/// Chat-completions client configured for one provider.
pub struct ModelClient {
    /// Base URL for the API.
    api_base: String,
    /// API key for authentication.
    api_key: String,
    /// Default model to use for requests.
    default_model: String,
    /// Default sampling temperature applied when a request sets none.
    temperature: f64,
    /// HTTP client for making API requests.
    http_client: Client,
}

impl std::fmt::Debug for ModelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelClient")
            .field("api_base", &self.api_base)
            .field("default_model", &self.default_model)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

impl ModelClient {
    /// Create a client with explicit configuration.
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        default_model: impl Into<String>,
        temperature: f64,
    ) -> Self {
        Self {
            api_base: api_base.into(),
            api_key: api_key.into(),
            default_model: default_model.into(),
            temperature,
            http_client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    /// Create a client for the provider selected in settings.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::MissingApiKey` naming the provider-specific
    /// environment variable when the key is absent.
    pub fn from_settings(settings: &Settings) -> Result<Self, LlmError> {
        let api_key = settings
            .current_api_key()
            .ok_or_else(|| LlmError::MissingApiKey(settings.llm_provider.api_key_var().to_string()))?
            .to_string();

        let api_base = match settings.llm_provider {
            LlmProviderKind::Gemini => {
                "https://generativelanguage.googleapis.com/v1beta/openai".to_string()
            }
            LlmProviderKind::OpenAi => "https://api.openai.com/v1".to_string(),
        };

        // Gemini model ids are configured with a provider prefix
        // ("gemini/gemini-2.5-flash"); the wire format wants the bare id.
        let model = settings
            .current_model()
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();

        Ok(Self::new(api_base, api_key, model, settings.llm_temperature))
    }

    /// Get the API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Get the default model.
    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Performs a single HTTP round trip without retry handling.
    async fn request_once(&self, api_request: &ApiRequest) -> Result<GenerationResponse, LlmError> {
        let url = format!("{}/chat/completions", self.api_base);

        let http_response = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(api_request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = http_response.status();

        if !status.is_success() {
            let status_code = status.as_u16();
            let error_text = http_response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());

            let message = serde_json::from_str::<ApiErrorResponse>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);

            if status_code == 429 {
                return Err(LlmError::RateLimited(message));
            }

            return Err(LlmError::ApiError {
                code: status_code,
                message,
            });
        }

        let api_response: ApiResponse = http_response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        Ok(api_response.into())
    }
}

/// Internal request structure for the chat-completions API.
#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Internal response structure from the chat-completions API.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    #[serde(default)]
    index: u32,
    message: Message,
    #[serde(default)]
    finish_reason: String,
}

impl From<ApiResponse> for GenerationResponse {
    fn from(api: ApiResponse) -> Self {
        GenerationResponse {
            id: api.id,
            model: api.model,
            choices: api
                .choices
                .into_iter()
                .map(|c| Choice {
                    index: c.index,
                    message: c.message,
                    finish_reason: c.finish_reason,
                })
                .collect(),
            usage: api.usage,
        }
    }
}

/// Error response from the API.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Whether an error is worth retrying.
fn is_transient(error: &LlmError) -> bool {
    matches!(
        error,
        LlmError::RateLimited(_)
            | LlmError::RequestFailed(_)
            | LlmError::ApiError { code: 500..=599, .. }
    )
}

#[async_trait]
impl LlmProvider for ModelClient {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model.clone()
        };

        let api_request = ApiRequest {
            model,
            messages: request.messages,
            temperature: request.temperature.or(Some(self.temperature)),
            max_tokens: request.max_tokens,
        };

        let mut last_error = None;
        for attempt in 0..MAX_RETRIES {
            match self.request_once(&api_request).await {
                Ok(response) => return Ok(response),
                Err(e) if is_transient(&e) => {
                    let delay = RETRY_BASE_DELAY * 2u32.saturating_pow(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_retries = MAX_RETRIES,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "Model call failed, retrying"
                    );
                    last_error = Some(e);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(LlmError::EmptyResponse))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    #[test]
    fn message_constructors_set_roles() {
        assert_eq!(Message::system("s").role, "system");
        assert_eq!(Message::user("u").role, "user");
        assert_eq!(Message::assistant("a").role, "assistant");
    }

    #[test]
    fn request_builder_sets_options() {
        let request = GenerationRequest::new("m", vec![Message::user("hi")])
            .with_temperature(0.3)
            .with_max_tokens(100);

        assert_eq!(request.model, "m");
        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.max_tokens, Some(100));
    }

    #[test]
    fn from_settings_requires_api_key() {
        let settings = Settings::default();
        let result = ModelClient::from_settings(&settings);
        assert!(matches!(result, Err(LlmError::MissingApiKey(ref var)) if var == "GOOGLE_API_KEY"));
    }

    #[test]
    fn from_settings_strips_gemini_model_prefix() {
        let settings = Settings {
            google_api_key: Some("key".to_string()),
            ..Settings::default()
        };
        let client = ModelClient::from_settings(&settings).expect("client should build");
        assert_eq!(client.default_model(), "gemini-2.5-flash");
        assert!(client.api_base().contains("generativelanguage"));
    }

    #[test]
    fn first_content_returns_first_choice() {
        let response = GenerationResponse {
            id: "r1".to_string(),
            model: "m".to_string(),
            choices: vec![Choice {
                index: 0,
                message: Message::assistant("hello"),
                finish_reason: "stop".to_string(),
            }],
            usage: Usage::default(),
        };
        assert_eq!(response.first_content(), Some("hello"));
    }

    #[test]
    fn transient_errors_identified() {
        assert!(is_transient(&LlmError::RateLimited("slow down".into())));
        assert!(is_transient(&LlmError::RequestFailed("reset".into())));
        assert!(is_transient(&LlmError::ApiError {
            code: 503,
            message: "unavailable".into()
        }));
        assert!(!is_transient(&LlmError::ApiError {
            code: 401,
            message: "bad key".into()
        }));
        assert!(!is_transient(&LlmError::ParseError("bad json".into())));
    }
}
