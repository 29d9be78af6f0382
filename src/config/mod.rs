//! Application configuration loaded from environment variables.
//!
//! Provides the [`Settings`] struct with typed defaults and validation,
//! a process-wide cached accessor in the same lifecycle as the shared
//! model handle (lazily built, explicitly resettable for tests), and
//! proactive missing-key detection so configuration gaps surface before
//! a pipeline run starts rather than as runtime failures.

use std::str::FromStr;
use std::sync::{Arc, RwLock};

use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Which LLM provider backs the shared model handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProviderKind {
    Gemini,
    OpenAi,
}

impl LlmProviderKind {
    /// Environment variable holding the API key for this provider.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            LlmProviderKind::Gemini => "GOOGLE_API_KEY",
            LlmProviderKind::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl FromStr for LlmProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(LlmProviderKind::Gemini),
            "openai" => Ok(LlmProviderKind::OpenAi),
            other => Err(format!("must be 'gemini' or 'openai', got '{}'", other)),
        }
    }
}

/// Application settings with validation and defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    // LLM settings
    /// API key for Google Gemini models.
    pub google_api_key: Option<String>,
    /// API key for OpenAI models.
    pub openai_api_key: Option<String>,
    /// Which provider to use for the shared model handle.
    pub llm_provider: LlmProviderKind,
    /// Model identifier used when the provider is Gemini.
    pub gemini_model: String,
    /// Model identifier used when the provider is OpenAI.
    pub openai_model: String,
    /// Sampling temperature for model calls (0.0 - 2.0).
    pub llm_temperature: f64,

    // Search settings
    /// API key for the Serper search API.
    pub serper_api_key: Option<String>,

    // Email settings
    /// SMTP account user (also used as the sender address).
    pub email_user: Option<String>,
    /// SMTP account password.
    pub email_pass: Option<String>,
    /// SMTP relay host.
    pub smtp_server: String,
    /// SMTP relay port.
    pub smtp_port: u16,

    // Application settings
    /// Default log level when RUST_LOG is not set.
    pub log_level: String,
    /// Whether the execution engine should carry context between stages
    /// beyond the declared upstream links. Passed through opaquely.
    pub enable_memory: bool,
    /// Verbose agent output.
    pub enable_verbose: bool,
    /// Global cap on reasoning/tool-call rounds per role. When set it wins
    /// over each role's own default budget.
    pub max_agent_iterations: Option<usize>,
    /// Maximum model requests per minute, passed to the execution engine.
    pub max_rpm: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            google_api_key: None,
            openai_api_key: None,
            llm_provider: LlmProviderKind::Gemini,
            gemini_model: "gemini/gemini-2.5-flash".to_string(),
            openai_model: "gpt-4-turbo-preview".to_string(),
            llm_temperature: 0.7,
            serper_api_key: None,
            email_user: None,
            email_pass: None,
            smtp_server: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            log_level: "info".to_string(),
            enable_memory: true,
            enable_verbose: true,
            max_agent_iterations: None,
            max_rpm: 4,
        }
    }
}

impl Settings {
    /// Creates settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `GOOGLE_API_KEY` / `OPENAI_API_KEY`: provider API keys
    /// - `LLM_PROVIDER`: "gemini" or "openai" (default: gemini)
    /// - `GEMINI_MODEL`: model id (default: gemini/gemini-2.5-flash)
    /// - `OPENAI_MODEL`: model id (default: gpt-4-turbo-preview)
    /// - `LLM_TEMPERATURE`: sampling temperature (default: 0.7)
    /// - `SERPER_API_KEY`: search API key
    /// - `EMAIL_USER` / `EMAIL_PASS`: SMTP credentials
    /// - `SMTP_SERVER`: SMTP host (default: smtp.gmail.com)
    /// - `SMTP_PORT`: SMTP port (default: 587)
    /// - `LOG_LEVEL`: default log level (default: info)
    /// - `ENABLE_MEMORY`: engine memory flag (default: true)
    /// - `ENABLE_VERBOSE`: verbose agent output (default: true)
    /// - `MAX_AGENT_ITERATIONS`: global iteration cap, 1-20 (default: unset)
    /// - `MAX_RPM`: model requests per minute (default: 4)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        settings.google_api_key = non_empty_var("GOOGLE_API_KEY");
        settings.openai_api_key = non_empty_var("OPENAI_API_KEY");

        if let Ok(val) = std::env::var("LLM_PROVIDER") {
            settings.llm_provider =
                val.parse()
                    .map_err(|message| ConfigError::InvalidValue {
                        key: "LLM_PROVIDER".to_string(),
                        message,
                    })?;
        }

        if let Ok(val) = std::env::var("GEMINI_MODEL") {
            settings.gemini_model = val;
        }

        if let Ok(val) = std::env::var("OPENAI_MODEL") {
            settings.openai_model = val;
        }

        if let Ok(val) = std::env::var("LLM_TEMPERATURE") {
            settings.llm_temperature = parse_env_value(&val, "LLM_TEMPERATURE")?;
        }

        settings.serper_api_key = non_empty_var("SERPER_API_KEY");
        settings.email_user = non_empty_var("EMAIL_USER");
        settings.email_pass = non_empty_var("EMAIL_PASS");

        if let Ok(val) = std::env::var("SMTP_SERVER") {
            settings.smtp_server = val;
        }

        if let Ok(val) = std::env::var("SMTP_PORT") {
            settings.smtp_port = parse_env_value(&val, "SMTP_PORT")?;
        }

        if let Ok(val) = std::env::var("LOG_LEVEL") {
            settings.log_level = val.to_lowercase();
        }

        if let Ok(val) = std::env::var("ENABLE_MEMORY") {
            settings.enable_memory = parse_env_bool(&val, "ENABLE_MEMORY")?;
        }

        if let Ok(val) = std::env::var("ENABLE_VERBOSE") {
            settings.enable_verbose = parse_env_bool(&val, "ENABLE_VERBOSE")?;
        }

        if let Ok(val) = std::env::var("MAX_AGENT_ITERATIONS") {
            settings.max_agent_iterations = Some(parse_env_value(&val, "MAX_AGENT_ITERATIONS")?);
        }

        if let Ok(val) = std::env::var("MAX_RPM") {
            settings.max_rpm = parse_env_value(&val, "MAX_RPM")?;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.llm_temperature) {
            return Err(ConfigError::ValidationFailed(
                "llm_temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.smtp_server.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "smtp_server cannot be empty".to_string(),
            ));
        }

        if let Some(cap) = self.max_agent_iterations {
            if !(1..=20).contains(&cap) {
                return Err(ConfigError::ValidationFailed(
                    "max_agent_iterations must be between 1 and 20".to_string(),
                ));
            }
        }

        if self.max_rpm == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_rpm must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// The model identifier for the selected provider.
    pub fn current_model(&self) -> &str {
        match self.llm_provider {
            LlmProviderKind::OpenAi => &self.openai_model,
            LlmProviderKind::Gemini => &self.gemini_model,
        }
    }

    /// The API key for the selected provider, if configured.
    pub fn current_api_key(&self) -> Option<&str> {
        match self.llm_provider {
            LlmProviderKind::OpenAi => self.openai_api_key.as_deref(),
            LlmProviderKind::Gemini => self.google_api_key.as_deref(),
        }
    }

    /// Names of required keys that are absent, by environment variable name.
    ///
    /// Checks exactly the set {LLM key (provider-specific), SERPER_API_KEY,
    /// EMAIL_USER, EMAIL_PASS} so callers can report precisely what is
    /// missing before any run starts.
    pub fn missing_keys(&self) -> Vec<String> {
        let mut missing = Vec::new();

        if self.current_api_key().is_none() {
            missing.push(self.llm_provider.api_key_var().to_string());
        }
        if self.serper_api_key.is_none() {
            missing.push("SERPER_API_KEY".to_string());
        }
        if self.email_user.is_none() {
            missing.push("EMAIL_USER".to_string());
        }
        if self.email_pass.is_none() {
            missing.push("EMAIL_PASS".to_string());
        }

        missing
    }
}

/// Reads an environment variable, treating empty values as unset.
fn non_empty_var(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(val) if !val.trim().is_empty() => Some(val),
        _ => None,
    }
}

/// Parses an environment variable value into the target type.
fn parse_env_value<T: FromStr>(val: &str, key: &str) -> Result<T, ConfigError> {
    val.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", val),
    })
}

/// Parses a boolean environment variable ("true"/"false"/"1"/"0").
fn parse_env_bool(val: &str, key: &str) -> Result<bool, ConfigError> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got '{}'", val),
        }),
    }
}

/// Process-wide cached settings, built on first access.
static SETTINGS: RwLock<Option<Arc<Settings>>> = RwLock::new(None);

/// Returns the process-wide settings, loading them from the environment on
/// first call. Subsequent calls return the identical cached instance until
/// [`reset_settings`] clears it.
pub fn settings() -> Result<Arc<Settings>, ConfigError> {
    if let Some(cached) = SETTINGS
        .read()
        .expect("settings lock poisoned")
        .as_ref()
    {
        return Ok(Arc::clone(cached));
    }

    let mut guard = SETTINGS.write().expect("settings lock poisoned");
    // A concurrent caller may have won the race while we waited.
    if let Some(cached) = guard.as_ref() {
        return Ok(Arc::clone(cached));
    }

    let built = Arc::new(Settings::from_env()?);
    *guard = Some(Arc::clone(&built));
    Ok(built)
}

/// Clears the cached settings so the next access reloads the environment.
pub fn reset_settings() {
    *SETTINGS.write().expect("settings lock poisoned") = None;
}

/// Serializes tests that mutate process environment variables.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
