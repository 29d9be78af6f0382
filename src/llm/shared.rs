//! Process-wide shared model handle.
//!
//! Capability roles are rebuilt for every pipeline run, but they all use the
//! same underlying model client. The handle is constructed lazily from the
//! cached settings on first access and reused until explicitly reset; the
//! write lock guards concurrent first construction.

use std::sync::{Arc, RwLock};

use crate::config;
use crate::error::LlmError;

use super::client::{LlmProvider, ModelClient};

static SHARED_MODEL: RwLock<Option<Arc<ModelClient>>> = RwLock::new(None);

/// Returns the process-wide model handle, constructing it from settings on
/// first call. Repeated calls return the identical instance until
/// [`reset_shared_model`] clears the cache.
///
/// # Errors
///
/// Returns `LlmError::MissingApiKey` if the selected provider's key is not
/// configured, or `LlmError::Configuration` if settings fail to load.
pub fn shared_model() -> Result<Arc<ModelClient>, LlmError> {
    if let Some(cached) = SHARED_MODEL
        .read()
        .expect("shared model lock poisoned")
        .as_ref()
    {
        return Ok(Arc::clone(cached));
    }

    let mut guard = SHARED_MODEL.write().expect("shared model lock poisoned");
    if let Some(cached) = guard.as_ref() {
        return Ok(Arc::clone(cached));
    }

    let settings = config::settings()?;
    tracing::info!(provider = ?settings.llm_provider, model = settings.current_model(), "Initializing shared model handle");

    let client = Arc::new(ModelClient::from_settings(&settings)?);
    *guard = Some(Arc::clone(&client));
    Ok(client)
}

/// Returns the shared model handle as a provider trait object.
pub fn shared_provider() -> Result<Arc<dyn LlmProvider>, LlmError> {
    let model = shared_model()?;
    Ok(model)
}

/// Clears the cached model handle so the next access constructs a new one.
/// Intended for tests and for provider switches at runtime.
pub fn reset_shared_model() {
    *SHARED_MODEL.write().expect("shared model lock poisoned") = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{reset_settings, ENV_LOCK};

    #[test]
    fn shared_model_is_cached_until_reset() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("GOOGLE_API_KEY", "test-key");
        reset_settings();
        reset_shared_model();

        let first = shared_model().expect("model should build");
        let second = shared_model().expect("model should build");
        assert!(Arc::ptr_eq(&first, &second));

        reset_shared_model();
        let third = shared_model().expect("model should build");
        assert!(!Arc::ptr_eq(&first, &third));

        reset_shared_model();
        reset_settings();
        std::env::remove_var("GOOGLE_API_KEY");
    }

    #[test]
    fn shared_model_requires_provider_key() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("GOOGLE_API_KEY");
        std::env::remove_var("LLM_PROVIDER");
        reset_settings();
        reset_shared_model();

        let result = shared_model();
        assert!(matches!(result, Err(LlmError::MissingApiKey(_))));

        reset_settings();
    }
}
