//! LLM integration for brief-forge.
//!
//! Provides an OpenAI-compatible chat-completions client for the supported
//! providers (Gemini via its OpenAI-compatible endpoint, OpenAI) and the
//! process-wide shared model handle used by every capability role.
//!
//! # Shared model handle
//!
//! The model handle is expensive to configure and identical for every role,
//! so it is constructed lazily once per process and reused across pipeline
//! runs. Tests (and provider switches) clear it with an explicit reset:
//!
//! ```ignore
//! use briefforge::llm::{shared_model, reset_shared_model};
//!
//! let model = shared_model()?;      // built on first call
//! let again = shared_model()?;      // identical cached instance
//! reset_shared_model();             // next call constructs a new one
//! ```

pub mod client;
pub mod shared;

pub use client::{
    Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, ModelClient, Usage,
};
pub use shared::{reset_shared_model, shared_model, shared_provider};
