//! External tool bindings for capability roles.
//!
//! A tool is an external capability (web search, email delivery) a role may
//! invoke during execution. Tools convert every internal failure into a
//! descriptive text observation instead of returning an error: the reasoning
//! loop sees the failure text and can react to it, and a tool failure never
//! aborts a stage on its own.

pub mod email;
pub mod search;

use async_trait::async_trait;

pub use email::{report_subject, EmailTool};
pub use search::SearchTool;

/// An external capability a role may invoke during execution.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable tool name the model uses to select it.
    fn name(&self) -> &str;

    /// One-line description shown to the model.
    fn description(&self) -> &str;

    /// Executes the tool. Failures are returned as descriptive text,
    /// never as an error.
    async fn invoke(&self, input: &str) -> String;
}
