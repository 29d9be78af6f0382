//! Execution engine boundary.
//!
//! The pipeline hands a [`PipelineRun`] (roles, dependency-linked tasks,
//! run-wide settings) to an [`ExecutionEngine`] and gets back one text
//! output per task. The contract at this boundary:
//!
//! - tasks execute respecting their declared `upstream` order; a task never
//!   runs before all of its upstream tasks have produced output
//! - each upstream task's raw output is fed as contextual input to its
//!   dependents
//! - outputs come back in the same order the tasks were declared
//! - a stage failure aborts the remaining stages, but outputs completed
//!   before the failure are preserved on the error
//!
//! The bundled [`AgentEngine`] satisfies this contract with a bounded
//! reason/act loop per task; anything smarter belongs behind the same trait.

pub mod agent_engine;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::agents::CapabilityRole;
use crate::config::Settings;
use crate::tasks::{ChainError, TaskSpec};

pub use agent_engine::AgentEngine;

/// The raw text output of one completed stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOutput {
    /// Name of the task that produced this output.
    pub task_name: String,
    /// Raw text produced by the stage.
    pub raw: String,
}

impl StageOutput {
    /// Creates a stage output.
    pub fn new(task_name: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            task_name: task_name.into(),
            raw: raw.into(),
        }
    }
}

/// Run-wide settings passed opaquely to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSettings {
    /// Maximum model requests per minute.
    pub max_rpm: u32,
    /// Whether the engine should carry memory across stages.
    pub memory_enabled: bool,
    /// Verbose agent output.
    pub verbose: bool,
}

impl RunSettings {
    /// Derives run settings from application settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_rpm: settings.max_rpm,
            memory_enabled: settings.enable_memory,
            verbose: settings.enable_verbose,
        }
    }
}

/// One execution of the full task chain.
///
/// Constructed per user request and discarded after producing a result;
/// never persisted.
pub struct PipelineRun {
    /// Unique identifier for this run.
    pub id: Uuid,
    /// Ordered task chain (order is the output-position contract).
    pub tasks: Vec<TaskSpec>,
    /// The capability roles participating in this run.
    pub roles: Vec<Arc<CapabilityRole>>,
    /// When the run was constructed.
    pub started_at: DateTime<Utc>,
    /// Run-wide engine settings.
    pub settings: RunSettings,
}

impl PipelineRun {
    /// Creates a run from its roles, tasks and settings.
    pub fn new(roles: Vec<Arc<CapabilityRole>>, tasks: Vec<TaskSpec>, settings: RunSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            tasks,
            roles,
            started_at: Utc::now(),
            settings,
        }
    }
}

impl std::fmt::Debug for PipelineRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineRun")
            .field("id", &self.id)
            .field("tasks", &self.tasks.len())
            .field("roles", &self.roles.len())
            .field("started_at", &self.started_at)
            .field("settings", &self.settings)
            .finish()
    }
}

/// Errors that can occur during engine execution.
///
/// A failed run keeps the outputs of the stages that completed before the
/// failure, so callers can report partial results.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The declared task chain is invalid.
    #[error("Invalid task chain: {0}")]
    Chain(#[from] ChainError),

    /// A stage failed mid-run.
    #[error("Stage '{stage}' failed: {message}")]
    StageFailed {
        stage: String,
        message: String,
        completed: Vec<StageOutput>,
    },
}

impl EngineError {
    /// Outputs of the stages completed before the failure, in execution
    /// order. Empty when the failure preceded any stage output.
    pub fn completed_outputs(&self) -> &[StageOutput] {
        match self {
            EngineError::Chain(_) => &[],
            EngineError::StageFailed { completed, .. } => completed,
        }
    }
}

/// The external execution boundary for a pipeline run.
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Executes all tasks of the run and returns their outputs in declared
    /// task order.
    async fn execute(&self, run: &PipelineRun) -> Result<Vec<StageOutput>, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_settings_derive_from_settings() {
        let settings = Settings {
            max_rpm: 10,
            enable_memory: false,
            enable_verbose: true,
            ..Settings::default()
        };
        let run_settings = RunSettings::from_settings(&settings);
        assert_eq!(run_settings.max_rpm, 10);
        assert!(!run_settings.memory_enabled);
        assert!(run_settings.verbose);
    }

    #[test]
    fn chain_errors_have_no_completed_outputs() {
        let err = EngineError::Chain(ChainError::DuplicateName("research".to_string()));
        assert!(err.completed_outputs().is_empty());
    }

    #[test]
    fn stage_failures_keep_completed_outputs() {
        let err = EngineError::StageFailed {
            stage: "summarize".to_string(),
            message: "model unavailable".to_string(),
            completed: vec![StageOutput::new("research", "findings")],
        };
        assert_eq!(err.completed_outputs().len(), 1);
        assert_eq!(err.completed_outputs()[0].task_name, "research");
        assert!(err.to_string().contains("summarize"));
    }
}
