//! Capability roles for the research pipeline.
//!
//! A capability role is a named behavioral profile: a persona, an objective,
//! the tools it may invoke and an iteration budget for its reasoning loop.
//! Roles are stateless templates re-instantiated for every pipeline run to
//! avoid cross-run leakage; only the underlying model handle is shared
//! process-wide.

pub mod email_agent;
pub mod researcher;
pub mod summarizer;

use std::sync::Arc;

use crate::config::Settings;
use crate::llm::LlmProvider;
use crate::tools::Tool;

pub use email_agent::email_sender_role;
pub use researcher::researcher_role;
pub use summarizer::{summarizer_role, ReportFormat};

/// One behavioral profile in the pipeline.
pub struct CapabilityRole {
    /// Short role title (e.g., "Senior Web Research Specialist").
    pub role_title: String,
    /// What this role is trying to achieve in the current run.
    pub objective: String,
    /// Behavioral prompt describing expertise and approach.
    pub persona_text: String,
    /// External tools the role may invoke; empty for reasoning-only roles.
    pub tool_bindings: Vec<Arc<dyn Tool>>,
    /// Maximum reasoning/tool-call rounds before forced termination.
    pub iteration_budget: usize,
    /// Whether the role may hand work to another role. Always false here.
    pub delegation_allowed: bool,
    /// Verbose agent output.
    pub verbose: bool,
    /// The shared model handle backing this role.
    pub model: Arc<dyn LlmProvider>,
}

impl std::fmt::Debug for CapabilityRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRole")
            .field("role_title", &self.role_title)
            .field("objective", &self.objective)
            .field("tools", &self.tool_bindings.len())
            .field("iteration_budget", &self.iteration_budget)
            .field("delegation_allowed", &self.delegation_allowed)
            .finish_non_exhaustive()
    }
}

impl CapabilityRole {
    /// Looks up a bound tool by name.
    pub fn tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tool_bindings.iter().find(|t| t.name() == name)
    }
}

/// Configuration for assembling one capability role.
pub struct RoleConfig {
    /// Short role title.
    pub role_title: String,
    /// What the role is trying to achieve.
    pub objective: String,
    /// Behavioral prompt text.
    pub persona_text: String,
    /// Tools the role may invoke.
    pub tools: Vec<Arc<dyn Tool>>,
    /// Role-specific default iteration budget.
    pub iteration_budget: usize,
    /// Whether delegation is allowed.
    pub delegation_allowed: bool,
}

impl RoleConfig {
    /// Creates a role configuration with no tools and the common defaults.
    pub fn new(
        role_title: impl Into<String>,
        objective: impl Into<String>,
        persona_text: impl Into<String>,
    ) -> Self {
        Self {
            role_title: role_title.into(),
            objective: objective.into(),
            persona_text: persona_text.into(),
            tools: Vec::new(),
            iteration_budget: 5,
            delegation_allowed: false,
        }
    }

    /// Binds a tool to the role.
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Sets the role-specific iteration budget.
    pub fn with_iteration_budget(mut self, budget: usize) -> Self {
        self.iteration_budget = budget;
        self
    }
}

/// Assembles a capability role from its configuration.
///
/// The global iteration cap from settings, when present, wins over the
/// role-specific default; the verbosity flag is taken from settings.
pub fn build_role(
    config: RoleConfig,
    model: Arc<dyn LlmProvider>,
    settings: &Settings,
) -> CapabilityRole {
    let iteration_budget = settings
        .max_agent_iterations
        .unwrap_or(config.iteration_budget);

    tracing::debug!(
        role = %config.role_title,
        iteration_budget,
        tools = config.tools.len(),
        "Creating capability role"
    );

    CapabilityRole {
        role_title: config.role_title,
        objective: config.objective,
        persona_text: config.persona_text,
        tool_bindings: config.tools,
        iteration_budget,
        delegation_allowed: config.delegation_allowed,
        verbose: settings.enable_verbose,
        model,
    }
}
