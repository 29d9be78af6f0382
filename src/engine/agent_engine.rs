//! Bundled execution engine.
//!
//! Runs the task chain strictly sequentially in resolved dependency order.
//! Each task is executed as a bounded reason/act loop against its role's
//! model: the model may request one of the role's tools with a plain-text
//! directive, the tool's observation is fed back, and the loop ends when the
//! model answers without a directive or the role's iteration budget runs
//! out. Model calls are paced to the run's requests-per-minute setting.

use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::LlmError;
use crate::llm::{GenerationRequest, Message};
use crate::tasks::{execution_order, TaskSpec};

use super::{EngineError, ExecutionEngine, PipelineRun, StageOutput};

fn tool_directive() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)^\s*TOOL:\s*(\S+)\s*\n\s*INPUT:\s*(.*)$")
            .expect("tool directive pattern must compile")
    })
}

/// Paces model calls to a requests-per-minute budget.
struct RatePacer {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RatePacer {
    fn new(max_rpm: u32) -> Self {
        Self {
            min_interval: Duration::from_secs_f64(60.0 / max_rpm.max(1) as f64),
            last_call: Mutex::new(None),
        }
    }

    /// Waits until the next call is allowed, then claims the slot.
    async fn acquire(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Sequential reason/act engine backed by each role's model handle.
#[derive(Debug, Default)]
pub struct AgentEngine;

impl AgentEngine {
    /// Creates the engine.
    pub fn new() -> Self {
        Self
    }

    /// Composes the system prompt for a task's role.
    fn system_prompt(task: &TaskSpec) -> String {
        let role = &task.assigned_role;
        let mut prompt = format!(
            "{persona}\n\nYour role: {title}\nYour objective: {objective}",
            persona = role.persona_text,
            title = role.role_title,
            objective = role.objective,
        );

        if !role.tool_bindings.is_empty() {
            prompt.push_str("\n\nYou can use the following tools:\n");
            for tool in &role.tool_bindings {
                prompt.push_str(&format!("- {}: {}\n", tool.name(), tool.description()));
            }
            prompt.push_str(
                "\nTo call a tool, reply with exactly two lines and nothing else:\n\
                 TOOL: <tool name>\n\
                 INPUT: <tool input>\n\
                 The tool result will be returned to you as an observation. \
                 When the task is done, reply with your complete final answer instead.",
            );
        }

        prompt
    }

    /// Composes the user prompt for a task, including upstream context.
    fn user_prompt(task: &TaskSpec, context: &[(&str, &str)]) -> String {
        let mut prompt = format!(
            "{instructions}\n\nExpected output:\n{expected}",
            instructions = task.instructions,
            expected = task.expected_output,
        );

        if !context.is_empty() {
            prompt.push_str("\n\nContext from completed upstream tasks:");
            for (name, raw) in context {
                prompt.push_str(&format!("\n\n### {}\n{}", name, raw));
            }
        }

        prompt
    }

    /// Runs one task's bounded reason/act loop.
    async fn run_task(
        &self,
        task: &TaskSpec,
        context: &[(&str, &str)],
        pacer: &RatePacer,
    ) -> Result<String, LlmError> {
        let role = &task.assigned_role;
        let mut transcript = vec![
            Message::system(Self::system_prompt(task)),
            Message::user(Self::user_prompt(task, context)),
        ];

        let mut last_content = String::new();
        for round in 0..role.iteration_budget.max(1) {
            pacer.acquire().await;

            let response = role
                .model
                .generate(GenerationRequest::new("", transcript.clone()))
                .await?;
            let content = response
                .first_content()
                .ok_or(LlmError::EmptyResponse)?
                .to_string();

            if role.verbose {
                tracing::debug!(
                    task = %task.name,
                    round,
                    content = %content.chars().take(200).collect::<String>(),
                    "Model response"
                );
            }

            let directive = tool_directive()
                .captures(&content)
                .map(|c| (c[1].to_string(), c[2].trim().to_string()));

            match directive {
                Some((tool_name, tool_input)) => {
                    let observation = match role.tool(&tool_name) {
                        Some(tool) => tool.invoke(&tool_input).await,
                        None => format!("Tool '{}' is not available to this role.", tool_name),
                    };

                    tracing::info!(
                        task = %task.name,
                        tool = %tool_name,
                        round,
                        "Tool invoked"
                    );

                    transcript.push(Message::assistant(content.clone()));
                    transcript.push(Message::user(format!("Observation:\n{}", observation)));
                    last_content = content;
                }
                None => return Ok(content),
            }
        }

        tracing::warn!(
            task = %task.name,
            budget = role.iteration_budget,
            "Iteration budget exhausted, terminating stage with last model output"
        );
        Ok(last_content)
    }
}

#[async_trait]
impl ExecutionEngine for AgentEngine {
    async fn execute(&self, run: &PipelineRun) -> Result<Vec<StageOutput>, EngineError> {
        let order = execution_order(&run.tasks)?;

        tracing::info!(
            run_id = %run.id,
            tasks = run.tasks.len(),
            max_rpm = run.settings.max_rpm,
            memory_enabled = run.settings.memory_enabled,
            "Executing task chain"
        );

        let pacer = RatePacer::new(run.settings.max_rpm);
        let mut outputs_by_name: HashMap<String, String> = HashMap::new();
        let mut completed: Vec<StageOutput> = Vec::new();

        for &idx in &order {
            let task = &run.tasks[idx];
            let context: Vec<(&str, &str)> = task
                .upstream
                .iter()
                .filter_map(|name| {
                    outputs_by_name
                        .get(name)
                        .map(|raw| (name.as_str(), raw.as_str()))
                })
                .collect();

            tracing::info!(task = %task.name, role = %task.assigned_role.role_title, "Starting stage");

            match self.run_task(task, &context, &pacer).await {
                Ok(raw) => {
                    outputs_by_name.insert(task.name.clone(), raw.clone());
                    completed.push(StageOutput::new(&task.name, raw));
                }
                Err(e) => {
                    tracing::error!(task = %task.name, error = %e, "Stage failed");
                    return Err(EngineError::StageFailed {
                        stage: task.name.clone(),
                        message: e.to_string(),
                        completed,
                    });
                }
            }
        }

        // Report outputs in declared task order, not execution order.
        Ok(run
            .tasks
            .iter()
            .filter_map(|task| {
                outputs_by_name
                    .get(&task.name)
                    .map(|raw| StageOutput::new(&task.name, raw))
            })
            .collect())
    }
}
