//! Top-level research workflow service.
//!
//! Coordinates the whole run: builds the capability roles and the task
//! chain from run parameters, executes them through the pipeline executor,
//! and reduces the outcome. Any error during the run is caught exactly once
//! here and converted into a failed [`ResultRecord`] carrying the error
//! message, the elapsed time and whatever stage outputs completed first.
//! The caller always receives a record, never an unhandled error.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::agents::{
    email_sender_role, researcher_role, summarizer_role, CapabilityRole, ReportFormat,
};
use crate::config::{self, ConfigError};
use crate::engine::{AgentEngine, EngineError, ExecutionEngine, RunSettings, StageOutput};
use crate::error::LlmError;
use crate::llm::{self, LlmProvider};
use crate::tasks::{build_email_task, build_research_task, build_summarization_task};

use super::executor::PipelineExecutor;
use super::progress::{milestones, ProgressReporter};
use super::result::{aggregate, ResultRecord};

/// Parameters for one research workflow run.
#[derive(Debug, Clone)]
pub struct RunParams {
    /// Research topic (validated by the caller).
    pub topic: String,
    /// Recipient email address (validated by the caller).
    pub recipient_email: String,
    /// Requested report format name; unrecognized names select the default.
    pub report_format: String,
    /// Number of search results to gather.
    pub num_results: usize,
    /// Optional specific areas to focus the research on.
    pub focus_areas: Option<Vec<String>>,
}

impl RunParams {
    /// Creates run parameters with the default format and result count.
    pub fn new(topic: impl Into<String>, recipient_email: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            recipient_email: recipient_email.into(),
            report_format: "Summary Report".to_string(),
            num_results: 5,
            focus_areas: None,
        }
    }

    /// Sets the report format.
    pub fn with_report_format(mut self, format: impl Into<String>) -> Self {
        self.report_format = format.into();
        self
    }

    /// Sets the number of search results.
    pub fn with_num_results(mut self, num_results: usize) -> Self {
        self.num_results = num_results;
        self
    }

    /// Sets the focus areas.
    pub fn with_focus_areas(mut self, areas: Vec<String>) -> Self {
        self.focus_areas = Some(areas);
        self
    }
}

/// Errors caught at the workflow boundary.
#[derive(Debug, Error)]
enum WorkflowError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Model error: {0}")]
    Llm(#[from] LlmError),

    #[error("{0}")]
    Engine(#[from] EngineError),
}

impl WorkflowError {
    /// Stage outputs completed before the failure.
    fn completed_outputs(&self) -> &[StageOutput] {
        match self {
            WorkflowError::Engine(e) => e.completed_outputs(),
            _ => &[],
        }
    }
}

/// Orchestrates the research → summarize → deliver workflow.
pub struct ResearchService {
    executor: PipelineExecutor,
    model: Option<Arc<dyn LlmProvider>>,
    run_settings: Option<RunSettings>,
    progress: ProgressReporter,
}

impl ResearchService {
    /// Creates a service over the bundled engine and the shared model.
    pub fn new(progress: ProgressReporter) -> Self {
        Self {
            executor: PipelineExecutor::new(Arc::new(AgentEngine::new())),
            model: None,
            run_settings: None,
            progress,
        }
    }

    /// Creates a service with an explicit engine and model handle.
    pub fn with_components(
        engine: Arc<dyn ExecutionEngine>,
        model: Arc<dyn LlmProvider>,
        progress: ProgressReporter,
    ) -> Self {
        Self {
            executor: PipelineExecutor::new(engine),
            model: Some(model),
            run_settings: None,
            progress,
        }
    }

    /// Overrides the run-wide engine settings derived from configuration.
    pub fn with_run_settings(mut self, run_settings: RunSettings) -> Self {
        self.run_settings = Some(run_settings);
        self
    }

    /// Names of required configuration keys that are absent.
    ///
    /// Intended as a pre-flight check: callers should refuse to start a run
    /// while this is non-empty.
    pub fn missing_configuration(&self) -> Result<Vec<String>, ConfigError> {
        Ok(config::settings()?.missing_keys())
    }

    /// Executes the complete research workflow.
    ///
    /// Always returns a [`ResultRecord`]; failures are captured in the
    /// record rather than propagated.
    pub async fn execute_research_workflow(&self, params: &RunParams) -> ResultRecord {
        let start = Instant::now();
        tracing::info!(
            topic = %params.topic.chars().take(50).collect::<String>(),
            recipient = %params.recipient_email,
            format = %params.report_format,
            "Starting research workflow"
        );

        match self.try_run(params).await {
            Ok(outputs) => {
                let record = aggregate(&outputs, start.elapsed(), None);
                self.progress
                    .report(milestones::COMPLETE, "Research complete!");
                tracing::info!(
                    elapsed_seconds = format!("{:.2}", record.elapsed_seconds),
                    "Workflow completed"
                );
                record
            }
            Err(e) => {
                tracing::error!(error = %e, "Workflow failed");
                aggregate(
                    e.completed_outputs(),
                    start.elapsed(),
                    Some(e.to_string()),
                )
            }
        }
    }

    async fn try_run(&self, params: &RunParams) -> Result<Vec<StageOutput>, WorkflowError> {
        let settings = config::settings()?;
        let model = self.model_handle()?;
        let format = ReportFormat::from_name(&params.report_format);

        self.progress
            .report(milestones::TEAM_ASSEMBLED, "Assembling AI research team...");

        let researcher = Arc::new(researcher_role(
            &settings,
            model.clone(),
            &params.topic,
            params.num_results,
        ));
        let summarizer = Arc::new(summarizer_role(&settings, model.clone(), format));
        let emailer = Arc::new(email_sender_role(
            &settings,
            model,
            &params.recipient_email,
            &params.topic,
            format.as_str(),
        ));

        self.progress
            .report(milestones::TASKS_CONFIGURED, "Configuring research tasks...");

        let research = build_research_task(
            researcher.clone(),
            &params.topic,
            params.num_results,
            params.focus_areas.as_deref(),
        );
        let summarize = build_summarization_task(summarizer.clone(), format, &research);
        let deliver = build_email_task(
            emailer.clone(),
            &params.recipient_email,
            &params.topic,
            format,
            &summarize,
        );

        let roles: Vec<Arc<CapabilityRole>> = vec![researcher, summarizer, emailer];
        let tasks = vec![research, summarize, deliver];

        let run_settings = self
            .run_settings
            .clone()
            .unwrap_or_else(|| RunSettings::from_settings(&settings));

        let outputs = self
            .executor
            .run(roles, tasks, run_settings, &self.progress)
            .await?;

        Ok(outputs)
    }

    fn model_handle(&self) -> Result<Arc<dyn LlmProvider>, LlmError> {
        match &self.model {
            Some(model) => Ok(Arc::clone(model)),
            None => llm::shared_provider(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::agents::test_support::ScriptedProvider;

    fn fast_settings() -> RunSettings {
        RunSettings {
            max_rpm: 6000,
            memory_enabled: false,
            verbose: false,
        }
    }

    fn scripted_service(responses: Vec<&'static str>) -> ResearchService {
        let model = Arc::new(ScriptedProvider::new(responses));
        ResearchService::with_components(
            Arc::new(AgentEngine::new()),
            model,
            ProgressReporter::disabled(),
        )
        .with_run_settings(fast_settings())
    }

    fn params() -> RunParams {
        RunParams::new("Electric vehicle battery trends 2025", "analyst@example.com")
            .with_report_format("Executive Brief")
            .with_num_results(3)
    }

    #[tokio::test]
    async fn workflow_success_produces_three_outputs() {
        let _guard = crate::config::ENV_LOCK.lock().unwrap();
        let service = scripted_service(vec!["findings", "summary", "sent"]);
        let record = service.execute_research_workflow(&params()).await;

        assert!(record.success, "error: {:?}", record.error_message);
        assert_eq!(record.research_output(), Some("findings"));
        assert_eq!(record.summary_output(), Some("summary"));
        assert_eq!(record.email_output(), Some("sent"));
        assert!(record.error_message.is_none());
    }

    #[tokio::test]
    async fn workflow_failure_returns_failed_record_with_prefix() {
        let _guard = crate::config::ENV_LOCK.lock().unwrap();
        // Only one scripted response: the summarize stage's model call fails.
        let service = scripted_service(vec!["findings"]);
        let record = service.execute_research_workflow(&params()).await;

        assert!(!record.success);
        assert!(!record.error_message.as_deref().unwrap_or("").is_empty());
        assert!(record.elapsed_seconds > 0.0);
        // The completed prefix survives the failure.
        assert_eq!(record.research_output(), Some("findings"));
        assert!(record.summary_output().is_none());
        assert!(record.email_output().is_none());
    }

    #[tokio::test]
    async fn workflow_reports_all_milestones_in_order() {
        let _guard = crate::config::ENV_LOCK.lock().unwrap();
        let seen: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let model = Arc::new(ScriptedProvider::new(vec!["findings", "summary", "sent"]));
        let service = ResearchService::with_components(
            Arc::new(AgentEngine::new()),
            model,
            ProgressReporter::new(Box::new(move |pct, _| sink.lock().unwrap().push(pct))),
        )
        .with_run_settings(fast_settings());

        let record = service.execute_research_workflow(&params()).await;
        assert!(record.success);
        assert_eq!(*seen.lock().unwrap(), vec![10, 25, 40, 50, 90, 100]);
    }

    #[tokio::test]
    async fn unrecognized_format_falls_back_to_default() {
        let _guard = crate::config::ENV_LOCK.lock().unwrap();
        let service = scripted_service(vec!["findings", "summary", "sent"]);
        let params = RunParams::new("Electric vehicle battery trends 2025", "a@example.com")
            .with_report_format("Quarterly Digest");

        let record = service.execute_research_workflow(&params).await;
        assert!(record.success);
    }
}
