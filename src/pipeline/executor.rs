//! Thin execution adapter around the engine boundary.
//!
//! The executor's only logic is assembling the [`PipelineRun`], reporting
//! progress milestones before and after the engine invocation (never during
//! it, since the engine is opaque), and extracting the ordered output list.
//! It does not retry stage failures; an engine error aborts the remaining
//! stages and is passed up with whatever outputs were completed.

use std::sync::Arc;

use crate::agents::CapabilityRole;
use crate::engine::{EngineError, ExecutionEngine, PipelineRun, RunSettings, StageOutput};
use crate::tasks::TaskSpec;

use super::progress::{milestones, ProgressReporter};

/// Composes roles and tasks into a run and hands it to the engine.
pub struct PipelineExecutor {
    engine: Arc<dyn ExecutionEngine>,
}

impl PipelineExecutor {
    /// Creates an executor over an engine implementation.
    pub fn new(engine: Arc<dyn ExecutionEngine>) -> Self {
        Self { engine }
    }

    /// Executes the task chain and returns the ordered stage outputs.
    ///
    /// # Errors
    ///
    /// Returns the engine's error unchanged; completed stage outputs remain
    /// available through [`EngineError::completed_outputs`].
    pub async fn run(
        &self,
        roles: Vec<Arc<CapabilityRole>>,
        tasks: Vec<TaskSpec>,
        settings: RunSettings,
        progress: &ProgressReporter,
    ) -> Result<Vec<StageOutput>, EngineError> {
        progress.report(milestones::RUN_INITIATED, "Initiating research process...");

        let expected = tasks.len();
        let run = PipelineRun::new(roles, tasks, settings);
        tracing::info!(run_id = %run.id, tasks = expected, "Pipeline run assembled");

        progress.report(milestones::AGENTS_WORKING, "AI agents working on research...");

        let outputs = self.engine.execute(&run).await?;

        progress.report(milestones::FINALIZING, "Finalizing results...");

        if outputs.len() < expected {
            // Tolerated: the aggregator leaves the missing stage slots unset.
            tracing::warn!(
                expected,
                got = outputs.len(),
                "Engine returned fewer outputs than tasks"
            );
        }

        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::agents::test_support::ScriptedProvider;
    use crate::agents::{build_role, RoleConfig};
    use crate::config::Settings;
    use crate::tasks::build_research_task;

    /// Engine stub returning a canned result.
    struct FixedEngine {
        outputs: Vec<StageOutput>,
    }

    #[async_trait]
    impl ExecutionEngine for FixedEngine {
        async fn execute(&self, _run: &PipelineRun) -> Result<Vec<StageOutput>, EngineError> {
            Ok(self.outputs.clone())
        }
    }

    fn fast_settings() -> RunSettings {
        RunSettings {
            max_rpm: 6000,
            memory_enabled: false,
            verbose: false,
        }
    }

    fn single_task() -> (Vec<Arc<CapabilityRole>>, Vec<TaskSpec>) {
        let settings = Settings::default();
        let model = Arc::new(ScriptedProvider::new(vec![]));
        let role = Arc::new(build_role(
            RoleConfig::new("Researcher", "objective", "persona"),
            model,
            &settings,
        ));
        let task = build_research_task(role.clone(), "topic here", 3, None);
        (vec![role], vec![task])
    }

    #[tokio::test]
    async fn executor_reports_milestones_around_engine() {
        let seen: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let progress =
            ProgressReporter::new(Box::new(move |pct, _| sink.lock().unwrap().push(pct)));

        let engine = Arc::new(FixedEngine {
            outputs: vec![StageOutput::new("research", "findings")],
        });
        let executor = PipelineExecutor::new(engine);

        let (roles, tasks) = single_task();
        let outputs = executor
            .run(roles, tasks, fast_settings(), &progress)
            .await
            .expect("run should succeed");

        assert_eq!(outputs.len(), 1);
        assert_eq!(*seen.lock().unwrap(), vec![40, 50, 90]);
    }

    #[tokio::test]
    async fn executor_tolerates_short_output_list() {
        let engine = Arc::new(FixedEngine { outputs: vec![] });
        let executor = PipelineExecutor::new(engine);

        let (roles, tasks) = single_task();
        let outputs = executor
            .run(roles, tasks, fast_settings(), &ProgressReporter::disabled())
            .await
            .expect("short list is not an error");
        assert!(outputs.is_empty());
    }
}
