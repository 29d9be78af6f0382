//! Progress reporting for pipeline runs.
//!
//! A run reports coarse phase markers at fixed percentages, not fine-grained
//! progress: the engine is a black box for the whole middle of the run. The
//! reporter is decoupled from execution so any front end can subscribe, and
//! it tolerates having no subscriber at all.

/// Fixed milestone percentages and their status messages.
pub mod milestones {
    /// Roles created.
    pub const TEAM_ASSEMBLED: u8 = 10;
    /// Task chain built.
    pub const TASKS_CONFIGURED: u8 = 25;
    /// Run assembled, engine about to be invoked.
    pub const RUN_INITIATED: u8 = 40;
    /// Engine invocation in flight.
    pub const AGENTS_WORKING: u8 = 50;
    /// Engine returned, outputs being aggregated.
    pub const FINALIZING: u8 = 90;
    /// Run finished.
    pub const COMPLETE: u8 = 100;
}

/// Callback receiving `(percentage, message)` progress updates.
pub type ProgressCallback = Box<dyn Fn(u8, &str) + Send + Sync>;

/// Synchronous sink for progress milestones.
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
}

impl ProgressReporter {
    /// Creates a reporter that forwards milestones to `callback`.
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    /// Creates a reporter with no subscriber; milestones are only logged.
    pub fn disabled() -> Self {
        Self { callback: None }
    }

    /// Reports a milestone. `percentage` is clamped to 0-100.
    pub fn report(&self, percentage: u8, message: &str) {
        let percentage = percentage.min(100);
        tracing::info!(percentage, "{}", message);
        if let Some(callback) = &self.callback {
            callback(percentage, message);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn reporter_forwards_to_subscriber() {
        let seen: Arc<Mutex<Vec<(u8, String)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let reporter = ProgressReporter::new(Box::new(move |pct, msg| {
            sink.lock().unwrap().push((pct, msg.to_string()));
        }));

        reporter.report(milestones::TEAM_ASSEMBLED, "Assembling AI research team...");
        reporter.report(milestones::COMPLETE, "Research complete!");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], (10, "Assembling AI research team...".to_string()));
        assert_eq!(seen[1].0, 100);
    }

    #[test]
    fn reporter_without_subscriber_is_noop() {
        let reporter = ProgressReporter::disabled();
        reporter.report(50, "AI agents working on research...");
    }

    #[test]
    fn percentages_clamp_to_100() {
        let seen: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reporter =
            ProgressReporter::new(Box::new(move |pct, _| sink.lock().unwrap().push(pct)));

        reporter.report(250, "overflow");
        assert_eq!(*seen.lock().unwrap(), vec![100]);
    }
}
