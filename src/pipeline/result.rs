//! Result aggregation for pipeline runs.
//!
//! Reduces the engine's ordered per-task output list into one structured
//! [`ResultRecord`]. Position is the integration contract with the engine:
//! index 0 maps to research, 1 to summarize, 2 to deliver. Reordering the
//! task chain means reordering this mapping with it.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::StageOutput;
use crate::tasks::{DELIVER, RESEARCH, SUMMARIZE};

/// Canonical stage names in positional order.
const STAGE_NAMES: [&str; 3] = [RESEARCH, SUMMARIZE, DELIVER];

/// The aggregated outcome of one pipeline run.
///
/// Invariants: on success, `stage_outputs` holds an entry for every stage
/// that produced output. On failure, it holds the strict prefix of stages
/// completed before the failing stage (keys absent, not empty, for stages
/// never reached) and `error_message` is non-empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Whether the whole run completed.
    pub success: bool,
    /// Raw text output per completed stage, keyed by stage name.
    pub stage_outputs: BTreeMap<String, String>,
    /// Failure description, present only when `success` is false.
    pub error_message: Option<String>,
    /// Wall-clock duration of the run, populated regardless of outcome.
    pub elapsed_seconds: f64,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl ResultRecord {
    /// Output of the research stage, if it completed.
    pub fn research_output(&self) -> Option<&str> {
        self.stage_outputs.get(RESEARCH).map(String::as_str)
    }

    /// Output of the summarization stage, if it completed.
    pub fn summary_output(&self) -> Option<&str> {
        self.stage_outputs.get(SUMMARIZE).map(String::as_str)
    }

    /// Output of the email delivery stage, if it completed.
    pub fn email_output(&self) -> Option<&str> {
        self.stage_outputs.get(DELIVER).map(String::as_str)
    }
}

/// Reduces an ordered output list into a result record.
///
/// Outputs are mapped to stage names by position. A shorter-than-expected
/// list (fewer than three outputs) leaves the later stage slots unset
/// rather than failing. `error` marks the run failed; the outputs then
/// represent the prefix completed before the failure.
pub fn aggregate(
    outputs: &[StageOutput],
    elapsed: Duration,
    error: Option<String>,
) -> ResultRecord {
    let mut stage_outputs = BTreeMap::new();
    for (position, output) in outputs.iter().enumerate() {
        let name = STAGE_NAMES
            .get(position)
            .copied()
            .unwrap_or(output.task_name.as_str());
        stage_outputs.insert(name.to_string(), output.raw.clone());
    }

    let success = error.is_none();
    ResultRecord {
        success,
        stage_outputs,
        error_message: error,
        elapsed_seconds: elapsed.as_secs_f64(),
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outputs(names_and_text: &[(&str, &str)]) -> Vec<StageOutput> {
        names_and_text
            .iter()
            .map(|(n, t)| StageOutput::new(*n, *t))
            .collect()
    }

    #[test]
    fn aggregate_maps_outputs_positionally() {
        let record = aggregate(
            &outputs(&[
                ("research", "findings"),
                ("summarize", "summary"),
                ("deliver", "sent"),
            ]),
            Duration::from_secs(12),
            None,
        );

        assert!(record.success);
        assert_eq!(record.research_output(), Some("findings"));
        assert_eq!(record.summary_output(), Some("summary"));
        assert_eq!(record.email_output(), Some("sent"));
        assert!(record.error_message.is_none());
        assert!((record.elapsed_seconds - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn aggregate_short_list_leaves_later_slots_unset() {
        let record = aggregate(
            &outputs(&[("research", "findings")]),
            Duration::from_secs(3),
            None,
        );

        assert_eq!(record.research_output(), Some("findings"));
        assert!(record.summary_output().is_none());
        assert!(record.email_output().is_none());
        assert!(!record.stage_outputs.contains_key("summarize"));
    }

    #[test]
    fn aggregate_failure_keeps_prefix_and_error() {
        let record = aggregate(
            &outputs(&[("research", "findings")]),
            Duration::from_millis(1500),
            Some("Stage 'summarize' failed: model unavailable".to_string()),
        );

        assert!(!record.success);
        assert_eq!(record.research_output(), Some("findings"));
        assert!(record.summary_output().is_none());
        let message = record.error_message.as_deref().unwrap();
        assert!(!message.is_empty());
        assert!(record.elapsed_seconds > 0.0);
    }

    #[test]
    fn aggregate_empty_failure_has_no_outputs() {
        let record = aggregate(&[], Duration::from_secs(1), Some("boom".to_string()));
        assert!(!record.success);
        assert!(record.stage_outputs.is_empty());
    }

    #[test]
    fn aggregate_is_positional_not_name_based() {
        // If the chain were reordered without reordering the mapping, the
        // positional contract governs: index 0 is always recorded as the
        // research slot.
        let record = aggregate(
            &outputs(&[("summarize", "first by position")]),
            Duration::from_secs(1),
            None,
        );
        assert_eq!(record.research_output(), Some("first by position"));
    }

    #[test]
    fn record_serializes_without_absent_keys() {
        let record = aggregate(
            &outputs(&[("research", "findings")]),
            Duration::from_secs(2),
            None,
        );
        let json = serde_json::to_value(&record).expect("record serializes");
        assert!(json["stage_outputs"].get("summarize").is_none());
        assert_eq!(json["stage_outputs"]["research"], "findings");
    }
}
