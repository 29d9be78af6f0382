//! Content summarizer role.
//!
//! Works purely from upstream context, so it carries no tools. Its persona
//! is extended with a format-specific instruction block selected by the
//! report format.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::llm::LlmProvider;

use super::{build_role, CapabilityRole, RoleConfig};

const SUMMARIZER_PERSONA: &str = "\
You are a world-class content analyst and strategic communicator with \
extensive experience in business intelligence and executive reporting. Your \
expertise includes:

- Transforming complex research data into clear, actionable insights
- Identifying key patterns, trends, and implications
- Structuring information for different audiences and purposes
- Writing compelling narratives that highlight critical findings
- Providing strategic recommendations based on data analysis

Your approach to content analysis:
1. Review all research findings comprehensively
2. Identify the most significant and actionable insights
3. Organize information in a logical, hierarchical structure
4. Highlight implications and potential impacts
5. Craft recommendations based on evidence

You excel at making complex information accessible and actionable, always \
tailoring your communication style to the intended format and audience.";

/// The closed set of supported report formats.
///
/// Unrecognized names fall back to [`ReportFormat::SummaryReport`] so a typo
/// in a caller-supplied format string selects the safe default instead of
/// silently altering behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    SummaryReport,
    DetailedAnalysis,
    ExecutiveBrief,
}

impl ReportFormat {
    /// Resolves a free-form format name, defaulting to the summary report.
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "Detailed Analysis" => ReportFormat::DetailedAnalysis,
            "Executive Brief" => ReportFormat::ExecutiveBrief,
            _ => ReportFormat::SummaryReport,
        }
    }

    /// The display name of the format.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::SummaryReport => "Summary Report",
            ReportFormat::DetailedAnalysis => "Detailed Analysis",
            ReportFormat::ExecutiveBrief => "Executive Brief",
        }
    }

    /// Format-specific requirements appended to the summarizer persona.
    fn requirements(&self) -> &'static str {
        match self {
            ReportFormat::SummaryReport => {
                "\nCreate a concise summary with:\n\
                 - Key Findings (3-5 bullet points)\n\
                 - Main trends and developments\n\
                 - Actionable insights\n\
                 - Source references\n"
            }
            ReportFormat::DetailedAnalysis => {
                "\nCreate a comprehensive analysis with:\n\
                 - Executive overview\n\
                 - Detailed findings with supporting evidence\n\
                 - Trend analysis and implications\n\
                 - Expert opinions and perspectives\n\
                 - Strategic recommendations\n\
                 - Complete source citations\n"
            }
            ReportFormat::ExecutiveBrief => {
                "\nCreate a one-page executive brief with:\n\
                 - Critical headline findings\n\
                 - Business implications\n\
                 - Immediate recommendations\n\
                 - Risk factors (if any)\n\
                 - Key takeaways for leadership\n"
            }
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Creates the content summarizer role for a run.
pub fn summarizer_role(
    settings: &Settings,
    model: Arc<dyn LlmProvider>,
    report_format: ReportFormat,
) -> CapabilityRole {
    tracing::info!(format = %report_format, "Creating summarizer role");

    let persona = format!(
        "{}\n\nCurrent Task Requirements:{}",
        SUMMARIZER_PERSONA,
        report_format.requirements()
    );

    let config = RoleConfig::new(
        "Content Analysis & Summarization Expert",
        format!(
            "Create an exceptional {} that transforms research data into actionable insights",
            report_format
        ),
        persona,
    )
    .with_iteration_budget(3);

    build_role(config, model, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::ScriptedProvider;

    #[test]
    fn format_lookup_resolves_known_names() {
        assert_eq!(
            ReportFormat::from_name("Detailed Analysis"),
            ReportFormat::DetailedAnalysis
        );
        assert_eq!(
            ReportFormat::from_name("Executive Brief"),
            ReportFormat::ExecutiveBrief
        );
        assert_eq!(
            ReportFormat::from_name("Summary Report"),
            ReportFormat::SummaryReport
        );
    }

    #[test]
    fn format_lookup_defaults_unrecognized_names() {
        assert_eq!(
            ReportFormat::from_name("Quarterly Digest"),
            ReportFormat::SummaryReport
        );
        assert_eq!(ReportFormat::from_name(""), ReportFormat::SummaryReport);
    }

    #[test]
    fn summarizer_has_no_tools_and_format_block() {
        let settings = Settings::default();
        let model = Arc::new(ScriptedProvider::new(vec![]));

        let role = summarizer_role(&settings, model, ReportFormat::ExecutiveBrief);
        assert!(role.tool_bindings.is_empty());
        assert_eq!(role.iteration_budget, 3);
        assert!(role.persona_text.contains("one-page executive brief"));
        assert!(role.objective.contains("Executive Brief"));
    }
}
