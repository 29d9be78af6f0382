//! Task specifications for the research pipeline.
//!
//! A [`TaskSpec`] is one declared unit of work: free-text instructions, an
//! expected-output contract (used as a prompt constraint, not validated
//! programmatically), the capability role that owns the work, and the
//! upstream tasks whose outputs feed it as context.
//!
//! The builders are pure given their inputs; no network or agent calls
//! happen here. The summarize and deliver builders take their upstream task
//! so the context link is wired at construction time, which keeps the
//! research → summarize → deliver chain acyclic by construction.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use thiserror::Error;

use crate::agents::{CapabilityRole, ReportFormat};

/// Stage name for the web research task.
pub const RESEARCH: &str = "research";
/// Stage name for the summarization task.
pub const SUMMARIZE: &str = "summarize";
/// Stage name for the email delivery task.
pub const DELIVER: &str = "deliver";

/// Errors in a declared task chain.
#[derive(Debug, Error)]
pub enum ChainError {
    /// A task references an upstream name not present in the chain.
    #[error("Task '{task}' references unknown upstream task '{upstream}'")]
    UnknownUpstream { task: String, upstream: String },

    /// Two tasks share a name, making upstream references ambiguous.
    #[error("Duplicate task name '{0}' in chain")]
    DuplicateName(String),

    /// The upstream references form a cycle.
    #[error("Task chain contains a dependency cycle involving '{0}'")]
    Cycle(String),
}

/// One pipeline stage.
pub struct TaskSpec {
    /// Stable stage identifier.
    pub name: String,
    /// Free-text description of the work.
    pub instructions: String,
    /// Free-text contract describing the required output shape.
    pub expected_output: String,
    /// The capability role that executes this task. The pipeline owns the
    /// task; the role is shared and outlives it.
    pub assigned_role: Arc<CapabilityRole>,
    /// Names of tasks whose outputs must be available as context before
    /// this task runs.
    pub upstream: Vec<String>,
}

impl std::fmt::Debug for TaskSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskSpec")
            .field("name", &self.name)
            .field("role", &self.assigned_role.role_title)
            .field("upstream", &self.upstream)
            .finish_non_exhaustive()
    }
}

/// Resolves the execution order of a task chain from its upstream links.
///
/// Returns indices into `tasks` such that every task appears after all of
/// its upstream tasks, preserving declared order among tasks that are ready
/// at the same time. The declared list may arrive in any order; the chain
/// itself must be acyclic and closed over its upstream names.
pub fn execution_order(tasks: &[TaskSpec]) -> Result<Vec<usize>, ChainError> {
    let mut index_by_name: HashMap<&str, usize> = HashMap::new();
    for (i, task) in tasks.iter().enumerate() {
        if index_by_name.insert(task.name.as_str(), i).is_some() {
            return Err(ChainError::DuplicateName(task.name.clone()));
        }
    }

    for task in tasks {
        for upstream in &task.upstream {
            if !index_by_name.contains_key(upstream.as_str()) {
                return Err(ChainError::UnknownUpstream {
                    task: task.name.clone(),
                    upstream: upstream.clone(),
                });
            }
        }
    }

    let mut order = Vec::with_capacity(tasks.len());
    let mut done: HashSet<usize> = HashSet::new();

    while order.len() < tasks.len() {
        let mut advanced = false;
        for (i, task) in tasks.iter().enumerate() {
            if done.contains(&i) {
                continue;
            }
            let ready = task
                .upstream
                .iter()
                .all(|u| done.contains(&index_by_name[u.as_str()]));
            if ready {
                done.insert(i);
                order.push(i);
                advanced = true;
            }
        }
        if !advanced {
            let stuck = tasks
                .iter()
                .enumerate()
                .find(|(i, _)| !done.contains(i))
                .map(|(_, t)| t.name.clone())
                .unwrap_or_default();
            return Err(ChainError::Cycle(stuck));
        }
    }

    Ok(order)
}

/// Builds the web research task.
pub fn build_research_task(
    role: Arc<CapabilityRole>,
    topic: &str,
    num_results: usize,
    focus_areas: Option<&[String]>,
) -> TaskSpec {
    tracing::info!(topic = %topic.chars().take(50).collect::<String>(), "Creating research task");

    let focus_section = match focus_areas {
        Some(areas) if !areas.is_empty() => {
            let bullets: Vec<String> = areas.iter().map(|a| format!("- {}", a)).collect();
            format!("\n\nFocus Areas:\n{}", bullets.join("\n"))
        }
        _ => String::new(),
    };

    let instructions = format!(
        "Conduct comprehensive web research on: {topic}\n\
         \n\
         Research Requirements:\n\
         1. Search for the most current and relevant information\n\
         2. Focus on credible, authoritative sources\n\
         3. Gather information from at least {num_results} different perspectives or sources\n\
         4. Include:\n\
            - Current trends and developments\n\
            - Expert opinions and analysis\n\
            - Key statistics and data points\n\
            - Recent news and announcements\n\
         5. Note publication dates and assess source credibility\n\
         6. Look for both supporting and contrasting viewpoints{focus_section}\n\
         \n\
         Quality Standards:\n\
         - Prioritize recency (prefer sources from the last 12 months)\n\
         - Verify key facts across multiple sources when possible\n\
         - Include direct quotes from experts where available\n\
         - Note any limitations or gaps in available information\n\
         \n\
         Provide detailed findings with proper source citations."
    );

    let expected_output = format!(
        "A comprehensive research report containing:\n\
         - {num_results}+ credible sources with full citations\n\
         - Key findings organized by theme\n\
         - Current trends and developments\n\
         - Expert insights and opinions\n\
         - Data and statistics (with sources)\n\
         - Publication dates for all sources"
    );

    TaskSpec {
        name: RESEARCH.to_string(),
        instructions,
        expected_output,
        assigned_role: role,
        upstream: Vec::new(),
    }
}

/// Structure instructions for the summarization task, keyed by format.
fn structure_instructions(format: ReportFormat) -> &'static str {
    match format {
        ReportFormat::SummaryReport => {
            "Structure your report as:\n\
             1. **Executive Summary** (2-3 sentences)\n\
             2. **Key Findings** (3-5 bullet points with brief explanations)\n\
             3. **Current Trends** (What's happening now)\n\
             4. **Actionable Insights** (What this means for the reader)\n\
             5. **Sources** (List of references used)"
        }
        ReportFormat::DetailedAnalysis => {
            "Structure your report as:\n\
             1. **Executive Overview** (1 paragraph summary)\n\
             2. **Background & Context** (Why this matters)\n\
             3. **Detailed Findings** (Organized by theme with supporting evidence)\n\
             4. **Trend Analysis** (Patterns and trajectories)\n\
             5. **Expert Perspectives** (What thought leaders say)\n\
             6. **Implications & Recommendations** (What to do with this information)\n\
             7. **Appendix: Sources & Methodology**"
        }
        ReportFormat::ExecutiveBrief => {
            "Structure your report as:\n\
             1. **Bottom Line Up Front** (The single most important takeaway)\n\
             2. **Critical Findings** (3 bullet points maximum)\n\
             3. **Business Impact** (Why leadership should care)\n\
             4. **Recommended Actions** (Next steps)\n\
             5. **Key Sources** (2-3 most credible references)\n\
             \n\
             Keep the entire brief to one page maximum."
        }
    }
}

/// Builds the content summarization task, fed by the research task.
pub fn build_summarization_task(
    role: Arc<CapabilityRole>,
    report_format: ReportFormat,
    research_task: &TaskSpec,
) -> TaskSpec {
    tracing::info!(format = %report_format, "Creating summarization task");

    let instructions = format!(
        "Analyze the research findings and create a {report_format}.\n\
         \n\
         Your Task:\n\
         1. Review all research findings provided\n\
         2. Identify the most significant and actionable insights\n\
         3. Synthesize information from multiple sources\n\
         4. Create a well-structured {report_format}\n\
         5. Ensure the output is professional and actionable\n\
         \n\
         {structure}\n\
         \n\
         Writing Guidelines:\n\
         - Use clear, professional language\n\
         - Avoid jargon unless necessary (explain when used)\n\
         - Make the content scannable with headers and bullets\n\
         - Highlight surprising or particularly important findings\n\
         - Be objective and balanced in your analysis\n\
         - Use Markdown formatting for structure",
        structure = structure_instructions(report_format),
    );

    let expected_output = format!(
        "A professionally formatted {report_format} in Markdown with:\n\
         - Clear structure and organization\n\
         - Key insights prominently featured\n\
         - Actionable takeaways\n\
         - Proper source attribution\n\
         - Professional tone suitable for email delivery"
    );

    TaskSpec {
        name: SUMMARIZE.to_string(),
        instructions,
        expected_output,
        assigned_role: role,
        upstream: vec![research_task.name.clone()],
    }
}

/// Builds the email delivery task, fed by the summarization task.
pub fn build_email_task(
    role: Arc<CapabilityRole>,
    recipient_email: &str,
    topic: &str,
    report_format: ReportFormat,
    summarization_task: &TaskSpec,
) -> TaskSpec {
    tracing::info!(recipient = %recipient_email, "Creating email task");

    let instructions = format!(
        "Send a professional email with the research report to: {recipient_email}\n\
         \n\
         Email Requirements:\n\
         1. Subject Line: \"AI Research Report: {topic} - {report_format}\"\n\
         2. Opening: Professional greeting\n\
         3. Introduction: Brief explanation of what this report contains\n\
         4. Body: The complete research summary/analysis\n\
         5. Closing: Professional sign-off with note about AI research methodology\n\
         6. Format: Use Markdown formatting (it will be converted to HTML)\n\
         \n\
         Email Best Practices:\n\
         - Keep the introduction brief (2-3 sentences)\n\
         - Let the research content be the focus\n\
         - Include a call-to-action if appropriate (e.g., \"reply with questions\")\n\
         - Maintain a helpful, professional tone\n\
         - Don't over-explain the AI methodology\n\
         \n\
         Send the email and confirm successful delivery."
    );

    let expected_output = format!(
        "Confirmation that:\n\
         1. Email was composed with proper formatting\n\
         2. Email was successfully sent to {recipient_email}\n\
         3. Subject line follows the specified format\n\
         4. Content includes the full research summary"
    );

    TaskSpec {
        name: DELIVER.to_string(),
        instructions,
        expected_output,
        assigned_role: role,
        upstream: vec![summarization_task.name.clone()],
    }
}
