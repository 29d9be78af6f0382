//! Web researcher role.
//!
//! Conducts web research through the search tool, bounded to the requested
//! number of results.

use std::sync::Arc;

use crate::config::Settings;
use crate::llm::LlmProvider;
use crate::tools::SearchTool;

use super::{build_role, CapabilityRole, RoleConfig};

const RESEARCHER_PERSONA: &str = "\
You are an elite web research specialist with over a decade of experience in \
investigative journalism and academic research. Your expertise lies in:

- Finding credible, authoritative sources across the internet
- Distinguishing reliable information from misinformation
- Synthesizing complex data from multiple sources
- Identifying emerging trends and expert opinions
- Fact-checking and source verification

You approach every research task methodically:
1. First, understand the core question and its context
2. Search for primary sources and expert opinions
3. Cross-reference information across multiple sources
4. Note publication dates and source credibility
5. Compile findings with proper citations

You are known for your thoroughness, accuracy, and ability to find \
information others might miss. You always prioritize quality over quantity.";

/// Creates the web researcher role for a run.
///
/// The search tool is limited to `num_results` organic results.
pub fn researcher_role(
    settings: &Settings,
    model: Arc<dyn LlmProvider>,
    topic: &str,
    num_results: usize,
) -> CapabilityRole {
    tracing::info!(topic = %topic.chars().take(50).collect::<String>(), "Creating researcher role");

    let search_tool = Arc::new(SearchTool::from_settings(settings, num_results));

    let config = RoleConfig::new(
        "Senior Web Research Specialist",
        format!("Conduct comprehensive, accurate web research on: {}", topic),
        RESEARCHER_PERSONA,
    )
    .with_tool(search_tool)
    .with_iteration_budget(5);

    build_role(config, model, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::ScriptedProvider;

    #[test]
    fn researcher_binds_search_tool() {
        let settings = Settings::default();
        let model = Arc::new(ScriptedProvider::new(vec![]));

        let role = researcher_role(&settings, model, "electric vehicles", 3);
        assert_eq!(role.role_title, "Senior Web Research Specialist");
        assert!(role.objective.contains("electric vehicles"));
        assert!(role.tool("web_search").is_some());
        assert_eq!(role.iteration_budget, 5);
        assert!(!role.delegation_allowed);
    }
}
