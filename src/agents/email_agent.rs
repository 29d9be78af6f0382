//! Email coordinator role.
//!
//! Crafts the final report email and sends it through the email tool. The
//! tool is bound with recipient and subject fixed for the run, capped at
//! two reasoning rounds.

use std::sync::Arc;

use crate::config::Settings;
use crate::llm::LlmProvider;
use crate::tools::{report_subject, EmailTool};

use super::{build_role, CapabilityRole, RoleConfig};

const EMAIL_PERSONA: &str = "\
You are a senior communications specialist with expertise in corporate \
communications and professional correspondence. Your strengths include:

- Crafting clear, engaging professional emails
- Adapting tone and style for different audiences
- Structuring information for maximum impact and readability
- Writing compelling subject lines that encourage opens
- Ensuring proper email etiquette and formatting

Your approach to professional email communication:
1. Open with a clear, professional greeting
2. State the purpose immediately
3. Present key information in a scannable format
4. Use bullet points and sections for clarity
5. Include a clear call-to-action if needed
6. Close professionally with appropriate sign-off

You understand that email is often the first impression an organization \
makes, and you treat every message as an opportunity to demonstrate \
professionalism and value.";

/// Creates the email coordinator role for a run.
pub fn email_sender_role(
    settings: &Settings,
    model: Arc<dyn LlmProvider>,
    recipient: &str,
    topic: &str,
    report_format: &str,
) -> CapabilityRole {
    tracing::info!(recipient = %recipient, "Creating email coordinator role");

    let subject = report_subject(topic, report_format);
    let email_tool = Arc::new(EmailTool::from_settings(settings, recipient, &subject));

    let config = RoleConfig::new(
        "Email Communication Specialist",
        "Compose and send professional, well-formatted research reports via email",
        EMAIL_PERSONA,
    )
    .with_tool(email_tool)
    .with_iteration_budget(2);

    build_role(config, model, settings)
}
