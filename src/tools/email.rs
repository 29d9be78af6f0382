//! Email delivery tool.
//!
//! Accepts a Markdown report body, converts it to HTML and sends it over
//! SMTP with a plain-text alternative. The subject line is fixed at
//! construction time in the literal format
//! `AI Research Report: {topic} - {report_format}`.

use async_trait::async_trait;
use lettre::message::{header, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message as MailMessage, Tokio1Executor};
use pulldown_cmark::{html, Parser};

use crate::config::Settings;
use crate::error::ToolError;

use super::Tool;

/// Prefix carried by every failure message.
const FAILURE_MARKER: &str = "Email delivery failed:";

/// Builds the report subject line in the required literal format.
pub fn report_subject(topic: &str, report_format: &str) -> String {
    format!("AI Research Report: {} - {}", topic, report_format)
}

/// Converts a Markdown body to HTML.
fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new(markdown);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// SMTP-backed email tool with recipient and subject bound up front.
pub struct EmailTool {
    smtp_server: String,
    smtp_port: u16,
    username: Option<String>,
    password: Option<String>,
    recipient: String,
    subject: String,
}

impl std::fmt::Debug for EmailTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailTool")
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("recipient", &self.recipient)
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

impl EmailTool {
    /// Creates an email tool bound to one recipient and subject.
    pub fn from_settings(settings: &Settings, recipient: &str, subject: &str) -> Self {
        Self {
            smtp_server: settings.smtp_server.clone(),
            smtp_port: settings.smtp_port,
            username: settings.email_user.clone(),
            password: settings.email_pass.clone(),
            recipient: recipient.to_string(),
            subject: subject.to_string(),
        }
    }

    /// The subject this tool will send with.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The recipient this tool will send to.
    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    async fn send_report(&self, markdown_body: &str) -> Result<String, ToolError> {
        if markdown_body.trim().is_empty() {
            return Err(ToolError::InvalidInput("email body is empty".to_string()));
        }

        let username = self
            .username
            .as_deref()
            .ok_or_else(|| ToolError::MissingCredentials("EMAIL_USER".to_string()))?;
        let password = self
            .password
            .as_deref()
            .ok_or_else(|| ToolError::MissingCredentials("EMAIL_PASS".to_string()))?;

        let html_body = markdown_to_html(markdown_body);

        let email = MailMessage::builder()
            .from(
                username
                    .parse()
                    .map_err(|e| ToolError::InvalidInput(format!("invalid sender: {}", e)))?,
            )
            .to(self
                .recipient
                .parse()
                .map_err(|e| ToolError::InvalidInput(format!("invalid recipient: {}", e)))?)
            .subject(&self.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(markdown_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )
            .map_err(|e| ToolError::Unexpected(format!("failed to build email: {}", e)))?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.smtp_server)
            .map_err(|e| ToolError::Network(e.to_string()))?
            .port(self.smtp_port)
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();

        tracing::info!(recipient = %self.recipient, subject = %self.subject, "Sending report email");

        mailer
            .send(email)
            .await
            .map_err(|e| ToolError::Network(e.to_string()))?;

        Ok(format!(
            "Email sent to {} with subject '{}'",
            self.recipient, self.subject
        ))
    }
}

#[async_trait]
impl Tool for EmailTool {
    fn name(&self) -> &str {
        "send_email"
    }

    fn description(&self) -> &str {
        "Send the final report to the configured recipient. \
         Input is the complete Markdown body of the email."
    }

    async fn invoke(&self, input: &str) -> String {
        match self.send_report(input).await {
            Ok(confirmation) => confirmation,
            Err(e) => {
                tracing::error!(error = %e, recipient = %self.recipient, "Email delivery failed");
                format!("{} {}", FAILURE_MARKER, e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    #[test]
    fn subject_follows_literal_format() {
        assert_eq!(
            report_subject("Electric vehicle battery trends 2025", "Executive Brief"),
            "AI Research Report: Electric vehicle battery trends 2025 - Executive Brief"
        );
    }

    #[test]
    fn markdown_converts_to_html() {
        let html = markdown_to_html("# Findings\n\n- battery costs fell\n- **demand** rose");
        assert!(html.contains("<h1>Findings</h1>"));
        assert!(html.contains("<li>battery costs fell</li>"));
        assert!(html.contains("<strong>demand</strong>"));
    }

    #[tokio::test]
    async fn invoke_without_credentials_returns_failure_text() {
        let settings = Settings::default();
        let tool = EmailTool::from_settings(
            &settings,
            "analyst@example.com",
            &report_subject("topic here", "Summary Report"),
        );

        let output = tool.invoke("# Report\n\nBody.").await;
        assert!(
            output.starts_with("Email delivery failed:"),
            "got: {}",
            output
        );
        assert!(output.contains("EMAIL_USER"));
    }

    #[tokio::test]
    async fn invoke_rejects_empty_body() {
        let settings = Settings {
            email_user: Some("sender@example.com".to_string()),
            email_pass: Some("secret".to_string()),
            ..Settings::default()
        };
        let tool = EmailTool::from_settings(&settings, "analyst@example.com", "subject");

        let output = tool.invoke("   ").await;
        assert!(output.starts_with("Email delivery failed:"));
    }
}
