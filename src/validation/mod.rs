//! Input validation for user-supplied run parameters.
//!
//! These validators sanitize the strings a run is parameterized with
//! (recipient email, research topic) before the pipeline starts. They
//! return a result object rather than raising: callers must check
//! [`ValidationOutcome::is_valid`] before using the sanitized value.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default minimum topic length in characters.
pub const DEFAULT_MIN_TOPIC_LEN: usize = 5;
/// Default maximum topic length in characters.
pub const DEFAULT_MAX_TOPIC_LEN: usize = 500;

/// Result of a validation check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// Whether the input passed validation.
    pub is_valid: bool,
    /// The sanitized value (best-effort even on failure).
    pub value: String,
    /// Human-readable error, present only when invalid.
    pub error: Option<String>,
}

impl ValidationOutcome {
    fn valid(value: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            value: value.into(),
            error: None,
        }
    }

    fn invalid(value: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            value: value.into(),
            error: Some(error.into()),
        }
    }
}

/// Domains frequently mistyped for a well-known mail provider.
///
/// A match produces a suggestion instead of silently auto-correcting.
const COMMON_DOMAIN_TYPOS: &[(&str, &str)] = &[
    ("gmial.com", "gmail.com"),
    ("gmal.com", "gmail.com"),
    ("gamil.com", "gmail.com"),
    ("yaho.com", "yahoo.com"),
    ("hotmal.com", "hotmail.com"),
];

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // RFC 5322, simplified.
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
            .expect("email pattern must compile")
    })
}

fn whitespace_runs() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern must compile"))
}

fn injection_signatures() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [r"(?i)<script", r"(?i)javascript:", r"(?i)on\w+\s*="]
            .iter()
            .map(|p| Regex::new(p).expect("injection pattern must compile"))
            .collect()
    })
}

/// Validates an email address.
///
/// Trims and lowercases the input, checks it against a simplified RFC 5322
/// pattern, and flags domains from a fixed typo table with a "did you mean"
/// suggestion. Deterministic, no side effects.
pub fn validate_email(email: &str) -> ValidationOutcome {
    if email.is_empty() {
        return ValidationOutcome::invalid("", "Email address is required");
    }

    let email = email.trim().to_lowercase();

    if !email_pattern().is_match(&email) {
        return ValidationOutcome::invalid(
            email,
            "Invalid email format. Please enter a valid email address.",
        );
    }

    // The pattern guarantees exactly the shape local@domain.
    let domain = email.split('@').nth(1).unwrap_or_default().to_string();
    if let Some((typo, correct)) = COMMON_DOMAIN_TYPOS
        .iter()
        .find(|(typo, _)| *typo == domain)
    {
        let suggested = email.replace(typo, correct);
        return ValidationOutcome::invalid(email, format!("Did you mean '{}'?", suggested));
    }

    ValidationOutcome::valid(email)
}

/// Validates a research topic with explicit length bounds.
///
/// Trims the input, collapses internal whitespace runs to single spaces,
/// enforces the length bounds (boundary exact at `min_len`), and rejects
/// markup/script-injection signatures. Not full HTML sanitization.
pub fn validate_topic_with_bounds(topic: &str, min_len: usize, max_len: usize) -> ValidationOutcome {
    if topic.is_empty() {
        return ValidationOutcome::invalid("", "Research topic is required");
    }

    let topic = whitespace_runs()
        .replace_all(topic.trim(), " ")
        .into_owned();

    let len = topic.chars().count();
    if len < min_len {
        return ValidationOutcome::invalid(
            topic,
            format!("Topic must be at least {} characters long", min_len),
        );
    }

    if len > max_len {
        return ValidationOutcome::invalid(
            topic,
            format!("Topic must be less than {} characters", max_len),
        );
    }

    if injection_signatures().iter().any(|p| p.is_match(&topic)) {
        return ValidationOutcome::invalid(topic, "Topic contains invalid characters");
    }

    ValidationOutcome::valid(topic)
}

/// Validates a research topic with the default length bounds.
pub fn validate_topic(topic: &str) -> ValidationOutcome {
    validate_topic_with_bounds(topic, DEFAULT_MIN_TOPIC_LEN, DEFAULT_MAX_TOPIC_LEN)
}

/// Validates the requested number of search results.
pub fn validate_num_results(value: usize, min_val: usize, max_val: usize) -> ValidationOutcome {
    if value < min_val {
        return ValidationOutcome::invalid(
            value.to_string(),
            format!("Value must be at least {}", min_val),
        );
    }

    if value > max_val {
        return ValidationOutcome::invalid(
            value.to_string(),
            format!("Value must be at most {}", max_val),
        );
    }

    ValidationOutcome::valid(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- validate_email ---

    #[test]
    fn email_valid_is_trimmed_and_lowercased() {
        let result = validate_email("  Analyst@Example.COM ");
        assert!(result.is_valid);
        assert_eq!(result.value, "analyst@example.com");
        assert!(result.error.is_none());
    }

    #[test]
    fn email_empty_is_required() {
        let result = validate_email("");
        assert!(!result.is_valid);
        assert_eq!(result.error.as_deref(), Some("Email address is required"));
    }

    #[test]
    fn email_bad_format_rejected() {
        for input in ["not-an-email", "missing@tld", "@example.com", "a b@example.com"] {
            let result = validate_email(input);
            assert!(!result.is_valid, "expected '{}' to be invalid", input);
            assert!(result.error.as_deref().unwrap().contains("Invalid email format"));
        }
    }

    #[test]
    fn email_typo_domain_suggests_correction() {
        let result = validate_email("user@gmial.com");
        assert!(!result.is_valid);
        assert_eq!(
            result.error.as_deref(),
            Some("Did you mean 'user@gmail.com'?")
        );
    }

    #[test]
    fn email_typo_table_covers_all_entries() {
        for (typo, correct) in COMMON_DOMAIN_TYPOS {
            let result = validate_email(&format!("user@{}", typo));
            assert!(!result.is_valid);
            assert!(
                result.error.as_deref().unwrap().contains(correct),
                "suggestion for {} should mention {}",
                typo,
                correct
            );
        }
    }

    // --- validate_topic ---

    #[test]
    fn topic_empty_is_required() {
        let result = validate_topic("");
        assert!(!result.is_valid);
        assert_eq!(result.error.as_deref(), Some("Research topic is required"));
    }

    #[test]
    fn topic_length_boundary_exact_at_min() {
        assert!(!validate_topic("abcd").is_valid);
        assert!(validate_topic("abcde").is_valid);
    }

    #[test]
    fn topic_over_max_rejected() {
        let long = "a".repeat(501);
        let result = validate_topic(&long);
        assert!(!result.is_valid);
        assert!(result.error.as_deref().unwrap().contains("less than 500"));
    }

    #[test]
    fn topic_whitespace_collapsed() {
        let result = validate_topic("  electric   vehicle \t trends ");
        assert!(result.is_valid);
        assert_eq!(result.value, "electric vehicle trends");
    }

    #[test]
    fn topic_script_tag_rejected() {
        let result = validate_topic("<script>alert(1)</script>");
        assert!(!result.is_valid);
        assert_eq!(
            result.error.as_deref(),
            Some("Topic contains invalid characters")
        );
    }

    #[test]
    fn topic_injection_signatures_rejected_case_insensitive() {
        for input in [
            "topic with JAVASCRIPT:alert(1)",
            "topic with onclick= payload",
            "topic with <SCRIPT src=x>",
        ] {
            assert!(!validate_topic(input).is_valid, "expected '{}' rejected", input);
        }
    }

    // --- validate_num_results ---

    #[test]
    fn num_results_bounds() {
        assert!(!validate_num_results(0, 1, 20).is_valid);
        assert!(validate_num_results(1, 1, 20).is_valid);
        assert!(validate_num_results(20, 1, 20).is_valid);
        assert!(!validate_num_results(21, 1, 20).is_valid);
    }
}
