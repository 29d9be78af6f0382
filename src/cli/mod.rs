//! Command-line interface for brief-forge.
//!
//! The CLI is a thin shell over [`ResearchService`]: it validates the user
//! inputs, refuses to start while required configuration is missing, wires
//! a textual progress subscriber, and writes the downloadable artifacts of
//! a successful run.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use crate::export;
use crate::pipeline::{ProgressReporter, ResearchService, RunParams};
use crate::validation::{validate_email, validate_num_results, validate_topic};

/// Research brief pipeline: web research, summarization and email delivery.
#[derive(Debug, Parser)]
#[command(name = "brief-forge", version, about)]
pub struct Cli {
    /// Log level used when RUST_LOG is not set.
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the full research workflow for a topic.
    Run {
        /// Research topic to investigate.
        #[arg(long)]
        topic: String,

        /// Email address the report is delivered to.
        #[arg(long)]
        recipient: String,

        /// Report format: "Summary Report", "Detailed Analysis" or
        /// "Executive Brief".
        #[arg(long, default_value = "Summary Report")]
        format: String,

        /// Number of search results to gather (1-20).
        #[arg(long, default_value_t = 5)]
        num_results: usize,

        /// Optional focus areas (repeatable).
        #[arg(long = "focus")]
        focus_areas: Vec<String>,

        /// Directory the report artifacts are written to.
        #[arg(long, default_value = "./reports")]
        output_dir: PathBuf,
    },

    /// Report which required configuration keys are missing.
    CheckConfig,
}

/// Parses command-line arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Runs the parsed command.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Run {
            topic,
            recipient,
            format,
            num_results,
            focus_areas,
            output_dir,
        } => {
            run_workflow(topic, recipient, format, num_results, focus_areas, output_dir).await
        }
        Command::CheckConfig => check_config(),
    }
}

fn check_config() -> anyhow::Result<()> {
    let service = ResearchService::new(ProgressReporter::disabled());
    let missing = service
        .missing_configuration()
        .context("failed to load configuration")?;

    if missing.is_empty() {
        println!("Configuration complete: all required keys are set.");
    } else {
        println!("Missing required configuration keys:");
        for key in &missing {
            println!("  - {}", key);
        }
    }
    Ok(())
}

async fn run_workflow(
    topic: String,
    recipient: String,
    format: String,
    num_results: usize,
    focus_areas: Vec<String>,
    output_dir: PathBuf,
) -> anyhow::Result<()> {
    // Input validation happens before anything else; the pipeline never
    // starts on invalid input.
    let email = validate_email(&recipient);
    if !email.is_valid {
        bail!("Invalid email: {}", email.error.unwrap_or_default());
    }

    let topic = validate_topic(&topic);
    if !topic.is_valid {
        bail!("Invalid topic: {}", topic.error.unwrap_or_default());
    }

    let count = validate_num_results(num_results, 1, 20);
    if !count.is_valid {
        bail!("Invalid num-results: {}", count.error.unwrap_or_default());
    }

    let service = ResearchService::new(ProgressReporter::new(Box::new(|pct, message| {
        println!("[{:>3}%] {}", pct, message);
    })));

    let missing = service
        .missing_configuration()
        .context("failed to load configuration")?;
    if !missing.is_empty() {
        bail!("Missing required configuration keys: {}", missing.join(", "));
    }

    let mut params = RunParams::new(&topic.value, &email.value)
        .with_report_format(&format)
        .with_num_results(num_results);
    if !focus_areas.is_empty() {
        params = params.with_focus_areas(focus_areas);
    }

    let record = service.execute_research_workflow(&params).await;

    if !record.success {
        bail!(
            "Research workflow failed after {:.2}s: {}",
            record.elapsed_seconds,
            record.error_message.as_deref().unwrap_or("unknown error")
        );
    }

    println!();
    println!(
        "Research workflow completed in {:.2}s",
        record.elapsed_seconds
    );

    if let Some(email_status) = record.email_output() {
        println!();
        println!("Delivery status: {}", email_status);
    }

    let written = export::write_artifacts(&record, &topic.value, &output_dir)
        .context("failed to write report artifacts")?;
    for path in written {
        println!("Wrote {}", path.display());
    }

    Ok(())
}
