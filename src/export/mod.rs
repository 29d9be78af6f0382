//! Downloadable report artifacts.
//!
//! A successful run yields two Markdown artifacts, the research findings
//! and the summary, named from the sanitized topic. Filenames keep
//! alphanumerics, hyphens and underscores; everything else (spaces
//! included) becomes an underscore, and the topic part is truncated to 50
//! characters.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::pipeline::ResultRecord;

/// Maximum length of the topic part of a filename.
const MAX_TOPIC_CHARS: usize = 50;

/// Sanitizes a topic for use in a filename.
pub fn sanitize_topic(topic: &str) -> String {
    let kept: String = topic
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_TOPIC_CHARS)
        .collect();

    kept.trim().replace(' ', "_")
}

/// Filename for the research findings artifact.
pub fn research_report_filename(topic: &str) -> String {
    format!("research_report_{}.md", sanitize_topic(topic))
}

/// Filename for the summary artifact.
pub fn summary_filename(topic: &str) -> String {
    format!("summary_{}.md", sanitize_topic(topic))
}

/// Writes the downloadable artifacts of a successful run into `dir`.
///
/// Returns the paths written. Stages without output are skipped; a failed
/// run writes nothing.
pub fn write_artifacts(
    record: &ResultRecord,
    topic: &str,
    dir: &Path,
) -> io::Result<Vec<PathBuf>> {
    if !record.success {
        return Ok(Vec::new());
    }

    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    if let Some(research) = record.research_output() {
        let path = dir.join(research_report_filename(topic));
        fs::write(&path, research)?;
        written.push(path);
    }

    if let Some(summary) = record.summary_output() {
        let path = dir.join(summary_filename(topic));
        fs::write(&path, summary)?;
        written.push(path);
    }

    tracing::info!(files = written.len(), dir = %dir.display(), "Wrote report artifacts");
    Ok(written)
}
