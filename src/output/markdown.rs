//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of a crawl run,
//! including counts, failed papers, and filename collisions.

use crate::output::traits::{CrawlSummary, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Failed papers listed before the table is cut short
const MAX_LISTED_FAILURES: usize = 50;

/// Generates a markdown summary and writes it to `output_path`
///
/// # Arguments
///
/// * `summary` - The crawl summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(summary: &CrawlSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl summary as markdown
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let mut md = String::new();

    md.push_str("# Cite-Ripple Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Run ID**: {}\n", summary.run_id));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at));
    if let Some(finished) = &summary.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished));
    }
    if let Some(duration) = summary.duration_seconds {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    md.push_str(&format!("- **Status**: {}\n", summary.status));
    md.push_str(&format!("- **Config Hash**: {}\n\n", summary.config_hash));

    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!(
        "- **Papers Written**: {}\n",
        summary.papers_persisted
    ));
    md.push_str(&format!("- **Files on Disk**: {}\n", summary.files_on_disk));
    md.push_str(&format!("- **Papers Failed**: {}\n", summary.papers_failed));
    md.push_str(&format!(
        "- **Papers Overwritten**: {}\n",
        summary.papers_overwritten()
    ));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        summary.success_rate()
    ));

    if !summary.collisions.is_empty() {
        md.push_str("## Filename Collisions\n\n");
        md.push_str("Only the last paper listed for each file is on disk.\n\n");
        md.push_str("| File | Papers |\n");
        md.push_str("|------|--------|\n");

        for collision in &summary.collisions {
            md.push_str(&format!(
                "| {} | {} |\n",
                collision.file_name,
                collision.paper_ids.join(", ")
            ));
        }
        md.push('\n');
    }

    if !summary.failures.is_empty() {
        md.push_str("## Failed Papers\n\n");
        md.push_str("| Paper | Kind | Error |\n");
        md.push_str("|-------|------|-------|\n");

        for failure in summary.failures.iter().take(MAX_LISTED_FAILURES) {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                failure.paper_id, failure.kind, failure.error
            ));
        }
        if summary.failures.len() > MAX_LISTED_FAILURES {
            md.push_str(&format!(
                "\n... and {} more\n",
                summary.failures.len() - MAX_LISTED_FAILURES
            ));
        }
        md.push('\n');
    }

    md
}
