use std::path::Path;

use super::text::filename_to_title;
use super::{Format, TranscriptDoc};

/// Parse a markdown transcript with optional YAML frontmatter.
///
/// Expected format:
/// ```text
/// ---
/// title: Weekly Sync
/// date: 2026-01-15
/// ---
///
/// ## Decisions
/// - Ship on Friday
/// ```
///
/// The frontmatter only supplies the title; the body (headings and bullets intact)
/// becomes the transcript text.
pub fn parse_markdown(content: &str, filepath: &Path) -> TranscriptDoc {
    let (frontmatter, body) = split_frontmatter(content);

    let title = frontmatter
        .and_then(|fm| serde_yaml::from_str::<serde_json::Value>(&fm).ok())
        .and_then(|yaml| {
            yaml.get("title")
                .and_then(|v| v.as_str())
                .map(|s| s.trim().to_string())
        })
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| filename_to_title(filepath));

    TranscriptDoc {
        title,
        source: filepath.display().to_string(),
        format: Format::Markdown,
        text: body.trim().to_string(),
    }
}

fn split_frontmatter(content: &str) -> (Option<String>, &str) {
    let trimmed = content.trim_start();
    if !trimmed.starts_with("---") {
        return (None, content);
    }

    // Find the closing ---
    let after_first = &trimmed[3..];
    if let Some(end) = after_first.find("\n---") {
        let fm = after_first[..end].trim().to_string();
        let body_start = 3 + end + 4; // skip past closing ---
        let body = trimmed.get(body_start..).unwrap_or("");
        (Some(fm), body)
    } else {
        (None, content)
    }
}
