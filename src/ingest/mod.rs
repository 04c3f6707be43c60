pub mod markdown;
pub mod text;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Text,
    Vtt,
    Srt,
    Markdown,
}

impl Format {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(Format::Text),
            "vtt" | "webvtt" => Some(Format::Vtt),
            "srt" | "subrip" => Some(Format::Srt),
            "markdown" | "md" => Some(Format::Markdown),
            _ => None,
        }
    }

    pub fn detect_from_extension(path: &Path) -> Option<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("txt" | "text") => Some(Format::Text),
            Some("vtt") => Some(Format::Vtt),
            Some("srt") => Some(Format::Srt),
            Some("md" | "markdown") => Some(Format::Markdown),
            _ => None,
        }
    }

    /// Guess from content, used for stdin.
    pub fn sniff(content: &str) -> Self {
        let trimmed = content.trim_start_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
        let mut lines = trimmed.lines().map(str::trim);
        let first = lines.next().unwrap_or_default();
        let second = lines.next().unwrap_or_default();

        if first.to_uppercase().starts_with("WEBVTT") {
            Format::Vtt
        } else if first.chars().all(|c| c.is_ascii_digit()) && !first.is_empty() && second.contains("-->") {
            Format::Srt
        } else if first == "---" {
            Format::Markdown
        } else {
            Format::Text
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Format::Text => "text",
            Format::Vtt => "vtt",
            Format::Srt => "srt",
            Format::Markdown => "markdown",
        }
    }
}

/// A transcript resolved to text, ready for summarization.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptDoc {
    pub title: String,
    pub source: String,
    pub format: Format,
    pub text: String,
}

/// Expand files, directories (recursively, known extensions only) and glob patterns
/// into a sorted, de-duplicated list of transcript files.
pub fn collect_paths(paths: &[String], format_override: Option<Format>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path_str in paths {
        let path = Path::new(path_str);
        if path.is_dir() {
            collect_directory(path, format_override, &mut files)?;
        } else if path.is_file() {
            files.push(path.to_path_buf());
        } else {
            // Try glob pattern
            let matches: Vec<_> = glob::glob(path_str)
                .with_context(|| format!("Invalid path or glob pattern: {path_str}"))?
                .filter_map(|r| r.ok())
                .filter(|p| p.is_file())
                .collect();

            if matches.is_empty() {
                bail!("No files found matching: {path_str}");
            }
            files.extend(matches);
        }
    }

    let mut seen = std::collections::HashSet::new();
    files.retain(|p| seen.insert(p.clone()));
    Ok(files)
}

fn collect_directory(dir: &Path, format_override: Option<Format>, out: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .filter_map(|e| e.ok())
        .collect();
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            collect_directory(&path, format_override, out)?;
        } else if path.is_file()
            && (format_override.is_some() || Format::detect_from_extension(&path).is_some())
        {
            out.push(path);
        }
    }
    Ok(())
}

/// Read one transcript file. Bytes that aren't valid UTF-8 are replaced, not rejected.
pub fn load_file(path: &Path, format_override: Option<Format>) -> Result<TranscriptDoc> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read: {}", path.display()))?;
    let content = String::from_utf8_lossy(&bytes);

    let format = format_override
        .or_else(|| Format::detect_from_extension(path))
        .unwrap_or_else(|| Format::sniff(&content));

    let doc = parse_content(&content, path, format);
    debug!(path = %path.display(), format = format.as_str(), chars = doc.text.len(), "loaded transcript");
    Ok(doc)
}

/// Read a transcript from stdin.
pub fn load_stdin(format_override: Option<Format>) -> Result<TranscriptDoc> {
    let mut bytes = Vec::new();
    std::io::stdin()
        .read_to_end(&mut bytes)
        .context("Failed to read from stdin")?;
    let content = String::from_utf8_lossy(&bytes);

    let format = format_override.unwrap_or_else(|| Format::sniff(&content));
    let doc = parse_content(&content, Path::new("stdin"), format);
    info!(format = format.as_str(), chars = doc.text.len(), "read transcript from stdin");
    Ok(doc)
}

pub fn parse_content(content: &str, path: &Path, format: Format) -> TranscriptDoc {
    match format {
        Format::Markdown => markdown::parse_markdown(content, path),
        Format::Text | Format::Vtt | Format::Srt => text::parse_text(content, path, format),
    }
}
