use std::path::Path;

use super::{Format, TranscriptDoc};

/// Plain text, WebVTT and SubRip all pass through verbatim; the normalizer strips
/// caption markup later. Title comes from the filename.
pub fn parse_text(content: &str, filepath: &Path, format: Format) -> TranscriptDoc {
    TranscriptDoc {
        title: filename_to_title(filepath),
        source: filepath.display().to_string(),
        format,
        text: content.to_string(),
    }
}

pub(crate) fn filename_to_title(filepath: &Path) -> String {
    filepath
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("Untitled")
        .replace(['-', '_'], " ")
}
