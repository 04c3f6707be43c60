//! Strips caption-container noise (WebVTT/SubRip headers, cue numbers, timing lines)
//! from raw transcript text.

use regex::Regex;
use std::sync::LazyLock;

const BOM: char = '\u{feff}';

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:WEBVTT(?:\s.*)?|Kind:.*|Language:.*)$").expect("header regex")
});

// HH:MM:SS[.,fff] --> HH:MM:SS[.,fff]; WebVTT also allows MM:SS.fff.
static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:\d{1,2}:)?\d{2}:\d{2}(?:[.,]\d{1,3})?\s*-->\s*(?:\d{1,2}:)?\d{2}:\d{2}(?:[.,]\d{1,3})?\b",
    )
    .expect("timestamp regex")
});

static ONLY_DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\s*$").expect("digits regex"));

static MULTI_WS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("whitespace regex"));

fn trim_line(line: &str) -> &str {
    line.trim_matches(|c: char| c.is_whitespace() || c == BOM)
}

/// True when a trimmed line is caption markup rather than spoken content.
fn is_noise(line: &str) -> bool {
    line.is_empty()
        || HEADER_RE.is_match(line)
        || ONLY_DIGITS_RE.is_match(line)
        || TIMESTAMP_RE.is_match(line)
}

/// Cleaned lines with their original line breaks preserved.
///
/// Each line has null bytes removed, BOM and surrounding whitespace trimmed, and
/// internal whitespace runs collapsed. Header, cue-number, timestamp and blank
/// lines are dropped.
pub fn clean_lines(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|raw| {
            let without_nul = raw.replace('\0', "");
            let line = trim_line(&without_nul);
            if is_noise(line) {
                return None;
            }
            Some(MULTI_WS_RE.replace_all(line, " ").into_owned())
        })
        .collect()
}

/// Flatten a transcript into a single whitespace-normalized string.
///
/// `normalize(normalize(s)) == normalize(s)` for every input, and the output is
/// never longer than the input.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let joined = clean_lines(text).join(" ");
    let mut flat = trim_line(&MULTI_WS_RE.replace_all(&joined, " ")).to_string();

    // Joining can glue two content lines into a timing range ("at 00:10:00" +
    // "--> 00:20:00 ..."). Only the range is cut; each pass shrinks the text.
    while TIMESTAMP_RE.is_match(&flat) {
        let cut = TIMESTAMP_RE.replace_all(&flat, " ");
        flat = trim_line(&MULTI_WS_RE.replace_all(&cut, " ")).to_string();
    }

    if is_noise(&flat) {
        return String::new();
    }
    flat
}
