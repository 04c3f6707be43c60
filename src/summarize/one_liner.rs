//! Single-sentence, length-bounded headline for a transcript.

use super::heuristic::split_sentences;
use super::normalize::normalize;

pub const DEFAULT_MAX_CHARS: usize = 220;

const ELLIPSIS: char = '…';
const MIN_LINE_CHARS: usize = 15;
const FALLBACK_PREFIX_CHARS: usize = 300;

/// Build a single headline sentence of at most `max_chars` characters.
///
/// Prefers the first sentence of the transcript, then falls back to the first
/// decent line, then to the first list entry available.
pub fn one_liner(
    raw_text: &str,
    key_points: &[String],
    decisions: &[String],
    action_items: &[String],
    max_chars: usize,
) -> String {
    let cleaned = normalize(raw_text);

    let mut candidate = String::new();
    if !cleaned.is_empty() {
        candidate = split_sentences(&cleaned)
            .into_iter()
            .next()
            .unwrap_or_default();
        if candidate.trim().is_empty() {
            candidate = first_meaningful_line(&cleaned);
        }
    }

    if candidate.trim().is_empty() {
        candidate = [key_points, decisions, action_items]
            .iter()
            .find_map(|list| list.first())
            .cloned()
            .unwrap_or_default();
    }

    let candidate = candidate.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_at_word(&candidate, max_chars)
}

fn first_meaningful_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|l| l.chars().count() >= MIN_LINE_CHARS)
        .unwrap_or_else(|| text.trim())
        .chars()
        .take(FALLBACK_PREFIX_CHARS)
        .collect()
}

/// Cut `text` to fit `max_chars` including the trailing ellipsis, backing up to the
/// last word boundary and dropping dangling punctuation.
pub fn truncate_at_word(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }

    let budget = max_chars - 1;
    let head: String = text.chars().take(budget).collect();
    let next_is_break = text.chars().nth(budget).is_some_and(char::is_whitespace);

    let stem = if next_is_break {
        head.as_str()
    } else {
        match head.rfind(char::is_whitespace) {
            Some(idx) => &head[..idx],
            // one enormous word: nothing better than a hard cut
            None => head.as_str(),
        }
    };
    let stem = stem.trim_end_matches(|c: char| {
        c.is_whitespace() || matches!(c, ',' | ';' | ':' | '.' | '-' | '–' | '—')
    });

    format!("{stem}{ELLIPSIS}")
}
