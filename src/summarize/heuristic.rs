//! Rule-based extraction used when no generative backend is available.
//!
//! Lines are classified by the section they sit under (`Decisions:`, `Action Items:`)
//! or, outside such sections, by keyword: decisions first, then action items, then
//! key points. Sentences from the same cleaned lines backfill short lists.

use regex::Regex;
use std::sync::LazyLock;

use super::normalize::clean_lines;
use super::{dedupe_keep_order, SummaryLists};

pub const KEY_POINTS_CAP: usize = 8;
pub const DECISIONS_CAP: usize = 6;
pub const ACTION_ITEMS_CAP: usize = 6;

const KEY_POINTS_MIN: usize = 5;
const DECISIONS_MIN: usize = 2;
const ACTION_ITEMS_MIN: usize = 3;

const KEY_POINT_BACKFILL: usize = 8;
const DECISION_BACKFILL: usize = 5;
const ACTION_BACKFILL: usize = 6;

static DECISION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:decided|decisions?|approved?|agreed|consensus|finali[sz]e[ds]?|confirmed|concluded|resolved|accepted)\b",
    )
    .expect("decision regex")
});

static ACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:to-?dos?|actions?|owners?|assign(?:ed|s)?|due|deadlines?|follow[\s-]?ups?|send|review|update|implement|prepare|fix|deploy|schedule|next steps|to be done|will|shall|must)\b",
    )
    .expect("action regex")
});

static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*•–]|\d+[.)])\s+").expect("bullet regex"));

static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:#{1,6}\s*)?(?P<name>key\s*points|highlights|summary|notes|discussion(?:\s+points)?|decisions?(?:\s+made)?|action\s*items?|next\s*steps|to-?dos?|follow[\s-]?ups?)\s*(?P<colon>:)?$",
    )
    .expect("section regex")
});

// Any markdown heading, or a short label line ending in a colon.
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:#{1,6}\s+\S.*|\p{L}[\p{L}\p{N}'&/ -]*:)$").expect("heading regex")
});

const LABEL_MAX_WORDS: usize = 4;

static SENTENCE_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("sentence regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Neutral,
    Decisions,
    Actions,
}

#[derive(Debug)]
struct Line {
    text: String,
    bullet: bool,
}

/// Detect a section header line. Plain words only count when followed by a colon
/// or written as a markdown heading. Headings with an unknown name close the
/// current section.
fn section_header(line: &str) -> Option<Section> {
    let Some(caps) = SECTION_RE
        .captures(line)
        .filter(|c| c.name("colon").is_some() || line.starts_with('#'))
    else {
        let heading = HEADING_RE.is_match(line)
            && (line.starts_with('#') || line.split_whitespace().count() <= LABEL_MAX_WORDS);
        return heading.then_some(Section::Neutral);
    };
    let name = caps.name("name")?.as_str().to_lowercase();
    let section = if name.starts_with("decision") {
        Section::Decisions
    } else if name.starts_with("action")
        || name.starts_with("next")
        || name.starts_with("to")
        || name.starts_with("follow")
    {
        Section::Actions
    } else {
        Section::Neutral
    };
    Some(section)
}

fn strip_bullet(line: &str) -> Line {
    match BULLET_RE.find(line) {
        Some(m) => Line {
            text: line[m.end()..].trim().to_string(),
            bullet: true,
        },
        None => Line {
            text: line.trim().to_string(),
            bullet: false,
        },
    }
}

/// Split text into sentences on terminal punctuation followed by whitespace.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in SENTENCE_SPLIT_RE.find_iter(text) {
        // keep the punctuation, drop the whitespace
        let end = m.start() + 1;
        push_sentence(&mut sentences, &text[start..end]);
        start = m.end();
    }
    push_sentence(&mut sentences, &text[start..]);
    sentences
}

fn push_sentence(out: &mut Vec<String>, s: &str) {
    let s = s.trim();
    if !s.is_empty() {
        out.push(s.to_string());
    }
}

fn ends_sentence(text: &str) -> bool {
    text.ends_with(['.', '!', '?'])
}

/// Sentence view over the same cleaned lines the classifier sees. List items
/// without terminal punctuation are closed off so they stay separate sentences.
fn sentence_source(lines: &[Line]) -> Vec<String> {
    let joined = lines
        .iter()
        .map(|line| {
            if line.bullet && !ends_sentence(&line.text) {
                format!("{}.", line.text)
            } else {
                line.text.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    split_sentences(&joined)
}

/// Extract key points, decisions and action items from transcript text.
///
/// Deterministic and infallible; an empty input yields empty lists.
pub fn heuristic_extract(text: &str) -> SummaryLists {
    let mut key_points = Vec::new();
    let mut decisions = Vec::new();
    let mut action_items = Vec::new();

    let mut section = Section::Neutral;
    let mut content = Vec::new();

    for raw in clean_lines(text) {
        let line = strip_bullet(&raw);
        if let Some(next) = section_header(&line.text) {
            section = next;
            continue;
        }
        if line.text.is_empty() {
            continue;
        }

        match section {
            Section::Decisions => decisions.push(line.text.clone()),
            Section::Actions => action_items.push(line.text.clone()),
            Section::Neutral => {
                if DECISION_RE.is_match(&line.text) {
                    decisions.push(line.text.clone());
                } else if ACTION_RE.is_match(&line.text) || line.text.contains('@') {
                    action_items.push(line.text.clone());
                } else if line.bullet || line.text.split_whitespace().count() > 6 {
                    key_points.push(line.text.clone());
                }
            }
        }
        content.push(line);
    }

    let sentences = sentence_source(&content);

    if key_points.len() < KEY_POINTS_MIN {
        key_points.extend(sentences.iter().take(KEY_POINT_BACKFILL).cloned());
    }
    if decisions.len() < DECISIONS_MIN {
        decisions.extend(
            sentences
                .iter()
                .filter(|s| DECISION_RE.is_match(s))
                .take(DECISION_BACKFILL)
                .cloned(),
        );
    }
    if action_items.len() < ACTION_ITEMS_MIN {
        action_items.extend(
            sentences
                .iter()
                .filter(|s| ACTION_RE.is_match(s))
                .take(ACTION_BACKFILL)
                .cloned(),
        );
    }

    SummaryLists {
        key_points: dedupe_keep_order(key_points, KEY_POINTS_CAP),
        decisions: dedupe_keep_order(decisions, DECISIONS_CAP),
        action_items: dedupe_keep_order(action_items, ACTION_ITEMS_CAP),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarize::dedupe_key;
    use std::collections::HashSet;

    const NOTES: &str = "Decisions:\n- We will cap uploads at 50 MB.\nAction Items:\n- @shiva to add PDF parsing — due 2025-10-18\n- @arul to add progress bar\nNotes:\n- Keep temperature low.";

    #[test]
    fn sections_route_items() {
        let lists = heuristic_extract(NOTES);
        assert_eq!(lists.decisions.first().map(String::as_str), Some("We will cap uploads at 50 MB."));
        assert!(lists.action_items.iter().any(|a| a.starts_with("@shiva")));
        assert!(lists.action_items.iter().any(|a| a.starts_with("@arul")));
        assert!(lists.key_points.iter().any(|k| k == "Keep temperature low."));
        assert!(!lists.key_points.iter().any(|k| k.eq_ignore_ascii_case("Notes:")));
    }

    #[test]
    fn unknown_headings_close_the_section() {
        let lists = heuristic_extract(
            "## Decisions\n- Ship on Friday\n## Risks\n- Vendor delay may slip the launch by a week\n## Attendees\n- Ana, Bo, Cy",
        );
        assert_eq!(lists.decisions, vec!["Ship on Friday"]);
        assert!(lists
            .key_points
            .contains(&"Vendor delay may slip the launch by a week".to_string()));
        let all = [&lists.key_points, &lists.decisions, &lists.action_items];
        assert!(all.iter().flat_map(|l| l.iter()).all(|item| !item.contains('#')));
        assert!(!all.iter().flat_map(|l| l.iter()).any(|item| item.contains("Risks")));
    }

    #[test]
    fn label_lines_close_the_section() {
        let lists = heuristic_extract(
            "Decisions:\n- Go with vendor A\nOpen questions:\n- Who owns the migration budget next quarter",
        );
        assert_eq!(lists.decisions, vec!["Go with vendor A"]);
        assert!(lists
            .key_points
            .contains(&"Who owns the migration budget next quarter".to_string()));
        assert!(!lists.key_points.iter().any(|k| k.contains("Open questions")));
    }

    #[test]
    fn long_colon_lines_are_content() {
        let lists = heuristic_extract("Decisions:\n- Here is what the group settled on for launch:");
        assert_eq!(lists.decisions, vec!["Here is what the group settled on for launch:"]);
    }

    #[test]
    fn keyword_precedence_outside_sections() {
        let text = "We agreed the launch will slip a week.\nSam will send the revised plan.\nThe customer survey showed strong interest in exports overall.";
        let lists = heuristic_extract(text);
        // decision keywords beat action keywords
        assert_eq!(lists.decisions[0], "We agreed the launch will slip a week.");
        assert_eq!(lists.action_items[0], "Sam will send the revised plan.");
        assert_eq!(
            lists.key_points[0],
            "The customer survey showed strong interest in exports overall."
        );
    }

    #[test]
    fn keywords_are_whole_words() {
        // "willing", "prefix" and "during" must not trigger action items
        let lists = heuristic_extract("Everyone seemed willing to prefix names during demos");
        assert!(lists.action_items.is_empty());
    }

    #[test]
    fn numbered_bullets_are_stripped() {
        let lists = heuristic_extract("1. Hiring plan\n2) Office move");
        assert_eq!(lists.key_points[..2], ["Hiring plan".to_string(), "Office move".to_string()]);
    }

    #[test]
    fn short_plain_lines_are_not_key_points() {
        let lists = heuristic_extract("ok thanks\nsounds good");
        assert!(lists.key_points.iter().all(|k| k.contains(' ')));
        // they still arrive through the sentence backfill as one sentence
        assert_eq!(lists.key_points, vec!["ok thanks sounds good"]);
    }

    #[test]
    fn backfill_adds_matching_sentences() {
        let text = "The plan was approved by finance. Then we talked about hiring. Maria must review the draft.";
        let lists = heuristic_extract(text);
        // the whole line classifies first, then the matching sentence backfills
        assert_eq!(
            lists.decisions,
            vec![text.to_string(), "The plan was approved by finance.".to_string()]
        );
        assert_eq!(lists.action_items, vec!["Maria must review the draft."]);
        assert!(lists.key_points.contains(&"Then we talked about hiring.".to_string()));
    }

    #[test]
    fn backfill_and_lines_share_dedupe_key() {
        let lists = heuristic_extract("- Ship the beta on Friday\n- Ship the beta on Friday.");
        let keys: HashSet<_> = lists.key_points.iter().map(|k| dedupe_key(k)).collect();
        assert_eq!(keys.len(), lists.key_points.len());
        assert_eq!(lists.key_points, vec!["Ship the beta on Friday"]);
    }

    #[test]
    fn caps_are_enforced() {
        let text = (0..40)
            .map(|i| format!("- Item number {i} covers a distinct topic we decided on and will fix"))
            .collect::<Vec<_>>()
            .join("\n");
        let lists = heuristic_extract(&text);
        assert!(lists.key_points.len() <= KEY_POINTS_CAP);
        assert_eq!(lists.decisions.len(), DECISIONS_CAP);
        assert!(lists.action_items.len() <= ACTION_ITEMS_CAP);
    }

    #[test]
    fn empty_input_gives_empty_lists() {
        assert!(heuristic_extract("").is_empty());
        assert!(heuristic_extract("WEBVTT\n\n1\n00:00:01.000 --> 00:00:02.000\n").is_empty());
    }

    #[test]
    fn split_sentences_keeps_punctuation() {
        assert_eq!(
            split_sentences("One. Two?  Three! four"),
            vec!["One.", "Two?", "Three!", "four"]
        );
    }

    #[quickcheck_macros::quickcheck]
    fn prop_lists_are_capped_and_unique(s: String) -> bool {
        let lists = heuristic_extract(&s);
        let unique = |items: &[String]| {
            let keys: HashSet<_> = items.iter().map(|i| dedupe_key(i)).collect();
            keys.len() == items.len() && items.iter().all(|i| !i.trim().is_empty())
        };
        lists.key_points.len() <= KEY_POINTS_CAP
            && lists.decisions.len() <= DECISIONS_CAP
            && lists.action_items.len() <= ACTION_ITEMS_CAP
            && unique(&lists.key_points)
            && unique(&lists.decisions)
            && unique(&lists.action_items)
    }

    #[quickcheck_macros::quickcheck]
    fn prop_deterministic(s: String) -> bool {
        heuristic_extract(&s) == heuristic_extract(&s)
    }
}
