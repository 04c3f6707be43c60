use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::summarize::{SummaryRecord, SummaryStatus};

/// Truncate a string to fit within max_width (respecting unicode width).
fn truncate(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let cw = UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + cw + 3 > max_width {
            result.push_str("...");
            break;
        }
        result.push(ch);
        width += cw;
    }
    result
}

/// Pad to a display width; `format!` pads by chars, which misaligns wide glyphs.
fn pad(s: &str, width: usize) -> String {
    let shown = truncate(s, width);
    let fill = width.saturating_sub(UnicodeWidthStr::width(shown.as_str()));
    format!("{shown}{}", " ".repeat(fill))
}

/// Render one record as the human-readable card.
pub fn render_record(record: &SummaryRecord) -> String {
    let mut out = Vec::new();
    out.push(format!("=== {} ===", record.title));

    match record.status {
        SummaryStatus::Error => {
            out.push(format!(
                "  error: {}",
                record.error.as_deref().unwrap_or("unknown error")
            ));
            return out.join("\n");
        }
        SummaryStatus::Empty => {
            out.push("  (no usable transcript text)".to_string());
            return out.join("\n");
        }
        SummaryStatus::Ready => {}
    }

    let s = &record.summary;
    if !s.one_liner.is_empty() {
        out.push(String::new());
        out.push(format!("  {}", s.one_liner));
    }

    for (heading, items) in [
        ("Key Points", &s.key_points),
        ("Decisions", &s.decisions),
        ("Action Items", &s.action_items),
    ] {
        if items.is_empty() {
            continue;
        }
        out.push(String::new());
        out.push(format!("{heading}:"));
        out.extend(items.iter().map(|item| format!("  • {item}")));
    }

    out.push(String::new());
    out.push(format!(
        "  via {} ({}, {} attempt{}), source: {}",
        s.extractor.as_str(),
        s.model.as_deref().unwrap_or("default model"),
        s.attempts,
        if s.attempts == 1 { "" } else { "s" },
        record.source
    ));
    out.join("\n")
}

pub fn print_record(record: &SummaryRecord) {
    println!("{}\n", render_record(record));
}

/// Render a batch overview table.
pub fn render_overview(records: &[SummaryRecord]) -> String {
    let mut out = Vec::new();
    out.push(format!(
        "{} transcript{} summarized:\n",
        records.len(),
        if records.len() == 1 { "" } else { "s" }
    ));
    out.push(format!(
        "  {} {} {} {:>4} {:>4} {:>4}",
        pad("TITLE", 34),
        pad("STATUS", 7),
        pad("VIA", 10),
        "KP",
        "DEC",
        "ACT"
    ));
    out.push(format!("  {}", "-".repeat(70)));

    for r in records {
        out.push(format!(
            "  {} {} {} {:>4} {:>4} {:>4}",
            pad(&r.title, 34),
            pad(r.status.as_str(), 7),
            pad(r.summary.extractor.as_str(), 10),
            r.summary.key_points.len(),
            r.summary.decisions.len(),
            r.summary.action_items.len(),
        ));
        if !r.summary.one_liner.is_empty() {
            out.push(format!("    {}", truncate(&r.summary.one_liner, 72)));
        }
    }
    out.join("\n")
}

pub fn print_overview(records: &[SummaryRecord]) {
    println!("{}", render_overview(records));
}
