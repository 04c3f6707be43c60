//! Markdown rendering and assembly of the full summary payload.

use super::one_liner::one_liner;
use super::retry::Summarizer;
use super::{GenerationParams, SummaryLists, SummaryResult};

/// Render the one-liner and the non-empty lists as markdown sections.
pub fn render_markdown(one_liner: &str, lists: &SummaryLists) -> String {
    let mut parts: Vec<String> = Vec::new();
    if !one_liner.is_empty() {
        parts.push(format!("**Summary:** {one_liner}"));
        parts.push(String::new());
    }
    for (heading, items) in [
        ("### Key Points", &lists.key_points),
        ("### Decisions", &lists.decisions),
        ("### Action Items", &lists.action_items),
    ] {
        if items.is_empty() {
            continue;
        }
        parts.push(heading.to_string());
        parts.extend(items.iter().map(|item| format!("- {item}")));
        parts.push(String::new());
    }
    parts.join("\n").trim().to_string()
}

impl Summarizer {
    /// Full UI payload: lists from the retry controller, a one-liner and markdown.
    pub fn build_result(&self, raw_text: &str, params: &GenerationParams) -> SummaryResult {
        let effective = self.resolve(params);
        let outcome = self.run(raw_text, &effective);
        let extractor = outcome.extractor();
        let attempts = outcome.attempts();
        let lists = outcome.into_lists();

        let headline = one_liner(
            raw_text,
            &lists.key_points,
            &lists.decisions,
            &lists.action_items,
            self.summary_config().one_liner_max_chars,
        );
        let markdown = render_markdown(&headline, &lists);

        SummaryResult {
            one_liner: headline,
            markdown,
            key_points: lists.key_points,
            decisions: lists.decisions,
            action_items: lists.action_items,
            model: effective.model,
            max_tokens: effective.max_tokens,
            temperature: effective.temperature,
            extractor,
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecapConfig;
    use crate::summarize::Extractor;

    fn lists(kp: &[&str], d: &[&str], a: &[&str]) -> SummaryLists {
        let own = |v: &[&str]| -> Vec<String> { v.iter().map(|s| s.to_string()).collect() };
        SummaryLists {
            key_points: own(kp),
            decisions: own(d),
            action_items: own(a),
        }
    }

    #[test]
    fn markdown_has_all_sections() {
        let md = render_markdown("Quick sync.", &lists(&["A"], &["B"], &["C"]));
        assert_eq!(
            md,
            "**Summary:** Quick sync.\n\n### Key Points\n- A\n\n### Decisions\n- B\n\n### Action Items\n- C"
        );
    }

    #[test]
    fn markdown_omits_empty_sections() {
        let md = render_markdown("", &lists(&[], &["Go"], &[]));
        assert_eq!(md, "### Decisions\n- Go");
        assert_eq!(render_markdown("", &SummaryLists::default()), "");
    }

    #[test]
    fn build_result_echoes_effective_params() {
        let summarizer = Summarizer::heuristic(&RecapConfig::default());
        let params = GenerationParams {
            model: Some("gpt-test".to_string()),
            max_tokens: Some(800),
            temperature: Some(0.1),
            retries: None,
        };
        let result = summarizer.build_result("We agreed to move the launch. Pat will update the site.", &params);
        assert_eq!(result.model.as_deref(), Some("gpt-test"));
        assert_eq!(result.max_tokens, 800);
        assert_eq!(result.temperature, 0.1);
        assert_eq!(result.extractor, Extractor::Heuristic);
        assert_eq!(result.attempts, 0);
        assert_eq!(result.one_liner, "We agreed to move the launch.");
        assert!(result.markdown.starts_with("**Summary:** We agreed to move the launch."));
    }

    #[test]
    fn build_result_on_empty_text() {
        let summarizer = Summarizer::heuristic(&RecapConfig::default());
        let result = summarizer.build_result("  ", &GenerationParams::default());
        assert!(result.one_liner.is_empty());
        assert!(result.markdown.is_empty());
        assert!(result.lists().is_empty());
    }
}
