pub mod generative;
pub mod heuristic;
pub mod normalize;
pub mod one_liner;
pub mod record;
pub mod render;
pub mod retry;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::GenerationConfig;

pub use generative::{CompletionBackend, CompletionRequest, GenerationError, OpenAiBackend};
pub use record::{SummaryRecord, SummaryStatus};
pub use retry::{CancelToken, RetryPolicy, Summarizer};

/// Cap applied to every list the generative backend returns.
pub const GENERATIVE_LIST_CAP: usize = 10;

/// The three structured lists every summary carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryLists {
    pub key_points: Vec<String>,
    pub decisions: Vec<String>,
    pub action_items: Vec<String>,
}

impl SummaryLists {
    pub fn is_empty(&self) -> bool {
        self.key_points.is_empty() && self.decisions.is_empty() && self.action_items.is_empty()
    }
}

/// Per-call overrides. Anything left `None` falls back to the configured default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub retries: Option<u32>,
}

impl GenerationParams {
    pub fn resolve(&self, defaults: &GenerationConfig) -> EffectiveParams {
        let model = self
            .model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .or_else(|| defaults.model.clone().filter(|m| !m.trim().is_empty()));

        let temperature = self.temperature.unwrap_or(defaults.temperature);
        let temperature = if temperature.is_finite() {
            temperature.clamp(0.0, 1.0)
        } else {
            defaults.temperature.clamp(0.0, 1.0)
        };

        EffectiveParams {
            model,
            max_tokens: self.max_tokens.filter(|t| *t > 0).unwrap_or(defaults.max_tokens),
            temperature,
            retries: self.retries.unwrap_or(defaults.retries),
        }
    }
}

/// Parameters actually used for a call, echoed back in the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveParams {
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub retries: u32,
}

/// Which extractor produced the lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extractor {
    Generative,
    #[default]
    Heuristic,
}

impl Extractor {
    pub fn as_str(&self) -> &str {
        match self {
            Extractor::Generative => "generative",
            Extractor::Heuristic => "heuristic",
        }
    }
}

/// UI-facing payload: one-liner, markdown rendering and the raw lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryResult {
    pub one_liner: String,
    pub markdown: String,
    pub key_points: Vec<String>,
    pub decisions: Vec<String>,
    pub action_items: Vec<String>,
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub extractor: Extractor,
    pub attempts: u32,
}

impl SummaryResult {
    pub fn lists(&self) -> SummaryLists {
        SummaryLists {
            key_points: self.key_points.clone(),
            decisions: self.decisions.clone(),
            action_items: self.action_items.clone(),
        }
    }
}

/// Key used for every case-insensitive comparison between list entries.
pub(crate) fn dedupe_key(item: &str) -> String {
    let collapsed = item.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_end_matches(|c: char| matches!(c, '.' | '!' | '?' | ';' | ':' | ',') || c.is_whitespace())
        .to_lowercase()
}

/// Trim entries, drop empties and case-insensitive duplicates, keep first-seen order, cap at `max`.
pub(crate) fn dedupe_keep_order<I, S>(items: I, max: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        if out.len() >= max {
            break;
        }
        let item = item.as_ref().trim();
        let key = dedupe_key(item);
        if key.is_empty() || !seen.insert(key) {
            continue;
        }
        out.push(item.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupe_is_case_insensitive_and_ordered() {
        let out = dedupe_keep_order(["Ship it", "ship IT", "  ", "Review PR", "ship it."], 10);
        assert_eq!(out, vec!["Ship it", "Review PR"]);
    }

    #[test]
    fn dedupe_respects_cap() {
        let items: Vec<String> = (0..20).map(|i| format!("item {i}")).collect();
        assert_eq!(dedupe_keep_order(&items, 6).len(), 6);
    }

    #[test]
    fn resolve_falls_back_to_defaults_and_clamps() {
        let defaults = GenerationConfig::default();
        let params = GenerationParams {
            model: Some("  ".to_string()),
            max_tokens: None,
            temperature: Some(3.5),
            retries: Some(0),
        };
        let eff = params.resolve(&defaults);
        assert_eq!(eff.model, defaults.model);
        assert_eq!(eff.max_tokens, defaults.max_tokens);
        assert_eq!(eff.temperature, 1.0);
        assert_eq!(eff.retries, 0);
    }

    #[test]
    fn partial_result_json_deserializes_with_defaults() {
        let result: SummaryResult = serde_json::from_str(r#"{"one_liner": "Hi"}"#).unwrap();
        assert_eq!(result.one_liner, "Hi");
        assert!(result.key_points.is_empty());
        assert_eq!(result.extractor, Extractor::Heuristic);
    }
}
