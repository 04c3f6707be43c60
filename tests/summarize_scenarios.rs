use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use recap::config::RecapConfig;
use recap::summarize::heuristic::heuristic_extract;
use recap::summarize::normalize::normalize;
use recap::summarize::{
    CompletionBackend, CompletionRequest, Extractor, GenerationError, GenerationParams,
    OpenAiBackend, SummaryLists, Summarizer,
};

const MEETING_NOTES: &str = "Decisions:\n- We will cap uploads at 50 MB.\nAction Items:\n- @shiva to add PDF parsing — due 2025-10-18\n- @arul to add progress bar\nNotes:\n- Keep temperature low.";

const TRANSCRIPT: &str = "We reviewed the Q3 roadmap with the platform team.\n\
    The group agreed to postpone the billing migration until January.\n\
    Priya will send the revised timeline by Friday.\n\
    Latency on the search endpoint is still above target.";

/// Backend that answers every call with the same reply (or error) and counts calls.
struct Scripted {
    reply: Result<String, GenerationError>,
    calls: AtomicU32,
}

impl Scripted {
    fn ok(body: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(body.to_string()),
            calls: AtomicU32::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: Err(GenerationError::Status {
                status: 503,
                body: "upstream overloaded".to_string(),
            }),
            calls: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CompletionBackend for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    fn complete(&self, _request: &CompletionRequest) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

fn generative_config(retries: u32) -> RecapConfig {
    let mut config = RecapConfig::default();
    config.generation.enabled = true;
    config.generation.retries = retries;
    config.generation.initial_backoff_ms = 0;
    config.generation.max_backoff_ms = 0;
    config
}

fn with_backend(config: &RecapConfig, backend: &Arc<Scripted>) -> Summarizer {
    let backend: Arc<dyn CompletionBackend> = backend.clone();
    Summarizer::new(config, Some(backend))
}

#[test]
fn meeting_notes_without_generation() {
    let summarizer = Summarizer::heuristic(&RecapConfig::default());
    let result = summarizer.build_result(MEETING_NOTES, &GenerationParams::default());

    assert_eq!(result.extractor, Extractor::Heuristic);
    assert!(result
        .decisions
        .iter()
        .any(|d| d.to_lowercase().contains("cap uploads")));
    assert!(result.action_items.iter().any(|a| a.contains("@shiva")));
    assert!(result.markdown.contains("### Decisions"));
    assert!(result.one_liner.chars().count() <= 220);
}

#[test]
fn webvtt_normalizes_to_spoken_lines() {
    let vtt = "WEBVTT\n\n\
        1\n\
        00:00:01.000 --> 00:00:04.000\n\
        Good morning everyone.\n\n\
        2\n\
        00:00:04.500 --> 00:00:08.250\n\
        Let's start with the budget.\n";

    let cleaned = normalize(vtt);
    assert_eq!(cleaned, "Good morning everyone. Let's start with the budget.");
    assert!(!cleaned.contains("-->"));
    assert!(!cleaned.split_whitespace().any(|w| w.chars().all(|c| c.is_ascii_digit())));
}

#[test]
fn always_failing_backend_falls_back_to_heuristic() {
    let backend = Scripted::failing();
    let summarizer = with_backend(&generative_config(3), &backend);

    let lists = summarizer.summarize_text(TRANSCRIPT, &GenerationParams::default());
    assert_eq!(backend.calls(), 3);
    assert_eq!(lists, heuristic_extract(TRANSCRIPT));
    assert_eq!(lists, heuristic_extract(TRANSCRIPT));
    assert!(!lists.is_empty());

    let result = summarizer.build_result(TRANSCRIPT, &GenerationParams::default());
    assert_eq!(result.extractor, Extractor::Heuristic);
    assert_eq!(result.attempts, 3);
}

#[test]
fn missing_credential_counts_as_failed_attempts() {
    let backend = OpenAiBackend::new(
        None,
        "http://127.0.0.1:9/v1",
        "gpt-4o-mini",
        Duration::from_secs(1),
    )
    .unwrap();
    let backend: Arc<dyn CompletionBackend> = Arc::new(backend);
    let summarizer = Summarizer::new(&generative_config(2), Some(backend));

    let result = summarizer.build_result(TRANSCRIPT, &GenerationParams::default());
    assert_eq!(result.extractor, Extractor::Heuristic);
    assert_eq!(result.attempts, 2);
    assert_eq!(result.lists(), heuristic_extract(TRANSCRIPT));
}

#[test]
fn empty_input_short_circuits() {
    let backend = Scripted::failing();
    let summarizer = with_backend(&generative_config(3), &backend);

    for text in ["", "   "] {
        let lists = summarizer.summarize_text(text, &GenerationParams::default());
        assert_eq!(lists, SummaryLists::default());
    }
    assert_eq!(backend.calls(), 0);
}

#[test]
fn generated_reply_is_capped_and_deduped() {
    let many: Vec<String> = (0..15).map(|i| format!("\"Point {i}\"")).collect();
    let reply = format!(
        "```json\n{{\"key_points\": [{}], \"decisions\": [\"Ship it\", \"ship it\", \"  \"], \"action_items\": [], \"extra\": 1}}\n```",
        many.join(", ")
    );
    let backend = Scripted::ok(&reply);
    let summarizer = with_backend(&generative_config(3), &backend);

    let params = GenerationParams {
        model: Some("gpt-4o".to_string()),
        ..Default::default()
    };
    let result = summarizer.build_result(TRANSCRIPT, &params);
    assert_eq!(backend.calls(), 1);
    assert_eq!(result.extractor, Extractor::Generative);
    assert_eq!(result.key_points.len(), 10);
    assert_eq!(result.decisions, vec!["Ship it"]);
    assert!(result.action_items.is_empty());
    assert_eq!(result.model.as_deref(), Some("gpt-4o"));
    assert_eq!(result.one_liner, "We reviewed the Q3 roadmap with the platform team.");
}

#[test]
fn zero_retries_never_calls_backend() {
    let backend = Scripted::ok(r#"{"key_points": [], "decisions": [], "action_items": []}"#);
    let summarizer = with_backend(&generative_config(3), &backend);

    let params = GenerationParams {
        retries: Some(0),
        ..Default::default()
    };
    let result = summarizer.build_result(TRANSCRIPT, &params);
    assert_eq!(backend.calls(), 0);
    assert_eq!(result.extractor, Extractor::Heuristic);
    assert_eq!(result.lists(), heuristic_extract(TRANSCRIPT));
}
