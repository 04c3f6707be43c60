//! Generative extraction over an OpenAI-compatible chat completions endpoint.
//!
//! The backend is asked for strict JSON with exactly three string lists. Anything
//! else (transport failure, timeout, non-2xx, malformed body) is a
//! [`GenerationError`]; retrying is the caller's job.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::{dedupe_keep_order, SummaryLists, GENERATIVE_LIST_CAP};

pub const SYSTEM_PROMPT: &str = "You extract concise meeting outcomes from noisy transcripts.\n\
Return STRICT JSON with EXACTLY these keys:\n  \
key_points: string[]\n  \
decisions: string[]\n  \
action_items: string[]\n\
Rules:\n\
- Items must be short, scannable, de-duplicated.\n\
- No speaker tags, timestamps, or formatting beyond plain text.";

const USER_AGENT: &str = concat!("recap/", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("no API key configured for the generative backend")]
    MissingCredential,
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("backend returned no content")]
    EmptyResponse,
    #[error("failed to parse backend reply: {0}")]
    Parse(String),
    #[error("generation cancelled")]
    Cancelled,
}

/// One chat request: a system instruction and a user message.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// The network boundary. Implementations return the raw message content.
pub trait CompletionBackend: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Issue exactly one request. No retries.
    fn complete(&self, request: &CompletionRequest) -> Result<String, GenerationError>;
}

/// Build the user message, embedding at most `char_limit` characters of cleaned text.
pub fn user_prompt(cleaned: &str, char_limit: usize) -> String {
    let excerpt: String = cleaned.chars().take(char_limit).collect();
    format!(
        "From the transcript below, return three concise lists:\n\
         - key_points: core ideas/topics discussed\n\
         - decisions: explicit decisions/approvals/agreements\n\
         - action_items: to-dos with owners/dates if present\n\n\
         Transcript (cleaned):\n{excerpt}"
    )
}

/// Run one generative extraction over already-cleaned text.
pub fn generate_extract(
    backend: &dyn CompletionBackend,
    cleaned: &str,
    model: Option<&str>,
    max_tokens: u32,
    temperature: f32,
    char_limit: usize,
) -> Result<SummaryLists, GenerationError> {
    let request = CompletionRequest {
        system: SYSTEM_PROMPT.to_string(),
        user: user_prompt(cleaned, char_limit),
        model: model.map(str::to_string),
        max_tokens,
        temperature,
    };
    debug!(
        backend = backend.name(),
        model = model.unwrap_or("<default>"),
        max_tokens,
        temperature,
        "requesting generative summary"
    );
    let content = backend.complete(&request)?;
    parse_lists(&content)
}

#[derive(Debug, Deserialize)]
struct ListsReply {
    key_points: Vec<String>,
    decisions: Vec<String>,
    action_items: Vec<String>,
}

/// Parse `{key_points, decisions, action_items}`. All three keys are required,
/// extra keys are ignored, and each list is cleaned and capped.
pub fn parse_lists(content: &str) -> Result<SummaryLists, GenerationError> {
    let body = strip_markdown_json(content);
    if body.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    let reply: ListsReply =
        serde_json::from_str(body).map_err(|e| GenerationError::Parse(e.to_string()))?;

    Ok(SummaryLists {
        key_points: dedupe_keep_order(reply.key_points, GENERATIVE_LIST_CAP),
        decisions: dedupe_keep_order(reply.decisions, GENERATIVE_LIST_CAP),
        action_items: dedupe_keep_order(reply.action_items, GENERATIVE_LIST_CAP),
    })
}

/// Strip a markdown code fence (```json ... ```) if the model added one.
fn strip_markdown_json(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    match rest.rfind("```") {
        Some(end) => rest[..end].trim(),
        None => rest.trim(),
    }
}

/// Chat-completions client for OpenAI and compatible servers.
pub struct OpenAiBackend {
    api_key: Option<String>,
    base_url: String,
    default_model: String,
    timeout: Duration,
    client: reqwest::blocking::Client,
}

impl OpenAiBackend {
    pub fn new(
        api_key: Option<String>,
        base_url: &str,
        default_model: &str,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;
        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_model: default_model.to_string(),
            timeout,
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: serde_json::Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Deserialize)]
struct ChatReplyMessage {
    content: Option<String>,
}

impl CompletionBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    fn complete(&self, request: &CompletionRequest) -> Result<String, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(GenerationError::MissingCredential)?;

        let body = ChatRequest {
            model: request.model.as_deref().unwrap_or(&self.default_model),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: serde_json::json!({ "type": "json_object" }),
        };

        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: truncate_body(&text),
            });
        }

        let parsed: ChatResponse = resp.json().map_err(|e| self.transport_error(e))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse)
    }
}

impl OpenAiBackend {
    fn transport_error(&self, e: reqwest::Error) -> GenerationError {
        if e.is_timeout() {
            GenerationError::Timeout(self.timeout)
        } else if e.is_decode() {
            GenerationError::Parse(e.to_string())
        } else {
            GenerationError::Transport(e.to_string())
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 300;
    if body.chars().count() <= MAX {
        body.trim().to_string()
    } else {
        let head: String = body.chars().take(MAX).collect();
        format!("{}...", head.trim_end())
    }
}
