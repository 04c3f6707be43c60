//! Retry controller: drives the generative path with exponential backoff and
//! degrades to the heuristic extractor when attempts run out.

use backon::{BlockingRetryable, ExponentialBuilder};
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;
use tracing::{info, warn};

use super::generative::{generate_extract, CompletionBackend, GenerationError};
use super::heuristic::heuristic_extract;
use super::normalize::normalize;
use super::{EffectiveParams, Extractor, GenerationParams, SummaryLists};
use crate::config::{GenerationConfig, RecapConfig, SummaryConfig};

/// Backoff bounds between generative attempts. The attempt count is per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            initial_delay,
            max_delay: max_delay.max(initial_delay),
        }
    }

    pub fn from_config(config: &GenerationConfig) -> Self {
        Self::new(config.initial_backoff(), config.max_backoff())
    }

    /// Doubling delays capped at `max_delay`, one fewer than `attempts`. No jitter.
    pub fn backoff(&self, attempts: u32) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.initial_delay)
            .with_factor(2.0)
            .with_max_delay(self.max_delay)
            .with_max_times(attempts.saturating_sub(1) as usize)
    }
}

/// Shared flag that short-circuits pending attempts and backoff waits.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    lock: Mutex<()>,
    wake: Condvar,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        let _guard = self.inner.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.inner.wake.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Sleep for `delay` unless cancelled first. Returns true if cancelled.
    pub fn wait(&self, delay: Duration) -> bool {
        let guard = self.inner.lock.lock().unwrap_or_else(|e| e.into_inner());
        let (_guard, _) = self
            .inner
            .wake
            .wait_timeout_while(guard, delay, |_| !self.is_cancelled())
            .unwrap_or_else(|e| e.into_inner());
        self.is_cancelled()
    }
}

/// How a `summarize_text` call ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Nothing to summarize; no backend call was made.
    Empty,
    Generated { lists: SummaryLists, attempts: u32 },
    Fallback { lists: SummaryLists, attempts: u32, reason: FallbackReason },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    Disabled,
    Exhausted { last_error: Option<String> },
    Cancelled,
}

impl Outcome {
    pub fn lists(&self) -> SummaryLists {
        match self {
            Outcome::Empty => SummaryLists::default(),
            Outcome::Generated { lists, .. } | Outcome::Fallback { lists, .. } => lists.clone(),
        }
    }

    pub fn into_lists(self) -> SummaryLists {
        match self {
            Outcome::Empty => SummaryLists::default(),
            Outcome::Generated { lists, .. } | Outcome::Fallback { lists, .. } => lists,
        }
    }

    pub fn extractor(&self) -> Extractor {
        match self {
            Outcome::Generated { .. } => Extractor::Generative,
            _ => Extractor::Heuristic,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Outcome::Empty => 0,
            Outcome::Generated { attempts, .. } | Outcome::Fallback { attempts, .. } => *attempts,
        }
    }
}

/// Stateless per-call summarization pipeline. The backend is injected so tests
/// can substitute a fake; sharing one `Summarizer` across threads is fine.
pub struct Summarizer {
    generation: GenerationConfig,
    summary: SummaryConfig,
    policy: RetryPolicy,
    backend: Option<Arc<dyn CompletionBackend>>,
    cancel: CancelToken,
}

impl Summarizer {
    pub fn new(config: &RecapConfig, backend: Option<Arc<dyn CompletionBackend>>) -> Self {
        Self {
            generation: config.generation.clone(),
            summary: config.summary.clone(),
            policy: RetryPolicy::from_config(&config.generation),
            backend,
            cancel: CancelToken::new(),
        }
    }

    /// Heuristic-only summarizer, no backend at all.
    pub fn heuristic(config: &RecapConfig) -> Self {
        let mut config = config.clone();
        config.generation.enabled = false;
        Self::new(&config, None)
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn summary_config(&self) -> &SummaryConfig {
        &self.summary
    }

    pub fn resolve(&self, params: &GenerationParams) -> EffectiveParams {
        params.resolve(&self.generation)
    }

    /// Summarize into lists. Never fails: generation errors degrade to heuristics.
    pub fn summarize_text(&self, text: &str, params: &GenerationParams) -> SummaryLists {
        self.run(text, &self.resolve(params)).into_lists()
    }

    /// Like [`Summarizer::summarize_text`] but reports which path produced the lists.
    pub fn run(&self, text: &str, params: &EffectiveParams) -> Outcome {
        if text.trim().is_empty() {
            return Outcome::Empty;
        }

        let backend = match (&self.backend, self.generation.enabled) {
            (Some(backend), true) => backend.as_ref(),
            _ => {
                info!("generation disabled, using heuristic extractor");
                return self.fallback(text, 0, FallbackReason::Disabled);
            }
        };

        let attempts = params.retries;
        if attempts == 0 {
            info!("no generative attempts allowed, using heuristic extractor");
            return self.fallback(text, 0, FallbackReason::Exhausted { last_error: None });
        }

        let cleaned = normalize(text);
        let cleaned = if cleaned.is_empty() { text.trim() } else { cleaned.as_str() };

        let made = Cell::new(0u32);
        let attempt = || {
            if self.cancel.is_cancelled() {
                return Err(GenerationError::Cancelled);
            }
            made.set(made.get() + 1);
            generate_extract(
                backend,
                cleaned,
                params.model.as_deref(),
                params.max_tokens,
                params.temperature,
                self.summary.prompt_char_limit,
            )
        };

        let sleeper = self.cancel.clone();
        let result = attempt
            .retry(self.policy.backoff(attempts))
            .sleep(move |delay: Duration| {
                sleeper.wait(delay);
            })
            .when(|_| !self.cancel.is_cancelled())
            .notify(|e, delay| {
                warn!(
                    attempt = made.get(),
                    attempts,
                    error = %e,
                    retry_delay_ms = delay.as_millis() as u64,
                    "generative attempt failed"
                );
            })
            .call();

        let made = made.get();
        match result {
            Ok(lists) => {
                info!(attempt = made, attempts, backend = backend.name(), "generative summary ready");
                Outcome::Generated { lists, attempts: made }
            }
            Err(_) if self.cancel.is_cancelled() => {
                info!(attempts = made, "generation cancelled, using heuristic extractor");
                self.fallback(text, made, FallbackReason::Cancelled)
            }
            Err(e) => {
                info!(attempts = made, last_error = %e, "falling back to heuristic extractor");
                self.fallback(text, made, FallbackReason::Exhausted { last_error: Some(e.to_string()) })
            }
        }
    }

    fn fallback(&self, text: &str, attempts: u32, reason: FallbackReason) -> Outcome {
        Outcome::Fallback {
            lists: heuristic_extract(text),
            attempts,
            reason,
        }
    }
}
