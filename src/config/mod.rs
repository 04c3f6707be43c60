use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// `[generation]` block: everything the generative path and its retry loop need.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    pub enabled: bool,
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub retries: u32,
    pub timeout_secs: u64,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_key_command: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model: Some(DEFAULT_MODEL.to_string()),
            max_tokens: 512,
            temperature: 0.2,
            retries: 3,
            timeout_secs: 30,
            initial_backoff_ms: 700,
            max_backoff_ms: 6000,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            api_key_command: None,
        }
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms.max(self.initial_backoff_ms))
    }
}

/// `[summary]` block: output shaping.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SummaryConfig {
    pub one_liner_max_chars: usize,
    pub prompt_char_limit: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            one_liner_max_chars: 220,
            prompt_char_limit: 12_000,
        }
    }
}

/// Top-level recap config file structure.
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
#[serde(default)]
pub struct RecapConfig {
    pub generation: GenerationConfig,
    pub summary: SummaryConfig,
}

impl RecapConfig {
    /// Load config from ~/.recap/config.toml. Returns defaults if the file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Load config from an explicit path, then apply environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            Self::parse(&content)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?
        } else {
            RecapConfig::default()
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `RECAP_*` overrides. `lookup` is injected so tests don't touch the process env.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let g = &mut self.generation;

        if let Some(v) = get("RECAP_GENERATE") {
            g.enabled = parse_flag(&v)
                .with_context(|| format!("RECAP_GENERATE must be 1/0/true/false, got {v:?}"))?;
        }
        if let Some(v) = get("RECAP_MODEL") {
            g.model = Some(v.trim().to_string());
        }
        if let Some(v) = get("RECAP_MAX_TOKENS") {
            g.max_tokens = v.trim().parse().context("RECAP_MAX_TOKENS must be an integer")?;
        }
        if let Some(v) = get("RECAP_TEMPERATURE") {
            g.temperature = v.trim().parse().context("RECAP_TEMPERATURE must be a number")?;
        }
        if let Some(v) = get("RECAP_RETRIES") {
            g.retries = v.trim().parse().context("RECAP_RETRIES must be an integer")?;
        }
        if let Some(v) = get("RECAP_TIMEOUT_SECS") {
            g.timeout_secs = v.trim().parse().context("RECAP_TIMEOUT_SECS must be an integer")?;
        }
        Ok(())
    }

    /// Display config with secrets redacted.
    pub fn display_redacted(&self) -> String {
        let g = &self.generation;
        let mut lines = vec![
            "[generation]".to_string(),
            format!("  enabled = {}", g.enabled),
            format!("  model = \"{}\"", g.model.as_deref().unwrap_or("")),
            format!("  max_tokens = {}", g.max_tokens),
            format!("  temperature = {}", g.temperature),
            format!("  retries = {}", g.retries),
            format!("  timeout_secs = {}", g.timeout_secs),
            format!("  initial_backoff_ms = {}", g.initial_backoff_ms),
            format!("  max_backoff_ms = {}", g.max_backoff_ms),
            format!("  base_url = \"{}\"", g.base_url),
        ];
        if let Some(ref key) = g.api_key {
            lines.push(format!("  api_key = \"{}\"", redact(key)));
        }
        if let Some(ref cmd) = g.api_key_command {
            lines.push(format!("  api_key_command = \"{}\"", cmd));
        }
        lines.push("[summary]".to_string());
        lines.push(format!("  one_liner_max_chars = {}", self.summary.one_liner_max_chars));
        lines.push(format!("  prompt_char_limit = {}", self.summary.prompt_char_limit));
        lines.join("\n")
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn redact(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "****".to_string()
    }
}

/// Resolve the backend credential through the chain: CLI flag > env var > config key > config command.
///
/// `Ok(None)` means no credential is configured anywhere. That is not an error here:
/// the generative path reports it per call and the summary degrades to heuristics.
pub fn resolve_credential(
    cli_flag: Option<&str>,
    env_var_name: &str,
    config: &GenerationConfig,
) -> Result<Option<String>> {
    // 1. CLI flag
    if let Some(key) = cli_flag {
        if !key.is_empty() {
            return Ok(Some(key.to_string()));
        }
    }

    // 2. Environment variable
    if let Ok(val) = std::env::var(env_var_name) {
        if !val.is_empty() {
            return Ok(Some(val));
        }
    }

    // 3. Config file api_key
    if let Some(ref key) = config.api_key {
        if !key.is_empty() {
            return Ok(Some(key.clone()));
        }
    }

    // 4. External command
    if let Some(ref cmd) = config.api_key_command {
        if !cmd.is_empty() {
            let output = std::process::Command::new("sh")
                .arg("-c")
                .arg(cmd)
                .output()
                .with_context(|| format!("Failed to run api_key_command: {cmd}"))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                bail!(
                    "api_key_command failed (exit {}): {}",
                    output.status.code().unwrap_or(-1),
                    stderr.trim()
                );
            }

            let secret = String::from_utf8(output.stdout)
                .context("api_key_command output is not valid UTF-8")?
                .trim()
                .to_string();

            if !secret.is_empty() {
                return Ok(Some(secret));
            }
        }
    }

    Ok(None)
}

/// Like [`resolve_credential`], but a failing lookup (e.g. a broken `api_key_command`)
/// only logs a warning and yields `None`, so generation fails per call instead of
/// aborting the run.
pub fn credential_or_none(
    cli_flag: Option<&str>,
    env_var_name: &str,
    config: &GenerationConfig,
) -> Option<String> {
    match resolve_credential(cli_flag, env_var_name, config) {
        Ok(key) => key,
        Err(e) => {
            warn!(error = %e, "could not resolve API key, generative attempts will fail");
            None
        }
    }
}

/// Path to the config file: $RECAP_CONFIG or ~/.recap/config.toml
pub fn config_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os("RECAP_CONFIG").filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".recap").join("config.toml"))
}

/// Default config template content.
pub fn default_config_template() -> &'static str {
    r#"# ~/.recap/config.toml
# Credential resolution order: --api-key > OPENAI_API_KEY > api_key > api_key_command
# Every value below can also be overridden with RECAP_GENERATE, RECAP_MODEL,
# RECAP_MAX_TOKENS, RECAP_TEMPERATURE, RECAP_RETRIES and RECAP_TIMEOUT_SECS.

[generation]
enabled = false
model = "gpt-4o-mini"
max_tokens = 512
temperature = 0.2
retries = 3
timeout_secs = 30
initial_backoff_ms = 700
max_backoff_ms = 6000
base_url = "https://api.openai.com/v1"
# api_key = "your-api-key"
# api_key_command = "your-secrets-manager-command-here"

[summary]
one_liner_max_chars = 220
prompt_char_limit = 12000
"#
}

/// Create the default config file if it doesn't already exist.
pub fn init_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, default_config_template())
        .with_context(|| format!("Failed to write config: {}", path.display()))?;
    Ok(true)
}
