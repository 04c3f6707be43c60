//! Versioned summary envelope. Every field has a default so older or partial
//! records still deserialize without field-presence checks.

use serde::{Deserialize, Serialize};

use super::SummaryResult;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryStatus {
    Ready,
    /// The transcript had no usable text. Not an error.
    #[default]
    Empty,
    /// The transcript could not be read at all.
    Error,
}

impl SummaryStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SummaryStatus::Ready => "ready",
            SummaryStatus::Empty => "empty",
            SummaryStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryRecord {
    pub schema_version: u32,
    pub title: String,
    pub source: String,
    pub status: SummaryStatus,
    pub error: Option<String>,
    pub generated_at: String,
    pub summary: SummaryResult,
}

impl Default for SummaryRecord {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            title: String::new(),
            source: String::new(),
            status: SummaryStatus::Empty,
            error: None,
            generated_at: String::new(),
            summary: SummaryResult::default(),
        }
    }
}

impl SummaryRecord {
    pub fn completed(title: &str, source: &str, summary: SummaryResult) -> Self {
        let status = if summary.lists().is_empty() && summary.one_liner.is_empty() {
            SummaryStatus::Empty
        } else {
            SummaryStatus::Ready
        };
        Self {
            title: title.to_string(),
            source: source.to_string(),
            status,
            generated_at: now_rfc3339(),
            summary,
            ..Default::default()
        }
    }

    pub fn failed(title: &str, source: &str, error: &str) -> Self {
        Self {
            title: title.to_string(),
            source: source.to_string(),
            status: SummaryStatus::Error,
            error: Some(error.to_string()),
            generated_at: now_rfc3339(),
            ..Default::default()
        }
    }
}

fn now_rfc3339() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_content() {
        let ready = SummaryResult {
            one_liner: "Hi".to_string(),
            ..Default::default()
        };
        assert_eq!(SummaryRecord::completed("t", "s", ready).status, SummaryStatus::Ready);
        assert_eq!(
            SummaryRecord::completed("t", "s", SummaryResult::default()).status,
            SummaryStatus::Empty
        );
    }

    #[test]
    fn failed_record_carries_error() {
        let record = SummaryRecord::failed("t", "a.txt", "permission denied");
        assert_eq!(record.status, SummaryStatus::Error);
        assert_eq!(record.error.as_deref(), Some("permission denied"));
        assert!(record.summary.key_points.is_empty());
    }

    #[test]
    fn sparse_json_fills_defaults() {
        let record: SummaryRecord =
            serde_json::from_str(r#"{"status": "ready", "summary": {"decisions": ["Go"]}}"#).unwrap();
        assert_eq!(record.schema_version, SCHEMA_VERSION);
        assert_eq!(record.status, SummaryStatus::Ready);
        assert_eq!(record.summary.decisions, vec!["Go"]);
        assert!(record.summary.action_items.is_empty());
    }

    #[test]
    fn serializes_lowercase_status() {
        let json = serde_json::to_value(SummaryRecord::default()).unwrap();
        assert_eq!(json["status"], "empty");
        assert_eq!(json["summary"]["extractor"], "heuristic");
    }
}
