//! The analysis payload as delivered by the comment analysis service.
//!
//! Every field is optional. A field that is present but has the wrong shape
//! is dropped with a warning instead of failing the whole payload, so one bad
//! sub-object never blanks the dashboard.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{DashboardError, DashboardResult};

/// Message used when the service fails without saying why.
pub const GENERIC_UPSTREAM_ERROR: &str = "Failed to analyze comments";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "lenient")]
    pub total_comments: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub total_available_comments: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub sentiment_counts: Option<SentimentCounts>,
    #[serde(default, deserialize_with = "lenient")]
    pub emotion_distribution: Option<IndexMap<String, u64>>,
    #[serde(default, deserialize_with = "lenient")]
    pub keywords: Option<IndexMap<String, u64>>,
    #[serde(default, deserialize_with = "lenient")]
    pub language_distribution: Option<IndexMap<String, u64>>,
    #[serde(default, deserialize_with = "lenient")]
    pub comment_lengths: Option<CommentLengths>,
    #[serde(default, deserialize_with = "lenient")]
    pub question_stats: Option<QuestionStats>,
    /// Older payloads only carry a bare question count.
    #[serde(default, deserialize_with = "lenient")]
    pub question_counts: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub question_sentiment: Option<SentimentCounts>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub analyzed_comments: Option<Vec<CommentAnalysis>>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub detailed_sentiment: Option<Vec<DetailedSentiment>>,
    #[serde(default, deserialize_with = "lenient")]
    pub metadata: Option<VideoMetadata>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentCounts {
    pub positive: u64,
    pub neutral: u64,
    pub negative: u64,
}

impl SentimentCounts {
    pub fn total(&self) -> u64 {
        self.positive
            .saturating_add(self.neutral)
            .saturating_add(self.negative)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentLengths {
    pub average_length: f64,
    pub total_chars: u64,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub distribution: IndexMap<String, u64>,
    pub individual_lengths: Vec<u64>,
}

impl CommentLengths {
    /// True when there is something to put in length buckets.
    pub fn has_buckets(&self) -> bool {
        !self.distribution.is_empty() || !self.individual_lengths.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionStats {
    pub questions: u64,
    pub statements: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentAnalysis {
    pub original: String,
    pub sentiment: SentimentScores,
    pub emotions: IndexMap<String, u64>,
    pub is_question: bool,
    pub language: String,
}

/// Polarity scores of one comment; `compound` lies in `[-1, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentScores {
    pub pos: f64,
    pub neu: f64,
    pub neg: f64,
    pub compound: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailedSentiment {
    pub text: String,
    pub pos: f64,
    pub neu: f64,
    pub neg: f64,
    pub compound: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoMetadata {
    pub title: String,
    pub category: String,
    pub published_at: String,
    #[serde(deserialize_with = "count_or_string")]
    pub total_comments: u64,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Decode the body of the analysis request.
///
/// A non-success response becomes [`DashboardError::Upstream`] carrying the
/// body's `error` message, or [`GENERIC_UPSTREAM_ERROR`] when there is none.
pub fn parse_response(success: bool, body: &str) -> DashboardResult<AnalysisResult> {
    if !success {
        return Err(upstream_error(serde_json::from_str::<ErrorBody>(body).ok()));
    }

    let value: Value = serde_json::from_str(body)?;
    if !value.is_object() {
        return Err(DashboardError::InvalidInput(
            "analysis response is not a JSON object".to_string(),
        ));
    }

    Ok(serde_json::from_value(value)?)
}

/// Load a saved response body from disk.
///
/// A file holding only an `{"error": ...}` envelope is treated as a failed
/// response.
pub fn load_payload(path: &Path) -> DashboardResult<AnalysisResult> {
    let body = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&body)?;

    let is_error_envelope = value.get("error").is_some() && value.get("metadata").is_none();
    debug!(path = %path.display(), is_error_envelope, "loaded analysis payload");

    parse_response(!is_error_envelope, &body)
}

fn upstream_error(body: Option<ErrorBody>) -> DashboardError {
    let message = body
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| GENERIC_UPSTREAM_ERROR.to_string());
    DashboardError::Upstream(message)
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(decode_or_warn))
}

// Drops malformed elements one by one so a single bad comment does not hide the rest.
fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => Some(items.into_iter().filter_map(decode_or_warn).collect()),
        Some(Value::Null) | None => None,
        Some(other) => {
            warn!(found = %json_kind(&other), "expected a list, dropping field");
            None
        }
    })
}

fn decode_or_warn<T: DeserializeOwned>(value: Value) -> Option<T> {
    if value.is_null() {
        return None;
    }
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            warn!(
                target_type = std::any::type_name::<T>(),
                error = %e,
                "dropping malformed payload field"
            );
            None
        }
    }
}

fn count_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentiment_total_saturates() {
        let counts = SentimentCounts {
            positive: u64::MAX,
            neutral: 1,
            negative: 1,
        };
        assert_eq!(counts.total(), u64::MAX);
    }

    #[test]
    fn averages_alone_have_no_buckets() {
        let lengths = CommentLengths {
            average_length: 42.0,
            total_chars: 420,
            ..Default::default()
        };
        assert!(!lengths.has_buckets());

        let lengths = CommentLengths {
            individual_lengths: vec![3],
            ..lengths
        };
        assert!(lengths.has_buckets());
    }

    #[test]
    fn parses_full_payload() {
        let body = r#"{
            "total_comments": 3,
            "total_available_comments": 120,
            "sentiment_counts": {"positive": 2, "neutral": 1, "negative": 0},
            "keywords": {"great": 10, "bad": 2},
            "metadata": {"title": "Clip", "category": "Music",
                         "published_at": "2024-03-01T10:00:00Z", "total_comments": "120"}
        }"#;
        let result = parse_response(true, body).unwrap();

        assert_eq!(result.total_comments, Some(3));
        assert_eq!(result.sentiment_counts.unwrap().total(), 3);
        let keys: Vec<_> = result.keywords.unwrap().into_keys().collect();
        assert_eq!(keys, vec!["great", "bad"]);
        assert_eq!(result.metadata.unwrap().total_comments, 120);
    }

    #[test]
    fn malformed_field_is_dropped_not_fatal() {
        let body = r#"{
            "sentiment_counts": "oops",
            "language_distribution": {"English": 4},
            "metadata": {"title": "t"}
        }"#;
        let result = parse_response(true, body).unwrap();

        assert!(result.sentiment_counts.is_none());
        assert_eq!(result.language_distribution.unwrap()["English"], 4);
    }

    #[test]
    fn malformed_comment_does_not_hide_others() {
        let body = r#"{"analyzed_comments": [
            {"original": "fine", "sentiment": {"compound": 0.3}},
            42,
            null,
            {"original": "why?", "is_question": true}
        ]}"#;
        let comments = parse_response(true, body).unwrap().analyzed_comments.unwrap();

        assert_eq!(comments.len(), 2);
        assert!(comments[1].is_question);
    }

    #[test]
    fn upstream_failure_uses_service_message() {
        let err = parse_response(false, r#"{"error": "Video not found"}"#).unwrap_err();
        assert_eq!(err.to_string(), "Video not found");
    }

    #[test]
    fn upstream_failure_falls_back_to_generic_message() {
        let err = parse_response(false, "<html>502</html>").unwrap_err();
        assert!(matches!(err, DashboardError::Upstream(ref m) if m == GENERIC_UPSTREAM_ERROR));

        let err = parse_response(false, r#"{"error": "  "}"#).unwrap_err();
        assert_eq!(err.to_string(), GENERIC_UPSTREAM_ERROR);
    }

    #[test]
    fn non_object_body_is_invalid_input() {
        let err = parse_response(true, "[1, 2]").unwrap_err();
        assert!(matches!(err, DashboardError::InvalidInput(_)));
    }

    #[test]
    fn load_payload_detects_error_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("response.json");
        fs::write(&path, r#"{"error": "No comments found"}"#).unwrap();

        let err = load_payload(&path).unwrap_err();
        assert!(matches!(err, DashboardError::Upstream(ref m) if m == "No comments found"));
    }
}
