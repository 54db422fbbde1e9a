//! Summary panels shown above the charts.

use chrono::DateTime;
use serde::Serialize;
use tracing::warn;

use crate::aggregate::{format_thousands, percentage_of, RangeStats};
use crate::analysis::{AnalysisResult, CommentLengths, VideoMetadata};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataPanel {
    pub title: String,
    pub category: String,
    pub published: String,
    pub comment_count: u64,
    pub thumbnail: Option<String>,
}

pub fn metadata_panel(metadata: &VideoMetadata) -> MetadataPanel {
    MetadataPanel {
        title: metadata.title.clone(),
        category: metadata.category.clone(),
        published: format_published(&metadata.published_at),
        comment_count: metadata.total_comments,
        thumbnail: metadata
            .thumbnail
            .as_ref()
            .filter(|url| !url.trim().is_empty())
            .cloned(),
    }
}

/// `YYYY-MM-DD` for RFC 3339 timestamps, anything else as given.
fn format_published(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(ts) => ts.format("%Y-%m-%d").to_string(),
        Err(_) => raw.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Share {
    pub count: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsPanel {
    pub analyzed: u64,
    pub available: u64,
    /// Not every available comment was analyzed.
    pub partial: bool,
    pub positive: Share,
    pub neutral: Share,
    pub negative: Share,
    pub questions: u64,
}

pub fn stats_panel(payload: &AnalysisResult) -> StatsPanel {
    let analyzed = payload.total_comments.unwrap_or(0);
    let available = payload.total_available_comments.unwrap_or(0);
    if analyzed > available && payload.total_available_comments.is_some() {
        warn!(analyzed, available, "more comments analyzed than reported available");
    }

    let counts = payload.sentiment_counts.unwrap_or_default();
    let whole = counts.total() as f64;
    let share = |count: u64| Share {
        count,
        percent: percentage_of(count as f64, whole),
    };

    let questions = payload
        .question_stats
        .map(|q| q.questions)
        .or(payload.question_counts)
        .unwrap_or(0);

    StatsPanel {
        analyzed,
        available,
        partial: analyzed < available,
        positive: share(counts.positive),
        neutral: share(counts.neutral),
        negative: share(counts.negative),
        questions,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LengthPanel {
    pub average: u64,
    pub total_chars: String,
    pub min: Option<u64>,
    pub max: Option<u64>,
}

pub fn length_panel(lengths: &CommentLengths) -> LengthPanel {
    let measured = RangeStats::from_values(&lengths.individual_lengths);
    LengthPanel {
        average: lengths.average_length.max(0.0).round() as u64,
        total_chars: format_thousands(lengths.total_chars),
        min: lengths.min_length.or(measured.map(|s| s.min)),
        max: lengths.max_length.or(measured.map(|s| s.max)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{QuestionStats, SentimentCounts};

    #[test]
    fn metadata_formats_date_and_hides_empty_thumbnail() {
        let panel = metadata_panel(&VideoMetadata {
            title: "Clip".into(),
            category: "Music".into(),
            published_at: "2024-03-01T10:00:00Z".into(),
            total_comments: 42,
            thumbnail: Some(String::new()),
        });

        assert_eq!(panel.published, "2024-03-01");
        assert_eq!(panel.thumbnail, None);
    }

    #[test]
    fn unparseable_date_is_kept_verbatim() {
        let panel = metadata_panel(&VideoMetadata {
            published_at: "last week".into(),
            ..Default::default()
        });
        assert_eq!(panel.published, "last week");
    }

    #[test]
    fn stats_panel_flags_partial_analysis() {
        let payload = AnalysisResult {
            total_comments: Some(100),
            total_available_comments: Some(2500),
            sentiment_counts: Some(SentimentCounts {
                positive: 50,
                neutral: 30,
                negative: 20,
            }),
            question_stats: Some(QuestionStats {
                questions: 12,
                statements: 88,
            }),
            ..Default::default()
        };
        let panel = stats_panel(&payload);

        assert!(panel.partial);
        assert_eq!(panel.positive.percent, 50.0);
        assert_eq!(panel.questions, 12);
    }

    #[test]
    fn stats_panel_without_counts_is_all_zero() {
        let panel = stats_panel(&AnalysisResult::default());
        assert_eq!(panel.positive, Share {
            count: 0,
            percent: 0.0,
        });
        assert!(!panel.partial);
    }

    #[test]
    fn length_panel_falls_back_to_measured_range() {
        let panel = length_panel(&CommentLengths {
            average_length: 41.6,
            total_chars: 12345,
            individual_lengths: vec![3, 80, 41],
            ..Default::default()
        });

        assert_eq!(panel.average, 42);
        assert_eq!(panel.total_chars, "12,345");
        assert_eq!((panel.min, panel.max), (Some(3), Some(80)));
    }
}
