//! Chart specifications.
//!
//! Each `*_chart` function maps one part of the payload to a [`ChartSpec`].
//! They are pure; drawing happens later in [`crate::draw`] through the widget
//! registry.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::aggregate::{bucketize, percentage_of, rank_by_frequency, LENGTH_BUCKETS};
use crate::analysis::{AnalysisResult, CommentLengths, QuestionStats, SentimentCounts};
use crate::palette::{self, Rgb};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Pie,
    Doughnut,
    Bar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendPosition {
    Bottom,
    Right,
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub label: Option<String>,
    pub values: Vec<f64>,
    /// One color per value.
    pub fill: Vec<Rgb>,
    pub fill_opacity: f64,
    pub border: Option<Vec<Rgb>>,
    /// Hover text per value; empty when the chart has none.
    pub tooltips: Vec<String>,
}

impl Series {
    pub fn new(values: Vec<f64>, fill: Vec<Rgb>) -> Self {
        Self {
            label: None,
            values,
            fill,
            fill_opacity: 1.0,
            border: None,
            tooltips: Vec::new(),
        }
    }

    pub fn labelled(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    /// `"<label>: <pct>% (<value> <unit>)"` for each value.
    fn with_tooltips(mut self, labels: &[&str], unit: &str) -> Self {
        let total: f64 = self.values.iter().sum();
        self.tooltips = labels
            .iter()
            .zip(&self.values)
            .map(|(label, value)| {
                let pct = percentage_of(*value, total);
                format!("{label}: {pct:.1}% ({value} {unit})")
            })
            .collect();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScaleOptions {
    pub begin_at_zero: bool,
    pub x_title: Option<String>,
    pub y_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
    pub legend: LegendPosition,
    pub scale: ScaleOptions,
}

impl ChartSpec {
    pub fn new(kind: ChartKind, title: &str, labels: Vec<String>) -> Self {
        Self {
            kind,
            title: title.to_string(),
            labels,
            series: Vec::new(),
            legend: LegendPosition::Bottom,
            scale: ScaleOptions::default(),
        }
    }

    fn with_series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    fn legend(mut self, legend: LegendPosition) -> Self {
        self.legend = legend;
        self
    }

    fn y_axis(mut self, title: &str) -> Self {
        self.scale.begin_at_zero = true;
        self.scale.y_title = Some(title.to_string());
        self
    }

    fn x_axis(mut self, title: &str) -> Self {
        self.scale.x_title = Some(title.to_string());
        self
    }

    /// Values of the first series.
    pub fn values(&self) -> &[f64] {
        self.series.first().map(|s| s.values.as_slice()).unwrap_or(&[])
    }
}

/// Display labels of the length buckets, in [`LENGTH_BUCKETS`] order.
pub const LENGTH_LABELS: [&str; 5] = [
    "1-25 chars",
    "26-50 chars",
    "51-100 chars",
    "101-200 chars",
    "200+ chars",
];

const SENTIMENT_LABELS: [&str; 3] = ["Positive", "Neutral", "Negative"];

pub fn sentiment_chart(counts: &SentimentCounts) -> ChartSpec {
    let values = sentiment_values(counts);
    ChartSpec::new(ChartKind::Doughnut, "Sentiment Distribution", owned(&SENTIMENT_LABELS))
        .with_series(
            Series::new(values, vec![palette::POSITIVE, palette::NEUTRAL, palette::NEGATIVE])
                .with_tooltips(&SENTIMENT_LABELS, "comments"),
        )
        .legend(LegendPosition::Right)
}

pub fn emotion_chart(distribution: &IndexMap<String, u64>) -> ChartSpec {
    let labels = distribution.keys().map(|e| capitalize(e)).collect();
    let values = distribution.values().map(|v| *v as f64).collect();
    let colors = distribution.keys().map(|e| palette::emotion_color(e)).collect();

    ChartSpec::new(ChartKind::Bar, "Emotional Distribution", labels)
        .with_series(Series::new(values, colors))
        .legend(LegendPosition::Hidden)
        .y_axis("Number of Comments")
}

/// Pie of the `limit` most common languages. Languages past the limit are
/// left out; no "other" slice is made up for them.
pub fn language_chart(distribution: &IndexMap<String, u64>, limit: usize) -> ChartSpec {
    let mut ranked =
        rank_by_frequency(distribution.iter().map(|(lang, count)| (lang.as_str(), *count)));
    if ranked.len() > limit {
        debug!(dropped = ranked.len() - limit, limit, "omitting minor languages");
        ranked.truncate(limit);
    }

    let labels: Vec<String> = ranked.iter().map(|(lang, _)| lang.to_string()).collect();
    let values = ranked.iter().map(|(_, count)| *count as f64).collect();
    let colors = palette::LANGUAGES.iter().cycle().take(labels.len()).copied().collect();
    let label_refs: Vec<&str> = labels.iter().map(String::as_str).collect();
    let series = Series::new(values, colors).with_tooltips(&label_refs, "comments");

    ChartSpec::new(ChartKind::Pie, "Comment Languages", labels)
        .with_series(series)
        .legend(LegendPosition::Right)
}

/// Bar per length bucket, always all five in fixed order.
///
/// Uses the precomputed distribution; when it is empty but per-comment
/// lengths are present, the lengths are bucketed here instead.
pub fn length_chart(lengths: &CommentLengths) -> ChartSpec {
    let measured = &lengths.individual_lengths;
    let distribution = if lengths.distribution.is_empty() && !measured.is_empty() {
        bucketize(measured.iter().map(|l| *l as f64), &LENGTH_BUCKETS)
    } else {
        lengths.distribution.clone()
    };

    for key in distribution.keys() {
        if !LENGTH_BUCKETS.iter().any(|b| b.label == key.as_str()) {
            warn!(bucket = %key, "ignoring unknown length bucket");
        }
    }

    let values = LENGTH_BUCKETS
        .iter()
        .map(|b| distribution.get(b.label).copied().unwrap_or(0) as f64)
        .collect();

    let series =
        Series::new(values, palette::LENGTH_BUCKETS.to_vec()).labelled("Number of Comments");

    ChartSpec::new(ChartKind::Bar, "Comment Length Distribution", owned(&LENGTH_LABELS))
        .with_series(series)
        .legend(LegendPosition::Hidden)
        .y_axis("Number of Comments")
        .x_axis("Comment Length")
}

pub fn question_split_chart(stats: &QuestionStats) -> ChartSpec {
    let labels = ["Questions", "Statements"];
    let values = vec![stats.questions as f64, stats.statements as f64];

    let series = Series::new(values, vec![palette::QUESTIONS, palette::STATEMENTS])
        .with_tooltips(&labels, "comments");

    ChartSpec::new(ChartKind::Doughnut, "Questions vs Statements", owned(&labels))
        .with_series(series)
}

pub fn question_sentiment_chart(counts: &SentimentCounts) -> ChartSpec {
    let mut series = Series::new(sentiment_values(counts), palette::QUESTION_SENTIMENT.to_vec())
        .labelled("Questions by Sentiment");
    series.fill_opacity = 0.8;
    series.border = Some(palette::QUESTION_SENTIMENT.to_vec());

    ChartSpec::new(
        ChartKind::Bar,
        "Distribution of Questions by Sentiment",
        owned(&SENTIMENT_LABELS),
    )
    .with_series(series)
    .y_axis("Number of Questions")
}

/// Where the question/statement split came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionSplit {
    pub stats: QuestionStats,
    /// Statements were derived as `total_comments - question_counts`.
    pub derived: bool,
    /// Ways in which `question_stats` disagrees with the other counts.
    pub discrepancies: Vec<String>,
}

impl QuestionSplit {
    /// `question_stats` wins when present. Otherwise the split is derived
    /// from the legacy question count and the total, if both exist.
    pub fn resolve(payload: &AnalysisResult) -> Option<Self> {
        if let Some(stats) = payload.question_stats {
            let mut discrepancies = Vec::new();
            if let Some(total) = payload.total_comments {
                let counted = stats.questions.saturating_add(stats.statements);
                if counted != total {
                    discrepancies.push(format!(
                        "question_stats adds up to {counted} comments but total_comments is {total}"
                    ));
                }
            }
            if let Some(questions) = payload.question_counts {
                if questions != stats.questions {
                    discrepancies.push(format!(
                        "question_counts is {} but question_stats counts {} questions",
                        questions, stats.questions
                    ));
                }
            }
            return Some(Self {
                stats,
                derived: false,
                discrepancies,
            });
        }

        let questions = payload.question_counts?;
        let total = payload.total_comments?;
        Some(Self {
            stats: QuestionStats {
                questions,
                statements: total.saturating_sub(questions),
            },
            derived: true,
            discrepancies: Vec::new(),
        })
    }
}

fn sentiment_values(counts: &SentimentCounts) -> Vec<f64> {
    vec![counts.positive as f64, counts.neutral as f64, counts.negative as f64]
}

fn owned(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|l| l.to_string()).collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
