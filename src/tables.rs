//! Keyword cloud and per-comment tables.

use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::aggregate::{font_size_for, rank_by_frequency, SentimentClass};
use crate::analysis::{CommentAnalysis, DetailedSentiment};
use crate::palette::{self, Rgb};

/// Picks the decorative hue (degrees) of each keyword in the cloud.
pub trait HuePicker {
    fn hue(&mut self, word: &str, rank: usize) -> f64;
}

/// A fresh random hue per word and per render.
#[derive(Debug, Default)]
pub struct RandomHue;

impl HuePicker for RandomHue {
    fn hue(&mut self, _word: &str, _rank: usize) -> f64 {
        rand::thread_rng().gen_range(0.0..360.0)
    }
}

/// Always the same hue; for reproducible output.
#[derive(Debug, Clone, Copy)]
pub struct FixedHue(pub f64);

impl HuePicker for FixedHue {
    fn hue(&mut self, _word: &str, _rank: usize) -> f64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeywordStyle {
    pub min_px: f64,
    pub max_px: f64,
}

impl Default for KeywordStyle {
    fn default() -> Self {
        Self {
            min_px: 14.0,
            max_px: 34.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordEntry {
    pub word: String,
    pub count: u64,
    pub font_px: f64,
    pub hue: f64,
}

impl KeywordEntry {
    pub fn css_color(&self) -> String {
        format!("hsl({:.0}, 70%, 40%)", self.hue)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeywordCloud {
    /// Most frequent first.
    pub entries: Vec<KeywordEntry>,
}

impl KeywordCloud {
    /// Word to font size, in cloud order.
    pub fn size_map(&self) -> IndexMap<&str, f64> {
        self.entries.iter().map(|e| (e.word.as_str(), e.font_px)).collect()
    }
}

/// Rank the keywords and size each one between the least and most frequent.
pub fn render_keyword_cloud(
    keywords: &IndexMap<String, u64>,
    style: &KeywordStyle,
    hues: &mut dyn HuePicker,
) -> KeywordCloud {
    let ranked = rank_by_frequency(keywords.iter().map(|(word, count)| (word.as_str(), *count)));
    let (Some(first), Some(last)) = (ranked.first(), ranked.last()) else {
        return KeywordCloud::default();
    };
    let (max_count, min_count) = (first.1 as f64, last.1 as f64);

    let entries = ranked
        .iter()
        .enumerate()
        .map(|(rank, (word, count))| KeywordEntry {
            word: word.to_string(),
            count: *count,
            font_px: font_size_for(*count as f64, min_count, max_count, style.min_px, style.max_px),
            hue: hues.hue(word, rank),
        })
        .collect();

    KeywordCloud { entries }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum TableSlot {
    #[serde(rename = "sampleCommentsTable")]
    SampleComments,
    #[serde(rename = "detailedAnalysisTable")]
    DetailedAnalysis,
    #[serde(rename = "detailedSentimentTable")]
    DetailedSentiment,
}

impl TableSlot {
    pub fn name(self) -> &'static str {
        match self {
            Self::SampleComments => "sampleCommentsTable",
            Self::DetailedAnalysis => "detailedAnalysisTable",
            Self::DetailedSentiment => "detailedSentimentTable",
        }
    }
}

/// A colored label inside a cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Badge {
    pub text: String,
    pub color: Rgb,
}

/// One table cell: display text plus an optional accent color.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub text: String,
    pub color: Option<Rgb>,
    /// Full text when `text` was shortened.
    pub title: Option<String>,
    /// Shown instead of `text` where badges are supported.
    pub badges: Vec<Badge>,
}

impl Cell {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
            title: None,
            badges: Vec::new(),
        }
    }

    fn colored(text: impl Into<String>, color: Rgb) -> Self {
        Self {
            color: Some(color),
            ..Self::plain(text)
        }
    }

    fn badges(badges: Vec<Badge>) -> Self {
        let text = badges
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            badges,
            ..Self::plain(text)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// Placeholder for comments without any detected emotion.
pub const NEUTRAL_PLACEHOLDER: &str = "neutral";

/// Overview table: shortened text, sentiment glyph, emotion counts, question flag.
pub fn render_detailed_analysis(comments: &[CommentAnalysis], preview_chars: usize) -> Table {
    let rows = comments
        .iter()
        .map(|comment| {
            let compound = comment.sentiment.compound;
            let class = SentimentClass::from_compound(compound);
            let emotions = active_emotions(&comment.emotions)
                .map(|(emotion, count)| format!("{emotion}: {count}"))
                .collect::<Vec<_>>()
                .join(", ");

            vec![
                preview_cell(&comment.original, preview_chars),
                Cell::plain(format!("{} ({:.1}%)", class.glyph(), compound * 100.0)),
                Cell::plain(non_empty_or_neutral(emotions)),
                Cell::plain(if comment.is_question { "❓ Yes" } else { "No" }),
            ]
        })
        .collect();

    Table {
        headers: headers(&["Comment", "Sentiment", "Emotions", "Question"]),
        rows,
    }
}

/// Full-text table with colored scores, emotion badges and language.
pub fn render_sample_comments(comments: &[CommentAnalysis]) -> Table {
    let rows = comments
        .iter()
        .map(|comment| {
            let compound = comment.sentiment.compound;
            let color = palette::sentiment_color(SentimentClass::from_compound(compound));
            let badges: Vec<Badge> = active_emotions(&comment.emotions)
                .map(|(emotion, _)| Badge {
                    text: emotion.to_string(),
                    color: palette::emotion_badge_color(emotion),
                })
                .collect();
            let emotion_cell = if badges.is_empty() {
                Cell::plain(NEUTRAL_PLACEHOLDER)
            } else {
                Cell::badges(badges)
            };

            vec![
                Cell::plain(comment.original.clone()),
                Cell::colored(format!("{:.1}%", compound * 100.0), color),
                emotion_cell,
                Cell::plain(if comment.is_question { "❓ Question" } else { "💬 Statement" }),
                Cell::plain(comment.language.to_uppercase()),
            ]
        })
        .collect();

    Table {
        headers: headers(&["Comment", "Sentiment", "Emotions", "Type", "Language"]),
        rows,
    }
}

/// Per-comment polarity breakdown as percentages.
pub fn render_detailed_sentiment(items: &[DetailedSentiment]) -> Table {
    let rows = items
        .iter()
        .map(|item| {
            vec![
                Cell::plain(item.text.clone()),
                Cell::plain(format!("{:.1}%", item.pos * 100.0)),
                Cell::plain(format!("{:.1}%", item.neu * 100.0)),
                Cell::plain(format!("{:.1}%", item.neg * 100.0)),
                Cell::plain(SentimentClass::from_compound(item.compound).glyph()),
            ]
        })
        .collect();

    Table {
        headers: headers(&["Comment", "Positive", "Neutral", "Negative", "Overall"]),
        rows,
    }
}

/// Shorten `text` to at most `max_graphemes` user-visible characters.
pub fn truncate_graphemes(text: &str, max_graphemes: usize) -> (String, bool) {
    let mut graphemes = text.graphemes(true);
    let head: String = graphemes.by_ref().take(max_graphemes).collect();
    if graphemes.next().is_some() {
        (format!("{}…", head.trim_end()), true)
    } else {
        (head, false)
    }
}

fn preview_cell(text: &str, max_graphemes: usize) -> Cell {
    let (preview, truncated) = truncate_graphemes(text, max_graphemes);
    Cell {
        text: preview,
        color: None,
        title: truncated.then(|| text.to_string()),
        badges: Vec::new(),
    }
}

fn active_emotions(emotions: &IndexMap<String, u64>) -> impl Iterator<Item = (&str, u64)> {
    emotions
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(emotion, count)| (emotion.as_str(), *count))
}

fn non_empty_or_neutral(text: String) -> String {
    if text.is_empty() {
        NEUTRAL_PLACEHOLDER.to_string()
    } else {
        text
    }
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|h| h.to_string()).collect()
}
