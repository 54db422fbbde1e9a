//! The render pass that turns one analysis payload into a dashboard.
//!
//! Every visual reads only its own part of the payload. Parts that are absent
//! or empty are skipped by [`guarded`], which leaves whatever that visual
//! showed before in place.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::analysis::{self, AnalysisResult, CommentLengths, SentimentCounts, VideoMetadata};
use crate::charts::{self, QuestionSplit};
use crate::config::DashboardConfig;
use crate::error::{DashboardError, DashboardResult};
use crate::panels::{self, LengthPanel, MetadataPanel, StatsPanel};
use crate::surface::LogicalSize;
use crate::tables::{self, FixedHue, HuePicker, KeywordCloud, RandomHue, Table, TableSlot};
use crate::widgets::{ChartSlot, WidgetBackend, WidgetRegistry};

/// Whether a decoded field has anything to show.
pub trait HasContent {
    fn has_content(&self) -> bool {
        true
    }
}

impl<K, V> HasContent for IndexMap<K, V> {
    fn has_content(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> HasContent for [T] {
    fn has_content(&self) -> bool {
        !self.is_empty()
    }
}

impl HasContent for u64 {}
impl HasContent for SentimentCounts {}
impl HasContent for CommentLengths {}
impl HasContent for VideoMetadata {}
impl HasContent for QuestionSplit {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepFailure {
    pub step: &'static str,
    pub message: String,
}

/// What one render pass did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderReport {
    /// Steps that ran, in pass order.
    pub rendered: Vec<&'static str>,
    /// Steps whose input was absent or empty.
    pub skipped: Vec<&'static str>,
    /// Steps whose renderer failed. The rest of the pass still ran.
    pub failed: Vec<StepFailure>,
    /// Inconsistencies noticed in the payload.
    pub discrepancies: Vec<String>,
}

impl RenderReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.failed.is_empty()
    }
}

/// Run `render` on `value` if it has content, and record the outcome.
///
/// Absent or empty input and [`DashboardError::MissingField`] raised by the
/// renderer both count as a skip. Any other error is recorded as a failure.
pub fn guarded<T, F>(report: &mut RenderReport, step: &'static str, value: Option<&T>, render: F)
where
    T: HasContent + ?Sized,
    F: FnOnce(&T) -> DashboardResult<()>,
{
    let outcome = value
        .filter(|v| v.has_content())
        .ok_or(DashboardError::MissingField(step))
        .and_then(render);

    match outcome {
        Ok(()) => report.rendered.push(step),
        Err(e) if e.is_recoverable() => {
            debug!(step, reason = %e, "skipping");
            report.skipped.push(step);
        }
        Err(e) => {
            warn!(step, error = %e, "render step failed");
            report.failed.push(StepFailure {
                step,
                message: e.to_string(),
            });
        }
    }
}

/// Everything outside the chart slots.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardState {
    pub metadata: Option<MetadataPanel>,
    pub stats: Option<StatsPanel>,
    pub length_stats: Option<LengthPanel>,
    pub keywords: Option<KeywordCloud>,
    pub tables: BTreeMap<TableSlot, Table>,
    pub question_split: Option<QuestionSplit>,
}

pub struct Dashboard<B: WidgetBackend> {
    registry: WidgetRegistry<B>,
    config: DashboardConfig,
    hues: Box<dyn HuePicker>,
    state: DashboardState,
    passes: u64,
}

impl<B: WidgetBackend> Dashboard<B> {
    pub fn new(backend: B, config: DashboardConfig) -> Self {
        let mut registry =
            WidgetRegistry::new(backend, config.chart_size, config.device_pixel_ratio);
        for slot in ChartSlot::ALL {
            registry.resize_surface(slot, config.size_for(slot));
        }
        let hues: Box<dyn HuePicker> = match config.keyword_hue {
            Some(hue) => Box::new(FixedHue(hue)),
            None => Box::new(RandomHue),
        };

        Self {
            registry,
            config,
            hues,
            state: DashboardState::default(),
            passes: 0,
        }
    }

    pub fn with_hue_picker(mut self, hues: impl HuePicker + 'static) -> Self {
        self.hues = Box::new(hues);
        self
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn registry(&self) -> &WidgetRegistry<B> {
        &self.registry
    }

    /// Resize a chart's mount point; applies from the next pass.
    pub fn resize(&mut self, slot: ChartSlot, size: LogicalSize) {
        self.registry.resize_surface(slot, size);
    }

    /// Decode a response from the analysis service and render it.
    pub fn render_response(&mut self, success: bool, body: &str) -> DashboardResult<RenderReport> {
        let payload = analysis::parse_response(success, body)?;
        self.render(&payload)
    }

    /// Render every visual the payload has data for, in a fixed order.
    ///
    /// Fails with [`DashboardError::InvalidInput`] when the payload has no
    /// metadata; nothing is touched in that case.
    pub fn render(&mut self, payload: &AnalysisResult) -> DashboardResult<RenderReport> {
        let metadata = payload
            .metadata
            .as_ref()
            .ok_or_else(|| DashboardError::InvalidInput("analysis result has no metadata".into()))?;

        self.passes += 1;
        info!(pass = self.passes, title = %metadata.title, "rendering dashboard");

        let mut report = RenderReport::default();
        let Self { registry, config, hues, state, .. } = self;

        guarded(&mut report, "metadata", Some(metadata), |m| {
            state.metadata = Some(panels::metadata_panel(m));
            Ok(())
        });

        guarded(&mut report, "stats", payload.total_comments.as_ref(), |_| {
            state.stats = Some(panels::stats_panel(payload));
            Ok(())
        });

        guarded(
            &mut report,
            TableSlot::DetailedAnalysis.name(),
            payload.analyzed_comments.as_deref(),
            |comments| {
                let preview = config.comment_preview_chars;
                let table = tables::render_detailed_analysis(comments, preview);
                state.tables.insert(TableSlot::DetailedAnalysis, table);
                Ok(())
            },
        );

        guarded(
            &mut report,
            ChartSlot::Emotion.name(),
            payload.emotion_distribution.as_ref(),
            |emotions| show_chart(registry, ChartSlot::Emotion, charts::emotion_chart(emotions)),
        );

        guarded(&mut report, "keywordsCloud", payload.keywords.as_ref(), |keywords| {
            let cloud = tables::render_keyword_cloud(keywords, &config.keyword_style, &mut **hues);
            state.keywords = Some(cloud);
            Ok(())
        });

        guarded(
            &mut report,
            ChartSlot::Sentiment.name(),
            payload.sentiment_counts.as_ref(),
            |counts| show_chart(registry, ChartSlot::Sentiment, charts::sentiment_chart(counts)),
        );

        guarded(
            &mut report,
            ChartSlot::QuestionSentiment.name(),
            payload.question_sentiment.as_ref(),
            |counts| {
                let spec = charts::question_sentiment_chart(counts);
                show_chart(registry, ChartSlot::QuestionSentiment, spec)
            },
        );

        guarded(
            &mut report,
            ChartSlot::Language.name(),
            payload.language_distribution.as_ref(),
            |languages| {
                let spec = charts::language_chart(languages, config.language_limit);
                show_chart(registry, ChartSlot::Language, spec)
            },
        );

        let split = QuestionSplit::resolve(payload);
        for discrepancy in split.iter().flat_map(|s| &s.discrepancies) {
            warn!(%discrepancy, "question counts disagree, using question_stats");
            report.discrepancies.push(discrepancy.clone());
        }
        guarded(&mut report, ChartSlot::Query.name(), split.as_ref(), |split| {
            show_chart(registry, ChartSlot::Query, charts::question_split_chart(&split.stats))?;
            state.question_split = Some(split.clone());
            Ok(())
        });

        guarded(&mut report, "lengthStats", payload.comment_lengths.as_ref(), |lengths| {
            state.length_stats = Some(panels::length_panel(lengths));
            Ok(())
        });

        guarded(
            &mut report,
            ChartSlot::Length.name(),
            payload.comment_lengths.as_ref().filter(|l| l.has_buckets()),
            |lengths| show_chart(registry, ChartSlot::Length, charts::length_chart(lengths)),
        );

        guarded(
            &mut report,
            TableSlot::SampleComments.name(),
            payload.analyzed_comments.as_deref(),
            |comments| {
                state
                    .tables
                    .insert(TableSlot::SampleComments, tables::render_sample_comments(comments));
                Ok(())
            },
        );

        guarded(
            &mut report,
            TableSlot::DetailedSentiment.name(),
            payload.detailed_sentiment.as_deref(),
            |items| {
                state
                    .tables
                    .insert(TableSlot::DetailedSentiment, tables::render_detailed_sentiment(items));
                Ok(())
            },
        );

        info!(
            rendered = report.rendered.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            live_charts = registry.live_count(),
            "dashboard pass finished"
        );
        Ok(report)
    }

    /// Dispose every chart and forget all panels and tables.
    pub fn teardown(&mut self) {
        self.registry.teardown();
        self.state = DashboardState::default();
    }
}

fn show_chart<B: WidgetBackend>(
    registry: &mut WidgetRegistry<B>,
    slot: ChartSlot,
    spec: charts::ChartSpec,
) -> DashboardResult<()> {
    registry.render(slot, spec).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::QuestionStats;
    use crate::widgets::tests::RecordingBackend;

    fn dashboard() -> Dashboard<RecordingBackend> {
        Dashboard::new(RecordingBackend::default(), DashboardConfig::default())
            .with_hue_picker(FixedHue(200.0))
    }

    fn counts(entries: &[(&str, u64)]) -> IndexMap<String, u64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn payload() -> AnalysisResult {
        AnalysisResult {
            total_comments: Some(10),
            total_available_comments: Some(40),
            sentiment_counts: Some(SentimentCounts {
                positive: 5,
                neutral: 3,
                negative: 2,
            }),
            keywords: Some(counts(&[("great", 10), ("bad", 2)])),
            metadata: Some(VideoMetadata {
                title: "Clip".into(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn missing_sentiment_keeps_previous_chart() {
        let mut dashboard = dashboard();
        dashboard.render(&payload()).unwrap();
        let before = dashboard.registry().get(ChartSlot::Sentiment).unwrap().id;

        let report = dashboard
            .render(&AnalysisResult {
                sentiment_counts: None,
                ..payload()
            })
            .unwrap();

        assert!(report.skipped.contains(&"sentimentChart"));
        assert_eq!(dashboard.registry().get(ChartSlot::Sentiment).unwrap().id, before);
    }

    #[test]
    fn lengths_without_buckets_keep_previous_chart() {
        let mut dashboard = dashboard();
        let bucketed = CommentLengths {
            average_length: 20.0,
            distribution: counts(&[("short", 4), ("medium", 2)]),
            ..Default::default()
        };
        dashboard
            .render(&AnalysisResult {
                comment_lengths: Some(bucketed),
                ..payload()
            })
            .unwrap();
        let before = dashboard.registry().get(ChartSlot::Length).unwrap().id;

        let averages_only = CommentLengths {
            average_length: 35.0,
            ..Default::default()
        };
        let report = dashboard
            .render(&AnalysisResult {
                comment_lengths: Some(averages_only),
                ..payload()
            })
            .unwrap();

        assert!(report.skipped.contains(&"lengthChart"));
        assert!(report.rendered.contains(&"lengthStats"));
        assert_eq!(dashboard.registry().get(ChartSlot::Length).unwrap().id, before);
        assert_eq!(dashboard.state().length_stats.as_ref().unwrap().average, 35);
    }

    #[test]
    fn resized_slot_is_drawn_at_new_size_on_next_pass() {
        let backing = |d: &Dashboard<RecordingBackend>| {
            d.registry().get(ChartSlot::Sentiment).unwrap().context.backing
        };
        let mut dashboard = dashboard();
        dashboard.render(&payload()).unwrap();
        assert_eq!(backing(&dashboard), (400, 300));

        dashboard.resize(ChartSlot::Sentiment, LogicalSize::new(120.0, 90.0));
        assert_eq!(backing(&dashboard), (400, 300));

        dashboard.render(&payload()).unwrap();
        assert_eq!(backing(&dashboard), (120, 90));
    }

    #[test]
    fn missing_metadata_touches_nothing() {
        let mut dashboard = dashboard();
        let err = dashboard
            .render(&AnalysisResult {
                metadata: None,
                ..payload()
            })
            .unwrap_err();

        assert!(matches!(err, DashboardError::InvalidInput(_)));
        assert_eq!(dashboard.registry().created_count(), 0);
        assert!(dashboard.state().keywords.is_none());
        assert!(dashboard.registry().backend().events.is_empty());
    }

    #[test]
    fn charts_are_built_in_pass_order() {
        let mut dashboard = dashboard();
        let full = AnalysisResult {
            emotion_distribution: Some(counts(&[("joy", 4)])),
            question_sentiment: Some(SentimentCounts {
                positive: 1,
                neutral: 1,
                negative: 0,
            }),
            language_distribution: Some(counts(&[("en", 9)])),
            question_stats: Some(QuestionStats {
                questions: 3,
                statements: 7,
            }),
            comment_lengths: Some(CommentLengths {
                distribution: counts(&[("short", 9)]),
                ..Default::default()
            }),
            ..payload()
        };
        let report = dashboard.render(&full).unwrap();

        assert_eq!(
            dashboard.registry().backend().events,
            vec![
                "create emotionChart #1",
                "create sentimentChart #2",
                "create questionSentimentChart #3",
                "create languageChart #4",
                "create queryChart #5",
                "create lengthChart #6",
            ]
        );
        assert!(report.discrepancies.is_empty());
    }

    #[test]
    fn empty_keywords_keep_previous_cloud() {
        let mut dashboard = dashboard();
        dashboard.render(&payload()).unwrap();

        let report = dashboard
            .render(&AnalysisResult {
                keywords: Some(IndexMap::new()),
                ..payload()
            })
            .unwrap();

        assert!(report.skipped.contains(&"keywordsCloud"));
        assert_eq!(dashboard.state().keywords.as_ref().unwrap().entries.len(), 2);
    }

    #[test]
    fn inconsistent_question_counts_are_reported() {
        let mut dashboard = dashboard();
        let report = dashboard
            .render(&AnalysisResult {
                question_stats: Some(QuestionStats {
                    questions: 4,
                    statements: 4,
                }),
                ..payload()
            })
            .unwrap();

        assert_eq!(report.discrepancies.len(), 1);
        assert_eq!(dashboard.state().question_split.as_ref().unwrap().stats.statements, 4);
    }

    #[test]
    fn guard_records_each_outcome() {
        let mut report = RenderReport::default();
        let present: Option<&u64> = Some(&3);

        guarded(&mut report, "ok", present, |_| Ok(()));
        guarded::<u64, _>(&mut report, "absent", None, |_| Ok(()));
        guarded(&mut report, "empty", Some(&[] as &[u8]), |_| Ok(()));
        guarded(&mut report, "broken", present, |_| {
            Err(DashboardError::Render {
                slot: "sentimentChart",
                message: "boom".into(),
            })
        });

        assert_eq!(report.rendered, vec!["ok"]);
        assert_eq!(report.skipped, vec!["absent", "empty"]);
        assert_eq!(report.failed[0].step, "broken");
        assert!(!report.is_complete());
    }

    #[test]
    fn guard_does_not_call_renderer_for_absent_input() {
        let mut report = RenderReport::default();
        let mut called = false;
        guarded::<[u8], _>(&mut report, "table", None, |_| {
            called = true;
            Ok(())
        });
        assert!(!called);
    }

    #[test]
    fn teardown_disposes_charts_and_clears_state() {
        let mut dashboard = dashboard();
        dashboard.render(&payload()).unwrap();
        dashboard.teardown();

        assert_eq!(dashboard.registry().live_count(), 0);
        assert!(dashboard.state().metadata.is_none());
    }
}
