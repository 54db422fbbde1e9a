//! Writing a rendered dashboard to disk.
//!
//! Output layout:
//! - `<slot>.svg` for every live chart,
//! - `dashboard.html`, a standalone page with panels, cloud, tables and charts,
//! - `dashboard.json`, the panels and tables plus each chart's spec.

use chrono::Local;
use minijinja::{AutoEscape, Environment};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use crate::charts::ChartSpec;
use crate::dashboard::{Dashboard, DashboardState};
use crate::error::DashboardResult;
use crate::palette::{self, Rgb};
use crate::tables::{Table, TableSlot};
use crate::widgets::{ChartInstance, ChartSlot, SvgWidget, SvgWidgets};

pub const HTML_FILE: &str = "dashboard.html";
pub const JSON_FILE: &str = "dashboard.json";

pub fn export_to_json<T: Serialize>(data: &T, path: &Path) -> DashboardResult<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, data)?;
    Ok(())
}

/// Write one chart's SVG document. Charts drawn on an empty surface have no
/// markup and are not written.
pub fn write_chart(
    instance: &ChartInstance<SvgWidget>,
    dir: &Path,
) -> DashboardResult<Option<PathBuf>> {
    if instance.widget.markup.is_empty() {
        debug!(slot = %instance.slot, "chart has no markup, not writing");
        return Ok(None);
    }
    let path = dir.join(format!("{}.svg", instance.slot));
    fs::write(&path, &instance.widget.markup)?;
    Ok(Some(path))
}

#[derive(Serialize)]
struct Snapshot<'a> {
    generated_at: String,
    #[serde(flatten)]
    state: &'a DashboardState,
    charts: BTreeMap<ChartSlot, &'a ChartSpec>,
}

pub fn write_state(dashboard: &Dashboard<SvgWidgets>, dir: &Path) -> DashboardResult<PathBuf> {
    let snapshot = Snapshot {
        generated_at: Local::now().to_rfc3339(),
        state: dashboard.state(),
        charts: dashboard.registry().live().map(|c| (c.slot, &c.spec)).collect(),
    };
    let path = dir.join(JSON_FILE);
    export_to_json(&snapshot, &path)?;
    Ok(path)
}

pub fn write_html(dashboard: &Dashboard<SvgWidgets>, dir: &Path) -> DashboardResult<PathBuf> {
    let path = dir.join(HTML_FILE);
    fs::write(&path, render_html(dashboard)?)?;
    Ok(path)
}

/// Write everything, calling `on_written` after each file.
pub fn export_dashboard(
    dashboard: &Dashboard<SvgWidgets>,
    dir: &Path,
    mut on_written: impl FnMut(&Path),
) -> DashboardResult<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    for instance in dashboard.registry().live() {
        if let Some(path) = write_chart(instance, dir)? {
            on_written(&path);
            written.push(path);
        }
    }
    for path in [write_html(dashboard, dir)?, write_state(dashboard, dir)?] {
        on_written(&path);
        written.push(path);
    }

    info!(dir = %dir.display(), files = written.len(), "dashboard exported");
    Ok(written)
}

/// Number of files [`export_dashboard`] will write.
pub fn planned_files(dashboard: &Dashboard<SvgWidgets>) -> usize {
    let charts = dashboard
        .registry()
        .live()
        .filter(|c| !c.widget.markup.is_empty())
        .count();
    charts + 2
}

static TEMPLATES: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|name| {
        let is_html = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("html"));
        if is_html {
            AutoEscape::Html
        } else {
            AutoEscape::None
        }
    });
    if let Err(e) = env.add_template(HTML_FILE, include_str!("../templates/dashboard.html")) {
        warn!(error = %e, "dashboard template failed to load");
    }
    env
});

#[derive(Serialize)]
struct PageContext<'a> {
    title: &'a str,
    state: &'a DashboardState,
    sentiment: Vec<ShareView>,
    keywords: Vec<KeywordView<'a>>,
    charts: Vec<ChartView<'a>>,
    tables: Vec<TableView<'a>>,
    generated: String,
}

#[derive(Serialize)]
struct ShareView {
    name: &'static str,
    color: Rgb,
    count: u64,
    percent: String,
}

#[derive(Serialize)]
struct KeywordView<'a> {
    text: &'a str,
    count: u64,
    style: String,
}

#[derive(Serialize)]
struct ChartView<'a> {
    id: &'static str,
    svg: &'a str,
}

#[derive(Serialize)]
struct TableView<'a> {
    id: &'static str,
    #[serde(flatten)]
    table: &'a Table,
}

/// Render the standalone page. Payload text is HTML-escaped by the template;
/// only the chart markup is inserted as is.
pub fn render_html(dashboard: &Dashboard<SvgWidgets>) -> DashboardResult<String> {
    let state = dashboard.state();
    let title = state
        .metadata
        .as_ref()
        .map(|m| m.title.as_str())
        .unwrap_or("Comment analysis");

    let sentiment = state
        .stats
        .iter()
        .flat_map(|stats| {
            [
                ("Positive", stats.positive, palette::POSITIVE),
                ("Neutral", stats.neutral, palette::NEUTRAL),
                ("Negative", stats.negative, palette::NEGATIVE),
            ]
        })
        .map(|(name, share, color)| ShareView {
            name,
            color,
            count: share.count,
            percent: format!("{:.1}", share.percent),
        })
        .collect();

    let keywords = state
        .keywords
        .iter()
        .flat_map(|cloud| &cloud.entries)
        .map(|entry| KeywordView {
            text: &entry.word,
            count: entry.count,
            style: format!("font-size:{:.1}px;color:{}", entry.font_px, entry.css_color()),
        })
        .collect();

    let charts = dashboard
        .registry()
        .live()
        .map(|instance| ChartView {
            id: instance.slot.name(),
            svg: strip_xml_declaration(&instance.widget.markup),
        })
        .collect();

    let tables = TABLE_ORDER
        .iter()
        .filter_map(|slot| {
            state.tables.get(slot).map(|table| TableView {
                id: slot.name(),
                table,
            })
        })
        .collect();

    let context = PageContext {
        title,
        state,
        sentiment,
        keywords,
        charts,
        tables,
        generated: Local::now().format("%Y-%m-%d %H:%M").to_string(),
    };
    let page = TEMPLATES.get_template(HTML_FILE)?.render(context)?;
    Ok(page)
}

const TABLE_ORDER: [TableSlot; 3] = [
    TableSlot::SampleComments,
    TableSlot::DetailedAnalysis,
    TableSlot::DetailedSentiment,
];

fn strip_xml_declaration(markup: &str) -> &str {
    match markup.strip_prefix("<?xml") {
        Some(rest) => rest
            .split_once("?>")
            .map(|(_, body)| body.trim_start())
            .unwrap_or(markup),
        None => markup,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisResult, CommentAnalysis, SentimentCounts, VideoMetadata};
    use crate::config::DashboardConfig;
    use crate::tables::FixedHue;
    use tempfile::tempdir;

    fn rendered() -> Dashboard<SvgWidgets> {
        let config = DashboardConfig {
            chart_size: crate::surface::LogicalSize::new(200.0, 150.0),
            ..Default::default()
        };
        let mut dashboard =
            Dashboard::new(SvgWidgets::default(), config).with_hue_picker(FixedHue(120.0));
        dashboard
            .render(&AnalysisResult {
                total_comments: Some(3),
                sentiment_counts: Some(SentimentCounts {
                    positive: 2,
                    neutral: 1,
                    negative: 0,
                }),
                keywords: Some([("<b>".to_string(), 3)].into_iter().collect()),
                analyzed_comments: Some(vec![CommentAnalysis {
                    original: "<i>wow</i>".into(),
                    emotions: [("joy".to_string(), 1), ("surprise".to_string(), 2)]
                        .into_iter()
                        .collect(),
                    ..Default::default()
                }]),
                metadata: Some(VideoMetadata {
                    title: "Fish & Chips".into(),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .unwrap();
        dashboard
    }

    #[test]
    fn writes_one_svg_per_live_chart_plus_page_and_state() {
        let dashboard = rendered();
        let dir = tempdir().unwrap();
        let mut seen = 0;

        let files = export_dashboard(&dashboard, dir.path(), |_| seen += 1).unwrap();

        assert_eq!(files.len(), planned_files(&dashboard));
        assert_eq!(seen, files.len());
        assert!(dir.path().join("sentimentChart.svg").exists());
        assert!(!dir.path().join("emotionChart.svg").exists());
        assert!(dir.path().join(HTML_FILE).exists());
    }

    #[test]
    fn page_escapes_payload_text() {
        let html = render_html(&rendered()).unwrap();

        assert!(html.contains("<title>Fish &amp; Chips</title>"));
        assert!(html.contains("&lt;b&gt;"));
        assert!(!html.contains("<i>wow"));
        assert!(html.contains("id=\"sentimentChart\""));
        assert!(html.contains("color:hsl(120, 70%, 40%)"));
    }

    #[test]
    fn page_inlines_chart_markup_and_emotion_badges() {
        let html = render_html(&rendered()).unwrap();

        assert!(html.contains("<figure id=\"sentimentChart\"><svg"));
        assert!(!html.contains("<?xml"));
        assert!(html.contains("<table id=\"sampleCommentsTable\">"));
        assert!(html.contains("style=\"background-color:#4CAF50\">joy</span>"));
        assert!(html.contains("style=\"background-color:#FF9800\">surprise</span>"));
        assert!(html.contains("Positive</span>: 2 (66.7%)"));
    }

    #[test]
    fn state_file_lists_live_charts() {
        let dashboard = rendered();
        let dir = tempdir().unwrap();
        let path = write_state(&dashboard, dir.path()).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["charts"]["sentimentChart"]["kind"], "doughnut");
        assert_eq!(json["metadata"]["title"], "Fish & Chips");
    }

    #[test]
    fn xml_declaration_is_dropped_for_inline_use() {
        assert_eq!(strip_xml_declaration("<?xml version=\"1.0\"?>\n<svg/>"), "<svg/>");
        assert_eq!(strip_xml_declaration("<svg/>"), "<svg/>");
    }
}
