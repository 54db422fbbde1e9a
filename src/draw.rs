//! Drawing of chart specs with plotters.
//!
//! All sizes are given in logical pixels and converted through the drawing
//! context, so a chart prepared for a 2x display comes out twice as large with
//! the same layout.

use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;

use crate::charts::{ChartKind, ChartSpec, LegendPosition, Series};
use crate::palette::Rgb;
use crate::surface::DrawingContext;

const FONT: &str = "sans-serif";
const TITLE_SIZE: f64 = 16.0;
const LABEL_SIZE: f64 = 11.0;
const LEGEND_SWATCH: f64 = 12.0;
const LEGEND_LINE: f64 = 18.0;

/// Draw `spec` into a fresh SVG document sized for `ctx`.
///
/// An empty context yields an empty string without touching plotters.
pub fn render_svg(spec: &ChartSpec, ctx: &DrawingContext) -> Result<String> {
    let mut markup = String::new();
    if ctx.is_empty() {
        return Ok(markup);
    }

    {
        let root = SVGBackend::with_string(&mut markup, ctx.backing).into_drawing_area();
        draw_chart(&root, spec, ctx)?;
        root.present().context("Failed to finish chart document")?;
    }

    Ok(markup)
}

pub fn draw_chart<DB>(
    root: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    ctx: &DrawingContext,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let area = root.titled(&spec.title, (FONT, ctx.font(TITLE_SIZE)).into_font().color(&BLACK))?;

    let Some(series) = spec.series.first() else {
        return draw_no_data(&area, ctx);
    };

    let plot_area = draw_legend(&area, spec, series, ctx)?;

    match spec.kind {
        ChartKind::Bar => draw_bars(&plot_area, spec, ctx),
        ChartKind::Pie | ChartKind::Doughnut => draw_pie(&plot_area, spec, series, ctx),
    }
}

fn draw_bars<DB>(
    area: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    ctx: &DrawingContext,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let bar_count = spec.labels.len().max(1) as i32;
    let max_value = spec
        .series
        .iter()
        .flat_map(|s| s.values.iter().copied())
        .fold(0.0_f64, f64::max);
    let y_max = if max_value > 0.0 { max_value * 1.1 } else { 1.0 };

    let mut chart = ChartBuilder::on(area)
        .margin(ctx.px(10.0))
        .x_label_area_size(ctx.px(if spec.scale.x_title.is_some() { 45.0 } else { 30.0 }))
        .y_label_area_size(ctx.px(if spec.scale.y_title.is_some() { 55.0 } else { 40.0 }))
        .build_cartesian_2d((0..bar_count).into_segmented(), 0.0..y_max)?;

    let label_for = |value: &SegmentValue<i32>| match value {
        SegmentValue::CenterOf(i) => spec.labels.get(*i as usize).cloned().unwrap_or_default(),
        _ => String::new(),
    };

    let mut mesh = chart.configure_mesh();
    mesh.disable_x_mesh()
        .x_labels(bar_count as usize)
        .x_label_formatter(&label_for)
        .label_style((FONT, ctx.font(LABEL_SIZE)))
        .light_line_style(RGBColor(240, 240, 245));
    if let Some(title) = &spec.scale.y_title {
        mesh.y_desc(title.as_str());
    }
    if let Some(title) = &spec.scale.x_title {
        mesh.x_desc(title.as_str());
    }
    mesh.draw()?;

    let gap = ctx.px(6.0).max(0) as u32;
    for series in &spec.series {
        chart.draw_series(series.values.iter().enumerate().map(|(i, value)| {
            let color = plot_color(series_color(series, i));
            let mut bar = Rectangle::new(
                [(SegmentValue::Exact(i as i32), 0.0), (SegmentValue::Exact(i as i32 + 1), *value)],
                color.mix(series.fill_opacity).filled(),
            );
            bar.set_margin(0, 0, gap, gap);
            bar
        }))?;

        if let Some(borders) = &series.border {
            let width = ctx.px(1.0).max(1) as u32;
            chart.draw_series(series.values.iter().enumerate().map(|(i, value)| {
                let color = plot_color(borders.get(i).copied().unwrap_or(Rgb(0, 0, 0)));
                let corners = [
                    (SegmentValue::Exact(i as i32), 0.0),
                    (SegmentValue::Exact(i as i32 + 1), *value),
                ];
                let mut outline = Rectangle::new(corners, color.stroke_width(width));
                outline.set_margin(0, 0, gap, gap);
                outline
            }))?;
        }
    }

    Ok(())
}

fn draw_pie<DB>(
    area: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    series: &Series,
    ctx: &DrawingContext,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let total: f64 = series.values.iter().sum();
    if total <= 0.0 {
        return draw_no_data(area, ctx);
    }

    let (width, height) = area.dim_in_pixel();
    let center = ((width / 2) as i32, (height / 2) as i32);
    let radius = f64::from(width.min(height)) * 0.4;

    let colors: Vec<RGBColor> = (0..series.values.len())
        .map(|i| plot_color(series_color(series, i)))
        .collect();
    // The legend already names the slices; slice labels would repeat it.
    let labels: Vec<String> = if spec.legend == LegendPosition::Hidden {
        spec.labels.clone()
    } else {
        vec![String::new(); series.values.len()]
    };

    let mut pie = Pie::new(&center, &radius, &series.values, &colors, &labels);
    pie.label_style((FONT, ctx.font(LABEL_SIZE)).into_font().color(&BLACK));
    pie.percentages((FONT, ctx.font(LABEL_SIZE * 0.9)).into_font().color(&WHITE));
    if spec.kind == ChartKind::Doughnut {
        pie.donut_hole(radius * 0.5);
    }
    area.draw(&pie)?;

    Ok(())
}

/// Draw the legend and return what is left for the plot.
fn draw_legend<DB>(
    area: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    series: &Series,
    ctx: &DrawingContext,
) -> Result<DrawingArea<DB, Shift>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (width, height) = area.dim_in_pixel();
    let (plot, legend) = match spec.legend {
        LegendPosition::Hidden => return Ok(area.clone()),
        LegendPosition::Right => area.split_horizontally((f64::from(width) * 0.7) as i32),
        LegendPosition::Bottom => {
            let legend_height = ctx.px(LEGEND_LINE) * spec.labels.len().min(3) as i32 + ctx.px(8.0);
            area.split_vertically(height as i32 - legend_height)
        }
    };

    let swatch = ctx.px(LEGEND_SWATCH);
    let line = ctx.px(LEGEND_LINE);
    let column_width = (f64::from(width) / 3.0) as i32;

    for (i, label) in spec.labels.iter().enumerate() {
        let (x, y) = match spec.legend {
            LegendPosition::Right => (ctx.px(4.0), ctx.px(8.0) + line * i as i32),
            _ => (ctx.px(8.0) + column_width * (i % 3) as i32, ctx.px(4.0) + line * (i / 3) as i32),
        };
        let color = plot_color(series_color(series, i));
        legend.draw(&Rectangle::new([(x, y), (x + swatch, y + swatch)], color.filled()))?;
        legend.draw(&Text::new(
            label.clone(),
            (x + swatch + ctx.px(6.0), y),
            (FONT, ctx.font(LABEL_SIZE)).into_font(),
        ))?;
    }

    Ok(plot)
}

fn draw_no_data<DB>(area: &DrawingArea<DB, Shift>, ctx: &DrawingContext) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (width, height) = area.dim_in_pixel();
    area.draw(&Text::new(
        "No data",
        ((width / 2) as i32 - ctx.px(20.0), (height / 2) as i32),
        (FONT, ctx.font(LABEL_SIZE)).into_font().color(&RGBColor(150, 150, 170)),
    ))?;
    Ok(())
}

fn series_color(series: &Series, index: usize) -> Rgb {
    series
        .fill
        .get(index)
        .or_else(|| series.fill.last())
        .copied()
        .unwrap_or(Rgb(0, 0, 0))
}

fn plot_color(color: Rgb) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{CommentLengths, SentimentCounts};
    use crate::charts::{length_chart, sentiment_chart};
    use crate::surface::{prepare_surface, LogicalSize, Surface};

    fn context(width: f64, height: f64, ratio: f64) -> DrawingContext {
        prepare_surface(&mut Surface::new(LogicalSize::new(width, height)), Some(ratio))
    }

    #[test]
    fn renders_doughnut_to_svg() {
        let spec = sentiment_chart(&SentimentCounts {
            positive: 3,
            neutral: 1,
            negative: 2,
        });
        let markup = render_svg(&spec, &context(400.0, 300.0, 1.0)).unwrap();

        assert!(markup.contains("<svg"));
        assert!(markup.contains("Sentiment Distribution"));
    }

    #[test]
    fn high_density_document_uses_backing_size() {
        let spec = length_chart(&CommentLengths::default());
        let markup = render_svg(&spec, &context(300.0, 200.0, 2.0)).unwrap();

        assert!(markup.contains("width=\"600\""));
        assert!(markup.contains("height=\"400\""));
    }

    #[test]
    fn all_zero_pie_draws_placeholder() {
        let spec = sentiment_chart(&SentimentCounts::default());
        let markup = render_svg(&spec, &context(300.0, 200.0, 1.0)).unwrap();

        assert!(markup.contains("No data"));
    }

    #[test]
    fn empty_context_draws_nothing() {
        let spec = sentiment_chart(&SentimentCounts::default());
        assert!(render_svg(&spec, &context(0.0, 0.0, 1.0)).unwrap().is_empty());
    }
}
