use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use unicode_segmentation::UnicodeSegmentation;

use comment_insights::aggregate::{format_thousands, rank_by_frequency, SentimentClass};
use comment_insights::analysis::{self, AnalysisResult};
use comment_insights::charts::QuestionSplit;
use comment_insights::config::DashboardConfig;
use comment_insights::dashboard::{Dashboard, RenderReport};
use comment_insights::export;
use comment_insights::panels;
use comment_insights::tables::{self, Table};
use comment_insights::widgets::SvgWidgets;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an analysis result into chart, page and state files
    Render {
        /// JSON file with the analysis result
        #[arg(short, long)]
        input: PathBuf,

        /// Directory for the generated files
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Dashboard config file (see `init-config`)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Device pixel ratio, overrides the config file
        #[arg(short, long)]
        pixel_ratio: Option<f64>,
    },
    /// Print a summary of an analysis result
    Summary {
        /// JSON file with the analysis result
        #[arg(short, long)]
        input: PathBuf,

        /// Also print the per-comment table
        #[arg(short, long)]
        detailed: bool,
    },
    /// Write a config file with the default settings
    InitConfig {
        /// Where to write the config
        #[arg(short, long, default_value = "dashboard_config.json")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Render {
            input,
            output_dir,
            config,
            pixel_ratio,
        } => {
            let mut settings = match config {
                Some(path) => DashboardConfig::load(path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => DashboardConfig::default(),
            };
            if pixel_ratio.is_some() {
                settings.device_pixel_ratio = *pixel_ratio;
            }

            let payload = load(input)?;
            let mut dashboard = Dashboard::new(SvgWidgets::default(), settings);
            let report = dashboard.render(&payload).context("Failed to render dashboard")?;
            print_render_report(&report);

            export_with_progress(&dashboard, output_dir)?;
            println!("Dashboard written to {}", output_dir.display());
            Ok(())
        }
        Commands::Summary { input, detailed } => {
            let payload = load(input)?;
            print_analysis_summary(&payload, *detailed);
            Ok(())
        }
        Commands::InitConfig { output } => {
            DashboardConfig::save_default(output).context("Failed to write default config")?;
            println!("Default config saved to {}", output.display());
            Ok(())
        }
    }
}

fn load(input: &Path) -> Result<AnalysisResult> {
    analysis::load_payload(input)
        .with_context(|| format!("Failed to load analysis result {}", input.display()))
}

fn export_with_progress(dashboard: &Dashboard<SvgWidgets>, output_dir: &Path) -> Result<()> {
    let pb = indicatif::ProgressBar::new(export::planned_files(dashboard) as u64);
    pb.set_style(
        indicatif::ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}",
            )
            .context("Invalid progress bar template")?
            .progress_chars("#>-"),
    );

    export::export_dashboard(dashboard, output_dir, |path| {
        if let Some(name) = path.file_name() {
            pb.set_message(name.to_string_lossy().into_owned());
        }
        pb.inc(1);
    })
    .context("Failed to export dashboard")?;

    pb.finish_with_message("done");
    Ok(())
}

fn print_render_report(report: &RenderReport) {
    println!("\n{}", "=== Dashboard Render ===".bold().green());
    println!("Rendered: {}", report.rendered.join(", "));
    if !report.skipped.is_empty() {
        println!("Skipped (no data): {}", report.skipped.join(", ").yellow());
    }
    for failure in &report.failed {
        println!("{} {}: {}", "Failed".red().bold(), failure.step, failure.message);
    }
    for discrepancy in &report.discrepancies {
        println!("{} {}", "Note:".yellow(), discrepancy);
    }
}

fn print_analysis_summary(payload: &AnalysisResult, detailed: bool) {
    println!("\n{}", "=== Comment Analysis Summary ===".bold().green());

    if let Some(meta) = &payload.metadata {
        let panel = panels::metadata_panel(meta);
        println!("{}", panel.title.bold());
        println!("Category: {}  Published: {}", panel.category, panel.published);
        println!("Comments on video: {}", format_thousands(panel.comment_count));
    }

    let stats = panels::stats_panel(payload);
    println!("\nComments analyzed: {} of {}", stats.analyzed, stats.available);
    if stats.partial {
        println!("{}", "Only part of the available comments was analyzed.".yellow());
    }

    if payload.sentiment_counts.is_some() {
        println!("\n{}", "Sentiment:".bold());
        for (name, share) in [
            ("Positive".green(), stats.positive),
            ("Neutral".yellow(), stats.neutral),
            ("Negative".red(), stats.negative),
        ] {
            println!("  {} {} ({:.1}%)", name, share.count, share.percent);
        }
    }

    if let Some(split) = QuestionSplit::resolve(payload) {
        println!(
            "\nQuestions: {}  Statements: {}",
            split.stats.questions, split.stats.statements
        );
        for note in &split.discrepancies {
            println!("  {}", note.yellow());
        }
    }

    if let Some(keywords) = payload.keywords.as_ref().filter(|k| !k.is_empty()) {
        println!("\n{}", "Top 10 keywords:".bold());
        let ranked = rank_by_frequency(keywords.iter().map(|(w, c)| (w.as_str(), *c)));
        for (i, (word, count)) in ranked.iter().take(10).enumerate() {
            println!("  {}. {} ({})", i + 1, word, count);
        }
    }

    if let Some(emotions) = payload.emotion_distribution.as_ref().filter(|e| !e.is_empty()) {
        println!("\n{}", "Emotions:".bold());
        for (emotion, count) in emotions {
            println!("  {emotion}: {count}");
        }
    }

    if let Some(languages) = payload.language_distribution.as_ref().filter(|l| !l.is_empty()) {
        println!("\n{}", "Languages:".bold());
        let ranked = rank_by_frequency(languages.iter().map(|(l, c)| (l.as_str(), *c)));
        for (language, count) in ranked.iter().take(8) {
            println!("  {}: {}", language.to_uppercase(), count);
        }
    }

    if let Some(lengths) = &payload.comment_lengths {
        let panel = panels::length_panel(lengths);
        println!("\n{}", "Comment length:".bold());
        println!("  Average: {} chars  Total: {} chars", panel.average, panel.total_chars);
        if let (Some(min), Some(max)) = (panel.min, panel.max) {
            println!("  Shortest: {min}  Longest: {max}");
        }
    }

    if detailed {
        if let Some(comments) = payload.analyzed_comments.as_deref().filter(|c| !c.is_empty()) {
            println!("\n{}", "Comments:".bold());
            print_table(&tables::render_detailed_analysis(comments, 40));

            let mood = comments
                .iter()
                .map(|c| c.sentiment.compound)
                .sum::<f64>()
                / comments.len() as f64;
            let class = SentimentClass::from_compound(mood);
            let label = match class {
                SentimentClass::Positive => class.label().green(),
                SentimentClass::Neutral => class.label().yellow(),
                SentimentClass::Negative => class.label().red(),
            };
            println!("\nAverage compound score: {:.3} {} {}", mood, class.glyph(), label);
        }
    }
}

fn print_table(table: &Table) {
    let rows: Vec<Vec<&str>> = std::iter::once(table.headers.iter().map(String::as_str).collect())
        .chain(
            table
                .rows
                .iter()
                .map(|row| row.iter().map(|cell| cell.text.as_str()).collect()),
        )
        .collect();

    let cols = table.headers.len();
    let mut col_widths = vec![0; cols];
    for row in &rows {
        for (i, cell) in row.iter().enumerate().take(cols) {
            col_widths[i] = col_widths[i].max(display_width(cell));
        }
    }

    let border = |fill: &str| {
        let mut line = String::from("+");
        for width in &col_widths {
            line.push_str(&fill.repeat(width + 2));
            line.push('+');
        }
        line
    };
    let print_row = |row: &[&str]| {
        let mut line = String::from("|");
        for (i, cell) in row.iter().enumerate().take(cols) {
            let padding = " ".repeat(col_widths[i] - display_width(cell));
            line.push_str(&format!(" {cell}{padding} |"));
        }
        println!("{line}");
    };

    println!("{}", border("-"));
    print_row(&rows[0]);
    println!("{}", border("="));
    for row in &rows[1..] {
        print_row(row);
    }
    println!("{}", border("-"));
}

fn display_width(text: &str) -> usize {
    text.graphemes(true).count()
}
