mod annotation;
mod config;
mod engine;
mod error;
mod indicator;
mod model;
mod normalize;
mod pipeline;
mod present;
mod provider;
mod render;

use std::path::Path;

use chrono::NaiveDate;
use clap::Parser;
use derive_more::{Display, Error};
use error_stack::{Report, ResultExt};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use annotation::{AnnotationSet, parse_canvas_arg};
use config::AppConfig;
use model::{PriceQuery, RawTable};
use render::Renderer;
use render::json::JsonFileRenderer;
use render::terminal::TerminalRenderer;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("configuration error")]
    Config,
    #[display("price provider error")]
    Provider,
    #[display("dashboard pipeline error")]
    Pipeline,
    #[display("render error")]
    Render,
}

#[derive(Parser)]
#[command(
    name = "market-dashboard",
    about = "Daily price dashboard with Bollinger Bands and accumulation/distribution"
)]
struct Cli {
    /// Path to the TOML configuration file (defaults apply when absent)
    #[arg(short, long)]
    config: Option<String>,

    /// Ticker symbol, e.g. BTC-USD
    #[arg(short, long)]
    symbol: Option<String>,

    /// First day of the range (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Day after the last day of the range (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,

    #[arg(short, long)]
    output_dir: Option<String>,

    /// Sidebar note; may be repeated
    #[arg(long = "note")]
    notes: Vec<String>,

    /// Zero-based index of a note to remove after collection; may be repeated
    #[arg(long = "drop-note")]
    drop_notes: Vec<usize>,

    /// Canvas text placed at a position, as TEXT@X,Y; may be repeated
    #[arg(long = "canvas-note")]
    canvas_notes: Vec<String>,
}

#[tokio::main]
async fn main() {
    if let Err(report) = run().await {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Report<AppError>> {
    let cli = Cli::parse();
    let config = load_config(&cli).change_context(AppError::Config)?;

    init_tracing(&config);

    let query = PriceQuery {
        symbol: config.query.symbol.trim().to_uppercase(),
        start: config.query.start,
        end: config.query.end,
    };
    let annotations = collect_annotations(&cli);

    let raw = if query.symbol.is_empty() {
        warn!("no symbol given, building an empty dashboard");
        RawTable::default()
    } else {
        let provider = provider::build(&config.provider).change_context(AppError::Provider)?;
        info!(provider = provider.name(), query = %query, "fetching price history");
        provider
            .fetch(&query)
            .await
            .change_context(AppError::Provider)?
    };

    let dashboard = pipeline::run(
        raw,
        query,
        &config.indicators,
        &config.chart,
        annotations,
    )
    .change_context(AppError::Pipeline)?;

    let renderers: Vec<Box<dyn Renderer>> = vec![
        Box::new(JsonFileRenderer::new(&config.general.output_dir)),
        Box::new(TerminalRenderer),
    ];
    for renderer in &renderers {
        renderer
            .render(&dashboard)
            .change_context(AppError::Render)?;
    }

    Ok(())
}

/// Load the config file (or defaults when none exists) and apply CLI
/// overrides before validating.
fn load_config(cli: &Cli) -> Result<AppConfig, Report<error::ConfigError>> {
    let mut config = match &cli.config {
        Some(path) => config::load(Path::new(path))?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            config::load(Path::new(DEFAULT_CONFIG_PATH))?
        }
        None => AppConfig::default(),
    };

    if let Some(symbol) = &cli.symbol {
        config.query.symbol = symbol.clone();
    }
    if let Some(start) = cli.start {
        config.query.start = start;
    }
    if let Some(end) = cli.end {
        config.query.end = end;
    }
    if let Some(dir) = &cli.output_dir {
        config.general.output_dir = dir.clone();
    }

    config::validate(&config)?;
    Ok(config)
}

fn collect_annotations(cli: &Cli) -> AnnotationSet {
    let mut annotations = AnnotationSet::default();
    for note in &cli.notes {
        if !annotations.add_note(note) {
            warn!("ignoring blank note");
        }
    }
    annotations.remove_notes(&cli.drop_notes);
    for arg in &cli.canvas_notes {
        match parse_canvas_arg(arg) {
            Some((text, x, y)) => {
                if !annotations.add_canvas_text(&text, x, y) {
                    warn!("ignoring blank canvas note");
                }
            }
            None => warn!(arg = %arg, "canvas note must look like TEXT@X,Y, skipping"),
        }
    }
    if !annotations.is_empty() {
        info!(
            notes = annotations.text_annotations.len(),
            canvas = annotations.canvas_annotations.len(),
            "annotations attached"
        );
    }
    annotations
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::new(&config.general.log_level);
    match config.general.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .init();
        }
        _ => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}
