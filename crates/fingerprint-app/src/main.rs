#![warn(missing_docs)]
//! # fingerprint-app binary
//!
//! Command-line entry point: prints layout plans and dry-run render requests.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use fingerprint_app::{
    AppError, GenerationRequest, GenerationSettings, LayoutMode, app_version, default_output_path,
    find_preset, generate_fingerprint, log_filter_from_env, plan_layout, seed_from_env,
};
use fingerprint_core::{EmphasisStyle, FillOrder, Highlight, parse_timestamp};
use fingerprint_extract::{SyntheticExtractor, VideoInfo, estimate_frame_count};
use fingerprint_mosaic::WeightConfig;
use fingerprint_quadtree::{DEFAULT_QUADTREE_DEPTH, MAX_QUADTREE_DEPTH, SubdivisionStyle};
use fingerprint_render::{CellLabels, OutputFormat, RecordingRenderer, RgbColor};
use tracing_subscriber::{EnvFilter, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "fingerprint-app", version = app_version(), about = "Movie fingerprint layout engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the layout plan for a video of the given duration as JSON
    Plan(PlanArgs),
    /// Run a full generation against synthetic frames and print the render request
    Simulate {
        #[command(flatten)]
        plan: PlanArgs,
        /// Source frame rate as `num/den`
        #[arg(long, default_value = "24/1")]
        frame_rate: String,
        /// Video path recorded in the request
        #[arg(long, default_value = "movie.mp4")]
        video: PathBuf,
        /// Output path; defaults to `<video>_fingerprint.<ext>`
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the application version
    Version,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ModeArg {
    Grid,
    Quadtree,
    Weighted,
}

#[derive(Args, Debug)]
struct PlanArgs {
    /// Video duration as seconds, `M:SS` or `H:MM:SS`
    #[arg(long, value_parser = parse_timestamp)]
    duration: f64,

    /// Layout mode
    #[arg(long, value_enum, default_value_t = ModeArg::Grid)]
    mode: ModeArg,

    /// Grid rows
    #[arg(long, default_value_t = fingerprint_app::DEFAULT_ROWS)]
    rows: usize,

    /// Grid columns
    #[arg(long, default_value_t = fingerprint_app::DEFAULT_COLS)]
    cols: usize,

    /// Fill order for grid mode
    #[arg(long, default_value = "standard")]
    fill_order: FillOrder,

    /// Quadtree depth
    #[arg(
        long,
        default_value_t = DEFAULT_QUADTREE_DEPTH,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_QUADTREE_DEPTH))
    )]
    depth: u32,

    /// Quadtree subdivision style
    #[arg(long, default_value = "balanced")]
    style: SubdivisionStyle,

    /// Quadtree seed; defaults to FINGERPRINT_SEED or 42
    #[arg(long)]
    seed: Option<u64>,

    /// Neighbours ramped on each side of a highlight in weighted mode
    #[arg(long, default_value_t = 3)]
    ramp_length: usize,

    /// Highlight cell weight in weighted mode
    #[arg(long, default_value_t = 3.0)]
    size_boost: f64,

    /// Highlight as `TIME` or `TIME@EMPHASIS` (repeatable)
    #[arg(long = "highlight", value_name = "TIME[@EMPHASIS]", value_parser = parse_highlight)]
    highlights: Vec<Highlight>,

    /// Sampling density multiplier near highlights
    #[arg(long, default_value_t = fingerprint_sampling::DEFAULT_BOOST_FACTOR)]
    boost: f64,

    /// Canvas size preset name (overrides width and height)
    #[arg(long)]
    preset: Option<String>,

    /// Canvas width in pixels
    #[arg(long, default_value_t = 3840)]
    width: u32,

    /// Canvas height in pixels
    #[arg(long, default_value_t = 2160)]
    height: u32,

    /// Gap in pixels around every cell
    #[arg(long, default_value_t = 0)]
    padding: u32,

    /// Output format
    #[arg(long, default_value = "png")]
    format: OutputFormat,

    /// Quality for JPEG and WebP
    #[arg(long, default_value_t = fingerprint_render::DEFAULT_QUALITY)]
    quality: u8,

    /// Background color name or `#rrggbb`
    #[arg(long, default_value = "black")]
    background: RgbColor,

    /// Cell labels
    #[arg(long, default_value = "none")]
    labels: CellLabels,

    /// Skip near-black frames when no highlights are set
    #[arg(long)]
    skip_black: bool,
}

impl PlanArgs {
    fn mode(&self) -> LayoutMode {
        match self.mode {
            ModeArg::Grid => LayoutMode::Grid {
                rows: self.rows,
                cols: self.cols,
                fill_order: self.fill_order,
            },
            ModeArg::Quadtree => LayoutMode::Quadtree {
                max_depth: self.depth,
                style: self.style,
                seed: self.seed.unwrap_or_else(seed_from_env),
            },
            ModeArg::Weighted => LayoutMode::Weighted {
                rows: self.rows,
                cols: self.cols,
                weights: WeightConfig {
                    ramp_length: self.ramp_length,
                    size_boost: self.size_boost,
                },
            },
        }
    }

    fn settings(&self) -> Result<GenerationSettings, String> {
        let mut settings = GenerationSettings {
            canvas_width: self.width,
            canvas_height: self.height,
            padding: self.padding,
            format: self.format,
            quality: self.quality,
            background: self.background,
            labels: self.labels,
            skip_black: self.skip_black,
            highlight_boost: self.boost,
        };
        if let Some(name) = &self.preset {
            let preset = find_preset(name).ok_or_else(|| format!("unknown preset: {name:?}"))?;
            settings = settings.with_preset(preset);
        }
        Ok(settings)
    }
}

fn parse_highlight(raw: &str) -> Result<Highlight, String> {
    let (time, emphasis) = match raw.split_once('@') {
        Some((time, emphasis)) => (
            time,
            emphasis
                .parse::<EmphasisStyle>()
                .map_err(|error| error.to_string())?,
        ),
        None => (raw, EmphasisStyle::default()),
    };
    let timestamp = parse_timestamp(time).map_err(|error| error.to_string())?;
    Ok(Highlight::at(timestamp).with_emphasis(emphasis))
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_new(log_filter_from_env())
        .unwrap_or_else(|_| EnvFilter::new(fingerprint_app::DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(env_filter),
        )
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            tracing::error!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Plan(args) => {
            let settings = args.settings()?;
            let plan = plan_layout(args.mode(), &settings, args.duration, &args.highlights)
                .map_err(|error| error.to_string())?;
            print_json(&plan)
        }
        Command::Simulate {
            plan,
            frame_rate,
            video,
            output,
        } => {
            let settings = plan.settings()?;
            let frame_count =
                estimate_frame_count(plan.duration, &frame_rate).map_err(|error| error.to_string())?;
            let extractor = SyntheticExtractor::new(
                video.clone(),
                VideoInfo::new(plan.duration, 1920, 1080, frame_count),
            );
            let renderer = RecordingRenderer::new();
            let request = GenerationRequest {
                output: output.unwrap_or_else(|| default_output_path(&video, settings.format)),
                video,
                mode: plan.mode(),
                settings,
                highlights: plan.highlights,
            };
            generate_fingerprint(&request, &extractor, &renderer)
                .map_err(|error: AppError| error.to_string())?;
            let recorded: Vec<_> = renderer
                .rendered()
                .into_iter()
                .map(|(_, request)| request)
                .collect();
            print_json(&recorded)
        }
        Command::Version => {
            println!("fingerprint-app {}", app_version());
            Ok(())
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|error| error.to_string())?;
    println!("{text}");
    Ok(())
}
