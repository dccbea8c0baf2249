#![warn(missing_docs)]
//! # fingerprint-app
//!
//! ## Purpose
//! Orchestrates layout, sampling, extraction, and rendering for one
//! fingerprint image.
//!
//! ## Responsibilities
//! - Turn a [`LayoutMode`] and [`GenerationSettings`] into a [`LayoutPlan`]
//!   of timestamped pixel cells.
//! - Validate highlights and pair them with target cells.
//! - Drive the extraction and render collaborators for a full generation.
//! - Provide build-time version and environment-driven defaults.
//!
//! ## Data flow
//! Mode + settings + highlights -> cell geometry -> highlight cells ->
//! timestamps -> [`LayoutPlan`] -> extracted frames ->
//! [`fingerprint_render::RenderRequest`] -> renderer.
//!
//! ## Ownership and lifetimes
//! Plans own their cells and warnings, so they can be serialized or handed
//! to the renderer after the inputs are dropped.
//!
//! ## Error model
//! Subsystem failures are wrapped in [`AppError`]. Out-of-range highlights are
//! not errors; they surface as [`LayoutWarning`] values on the plan.

use std::path::{Path, PathBuf};

use fingerprint_core::{
    Cell, CoreError, FillOrder, Highlight, LayoutWarning, PixelRect, compute_fill_order,
    require_positive, validate_duration, validate_highlights,
};
use fingerprint_extract::{ExtractError, ExtractedFrame, FrameExtractor};
use fingerprint_mosaic::{
    HighlightEmphasis, MosaicError, WeightConfig, cells_to_pixel_rects,
    compute_frame_weights, compute_weighted_cell_rects, grid_cell_rects,
};
use fingerprint_quadtree::{
    DEFAULT_QUADTREE_DEPTH, DEFAULT_SEED, QuadtreeError, SubdivisionStyle, generate_quadtree,
};
use fingerprint_render::{
    CellLabels, DEFAULT_QUALITY, OutputFormat, Placement, RenderError, RenderRequest, Renderer,
    RgbColor, with_format_extension,
};
use fingerprint_sampling::{
    DEFAULT_BOOST_FACTOR, SamplingError, assign_highlights_to_cells,
    assign_highlights_to_cells_temporal, compute_weighted_timestamps, even_timestamps,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("FINGERPRINT_VERSION");

/// Environment variable holding the `tracing` filter directive.
pub const LOG_FILTER_ENV: &str = "FINGERPRINT_LOG";

/// Filter used when [`LOG_FILTER_ENV`] is unset or blank.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Environment variable overriding the default quadtree seed.
pub const SEED_ENV: &str = "FINGERPRINT_SEED";

/// Default grid rows.
pub const DEFAULT_ROWS: usize = 20;

/// Default grid columns.
pub const DEFAULT_COLS: usize = 30;

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Reads the log filter directive.
///
/// Unset or blank values fall back to [`DEFAULT_LOG_FILTER`].
pub fn log_filter_from_env() -> String {
    match std::env::var(LOG_FILTER_ENV) {
        Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => DEFAULT_LOG_FILTER.to_string(),
    }
}

/// Reads the default quadtree seed.
///
/// Semantics:
/// - Unset => [`DEFAULT_SEED`].
/// - Unsigned decimal => that seed.
/// - Anything else => [`DEFAULT_SEED`], with a warning.
pub fn seed_from_env() -> u64 {
    match std::env::var(SEED_ENV) {
        Ok(value) => value.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(value = %value, "ignoring unparsable {SEED_ENV}");
            DEFAULT_SEED
        }),
        Err(_) => DEFAULT_SEED,
    }
}

/// Named output size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtworkPreset {
    /// Display name.
    pub name: &'static str,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
}

/// Display-sized canvas presets.
pub const ARTWORK_PRESETS: [ArtworkPreset; 9] = [
    ArtworkPreset { name: "MacBook Pro 16\"", width: 3456, height: 2234 },
    ArtworkPreset { name: "MacBook Pro 14\"", width: 3024, height: 1964 },
    ArtworkPreset { name: "MacBook Air 15\"", width: 2880, height: 1864 },
    ArtworkPreset { name: "MacBook Air 13\"", width: 2560, height: 1664 },
    ArtworkPreset { name: "iMac 24\"", width: 4480, height: 2520 },
    ArtworkPreset { name: "Apple Studio Display", width: 5120, height: 2880 },
    ArtworkPreset { name: "Pro Display XDR", width: 6016, height: 3384 },
    ArtworkPreset { name: "4K UHD", width: 3840, height: 2160 },
    ArtworkPreset { name: "1080p", width: 1920, height: 1080 },
];

/// Looks up a preset by case-insensitive name.
pub fn find_preset(name: &str) -> Option<ArtworkPreset> {
    let wanted = name.trim();
    ARTWORK_PRESETS
        .iter()
        .find(|preset| preset.name.eq_ignore_ascii_case(wanted))
        .copied()
}

/// How cells are laid out on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum LayoutMode {
    /// Uniform grid; frame `i` goes to the `i`-th fill position.
    Grid {
        /// Grid rows.
        rows: usize,
        /// Grid columns.
        cols: usize,
        /// Chronological fill policy.
        fill_order: FillOrder,
    },
    /// Recursive subdivision of the canvas.
    Quadtree {
        /// Subdivision depth limit.
        max_depth: u32,
        /// Split decision policy.
        style: SubdivisionStyle,
        /// Pseudo-random seed.
        seed: u64,
    },
    /// Rows of variable-width cells sized by highlight weights.
    Weighted {
        /// Grid rows.
        rows: usize,
        /// Cells per row.
        cols: usize,
        /// Highlight size tuning.
        weights: WeightConfig,
    },
}

impl LayoutMode {
    /// Default 20x30 grid in standard order.
    pub fn default_grid() -> Self {
        LayoutMode::Grid {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            fill_order: FillOrder::Standard,
        }
    }

    /// Balanced quadtree at the default depth with the given seed.
    pub fn default_quadtree(seed: u64) -> Self {
        LayoutMode::Quadtree {
            max_depth: DEFAULT_QUADTREE_DEPTH,
            style: SubdivisionStyle::Balanced,
            seed,
        }
    }
}

impl Default for LayoutMode {
    fn default() -> Self {
        LayoutMode::default_grid()
    }
}

/// Output and sampling options shared by every layout mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Canvas width in pixels.
    pub canvas_width: u32,
    /// Canvas height in pixels.
    pub canvas_height: u32,
    /// Gap in pixels between neighbouring cells.
    pub padding: u32,
    /// Output encoding.
    pub format: OutputFormat,
    /// Encoder quality for lossy formats.
    pub quality: u8,
    /// Fill color behind padding gaps.
    pub background: RgbColor,
    /// Corner label policy.
    pub labels: CellLabels,
    /// Drop near-black frames during even extraction.
    pub skip_black: bool,
    /// Sampling density multiplier inside highlight zones.
    pub highlight_boost: f64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            canvas_width: 3840,
            canvas_height: 2160,
            padding: 0,
            format: OutputFormat::default(),
            quality: DEFAULT_QUALITY,
            background: RgbColor::default(),
            labels: CellLabels::default(),
            skip_black: false,
            highlight_boost: DEFAULT_BOOST_FACTOR,
        }
    }
}

impl GenerationSettings {
    /// Applies a preset canvas size.
    pub fn with_preset(mut self, preset: ArtworkPreset) -> Self {
        self.canvas_width = preset.width;
        self.canvas_height = preset.height;
        self
    }
}

/// One cell of a planned fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedCell {
    /// Chronological frame index.
    pub index: usize,
    /// Source timestamp in seconds.
    pub timestamp: f64,
    /// Destination rectangle in canvas pixels.
    pub rect: PixelRect,
    /// Whether this cell shows a user-marked highlight.
    pub is_highlight: bool,
    /// Optional corner label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Complete layout decided before any frame is extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutPlan {
    /// Layout mode the plan was built from.
    pub mode: LayoutMode,
    /// Canvas width in pixels.
    pub canvas_width: u32,
    /// Canvas height in pixels.
    pub canvas_height: u32,
    /// Cells in chronological order.
    pub cells: Vec<PlannedCell>,
    /// Non-fatal highlight conditions.
    #[serde(default)]
    pub warnings: Vec<LayoutWarning>,
}

impl LayoutPlan {
    /// Number of highlight cells.
    pub fn highlight_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_highlight).count()
    }

    /// Timestamps of every cell in chronological order.
    pub fn timestamps(&self) -> Vec<f64> {
        self.cells.iter().map(|cell| cell.timestamp).collect()
    }

    /// Builds the render request for frames extracted in cell order.
    ///
    /// # Errors
    /// Returns [`AppError::FrameShortfall`] when fewer frames than cells are
    /// supplied.
    pub fn to_render_request(
        &self,
        frames: &[ExtractedFrame],
        settings: &GenerationSettings,
    ) -> Result<RenderRequest, AppError> {
        if frames.len() < self.cells.len() {
            return Err(AppError::FrameShortfall {
                expected: self.cells.len(),
                actual: frames.len(),
            });
        }

        let mut request = RenderRequest::new(self.canvas_width, self.canvas_height, settings.format)
            .with_background(settings.background)
            .with_quality(settings.quality);
        request.placements = self
            .cells
            .iter()
            .zip(frames)
            .map(|(cell, frame)| Placement {
                frame_path: frame.path.clone(),
                rect: cell.rect,
                label: cell.label.clone(),
            })
            .collect();
        Ok(request)
    }
}

/// Plans cell geometry, highlight placement, and timestamps.
///
/// # Semantics
/// - Grid: uniform rects; frame `i` lands on the `i`-th fill position.
///   Highlights go to cells by timeline position.
/// - Quadtree: leaves in reading order; highlights go to the largest cells.
/// - Weighted: highlights go to cells by timeline position, then row widths
///   follow the emphasis weights.
///
/// Sorted highlight times are paired with sorted highlight cells. The other
/// cells take boosted weighted timestamps in order, or evenly spaced
/// timestamps when no highlight survives validation.
///
/// # Errors
/// Returns [`AppError`] for a non-positive duration, an empty canvas or
/// grid, or an invalid quadtree depth.
pub fn plan_layout(
    mode: LayoutMode,
    settings: &GenerationSettings,
    duration: f64,
    highlights: &[Highlight],
) -> Result<LayoutPlan, AppError> {
    let duration = validate_duration(duration)?;
    require_positive("canvas width", settings.canvas_width as usize)?;
    require_positive("canvas height", settings.canvas_height as usize)?;
    let (width, height, padding) = (
        settings.canvas_width,
        settings.canvas_height,
        settings.padding,
    );

    let capacity = match mode {
        LayoutMode::Grid { rows, cols, .. } | LayoutMode::Weighted { rows, cols, .. } => {
            require_positive("rows", rows)?;
            require_positive("columns", cols)?;
            rows * cols
        }
        LayoutMode::Quadtree { .. } => 0,
    };

    let quadtree_cells: Vec<Cell> = match mode {
        LayoutMode::Quadtree {
            max_depth,
            style,
            seed,
        } => generate_quadtree(max_depth, style, seed)?,
        _ => Vec::new(),
    };
    let total = if quadtree_cells.is_empty() {
        capacity
    } else {
        quadtree_cells.len()
    };

    let selection = validate_highlights(highlights, Some(duration), total);
    let highlight_times = selection.timestamps();
    let highlight_cells = match mode {
        LayoutMode::Quadtree { .. } => {
            assign_highlights_to_cells(&quadtree_cells, highlight_times.len())
        }
        _ => assign_highlights_to_cells_temporal(&highlight_times, duration, total)?,
    };

    let rects: Vec<PixelRect> = match mode {
        LayoutMode::Grid {
            rows,
            cols,
            fill_order,
        } => {
            let raster = grid_cell_rects(rows, cols, width, height, padding)?;
            compute_fill_order(rows, cols, fill_order)
                .into_iter()
                .map(|position| raster[position.raster_index(cols)])
                .collect()
        }
        LayoutMode::Quadtree { .. } => cells_to_pixel_rects(&quadtree_cells, width, height, padding),
        LayoutMode::Weighted {
            rows,
            cols,
            weights,
        } => {
            let emphases: Vec<HighlightEmphasis> = highlight_cells
                .iter()
                .zip(&selection.highlights)
                .map(|(&cell_index, highlight)| HighlightEmphasis {
                    cell_index,
                    style: highlight.emphasis,
                })
                .collect();
            let frame_weights = compute_frame_weights(total, &emphases, weights);
            compute_weighted_cell_rects(&frame_weights, rows, cols, width, height, padding)?
        }
    };

    let timestamps = cell_timestamps(
        duration,
        total,
        &highlight_cells,
        &highlight_times,
        settings.highlight_boost,
    )?;

    let cells = rects
        .into_iter()
        .zip(timestamps)
        .enumerate()
        .map(|(index, (rect, (timestamp, is_highlight)))| PlannedCell {
            index,
            timestamp,
            rect,
            is_highlight,
            label: settings.labels.label_for(index, timestamp),
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        cells = cells.len(),
        highlights = highlight_cells.len(),
        warnings = selection.warnings.len(),
        "layout planned"
    );

    Ok(LayoutPlan {
        mode,
        canvas_width: width,
        canvas_height: height,
        cells,
        warnings: selection.warnings,
    })
}

/// Timestamp and highlight flag for every cell in chronological order.
fn cell_timestamps(
    duration: f64,
    total: usize,
    highlight_cells: &[usize],
    highlight_times: &[f64],
    boost: f64,
) -> Result<Vec<(f64, bool)>, AppError> {
    if highlight_cells.is_empty() {
        return Ok(even_timestamps(duration, total)?
            .into_iter()
            .map(|timestamp| (timestamp, false))
            .collect());
    }

    let regular_count = total - highlight_cells.len();
    let regular = if regular_count > 0 {
        compute_weighted_timestamps(duration, regular_count, highlight_times, boost)?
    } else {
        Vec::new()
    };

    let mut highlight_iter = highlight_cells.iter().zip(highlight_times).peekable();
    let mut regular_iter = regular.into_iter();
    let mut timestamps = Vec::with_capacity(total);
    for index in 0..total {
        match highlight_iter.peek() {
            Some(&(&cell, &time)) if cell == index => {
                highlight_iter.next();
                timestamps.push((time, true));
            }
            _ => timestamps.push((regular_iter.next().unwrap_or(0.0), false)),
        }
    }
    Ok(timestamps)
}

/// Everything needed to produce one fingerprint file.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Source video.
    pub video: PathBuf,
    /// Destination file; the extension is replaced to match the format.
    pub output: PathBuf,
    /// Layout mode.
    pub mode: LayoutMode,
    /// Output and sampling options.
    pub settings: GenerationSettings,
    /// User-marked highlights.
    pub highlights: Vec<Highlight>,
}

/// Result of a completed generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    /// File written by the renderer.
    pub output: PathBuf,
    /// Plan with timestamps of the frames actually extracted.
    pub plan: LayoutPlan,
}

/// Runs probe, planning, extraction, and rendering.
///
/// Plans without highlights use the extractor's even spacing, which honors
/// `skip_black`; the plan's timestamps and labels are then updated to the
/// frames actually chosen. Plans with highlights extract at the planned
/// timestamps.
///
/// # Errors
/// Returns [`AppError`] when any stage fails or the extractor returns fewer
/// frames than planned cells.
pub fn generate_fingerprint(
    request: &GenerationRequest,
    extractor: &dyn FrameExtractor,
    renderer: &dyn Renderer,
) -> Result<GenerationReport, AppError> {
    let info = extractor.probe(&request.video)?;
    tracing::info!(
        video = %request.video.display(),
        duration = info.duration,
        width = info.width,
        height = info.height,
        "video probed"
    );

    let mut plan = plan_layout(
        request.mode,
        &request.settings,
        info.duration,
        &request.highlights,
    )?;
    tracing::info!(
        cells = plan.cells.len(),
        highlights = plan.highlight_count(),
        warnings = plan.warnings.len(),
        "layout planned"
    );

    let frames = if plan.highlight_count() == 0 {
        let frames = extractor.extract_evenly(
            &request.video,
            plan.cells.len(),
            request.settings.skip_black,
        )?;
        retime_cells(&mut plan, &frames, request.settings.labels);
        frames
    } else {
        extractor.extract_at(&request.video, &plan.timestamps())?
    };
    tracing::info!(frames = frames.len(), cells = plan.cells.len(), "frames extracted");

    let render_request = plan.to_render_request(&frames, &request.settings)?;
    let output = with_format_extension(&request.output, request.settings.format);
    renderer.render(&render_request, &output)?;
    tracing::info!(output = %output.display(), "fingerprint rendered");

    Ok(GenerationReport { output, plan })
}

fn retime_cells(plan: &mut LayoutPlan, frames: &[ExtractedFrame], labels: CellLabels) {
    for (cell, frame) in plan.cells.iter_mut().zip(frames) {
        cell.timestamp = frame.timestamp;
        cell.label = labels.label_for(cell.index, frame.timestamp);
    }
}

/// Resolves the output path for a video when none is given.
///
/// `movie.mp4` becomes `movie_fingerprint.<ext>` next to the video.
pub fn default_output_path(video: &Path, format: OutputFormat) -> PathBuf {
    let stem = video
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "fingerprint".to_string());
    video.with_file_name(format!("{stem}_fingerprint.{}", format.extension()))
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Argument validation error.
    #[error("invalid argument: {0}")]
    Core(#[from] CoreError),
    /// Quadtree generation error.
    #[error("quadtree error: {0}")]
    Quadtree(#[from] QuadtreeError),
    /// Rect mapping error.
    #[error("mosaic error: {0}")]
    Mosaic(#[from] MosaicError),
    /// Timestamp sampling error.
    #[error("sampling error: {0}")]
    Sampling(#[from] SamplingError),
    /// Frame extraction error.
    #[error("extraction error: {0}")]
    Extract(#[from] ExtractError),
    /// Render contract or backend error.
    #[error("render error: {0}")]
    Render(#[from] RenderError),
    /// Extractor returned fewer frames than planned cells.
    #[error("expected {expected} frames, extractor returned {actual}")]
    FrameShortfall {
        /// Planned cell count.
        expected: usize,
        /// Frames actually returned.
        actual: usize,
    },
}
