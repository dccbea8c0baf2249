#![warn(missing_docs)]
//! # fingerprint-core
//!
//! ## Purpose
//! Defines the pure data model and grid ordering rules shared across the
//! `fingerprint` workspace.
//!
//! ## Responsibilities
//! - Represent normalized layout cells, pixel rectangles, and grid positions.
//! - Map sequential frame indices to grid positions under a fill policy.
//! - Parse and format user-facing timestamp text.
//! - Validate highlight sets against video duration and cell capacity.
//!
//! ## Data flow
//! Layout builders emit [`Cell`] values -> rect mappers turn them into
//! [`PixelRect`] values. Highlight text is parsed with [`parse_timestamp`] and
//! filtered by [`validate_highlights`] before temporal sampling.
//!
//! ## Ownership and lifetimes
//! Every model type is a small owned value (`Copy` where possible) so layout
//! stages never borrow from one another.
//!
//! ## Error model
//! Invalid arguments (unknown policy names, zero dimensions, malformed
//! timestamps) return [`CoreError`]. Out-of-range highlights are not errors:
//! they surface as [`LayoutWarning`] values with a truncation policy.
//!
//! ## Example
//! ```rust
//! use fingerprint_core::{compute_fill_order, FillOrder, FillPosition};
//!
//! let order = compute_fill_order(2, 2, FillOrder::Diagonal);
//! assert_eq!(order[1], FillPosition::new(1, 0));
//! assert_eq!(order.len(), 4);
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rectangle in normalized unit-square coordinates.
///
/// `x`, `y`, `w`, `h` are fractions of the canvas in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub w: f64,
    /// Height.
    pub h: f64,
    /// Subdivision level (0 for non-quadtree cells).
    pub depth: u32,
}

impl Cell {
    /// Creates a normalized cell.
    pub fn new(x: f64, y: f64, w: f64, h: f64, depth: u32) -> Self {
        Self { x, y, w, h, depth }
    }

    /// Normalized area (`w * h`).
    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    /// Normalized center point.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}

/// Integer rectangle in output-canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    /// Left edge in pixels.
    pub x: u32,
    /// Top edge in pixels.
    pub y: u32,
    /// Width in pixels (at least 1).
    pub width: u32,
    /// Height in pixels (at least 1).
    pub height: u32,
}

impl PixelRect {
    /// Creates a pixel rectangle.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }
}

/// Grid coordinate assigned to one frame index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FillPosition {
    /// Zero-based row.
    pub row: usize,
    /// Zero-based column.
    pub col: usize,
}

impl FillPosition {
    /// Creates a grid position.
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Raster index of this position in a grid with `cols` columns.
    pub fn raster_index(&self, cols: usize) -> usize {
        self.row * cols + self.col
    }
}

/// Traversal policy mapping frame index to grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FillOrder {
    /// Row-major raster order.
    #[default]
    Standard,
    /// Square spiral starting at the grid center.
    SpiralFromCenter,
    /// Anti-diagonal sweep from the top-left corner.
    Diagonal,
}

impl FillOrder {
    /// All supported fill policies.
    pub const ALL: [FillOrder; 3] = [
        FillOrder::Standard,
        FillOrder::SpiralFromCenter,
        FillOrder::Diagonal,
    ];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            FillOrder::Standard => "Standard",
            FillOrder::SpiralFromCenter => "Spiral from center",
            FillOrder::Diagonal => "Diagonal",
        }
    }
}

impl fmt::Display for FillOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FillOrder {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize_policy_name(value).as_str() {
            "standard" => Ok(FillOrder::Standard),
            "spiral" | "spiral-from-center" => Ok(FillOrder::SpiralFromCenter),
            "diagonal" => Ok(FillOrder::Diagonal),
            _ => Err(CoreError::UnknownPolicy {
                kind: "fill order",
                value: value.to_string(),
            }),
        }
    }
}

/// Computes the grid position of every frame index under `order`.
///
/// # Semantics
/// The result has exactly `rows * cols` entries and visits each grid cell
/// once. A zero dimension yields an empty sequence.
pub fn compute_fill_order(rows: usize, cols: usize, order: FillOrder) -> Vec<FillPosition> {
    if rows == 0 || cols == 0 {
        return Vec::new();
    }

    match order {
        FillOrder::Standard => standard_order(rows, cols),
        FillOrder::SpiralFromCenter => spiral_from_center(rows, cols),
        FillOrder::Diagonal => diagonal_order(rows, cols),
    }
}

fn standard_order(rows: usize, cols: usize) -> Vec<FillPosition> {
    (0..rows)
        .flat_map(|row| (0..cols).map(move |col| FillPosition::new(row, col)))
        .collect()
}

fn spiral_from_center(rows: usize, cols: usize) -> Vec<FillPosition> {
    // right, down, left, up
    const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

    let total = rows * cols;
    let mut row = (rows / 2) as isize;
    let mut col = (cols / 2) as isize;
    let mut positions = Vec::with_capacity(total);
    positions.push(FillPosition::new(rows / 2, cols / 2));

    let mut direction = 0;
    let mut steps = 1;

    while positions.len() < total {
        // Invariant:
        // - Each step length is walked for two consecutive directions.
        for _ in 0..2 {
            for _ in 0..steps {
                row += DIRECTIONS[direction].0;
                col += DIRECTIONS[direction].1;
                if (0..rows as isize).contains(&row) && (0..cols as isize).contains(&col) {
                    positions.push(FillPosition::new(row as usize, col as usize));
                }
                if positions.len() >= total {
                    break;
                }
            }
            direction = (direction + 1) % DIRECTIONS.len();
            if positions.len() >= total {
                break;
            }
        }
        steps += 1;
    }

    positions.truncate(total);
    positions
}

fn diagonal_order(rows: usize, cols: usize) -> Vec<FillPosition> {
    let mut positions = Vec::with_capacity(rows * cols);
    for diagonal in 0..rows + cols - 1 {
        let row_start = diagonal.min(rows - 1);
        let row_end = diagonal.saturating_sub(cols - 1);
        for row in (row_end..=row_start).rev() {
            positions.push(FillPosition::new(row, diagonal - row));
        }
    }
    positions
}

/// Neighbouring-cell size gradient applied around a highlight cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmphasisStyle {
    /// Only the highlight cell grows.
    #[default]
    Bigger,
    /// Preceding cells grow toward the highlight.
    RampUp,
    /// Following cells shrink away from the highlight.
    RampDown,
    /// Both neighbours ramp.
    RampUpAndDown,
}

impl EmphasisStyle {
    /// Returns `true` when cells before the highlight receive ramp weight.
    pub fn ramps_before(&self) -> bool {
        matches!(self, EmphasisStyle::RampUp | EmphasisStyle::RampUpAndDown)
    }

    /// Returns `true` when cells after the highlight receive ramp weight.
    pub fn ramps_after(&self) -> bool {
        matches!(self, EmphasisStyle::RampDown | EmphasisStyle::RampUpAndDown)
    }
}

impl FromStr for EmphasisStyle {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize_policy_name(value).as_str() {
            "bigger" => Ok(EmphasisStyle::Bigger),
            "ramp-up" => Ok(EmphasisStyle::RampUp),
            "ramp-down" => Ok(EmphasisStyle::RampDown),
            "ramp-up-and-down" | "ramp-both" => Ok(EmphasisStyle::RampUpAndDown),
            _ => Err(CoreError::UnknownPolicy {
                kind: "emphasis style",
                value: value.to_string(),
            }),
        }
    }
}

/// User-marked moment that gets its own, usually larger, cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    /// Position on the video timeline in seconds.
    pub timestamp: f64,
    /// Size gradient applied in weighted layouts.
    #[serde(default)]
    pub emphasis: EmphasisStyle,
}

impl Highlight {
    /// Creates a highlight with default emphasis.
    pub fn at(timestamp: f64) -> Self {
        Self {
            timestamp,
            emphasis: EmphasisStyle::default(),
        }
    }

    /// Returns a copy with a different emphasis style.
    pub fn with_emphasis(self, emphasis: EmphasisStyle) -> Self {
        Self { emphasis, ..self }
    }
}

/// Non-fatal condition reported alongside a usable layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutWarning {
    /// Highlight lies after the end of the video and was dropped.
    HighlightBeyondDuration {
        /// Offending timestamp in seconds.
        timestamp: f64,
        /// Video duration in seconds.
        duration: f64,
    },
    /// More highlights than cells; only the first `available` are used.
    TooManyHighlights {
        /// Highlight count after filtering.
        requested: usize,
        /// Cells available for highlights.
        available: usize,
    },
    /// Same timestamp marked twice; the repeat was dropped.
    DuplicateHighlight {
        /// Repeated timestamp in seconds.
        timestamp: f64,
    },
}

impl fmt::Display for LayoutWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutWarning::HighlightBeyondDuration {
                timestamp,
                duration,
            } => write!(
                f,
                "timestamp {} exceeds video duration ({duration:.1}s)",
                format_timestamp(*timestamp)
            ),
            LayoutWarning::TooManyHighlights {
                requested,
                available,
            } => write!(
                f,
                "{requested} highlights but only {available} cells; using the first {available}"
            ),
            LayoutWarning::DuplicateHighlight { timestamp } => {
                write!(f, "duplicate highlight at {}", format_timestamp(*timestamp))
            }
        }
    }
}

/// Highlights that survived validation plus the warnings raised on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighlightSelection {
    /// Accepted highlights in ascending timestamp order.
    pub highlights: Vec<Highlight>,
    /// Conditions the caller should surface to the user.
    pub warnings: Vec<LayoutWarning>,
}

impl HighlightSelection {
    /// Accepted timestamps in ascending order.
    pub fn timestamps(&self) -> Vec<f64> {
        self.highlights.iter().map(|h| h.timestamp).collect()
    }
}

/// Sorts, de-duplicates, and truncates a highlight set.
///
/// # Semantics
/// - Highlights with the exact same timestamp keep only the first entry.
/// - When `duration` is known, timestamps greater than it are dropped.
/// - At most `capacity` highlights are kept (earliest first).
///
/// Every dropped highlight produces one [`LayoutWarning`].
pub fn validate_highlights(
    highlights: &[Highlight],
    duration: Option<f64>,
    capacity: usize,
) -> HighlightSelection {
    let mut sorted = highlights.to_vec();
    sorted.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

    let mut selection = HighlightSelection::default();
    for highlight in sorted {
        if selection
            .highlights
            .last()
            .is_some_and(|previous| previous.timestamp == highlight.timestamp)
        {
            selection.warnings.push(LayoutWarning::DuplicateHighlight {
                timestamp: highlight.timestamp,
            });
            continue;
        }

        if let Some(duration) = duration
            && highlight.timestamp > duration
        {
            tracing::warn!(
                timestamp = highlight.timestamp,
                duration,
                "highlight exceeds video duration"
            );
            selection
                .warnings
                .push(LayoutWarning::HighlightBeyondDuration {
                    timestamp: highlight.timestamp,
                    duration,
                });
            continue;
        }

        selection.highlights.push(highlight);
    }

    if selection.highlights.len() > capacity {
        tracing::warn!(
            requested = selection.highlights.len(),
            available = capacity,
            "more highlights than cells; truncating"
        );
        selection.warnings.push(LayoutWarning::TooManyHighlights {
            requested: selection.highlights.len(),
            available: capacity,
        });
        selection.highlights.truncate(capacity);
    }

    selection
}

// Patterns are literals; a build failure leaves the form unmatched.
static HOURS_MINUTES_SECONDS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(\d+):(\d{1,2}):(\d{1,2}(?:\.\d+)?)$").ok());

static MINUTES_SECONDS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(\d+):(\d{1,2}(?:\.\d+)?)$").ok());

/// Parses `H:MM:SS`, `M:SS`, or raw seconds into seconds.
///
/// Fractional seconds are accepted in every form (`1:02.5`, `45.5`).
///
/// # Errors
/// Returns [`CoreError::InvalidTimestamp`] for negative, non-finite, or
/// unrecognised input.
pub fn parse_timestamp(text: &str) -> Result<f64, CoreError> {
    let text = text.trim();
    let invalid = || CoreError::InvalidTimestamp(text.to_string());

    if let Ok(seconds) = text.parse::<f64>() {
        if seconds.is_finite() && seconds >= 0.0 {
            return Ok(seconds);
        }
        return Err(invalid());
    }

    if let Some(captures) = HOURS_MINUTES_SECONDS
        .as_ref()
        .and_then(|pattern| pattern.captures(text))
    {
        let hours: u64 = captures[1].parse().map_err(|_| invalid())?;
        let minutes: u64 = captures[2].parse().map_err(|_| invalid())?;
        let seconds: f64 = captures[3].parse().map_err(|_| invalid())?;
        return Ok(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds);
    }

    if let Some(captures) = MINUTES_SECONDS
        .as_ref()
        .and_then(|pattern| pattern.captures(text))
    {
        let minutes: u64 = captures[1].parse().map_err(|_| invalid())?;
        let seconds: f64 = captures[2].parse().map_err(|_| invalid())?;
        return Ok(minutes as f64 * 60.0 + seconds);
    }

    Err(invalid())
}

/// Formats seconds as `H:MM:SS.ss`, or `M:SS.ss` below one hour.
pub fn format_timestamp(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let hours = (seconds / 3600.0).floor() as u64;
    let minutes = ((seconds % 3600.0) / 60.0).floor() as u64;
    let rest = seconds % 60.0;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{rest:05.2}")
    } else {
        format!("{minutes}:{rest:05.2}")
    }
}

/// Formats seconds as a compact `M:SS` cell caption.
pub fn format_cell_label(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let minutes = (seconds / 60.0).floor() as u64;
    let rest = (seconds % 60.0).floor() as u64;
    format!("{minutes}:{rest:02}")
}

/// Validates that a video duration is usable for sampling.
///
/// # Errors
/// Returns [`CoreError::InvalidDuration`] for non-finite or non-positive input.
pub fn validate_duration(duration: f64) -> Result<f64, CoreError> {
    if duration.is_finite() && duration > 0.0 {
        Ok(duration)
    } else {
        Err(CoreError::InvalidDuration(duration))
    }
}

/// Validates that a count-like argument is strictly positive.
///
/// # Errors
/// Returns [`CoreError::NonPositive`] naming the argument when `value == 0`.
pub fn require_positive(name: &'static str, value: usize) -> Result<usize, CoreError> {
    if value == 0 {
        Err(CoreError::NonPositive { name })
    } else {
        Ok(value)
    }
}

fn normalize_policy_name(value: &str) -> String {
    value
        .trim()
        .to_ascii_lowercase()
        .replace(['_', ' '], "-")
}

/// Error type for core argument validation.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    /// Policy name outside the closed set.
    #[error("unknown {kind}: {value:?}")]
    UnknownPolicy {
        /// Policy family (fill order, subdivision style, ...).
        kind: &'static str,
        /// Rejected input.
        value: String,
    },
    /// Count or dimension argument was zero.
    #[error("{name} must be greater than zero")]
    NonPositive {
        /// Argument name.
        name: &'static str,
    },
    /// Timestamp text could not be parsed.
    #[error("unrecognised timestamp format: {0:?}")]
    InvalidTimestamp(String),
    /// Video duration is not a positive finite number.
    #[error("invalid video duration: {0}")]
    InvalidDuration(f64),
}
