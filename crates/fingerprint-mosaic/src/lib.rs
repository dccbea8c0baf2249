#![warn(missing_docs)]
//! # fingerprint-mosaic
//!
//! ## Purpose
//! Turns layout geometry into integer pixel rectangles on the output canvas.
//!
//! ## Responsibilities
//! - Scale normalized cells to pixels with a symmetric padding inset.
//! - Derive per-cell size weights from highlight emphasis styles.
//! - Lay out variable-size rows whose pixel sums match the canvas exactly.
//!
//! ## Data flow
//! Quadtree leaves -> [`cells_to_pixel_rects`] -> [`PixelRect`] list.
//! Highlight cells -> [`compute_frame_weights`] ->
//! [`compute_weighted_cell_rects`] -> [`PixelRect`] list.
//!
//! ## Ownership and lifetimes
//! Inputs are borrowed slices; every call returns an owned rect list with the
//! same order as its input.
//!
//! ## Error model
//! Zero row or column counts fail with [`MosaicError::InvalidGrid`]. Zero
//! total weight is not an error: the layout falls back to uniform weights.
//!
//! ## Rounding notes
//! All rounding is half-to-even. [`cells_to_pixel_rects`] rounds every cell
//! independently, so interior neighbours may show +-1px seams; only cells on
//! the right and bottom canvas edges take the remainder. The weighted layout
//! rounds cumulative edges instead of sizes, so the last row and the last
//! cell of each row absorb the remainder and row heights and row widths
//! always sum to the canvas size.

use fingerprint_core::{Cell, EmphasisStyle, PixelRect};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Converts normalized cells into padded pixel rectangles.
///
/// # Parameters
/// - `cells`: Normalized cells, typically quadtree leaves in reading order.
/// - `padding`: Total gap per cell; the origin moves by `padding / 2` and the
///   size shrinks by `padding`.
///
/// # Returns
/// One rect per cell, in input order, each at least 1x1. Interior edges are
/// rounded per cell; cells on the right or bottom canvas edge extend exactly
/// to it.
pub fn cells_to_pixel_rects(
    cells: &[Cell],
    canvas_width: u32,
    canvas_height: u32,
    padding: u32,
) -> Vec<PixelRect> {
    let width = f64::from(canvas_width);
    let height = f64::from(canvas_height);

    cells
        .iter()
        .map(|cell| {
            let x = round_px(cell.x * width);
            let y = round_px(cell.y * height);
            let w = if touches_far_edge(cell.x + cell.w) {
                i64::from(canvas_width) - x
            } else {
                round_px(cell.w * width)
            };
            let h = if touches_far_edge(cell.y + cell.h) {
                i64::from(canvas_height) - y
            } else {
                round_px(cell.h * height)
            };
            inset_rect(x, y, w, h, padding)
        })
        .collect()
}

/// Cells ending on the right or bottom canvas edge absorb the remainder.
fn touches_far_edge(normalized_end: f64) -> bool {
    normalized_end >= 1.0 - EDGE_EPSILON
}

const EDGE_EPSILON: f64 = 1e-9;

/// Raster-order rects of a uniform `rows x cols` grid.
///
/// # Errors
/// Returns [`MosaicError::InvalidGrid`] when either dimension is zero.
pub fn grid_cell_rects(
    rows: usize,
    cols: usize,
    canvas_width: u32,
    canvas_height: u32,
    padding: u32,
) -> Result<Vec<PixelRect>, MosaicError> {
    let weights = vec![1.0_f64; rows.saturating_mul(cols)];
    compute_weighted_cell_rects(&weights, rows, cols, canvas_width, canvas_height, padding)
}

/// Highlight cell paired with the emphasis applied around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightEmphasis {
    /// Index of the highlight cell in frame order.
    pub cell_index: usize,
    /// Neighbour gradient around the cell.
    pub style: EmphasisStyle,
}

/// Tuning for highlight size weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightConfig {
    /// Number of neighbours on each ramped side.
    pub ramp_length: usize,
    /// Weight of a highlight cell (regular cells weigh 1.0).
    pub size_boost: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            ramp_length: 3,
            size_boost: 3.0,
        }
    }
}

/// Computes one size weight per frame.
///
/// # Semantics
/// - Every cell starts at 1.0.
/// - A highlight cell rises to `size_boost`.
/// - Ramped neighbours at distance `step` rise to
///   `1 + (size_boost - 1) * (ramp_length - step) / ramp_length`.
/// - Overlapping boosts resolve with `max`, never by addition.
///
/// Emphases are applied in ascending cell order; indices outside
/// `0..total_frames` are ignored.
pub fn compute_frame_weights(
    total_frames: usize,
    emphases: &[HighlightEmphasis],
    config: WeightConfig,
) -> Vec<f64> {
    let mut weights = vec![1.0_f64; total_frames];
    let mut sorted = emphases.to_vec();
    sorted.sort_by_key(|emphasis| emphasis.cell_index);

    for emphasis in sorted {
        let index = emphasis.cell_index;
        if index >= total_frames {
            continue;
        }
        weights[index] = weights[index].max(config.size_boost);

        for step in 1..=config.ramp_length {
            let ramp = 1.0
                + (config.size_boost - 1.0) * (config.ramp_length - step) as f64
                    / config.ramp_length as f64;

            if emphasis.style.ramps_before()
                && let Some(before) = index.checked_sub(step)
            {
                weights[before] = weights[before].max(ramp);
            }
            if emphasis.style.ramps_after() && index + step < total_frames {
                weights[index + step] = weights[index + step].max(ramp);
            }
        }
    }

    weights
}

/// Lays out weighted cells in rows of up to `cols` cells.
///
/// # Semantics
/// - Weights are chunked into at most `rows` rows; the last row may be short
///   and weights beyond `rows * cols` are not placed.
/// - Row edges sit at the rounded cumulative share of the row weight sums;
///   the last row ends on the canvas bottom.
/// - Cell edges sit at the rounded cumulative share of the cell weights
///   within the row; the last cell ends on the canvas right edge.
/// - Rounding never accumulates, so no rect starts past the canvas even when
///   there are more rows or columns than pixels.
/// - Padding is applied exactly as in [`cells_to_pixel_rects`].
///
/// Non-finite or negative weights count as zero. A zero total weight lays
/// out every cell with weight 1.0; a zero-weight row splits its width evenly.
///
/// # Errors
/// Returns [`MosaicError::InvalidGrid`] when `rows == 0` or `cols == 0`.
pub fn compute_weighted_cell_rects(
    weights: &[f64],
    rows: usize,
    cols: usize,
    canvas_width: u32,
    canvas_height: u32,
    padding: u32,
) -> Result<Vec<PixelRect>, MosaicError> {
    if rows == 0 || cols == 0 {
        return Err(MosaicError::InvalidGrid { rows, cols });
    }

    let placed = weights.len().min(rows * cols);
    let mut sanitized: Vec<f64> = weights[..placed]
        .iter()
        .map(|weight| {
            if weight.is_finite() && *weight > 0.0 {
                *weight
            } else {
                0.0
            }
        })
        .collect();

    if sanitized.iter().sum::<f64>() <= 0.0 {
        tracing::debug!(cells = placed, "zero total weight; using uniform weights");
        sanitized.fill(1.0);
    }

    let row_chunks: Vec<&[f64]> = sanitized.chunks(cols).collect();
    let row_sums: Vec<f64> = row_chunks.iter().map(|row| row.iter().sum()).collect();
    let total_weight: f64 = row_sums.iter().sum();

    let row_spans = split_proportionally(&row_sums, total_weight, i64::from(canvas_height));

    let mut rects = Vec::with_capacity(placed);
    for ((row, row_sum), (y, row_height)) in row_chunks.iter().zip(&row_sums).zip(row_spans) {
        let cell_spans = if *row_sum > 0.0 {
            split_proportionally(row, *row_sum, i64::from(canvas_width))
        } else {
            let even = vec![1.0; row.len()];
            split_proportionally(&even, row.len() as f64, i64::from(canvas_width))
        };

        for (x, cell_width) in cell_spans {
            rects.push(inset_rect(x, y, cell_width, row_height, padding));
        }
    }

    Ok(rects)
}

/// Splits `extent` pixels by weight along rounded cumulative edges.
///
/// Returns `(offset, size)` spans in input order. Edges never move backwards
/// and the last span ends exactly at `extent`. A share that rounds to nothing
/// keeps a 1px slot inside the extent.
fn split_proportionally(weights: &[f64], total: f64, extent: i64) -> Vec<(i64, i64)> {
    let mut spans = Vec::with_capacity(weights.len());
    let mut cumulative = 0.0_f64;
    let mut start = 0_i64;
    for (index, weight) in weights.iter().enumerate() {
        cumulative += weight;
        let end = if index + 1 == weights.len() {
            extent
        } else {
            round_px(cumulative / total * extent as f64).clamp(start, extent)
        };
        if end > start {
            spans.push((start, end - start));
        } else {
            spans.push((start.min(extent - 1).max(0), 1));
        }
        start = end;
    }
    spans
}

fn round_px(value: f64) -> i64 {
    value.round_ties_even() as i64
}

fn inset_rect(x: i64, y: i64, width: i64, height: i64, padding: u32) -> PixelRect {
    let padding = i64::from(padding);
    let inset = padding / 2;
    PixelRect::new(
        clamp_u32(x + inset),
        clamp_u32(y + inset),
        clamp_u32((width - padding).max(1)),
        clamp_u32((height - padding).max(1)),
    )
}

fn clamp_u32(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}

/// Error type for pixel layout.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MosaicError {
    /// Grid dimensions must be strictly positive.
    #[error("invalid grid: {rows} rows x {cols} columns")]
    InvalidGrid {
        /// Requested row count.
        rows: usize,
        /// Requested column count.
        cols: usize,
    },
}
