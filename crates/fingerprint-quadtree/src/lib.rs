#![warn(missing_docs)]
//! # fingerprint-quadtree
//!
//! ## Purpose
//! Recursively subdivides the unit square into variable-size leaf cells and
//! linearizes the leaves into reading order.
//!
//! ## Responsibilities
//! - Split the root unconditionally, then recurse under a subdivision style.
//! - Draw split decisions from a seeded, call-local pseudo-random sequence.
//! - Re-sort leaves top-to-bottom, left-to-right with band tolerance.
//!
//! ## Data flow
//! `(max_depth, style, seed)` -> [`generate_quadtree`] -> ordered
//! [`fingerprint_core::Cell`] leaves consumed by rect mapping and
//! area-based highlight assignment.
//!
//! ## Error model
//! A `max_depth` outside `1..=MAX_QUADTREE_DEPTH` fails with
//! [`QuadtreeError::InvalidDepth`].
//!
//! ## Determinism notes
//! The generator lives inside one [`generate_quadtree`] call and draws are
//! consumed depth-first in top-left, top-right, bottom-left, bottom-right
//! order, so identical arguments always yield identical leaf lists.

use std::fmt;
use std::str::FromStr;

use fingerprint_core::{Cell, CoreError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default subdivision depth.
pub const DEFAULT_QUADTREE_DEPTH: u32 = 3;

/// Deepest supported subdivision; a balanced tree at this depth has 4096
/// leaves.
pub const MAX_QUADTREE_DEPTH: u32 = 6;

/// Default pseudo-random seed.
pub const DEFAULT_SEED: u64 = 42;

/// Split decision policy applied to every non-root node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "kebab-case")]
pub enum SubdivisionStyle {
    /// Always split until the depth limit.
    #[default]
    Balanced,
    /// Split with a fixed probability.
    Random {
        /// Probability in `[0, 1]` that a node splits.
        split_probability: f64,
    },
    /// Split probability decays linearly from the canvas center to a corner.
    CenterWeighted {
        /// Probability at the canvas center.
        center_probability: f64,
        /// Probability at a canvas corner.
        corner_probability: f64,
    },
}

impl SubdivisionStyle {
    /// Random style with a 70% split probability.
    pub const fn random() -> Self {
        SubdivisionStyle::Random {
            split_probability: 0.70,
        }
    }

    /// Center-weighted style decaying from 95% to 15%.
    pub const fn center_weighted() -> Self {
        SubdivisionStyle::CenterWeighted {
            center_probability: 0.95,
            corner_probability: 0.15,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            SubdivisionStyle::Balanced => "Balanced",
            SubdivisionStyle::Random { .. } => "Random",
            SubdivisionStyle::CenterWeighted { .. } => "Center weighted",
        }
    }
}

impl fmt::Display for SubdivisionStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SubdivisionStyle {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "balanced" => Ok(SubdivisionStyle::Balanced),
            "random" => Ok(SubdivisionStyle::random()),
            "center-weighted" => Ok(SubdivisionStyle::center_weighted()),
            _ => Err(CoreError::UnknownPolicy {
                kind: "subdivision style",
                value: value.to_string(),
            }),
        }
    }
}

/// Generates quadtree leaves in reading order.
///
/// # Parameters
/// - `max_depth`: Depth limit; the mandatory first split is depth 1, so any
///   valid depth yields at least four leaves.
/// - `style`: Split decision policy for nodes below the limit.
/// - `seed`: Seed for the call-local pseudo-random sequence.
///
/// # Errors
/// Returns [`QuadtreeError::InvalidDepth`] when `max_depth` is outside
/// `1..=MAX_QUADTREE_DEPTH`.
pub fn generate_quadtree(
    max_depth: u32,
    style: SubdivisionStyle,
    seed: u64,
) -> Result<Vec<Cell>, QuadtreeError> {
    if !(1..=MAX_QUADTREE_DEPTH).contains(&max_depth) {
        return Err(QuadtreeError::InvalidDepth(max_depth));
    }

    let mut subdivider = Subdivider {
        max_depth,
        style,
        rng: StdRng::seed_from_u64(seed),
        leaves: Vec::new(),
    };

    for quadrant in quadrants(&Cell::new(0.0, 0.0, 1.0, 1.0, 0)) {
        subdivider.subdivide(quadrant);
    }

    let leaves = into_reading_order(subdivider.leaves);
    tracing::debug!(
        max_depth,
        %style,
        seed,
        leaves = leaves.len(),
        "quadtree generated"
    );
    Ok(leaves)
}

struct Subdivider {
    max_depth: u32,
    style: SubdivisionStyle,
    rng: StdRng,
    leaves: Vec<Cell>,
}

impl Subdivider {
    fn subdivide(&mut self, cell: Cell) {
        if cell.depth >= self.max_depth || !self.should_split(&cell) {
            self.leaves.push(cell);
            return;
        }

        for child in quadrants(&cell) {
            self.subdivide(child);
        }
    }

    fn should_split(&mut self, cell: &Cell) -> bool {
        match self.style {
            SubdivisionStyle::Balanced => true,
            SubdivisionStyle::Random { split_probability } => {
                self.rng.random::<f64>() < split_probability
            }
            SubdivisionStyle::CenterWeighted {
                center_probability,
                corner_probability,
            } => {
                let (cx, cy) = cell.center();
                let distance = ((cx - 0.5).powi(2) + (cy - 0.5).powi(2)).sqrt();
                let t = distance / 0.5_f64.sqrt();
                let probability = center_probability - (center_probability - corner_probability) * t;
                self.rng.random::<f64>() < probability
            }
        }
    }
}

/// Children in top-left, top-right, bottom-left, bottom-right order.
fn quadrants(cell: &Cell) -> [Cell; 4] {
    let half_w = cell.w / 2.0;
    let half_h = cell.h / 2.0;
    let depth = cell.depth + 1;
    [
        Cell::new(cell.x, cell.y, half_w, half_h, depth),
        Cell::new(cell.x + half_w, cell.y, half_w, half_h, depth),
        Cell::new(cell.x, cell.y + half_h, half_w, half_h, depth),
        Cell::new(cell.x + half_w, cell.y + half_h, half_w, half_h, depth),
    ]
}

/// Sorts leaves top-to-bottom then left-to-right.
///
/// Leaves of different depths do not share row edges, so rows are grouped
/// into bands of half the smallest leaf height before sorting by `x`.
fn into_reading_order(leaves: Vec<Cell>) -> Vec<Cell> {
    let min_height = leaves.iter().map(|cell| cell.h).fold(f64::INFINITY, f64::min);
    let tolerance = if min_height.is_finite() && min_height > 0.0 {
        min_height / 2.0
    } else {
        0.005
    };

    let mut banded: Vec<(i64, Cell)> = leaves
        .into_iter()
        .map(|cell| ((cell.y / tolerance).round_ties_even() as i64, cell))
        .collect();
    banded.sort_by(|(band_a, a), (band_b, b)| band_a.cmp(band_b).then(a.x.total_cmp(&b.x)));

    banded.into_iter().map(|(_, cell)| cell).collect()
}

/// Error type for quadtree generation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuadtreeError {
    /// Depth must allow the mandatory first split and stay within
    /// [`MAX_QUADTREE_DEPTH`].
    #[error("quadtree depth must be in 1..={MAX_QUADTREE_DEPTH}, got {0}")]
    InvalidDepth(u32),
}

#[cfg(test)]
mod tests {
    //! Unit tests for subdivision and reading order.

    use super::*;

    #[test]
    fn depth_one_yields_four_quadrants_in_reading_order() {
        let leaves = generate_quadtree(1, SubdivisionStyle::Balanced, DEFAULT_SEED)
            .expect("depth 1 is valid");
        let origins: Vec<(f64, f64)> = leaves.iter().map(|cell| (cell.x, cell.y)).collect();
        assert_eq!(origins, vec![(0.0, 0.0), (0.5, 0.0), (0.0, 0.5), (0.5, 0.5)]);
        assert!(leaves.iter().all(|cell| cell.depth == 1));
    }

    #[test]
    fn balanced_depth_two_is_a_four_by_four_raster() {
        let leaves = generate_quadtree(2, SubdivisionStyle::Balanced, DEFAULT_SEED)
            .expect("depth 2 is valid");
        assert_eq!(leaves.len(), 16);
        for (index, cell) in leaves.iter().enumerate() {
            assert_eq!(cell.x, (index % 4) as f64 * 0.25);
            assert_eq!(cell.y, (index / 4) as f64 * 0.25);
        }
    }

    #[test]
    fn zero_depth_is_rejected() {
        assert_eq!(
            generate_quadtree(0, SubdivisionStyle::Balanced, 1),
            Err(QuadtreeError::InvalidDepth(0))
        );
    }

    #[test]
    fn depth_beyond_limit_is_rejected() {
        let leaves = generate_quadtree(MAX_QUADTREE_DEPTH, SubdivisionStyle::Balanced, 1)
            .expect("deepest supported tree");
        assert_eq!(leaves.len(), 4096);
        assert_eq!(
            generate_quadtree(MAX_QUADTREE_DEPTH + 1, SubdivisionStyle::Balanced, 1),
            Err(QuadtreeError::InvalidDepth(MAX_QUADTREE_DEPTH + 1))
        );
        assert_eq!(
            generate_quadtree(20, SubdivisionStyle::Balanced, 1),
            Err(QuadtreeError::InvalidDepth(20))
        );
    }

    #[test]
    fn certain_and_impossible_splits_bracket_the_random_style() {
        let always = SubdivisionStyle::Random {
            split_probability: 1.0,
        };
        let never = SubdivisionStyle::Random {
            split_probability: 0.0,
        };
        assert_eq!(generate_quadtree(3, always, 7).map(|l| l.len()), Ok(64));
        assert_eq!(generate_quadtree(3, never, 7).map(|l| l.len()), Ok(4));
    }

    #[test]
    fn mixed_depth_leaves_sort_by_band_then_x() {
        let leaves = into_reading_order(vec![
            Cell::new(0.5, 0.0, 0.5, 0.5, 1),
            Cell::new(0.0, 0.25, 0.25, 0.25, 2),
            Cell::new(0.0, 0.0, 0.25, 0.25, 2),
            Cell::new(0.25, 0.0, 0.25, 0.25, 2),
        ]);
        let origins: Vec<(f64, f64)> = leaves.iter().map(|cell| (cell.x, cell.y)).collect();
        assert_eq!(
            origins,
            vec![(0.0, 0.0), (0.25, 0.0), (0.5, 0.0), (0.0, 0.25)]
        );
    }

    #[test]
    fn style_names_parse() {
        assert_eq!("Center weighted".parse(), Ok(SubdivisionStyle::center_weighted()));
        assert_eq!("random".parse(), Ok(SubdivisionStyle::random()));
        assert!("spiral".parse::<SubdivisionStyle>().is_err());
    }
}
