#![warn(missing_docs)]
//! # fingerprint-sampling
//!
//! ## Purpose
//! Decides which timestamps get extracted and which cells receive highlight
//! frames.
//!
//! ## Responsibilities
//! - Partition the timeline into highlight zones and plain segments.
//! - Allocate regular frames with a density boost inside highlight zones.
//! - Map highlight timestamps to cells by timeline position or by cell area.
//! - Provide the even-spacing helpers used by plain extraction.
//!
//! ## Data flow
//! Validated highlight times -> [`build_segments`] ->
//! [`compute_weighted_timestamps`] -> regular frame timestamps.
//! Highlight times -> [`assign_highlights_to_cells_temporal`] (grid and
//! weighted layouts) or [`assign_highlights_to_cells`] (quadtree layouts) ->
//! highlight cell indices.
//!
//! ## Error model
//! Zero frame counts and unusable durations fail with [`SamplingError`].
//! Missing highlights or a non-positive boost are not errors; sampling falls
//! back to even spacing.

use fingerprint_core::{Cell, CoreError, require_positive, validate_duration};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Share of the video duration used as the maximum zone radius.
pub const ZONE_RADIUS_FRACTION: f64 = 0.10;

/// Gap kept between the last sampled timestamp and the end of the video.
pub const END_MARGIN_SECONDS: f64 = 0.01;

/// Default density multiplier for highlight zones.
pub const DEFAULT_BOOST_FACTOR: f64 = 2.0;

/// Oversampling factor applied when black frames will be filtered out.
pub const BLACK_FRAME_OVERSAMPLE: f64 = 1.2;

/// Contiguous `[start, end)` slice of the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Inclusive start in seconds.
    pub start: f64,
    /// Exclusive end in seconds.
    pub end: f64,
    /// Whether this slice surrounds one or more highlights.
    pub is_highlight_zone: bool,
}

impl Segment {
    /// Segment length in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Partitions `[0, duration)` into alternating plain and highlight segments.
///
/// # Semantics
/// Each highlight gets a zone of radius
/// `min(10% of duration, half the gap to each neighbour)`, clamped to the
/// timeline. Overlapping or touching zones merge. Highlights outside
/// `[0, duration]` are ignored.
pub fn build_segments(duration: f64, highlight_times: &[f64]) -> Vec<Segment> {
    let highlights = in_range_sorted(highlight_times, duration);
    let max_radius = ZONE_RADIUS_FRACTION * duration;

    let mut merged: Vec<(f64, f64)> = Vec::with_capacity(highlights.len());
    for (index, &time) in highlights.iter().enumerate() {
        let mut radius = max_radius;
        if index > 0 {
            radius = radius.min((time - highlights[index - 1]) / 2.0);
        }
        if let Some(next) = highlights.get(index + 1) {
            radius = radius.min((next - time) / 2.0);
        }
        let start = (time - radius).max(0.0);
        let end = (time + radius).min(duration);

        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }

    let mut segments = Vec::with_capacity(merged.len() * 2 + 1);
    let mut cursor = 0.0;
    for (start, end) in merged {
        if cursor < start {
            segments.push(Segment {
                start: cursor,
                end: start,
                is_highlight_zone: false,
            });
        }
        segments.push(Segment {
            start,
            end,
            is_highlight_zone: true,
        });
        cursor = end;
    }
    if cursor < duration {
        segments.push(Segment {
            start: cursor,
            end: duration,
            is_highlight_zone: false,
        });
    }

    segments
}

/// Computes `num_frames` regular-frame timestamps, denser near highlights.
///
/// # Semantics
/// Each segment gets `round(weight / total_weight * num_frames)` frames,
/// where zone weight is `duration * boost_factor` and plain weight is its
/// duration. Rounding drift goes to the segment with the largest allocation.
/// Frames sit at evenly spaced midpoints inside their segment and are clamped
/// to `[0, duration - 0.01]`.
///
/// Without in-range highlights, with `boost_factor <= 0`, or with zero total
/// weight, frames are evenly spaced midpoints over the whole video.
///
/// # Errors
/// Returns [`SamplingError::Core`] when `num_frames == 0` or `duration` is
/// not a positive finite number.
pub fn compute_weighted_timestamps(
    duration: f64,
    num_frames: usize,
    highlight_times: &[f64],
    boost_factor: f64,
) -> Result<Vec<f64>, SamplingError> {
    require_positive("frame count", num_frames)?;
    let duration = validate_duration(duration)?;

    if in_range_sorted(highlight_times, duration).is_empty()
        || boost_factor.is_nan()
        || boost_factor <= 0.0
    {
        tracing::debug!(num_frames, boost_factor, "no usable highlights; even spacing");
        return Ok(midpoints(0.0, duration, num_frames));
    }

    let segments = build_segments(duration, highlight_times);
    let weights: Vec<f64> = segments
        .iter()
        .map(|segment| {
            if segment.is_highlight_zone {
                segment.duration() * boost_factor
            } else {
                segment.duration()
            }
        })
        .collect();
    let total_weight: f64 = weights.iter().sum();

    if total_weight <= 0.0 {
        tracing::debug!(num_frames, "zero total weight; even spacing");
        return Ok(midpoints(0.0, duration, num_frames));
    }

    let mut allocation: Vec<i64> = weights
        .iter()
        .map(|weight| (weight / total_weight * num_frames as f64).round_ties_even() as i64)
        .collect();

    let drift = num_frames as i64 - allocation.iter().sum::<i64>();
    if drift != 0
        && let Some(largest) = first_max_index(&allocation)
    {
        allocation[largest] += drift;
    }

    let latest = duration - END_MARGIN_SECONDS;
    let mut timestamps = Vec::with_capacity(num_frames);
    for (segment, count) in segments.iter().zip(allocation) {
        if count <= 0 {
            continue;
        }
        timestamps.extend(
            midpoints(segment.start, segment.end, count as usize)
                .into_iter()
                .map(|time| time.min(latest).max(0.0)),
        );
    }

    timestamps.sort_by(f64::total_cmp);
    Ok(timestamps)
}

/// Evenly spaced midpoints over the whole video, clamped short of the end.
///
/// # Errors
/// Returns [`SamplingError::Core`] when `count == 0` or `duration` is not a
/// positive finite number.
pub fn even_timestamps(duration: f64, count: usize) -> Result<Vec<f64>, SamplingError> {
    require_positive("frame count", count)?;
    let duration = validate_duration(duration)?;
    let latest = duration - END_MARGIN_SECONDS;
    Ok(midpoints(0.0, duration, count)
        .into_iter()
        .map(|time| time.min(latest).max(0.0))
        .collect())
}

/// Maps highlight timestamps to cells by their relative timeline position.
///
/// # Semantics
/// A timestamp's ideal cell is `round(ts / duration * (total_cells - 1))`,
/// clamped to the grid. A taken cell is resolved by probing forward to the
/// end, then backward from `ideal - 1`. Timestamps outside `0..=duration`
/// (and NaN) are skipped. At most `total_cells` highlights are placed; the
/// result is sorted and free of duplicates.
///
/// # Errors
/// Returns [`SamplingError::Core`] when `duration` is not a positive finite
/// number.
pub fn assign_highlights_to_cells_temporal(
    highlight_times: &[f64],
    duration: f64,
    total_cells: usize,
) -> Result<Vec<usize>, SamplingError> {
    let duration = validate_duration(duration)?;
    if total_cells == 0 {
        return Ok(Vec::new());
    }

    let last = total_cells - 1;
    let mut used = vec![false; total_cells];
    let mut assigned = Vec::with_capacity(highlight_times.len().min(total_cells));

    let in_range = highlight_times
        .iter()
        .copied()
        .filter(|time| (0.0..=duration).contains(time));
    for time in in_range.take(total_cells) {
        let ideal = (time / duration * last as f64)
            .round_ties_even()
            .clamp(0.0, last as f64) as usize;

        let slot = if !used[ideal] {
            Some(ideal)
        } else {
            (ideal + 1..total_cells)
                .find(|&index| !used[index])
                .or_else(|| (0..ideal).rev().find(|&index| !used[index]))
        };

        if let Some(index) = slot {
            used[index] = true;
            assigned.push(index);
        }
    }

    assigned.sort_unstable();
    Ok(assigned)
}

/// Picks the `num_highlights` largest cells and returns them in reading order.
///
/// # Semantics
/// Cells are ranked by area descending with a stable sort, so equal areas
/// keep their original order. The chosen indices are returned ascending.
/// `num_highlights` is clamped to the cell count.
pub fn assign_highlights_to_cells(cells: &[Cell], num_highlights: usize) -> Vec<usize> {
    let take = num_highlights.min(cells.len());
    if take == 0 {
        return Vec::new();
    }

    let mut ranked: Vec<(usize, f64)> = cells
        .iter()
        .enumerate()
        .map(|(index, cell)| (index, cell.area()))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut chosen: Vec<usize> = ranked.into_iter().take(take).map(|(index, _)| index).collect();
    chosen.sort_unstable();
    chosen
}

/// Number of frames to extract so `count` remain after black-frame filtering.
///
/// Skipping black frames extracts 20% more; the result never exceeds the
/// frames available in the video.
pub fn oversampled_count(count: usize, skip_black: bool, available_frames: usize) -> usize {
    let wanted = if skip_black {
        (count as f64 * BLACK_FRAME_OVERSAMPLE) as usize
    } else {
        count
    };
    wanted.min(available_frames)
}

/// Picks `count` evenly spaced items, always keeping the first and last.
///
/// Returns all items when there are not more than `count`.
pub fn evenly_sample<T: Clone>(items: &[T], count: usize) -> Vec<T> {
    let available = items.len();
    if available <= count {
        return items.to_vec();
    }
    match count {
        0 => Vec::new(),
        1 => items[..1].to_vec(),
        _ => (0..count)
            .map(|index| {
                let position = (index * (available - 1)) as f64 / (count - 1) as f64;
                items[position.round_ties_even() as usize].clone()
            })
            .collect(),
    }
}

fn midpoints(start: f64, end: f64, count: usize) -> Vec<f64> {
    let interval = (end - start) / count as f64;
    (0..count)
        .map(|index| start + interval * index as f64 + interval / 2.0)
        .collect()
}

fn in_range_sorted(times: &[f64], duration: f64) -> Vec<f64> {
    let mut sorted: Vec<f64> = times
        .iter()
        .copied()
        .filter(|time| (0.0..=duration).contains(time))
        .collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// First index holding the maximum value.
fn first_max_index(values: &[i64]) -> Option<usize> {
    let mut best: Option<(usize, i64)> = None;
    for (index, &value) in values.iter().enumerate() {
        if best.is_none_or(|(_, current)| value > current) {
            best = Some((index, value));
        }
    }
    best.map(|(index, _)| index)
}

/// Error type for temporal sampling.
#[derive(Debug, Error, PartialEq)]
pub enum SamplingError {
    /// Argument validation failed.
    #[error(transparent)]
    Core(#[from] CoreError),
}

#[cfg(test)]
mod tests {
    //! Unit tests for segment building and collision handling.

    use super::*;

    #[test]
    fn single_highlight_zone_spans_ten_percent_each_side() {
        let segments = build_segments(100.0, &[50.0]);
        assert_eq!(
            segments,
            vec![
                Segment {
                    start: 0.0,
                    end: 40.0,
                    is_highlight_zone: false
                },
                Segment {
                    start: 40.0,
                    end: 60.0,
                    is_highlight_zone: true
                },
                Segment {
                    start: 60.0,
                    end: 100.0,
                    is_highlight_zone: false
                },
            ]
        );
    }

    #[test]
    fn close_highlights_shrink_radius_and_merge() {
        let segments = build_segments(100.0, &[50.0, 54.0]);
        // Radius is half the 4s gap, so both zones touch at 52 and merge.
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[1].start, 48.0);
        assert_eq!(segments[1].end, 56.0);
        assert!(segments[1].is_highlight_zone);
    }

    #[test]
    fn zones_clamp_to_the_timeline() {
        let segments = build_segments(100.0, &[2.0, 100.0]);
        assert_eq!(segments.first().map(|s| s.start), Some(0.0));
        assert!(segments[0].is_highlight_zone);
        assert_eq!(segments.last().map(|s| (s.end, s.is_highlight_zone)), Some((100.0, true)));
    }

    #[test]
    fn drift_goes_to_the_first_largest_allocation() {
        assert_eq!(first_max_index(&[3, 7, 7, 1]), Some(1));
        assert_eq!(first_max_index(&[]), None);
    }

    #[test]
    fn temporal_collisions_probe_forward_then_backward() {
        let assigned = assign_highlights_to_cells_temporal(&[100.0, 100.0, 100.0], 100.0, 3)
            .expect("valid duration");
        assert_eq!(assigned, vec![0, 1, 2]);
    }

    #[test]
    fn temporal_assignment_places_at_most_total_cells() {
        let assigned =
            assign_highlights_to_cells_temporal(&[1.0, 2.0, 3.0, 4.0], 10.0, 2).expect("valid");
        assert_eq!(assigned.len(), 2);
    }

    #[test]
    fn evenly_sample_keeps_both_ends() {
        let items: Vec<u32> = (0..10).collect();
        assert_eq!(evenly_sample(&items, 4), vec![0, 3, 6, 9]);
        assert_eq!(evenly_sample(&items, 1), vec![0]);
        assert_eq!(evenly_sample(&items[..3], 5), vec![0, 1, 2]);
    }

    #[test]
    fn oversampling_caps_at_available_frames() {
        assert_eq!(oversampled_count(100, true, 1_000), 120);
        assert_eq!(oversampled_count(100, true, 110), 110);
        assert_eq!(oversampled_count(100, false, 1_000), 100);
    }
}
