#![warn(missing_docs)]
//! # fingerprint-extract
//!
//! ## Purpose
//! Defines the frame-extraction service consumed by fingerprint generation.
//!
//! ## Responsibilities
//! - Describe probed video metadata.
//! - Define a backend-agnostic extraction trait.
//! - Provide the shared even-spacing and black-frame filtering flow.
//! - Expose a deterministic synthetic backend for CI and unit tests.
//!
//! ## Data flow
//! Planner asks [`FrameExtractor::probe`] for [`VideoInfo`] -> requests
//! frames at explicit timestamps or evenly spaced -> receives
//! [`ExtractedFrame`] paths for the renderer.
//!
//! ## Ownership and lifetimes
//! Extracted frames are owned `(path, timestamp)` values; backends own any
//! temporary storage behind those paths.
//!
//! ## Error model
//! Unknown videos, malformed metadata, and backend failures are reported as
//! [`ExtractError`] values.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fingerprint_sampling::{SamplingError, even_timestamps, evenly_sample, oversampled_count};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean intensity (0-255) below which a frame counts as black.
pub const BLACK_FRAME_THRESHOLD: f64 = 10.0;

/// Metadata probed from a video file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Duration in seconds.
    pub duration: f64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Total frame count (declared or estimated).
    pub frame_count: u64,
    /// Reduced `width:height` ratio.
    pub aspect_ratio: (u32, u32),
}

impl VideoInfo {
    /// Creates metadata and derives the reduced aspect ratio.
    pub fn new(duration: f64, width: u32, height: u32, frame_count: u64) -> Self {
        let divisor = gcd(width, height).max(1);
        Self {
            duration,
            width,
            height,
            frame_count,
            aspect_ratio: (width / divisor, height / divisor),
        }
    }
}

/// Estimates a frame count from a duration and a `num/den` frame rate.
///
/// # Errors
/// Returns [`ExtractError::InvalidFrameRate`] when the rate is malformed or
/// has a zero denominator.
pub fn estimate_frame_count(duration: f64, frame_rate: &str) -> Result<u64, ExtractError> {
    let invalid = || ExtractError::InvalidFrameRate(frame_rate.to_string());
    let (numerator, denominator) = frame_rate.trim().split_once('/').ok_or_else(invalid)?;
    let numerator: f64 = numerator.parse().map_err(|_| invalid())?;
    let denominator: f64 = denominator.parse().map_err(|_| invalid())?;
    if denominator == 0.0 || !numerator.is_finite() || numerator < 0.0 {
        return Err(invalid());
    }
    Ok((duration.max(0.0) * numerator / denominator) as u64)
}

/// Returns `true` when a frame's mean intensity is below the black threshold.
pub fn is_black_intensity(mean_intensity: f64) -> bool {
    mean_intensity < BLACK_FRAME_THRESHOLD
}

/// One extracted still frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFrame {
    /// Location of the encoded still.
    pub path: PathBuf,
    /// Source position in seconds.
    pub timestamp: f64,
}

/// Trait implemented by concrete extraction providers.
pub trait FrameExtractor: Send + Sync {
    /// Reads video metadata.
    ///
    /// # Errors
    /// Returns [`ExtractError::UnknownVideo`] when the video cannot be opened.
    fn probe(&self, video: &Path) -> Result<VideoInfo, ExtractError>;

    /// Extracts one frame per requested timestamp, in request order.
    ///
    /// # Errors
    /// Propagates backend failures.
    fn extract_at(
        &self,
        video: &Path,
        timestamps: &[f64],
    ) -> Result<Vec<ExtractedFrame>, ExtractError>;

    /// Returns `true` when an extracted frame is near-black.
    ///
    /// # Errors
    /// Propagates backend failures while reading the frame.
    fn is_black(&self, frame: &ExtractedFrame) -> Result<bool, ExtractError>;

    /// Extracts `count` evenly spaced frames.
    ///
    /// # Semantics
    /// With `skip_black`, 20% more frames are extracted, black frames are
    /// dropped, and `count` survivors are picked evenly. When filtering leaves
    /// fewer than `count` frames, the unfiltered set is sampled instead.
    ///
    /// # Errors
    /// Returns [`ExtractError::NoFrames`] when the video has no frames, and
    /// propagates sampling and backend failures.
    fn extract_evenly(
        &self,
        video: &Path,
        count: usize,
        skip_black: bool,
    ) -> Result<Vec<ExtractedFrame>, ExtractError> {
        let info = self.probe(video)?;
        let available = usize::try_from(info.frame_count).unwrap_or(usize::MAX);
        let extract_count = oversampled_count(count, skip_black, available);
        if extract_count == 0 {
            return Err(ExtractError::NoFrames(video.to_path_buf()));
        }

        let timestamps = even_timestamps(info.duration, extract_count)?;
        let extracted = self.extract_at(video, &timestamps)?;

        if !skip_black {
            return Ok(extracted.into_iter().take(count).collect());
        }

        let mut kept = Vec::with_capacity(extracted.len());
        for frame in &extracted {
            if !self.is_black(frame)? {
                kept.push(frame.clone());
            }
        }
        if kept.len() < count {
            tracing::debug!(
                kept = kept.len(),
                wanted = count,
                "black-frame filter removed too many frames; keeping all"
            );
            kept = extracted;
        }
        Ok(evenly_sample(&kept, count))
    }
}

/// Deterministic in-memory backend for test and CI usage.
#[derive(Debug)]
pub struct SyntheticExtractor {
    video: PathBuf,
    info: VideoInfo,
    black_ranges: Vec<(f64, f64)>,
    sequence: Mutex<u64>,
}

impl SyntheticExtractor {
    /// Creates a backend serving one video with the given metadata.
    pub fn new(video: impl Into<PathBuf>, info: VideoInfo) -> Self {
        Self {
            video: video.into(),
            info,
            black_ranges: Vec::new(),
            sequence: Mutex::new(0),
        }
    }

    /// Marks `[start, end)` as black footage.
    pub fn with_black_range(mut self, start: f64, end: f64) -> Self {
        self.black_ranges.push((start, end));
        self
    }

    /// Number of frames extracted so far.
    pub fn extracted_count(&self) -> u64 {
        self.sequence.lock().map(|sequence| *sequence).unwrap_or(0)
    }

    fn mean_intensity(&self, timestamp: f64) -> f64 {
        if self
            .black_ranges
            .iter()
            .any(|(start, end)| (*start..*end).contains(&timestamp))
        {
            0.0
        } else {
            128.0
        }
    }
}

impl FrameExtractor for SyntheticExtractor {
    fn probe(&self, video: &Path) -> Result<VideoInfo, ExtractError> {
        if video != self.video.as_path() {
            return Err(ExtractError::UnknownVideo(video.to_path_buf()));
        }
        Ok(self.info)
    }

    fn extract_at(
        &self,
        video: &Path,
        timestamps: &[f64],
    ) -> Result<Vec<ExtractedFrame>, ExtractError> {
        let info = self.probe(video)?;
        let mut sequence = self
            .sequence
            .lock()
            .map_err(|_| ExtractError::Backend("synthetic sequence lock poisoned".to_string()))?;

        let mut frames = Vec::with_capacity(timestamps.len());
        for &timestamp in timestamps {
            if !(0.0..=info.duration).contains(&timestamp) {
                return Err(ExtractError::Backend(format!(
                    "timestamp {timestamp} outside video duration {}",
                    info.duration
                )));
            }
            *sequence += 1;
            frames.push(ExtractedFrame {
                path: PathBuf::from(format!("synthetic/frame_{:06}.jpg", *sequence)),
                timestamp,
            });
        }
        Ok(frames)
    }

    fn is_black(&self, frame: &ExtractedFrame) -> Result<bool, ExtractError> {
        Ok(is_black_intensity(self.mean_intensity(frame.timestamp)))
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Extraction layer error type.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Backend does not know or cannot open this video.
    #[error("unknown video: {}", .0.display())]
    UnknownVideo(PathBuf),
    /// Frame rate metadata is malformed.
    #[error("invalid frame rate: {0:?}")]
    InvalidFrameRate(String),
    /// Video contains no extractable frames.
    #[error("no frames available in {}", .0.display())]
    NoFrames(PathBuf),
    /// Timestamp planning failed.
    #[error("sampling failure: {0}")]
    Sampling(#[from] SamplingError),
    /// Backend runtime failure.
    #[error("extraction backend failure: {0}")]
    Backend(String),
}
