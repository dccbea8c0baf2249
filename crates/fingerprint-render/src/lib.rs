#![warn(missing_docs)]
//! # fingerprint-render
//!
//! ## Purpose
//! Defines the render-plan contract handed to the compositing collaborator.
//!
//! ## Responsibilities
//! - Describe the output canvas, format, and background of a fingerprint.
//! - Carry one placement (frame path, pixel rect, optional label) per cell.
//! - Encode and decode the versioned JSON form of a render request.
//! - Define the renderer trait and a recording backend for tests.
//!
//! ## Data flow
//! Planner output -> [`RenderRequest`] -> [`Renderer::render`] -> encoded
//! image at the requested output path.
//!
//! ## Ownership and lifetimes
//! Requests own their placements and paths so they can be queued or logged
//! after the planner's buffers are dropped.
//!
//! ## Error model
//! Unknown option names, invalid requests, codec failures, and backend
//! failures are reported as [`RenderError`] values.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use fingerprint_core::{PixelRect, format_cell_label};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical schema version for the render-request contract.
pub const SCHEMA_VERSION_V1: &str = "v1";

/// Default encoder quality for lossy formats.
pub const DEFAULT_QUALITY: u8 = 90;

/// Encoded output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossless PNG.
    #[default]
    Png,
    /// JPEG with a quality setting.
    Jpeg,
    /// WebP with a quality setting.
    WebP,
    /// Lossless TIFF.
    Tiff,
}

impl OutputFormat {
    /// Every supported format, in menu order.
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Png,
        OutputFormat::Jpeg,
        OutputFormat::WebP,
        OutputFormat::Tiff,
    ];

    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::WebP => "webp",
            OutputFormat::Tiff => "tiff",
        }
    }

    /// Returns `true` when the encoder accepts a quality setting.
    pub fn has_quality(self) -> bool {
        matches!(self, OutputFormat::Jpeg | OutputFormat::WebP)
    }

    /// Display name.
    pub fn label(self) -> &'static str {
        match self {
            OutputFormat::Png => "PNG",
            OutputFormat::Jpeg => "JPEG",
            OutputFormat::WebP => "WebP",
            OutputFormat::Tiff => "TIFF",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OutputFormat {
    type Err = RenderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "webp" => Ok(OutputFormat::WebP),
            "tiff" | "tif" => Ok(OutputFormat::Tiff),
            _ => Err(RenderError::UnknownOption {
                kind: "output format",
                value: value.to_string(),
            }),
        }
    }
}

/// Replaces or appends the extension matching `format`.
pub fn with_format_extension(path: &Path, format: OutputFormat) -> PathBuf {
    path.with_extension(format.extension())
}

/// 8-bit RGB background color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RgbColor {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl RgbColor {
    /// Pure black.
    pub const BLACK: RgbColor = RgbColor::new(0, 0, 0);
    /// Pure white.
    pub const WHITE: RgbColor = RgbColor::new(255, 255, 255);
    /// Dark gray.
    pub const DARK_GRAY: RgbColor = RgbColor::new(40, 40, 40);

    /// Creates a color from channel values.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Lowercase `#rrggbb` form.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for RgbColor {
    fn default() -> Self {
        RgbColor::BLACK
    }
}

impl FromStr for RgbColor {
    type Err = RenderError;

    /// Accepts `black`, `white`, `dark-gray`, or `#rrggbb`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let unknown = || RenderError::UnknownOption {
            kind: "background color",
            value: value.to_string(),
        };
        let normalized = value.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "black" => return Ok(RgbColor::BLACK),
            "white" => return Ok(RgbColor::WHITE),
            "dark-gray" | "dark-grey" => return Ok(RgbColor::DARK_GRAY),
            _ => {}
        }

        let hex = normalized.strip_prefix('#').ok_or_else(unknown)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(unknown());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| unknown())
        };
        Ok(RgbColor::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

/// Text drawn in the corner of each cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CellLabels {
    /// No labels.
    #[default]
    None,
    /// 1-based cell number.
    FrameNumber,
    /// Source timestamp as `M:SS`.
    Timestamp,
}

impl CellLabels {
    /// Label text for the cell at `index` showing a frame from `timestamp`.
    pub fn label_for(self, index: usize, timestamp: f64) -> Option<String> {
        match self {
            CellLabels::None => None,
            CellLabels::FrameNumber => Some((index + 1).to_string()),
            CellLabels::Timestamp => Some(format_cell_label(timestamp)),
        }
    }
}

impl FromStr for CellLabels {
    type Err = RenderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "none" => Ok(CellLabels::None),
            "frame-number" | "number" => Ok(CellLabels::FrameNumber),
            "timestamp" => Ok(CellLabels::Timestamp),
            _ => Err(RenderError::UnknownOption {
                kind: "cell labels",
                value: value.to_string(),
            }),
        }
    }
}

/// One frame placed on the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Extracted still to crop into the cell.
    pub frame_path: PathBuf,
    /// Destination rectangle in canvas pixels.
    pub rect: PixelRect,
    /// Optional corner label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Placement {
    /// Part of the rect inside a `canvas_width x canvas_height` canvas.
    ///
    /// Returns `None` when the rect starts on or past the right or bottom
    /// canvas edge.
    pub fn visible_rect(&self, canvas_width: u32, canvas_height: u32) -> Option<PixelRect> {
        let rect = self.rect;
        if rect.x >= canvas_width || rect.y >= canvas_height {
            return None;
        }
        Some(PixelRect::new(
            rect.x,
            rect.y,
            rect.width.min(canvas_width - rect.x),
            rect.height.min(canvas_height - rect.y),
        ))
    }
}

/// Complete instruction set for compositing one fingerprint image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Contract schema version.
    pub schema_version: String,
    /// Canvas width in pixels.
    pub canvas_width: u32,
    /// Canvas height in pixels.
    pub canvas_height: u32,
    /// Fill color behind padding gaps.
    pub background: RgbColor,
    /// Output encoding.
    pub format: OutputFormat,
    /// Encoder quality in `1..=100`, present only for lossy formats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
    /// Frame placements in cell order.
    #[serde(default)]
    pub placements: Vec<Placement>,
}

impl RenderRequest {
    /// Creates an empty request at the current schema version.
    ///
    /// Lossy formats start at [`DEFAULT_QUALITY`].
    pub fn new(canvas_width: u32, canvas_height: u32, format: OutputFormat) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            canvas_width,
            canvas_height,
            background: RgbColor::default(),
            format,
            quality: format.has_quality().then_some(DEFAULT_QUALITY),
            placements: Vec::new(),
        }
    }

    /// Sets the background color.
    pub fn with_background(mut self, background: RgbColor) -> Self {
        self.background = background;
        self
    }

    /// Sets the encoder quality; ignored for lossless formats.
    pub fn with_quality(mut self, quality: u8) -> Self {
        if self.format.has_quality() {
            self.quality = Some(quality);
        }
        self
    }

    /// Checks contract invariants.
    ///
    /// Placements may extend past the canvas (padding wider than a cell
    /// pushes edge cells outward); backends clip them with
    /// [`Placement::visible_rect`].
    ///
    /// # Errors
    /// Returns [`RenderError::InvalidRequest`] for a blank schema version, an
    /// empty canvas, a quality outside `1..=100`, or an empty placement.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.schema_version.trim().is_empty() {
            return Err(RenderError::InvalidRequest(
                "schema_version is empty".to_string(),
            ));
        }
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(RenderError::InvalidRequest(format!(
                "canvas {}x{} is empty",
                self.canvas_width, self.canvas_height
            )));
        }
        if let Some(quality) = self.quality
            && !(1..=100).contains(&quality)
        {
            return Err(RenderError::InvalidRequest(format!(
                "quality {quality} outside 1..=100"
            )));
        }
        for (index, placement) in self.placements.iter().enumerate() {
            let rect = placement.rect;
            if rect.width == 0 || rect.height == 0 {
                return Err(RenderError::InvalidRequest(format!(
                    "placement {index} at {}x{}+{}+{} is empty",
                    rect.width, rect.height, rect.x, rect.y
                )));
            }
        }
        Ok(())
    }

    /// Placements that draw at least one pixel, with their clipped rects.
    pub fn visible_placements(&self) -> Vec<(&Placement, PixelRect)> {
        self.placements
            .iter()
            .filter_map(|placement| {
                placement
                    .visible_rect(self.canvas_width, self.canvas_height)
                    .map(|rect| (placement, rect))
            })
            .collect()
    }

    /// Serializes into deterministic JSON bytes.
    ///
    /// # Errors
    /// Returns [`RenderError::Codec`] when serialization fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, RenderError> {
        serde_json::to_vec(self).map_err(RenderError::Codec)
    }

    /// Parses and validates JSON bytes.
    ///
    /// # Errors
    /// Returns [`RenderError::Codec`] for malformed JSON and
    /// [`RenderError::InvalidRequest`] when invariants fail.
    pub fn from_json_bytes(raw: &[u8]) -> Result<Self, RenderError> {
        let parsed: RenderRequest = serde_json::from_slice(raw).map_err(RenderError::Codec)?;
        parsed.validate()?;
        Ok(parsed)
    }
}

/// Trait implemented by concrete compositing backends.
pub trait Renderer: Send + Sync {
    /// Composites and encodes `request` into `output`.
    ///
    /// # Errors
    /// Returns backend-specific failures as [`RenderError`].
    fn render(&self, request: &RenderRequest, output: &Path) -> Result<(), RenderError>;
}

/// Backend that validates and records requests without touching pixels.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    rendered: Mutex<Vec<(PathBuf, RenderRequest)>>,
}

impl RecordingRenderer {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every `(output, request)` pair seen so far.
    pub fn rendered(&self) -> Vec<(PathBuf, RenderRequest)> {
        self.rendered
            .lock()
            .map(|rendered| rendered.clone())
            .unwrap_or_default()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&self, request: &RenderRequest, output: &Path) -> Result<(), RenderError> {
        request.validate()?;
        let mut rendered = self
            .rendered
            .lock()
            .map_err(|_| RenderError::Backend("recording lock poisoned".to_string()))?;
        rendered.push((output.to_path_buf(), request.clone()));
        Ok(())
    }
}

/// Render contract errors.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Option name is not recognised.
    #[error("unknown {kind}: {value:?}")]
    UnknownOption {
        /// Option family.
        kind: &'static str,
        /// Rejected input.
        value: String,
    },
    /// Request violates contract invariants.
    #[error("render request violation: {0}")]
    InvalidRequest(String),
    /// JSON encode/decode failure.
    #[error("render request codec failure: {0}")]
    Codec(#[from] serde_json::Error),
    /// Backend runtime failure.
    #[error("render backend failure: {0}")]
    Backend(String),
}
