//! Shared fixtures for app integration tests.

use fingerprint_app::GenerationSettings;
use fingerprint_extract::{SyntheticExtractor, VideoInfo};

/// Path the fixture extractor answers to.
#[allow(dead_code)]
pub const FIXTURE_VIDEO: &str = "fixtures/movie.mp4";

/// Creates a two-minute 24 fps synthetic video.
#[allow(dead_code)]
pub fn fixture_extractor() -> SyntheticExtractor {
    SyntheticExtractor::new(FIXTURE_VIDEO, VideoInfo::new(120.0, 1920, 1080, 2_880))
}

/// Creates PNG settings for a small canvas.
#[allow(dead_code)]
pub fn fixture_settings(width: u32, height: u32) -> GenerationSettings {
    GenerationSettings {
        canvas_width: width,
        canvas_height: height,
        ..GenerationSettings::default()
    }
}
