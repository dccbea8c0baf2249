//! Tests the shared even-spacing and black-frame filtering flow.

use std::path::Path;

use fingerprint_extract::{ExtractError, FrameExtractor, SyntheticExtractor, VideoInfo};

fn backend() -> SyntheticExtractor {
    SyntheticExtractor::new("movie.mp4", VideoInfo::new(100.0, 1920, 1080, 2_400))
}

#[test]
fn extraction_flow_tests_even_extraction_uses_midpoints() {
    let backend = backend();
    let frames = backend
        .extract_evenly(Path::new("movie.mp4"), 10, false)
        .expect("extraction should work");

    let timestamps: Vec<f64> = frames.iter().map(|frame| frame.timestamp).collect();
    let expected: Vec<f64> = (0..10).map(|index| 5.0 + 10.0 * index as f64).collect();
    assert_eq!(timestamps, expected);
    assert_eq!(backend.extracted_count(), 10);
}

#[test]
fn extraction_flow_tests_skip_black_oversamples_and_filters() {
    let backend = backend().with_black_range(0.0, 10.0);
    let frames = backend
        .extract_evenly(Path::new("movie.mp4"), 10, true)
        .expect("extraction should work");

    assert_eq!(frames.len(), 10);
    assert_eq!(backend.extracted_count(), 12);
    assert!(frames.iter().all(|frame| frame.timestamp >= 10.0));
}

#[test]
fn extraction_flow_tests_over_filtering_keeps_black_frames() {
    let backend = backend().with_black_range(0.0, 30.0);
    let frames = backend
        .extract_evenly(Path::new("movie.mp4"), 10, true)
        .expect("extraction should work");

    assert_eq!(frames.len(), 10);
    assert!(frames.iter().any(|frame| frame.timestamp < 30.0));
}

#[test]
fn extraction_flow_tests_explicit_timestamps_keep_request_order() {
    let backend = backend();
    let frames = backend
        .extract_at(Path::new("movie.mp4"), &[50.0, 10.0])
        .expect("extraction should work");
    assert_eq!(frames[0].timestamp, 50.0);
    assert_eq!(frames[1].timestamp, 10.0);
    assert_ne!(frames[0].path, frames[1].path);
}

#[test]
fn extraction_flow_tests_empty_video_reports_no_frames() {
    let backend = SyntheticExtractor::new("empty.mp4", VideoInfo::new(1.0, 16, 16, 0));
    assert!(matches!(
        backend.extract_evenly(Path::new("empty.mp4"), 4, false),
        Err(ExtractError::NoFrames(_))
    ));
}
