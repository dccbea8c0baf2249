//! Integration tests for layout planning across modes.

mod common;

use fingerprint_app::{AppError, LayoutMode, plan_layout};
use fingerprint_core::{
    CoreError, EmphasisStyle, FillOrder, Highlight, LayoutWarning, PixelRect, compute_fill_order,
};
use fingerprint_mosaic::{WeightConfig, grid_cell_rects};
use fingerprint_quadtree::{MAX_QUADTREE_DEPTH, SubdivisionStyle};
use fingerprint_render::CellLabels;

#[test]
fn layout_planning_tests_grid_without_highlights_is_evenly_timed() {
    let plan = plan_layout(
        LayoutMode::Grid {
            rows: 2,
            cols: 3,
            fill_order: FillOrder::Standard,
        },
        &common::fixture_settings(300, 200),
        120.0,
        &[],
    )
    .expect("grid plan");

    assert_eq!(plan.timestamps(), vec![10.0, 30.0, 50.0, 70.0, 90.0, 110.0]);
    assert_eq!(plan.cells[0].rect, PixelRect::new(0, 0, 100, 100));
    assert_eq!(plan.cells[5].rect, PixelRect::new(200, 100, 100, 100));
    assert_eq!(plan.highlight_count(), 0);
    assert!(plan.warnings.is_empty());
}

#[test]
fn layout_planning_tests_fill_order_permutes_grid_rects() {
    let plan = plan_layout(
        LayoutMode::Grid {
            rows: 4,
            cols: 5,
            fill_order: FillOrder::SpiralFromCenter,
        },
        &common::fixture_settings(500, 400),
        60.0,
        &[],
    )
    .expect("spiral plan");

    let raster = grid_cell_rects(4, 5, 500, 400, 0).expect("raster");
    let positions = compute_fill_order(4, 5, FillOrder::SpiralFromCenter);
    for (cell, position) in plan.cells.iter().zip(&positions) {
        assert_eq!(cell.rect, raster[position.raster_index(5)]);
    }

    let mut planned: Vec<PixelRect> = plan.cells.iter().map(|cell| cell.rect).collect();
    let mut expected = raster.clone();
    planned.sort_by_key(|rect| (rect.y, rect.x));
    expected.sort_by_key(|rect| (rect.y, rect.x));
    assert_eq!(planned, expected);
}

#[test]
fn layout_planning_tests_grid_highlight_lands_on_its_timeline_cell() {
    let plan = plan_layout(
        LayoutMode::Grid {
            rows: 2,
            cols: 3,
            fill_order: FillOrder::Standard,
        },
        &common::fixture_settings(300, 200),
        120.0,
        &[Highlight::at(60.0)],
    )
    .expect("grid plan");

    assert_eq!(plan.highlight_count(), 1);
    assert!(plan.cells[2].is_highlight);
    assert_eq!(plan.cells[2].timestamp, 60.0);
    let regular: Vec<f64> = plan
        .cells
        .iter()
        .filter(|cell| !cell.is_highlight)
        .map(|cell| cell.timestamp)
        .collect();
    assert_eq!(regular.len(), 5);
    assert!(regular.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn layout_planning_tests_quadtree_highlights_take_largest_cells() {
    let plan = plan_layout(
        LayoutMode::Quadtree {
            max_depth: 2,
            style: SubdivisionStyle::Balanced,
            seed: 42,
        },
        &common::fixture_settings(400, 400),
        100.0,
        &[Highlight::at(80.0), Highlight::at(20.0)],
    )
    .expect("quadtree plan");

    assert_eq!(plan.cells.len(), 16);
    assert!(plan.cells[0].is_highlight && plan.cells[1].is_highlight);
    assert_eq!(plan.cells[0].timestamp, 20.0);
    assert_eq!(plan.cells[1].timestamp, 80.0);
    assert_eq!(plan.cells[15].rect, PixelRect::new(300, 300, 100, 100));
}

#[test]
fn layout_planning_tests_weighted_highlight_widens_its_cell() {
    let plan = plan_layout(
        LayoutMode::Weighted {
            rows: 1,
            cols: 5,
            weights: WeightConfig::default(),
        },
        &common::fixture_settings(700, 100),
        100.0,
        &[Highlight::at(50.0).with_emphasis(EmphasisStyle::Bigger)],
    )
    .expect("weighted plan");

    let widths: Vec<u32> = plan.cells.iter().map(|cell| cell.rect.width).collect();
    assert_eq!(widths, vec![100, 100, 300, 100, 100]);
    assert!(plan.cells[2].is_highlight);
}

#[test]
fn layout_planning_tests_reports_highlight_adjustments() {
    let plan = plan_layout(
        LayoutMode::Grid {
            rows: 1,
            cols: 2,
            fill_order: FillOrder::Standard,
        },
        &common::fixture_settings(200, 100),
        100.0,
        &[
            Highlight::at(10.0),
            Highlight::at(150.0),
            Highlight::at(20.0),
            Highlight::at(30.0),
        ],
    )
    .expect("plan with warnings");

    assert_eq!(plan.highlight_count(), 2);
    assert!(plan.warnings.iter().any(|warning| matches!(
        warning,
        LayoutWarning::HighlightBeyondDuration { timestamp, .. } if *timestamp == 150.0
    )));
    assert!(plan.warnings.iter().any(|warning| matches!(
        warning,
        LayoutWarning::TooManyHighlights { available: 2, .. }
    )));
    assert_eq!(plan.timestamps(), vec![10.0, 20.0]);
}

#[test]
fn layout_planning_tests_labels_follow_settings() {
    let mut settings = common::fixture_settings(200, 100);
    settings.labels = CellLabels::Timestamp;
    let plan = plan_layout(
        LayoutMode::Grid {
            rows: 1,
            cols: 2,
            fill_order: FillOrder::Standard,
        },
        &settings,
        240.0,
        &[],
    )
    .expect("labelled plan");

    let labels: Vec<Option<&str>> = plan.cells.iter().map(|cell| cell.label.as_deref()).collect();
    assert_eq!(labels, vec![Some("1:00"), Some("3:00")]);
}

#[test]
fn layout_planning_tests_rejects_invalid_arguments() {
    let settings = common::fixture_settings(200, 100);
    assert!(matches!(
        plan_layout(LayoutMode::default_grid(), &settings, 0.0, &[]),
        Err(AppError::Core(CoreError::InvalidDuration(_)))
    ));
    assert!(matches!(
        plan_layout(
            LayoutMode::Grid {
                rows: 0,
                cols: 3,
                fill_order: FillOrder::Standard,
            },
            &settings,
            10.0,
            &[]
        ),
        Err(AppError::Core(CoreError::NonPositive { .. }))
    ));
    assert!(matches!(
        plan_layout(
            LayoutMode::Quadtree {
                max_depth: 0,
                style: SubdivisionStyle::Balanced,
                seed: 1,
            },
            &settings,
            10.0,
            &[]
        ),
        Err(AppError::Quadtree(_))
    ));
    assert!(matches!(
        plan_layout(
            LayoutMode::Quadtree {
                max_depth: MAX_QUADTREE_DEPTH + 1,
                style: SubdivisionStyle::Balanced,
                seed: 1,
            },
            &settings,
            10.0,
            &[]
        ),
        Err(AppError::Quadtree(_))
    ));
}
