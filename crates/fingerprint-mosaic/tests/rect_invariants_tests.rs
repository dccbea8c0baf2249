//! Tests pixel-sum invariants of the weighted and uniform layouts.

use fingerprint_core::{EmphasisStyle, PixelRect};
use fingerprint_mosaic::{
    HighlightEmphasis, WeightConfig, cells_to_pixel_rects, compute_frame_weights,
    compute_weighted_cell_rects, grid_cell_rects,
};
use fingerprint_quadtree::{SubdivisionStyle, generate_quadtree};

fn assert_rows_fill_canvas(rects: &[PixelRect], cols: usize, width: u32, height: u32) {
    let rows: Vec<&[PixelRect]> = rects.chunks(cols).collect();
    let height_sum: u32 = rows.iter().map(|row| row[0].height).sum();
    assert_eq!(height_sum, height);

    for row in rows {
        let width_sum: u32 = row.iter().map(|rect| rect.width).sum();
        assert_eq!(width_sum, width);
        assert_eq!(row.last().map(PixelRect::right), Some(width));
        assert!(row.iter().all(|rect| rect.height == row[0].height));
    }
}

#[test]
fn rect_invariants_tests_weighted_rows_sum_to_canvas() {
    let styles = [
        EmphasisStyle::Bigger,
        EmphasisStyle::RampUp,
        EmphasisStyle::RampDown,
        EmphasisStyle::RampUpAndDown,
    ];

    for (rows, cols) in [(1, 1), (3, 4), (5, 7), (20, 30)] {
        let total = rows * cols;
        for style in styles {
            let emphases = [
                HighlightEmphasis {
                    cell_index: 0,
                    style,
                },
                HighlightEmphasis {
                    cell_index: total / 2,
                    style,
                },
            ];
            let weights = compute_frame_weights(total, &emphases, WeightConfig::default());
            for (width, height) in [(1920, 1080), (3456, 2234), (101, 37)] {
                let rects = compute_weighted_cell_rects(&weights, rows, cols, width, height, 0)
                    .expect("grid should lay out");
                assert_eq!(rects.len(), total);
                assert_rows_fill_canvas(&rects, cols, width, height);
            }
        }
    }
}

#[test]
fn rect_invariants_tests_short_last_row_still_spans_canvas() {
    let rects = compute_weighted_cell_rects(&[1.0; 7], 3, 3, 90, 60, 0).expect("valid grid");
    assert_eq!(rects.len(), 7);
    // Row sums 3, 3, 1 -> edges at round(60*3/7)=26 and round(60*6/7)=51.
    assert_eq!(rects[6], PixelRect::new(0, 51, 90, 9));
}

#[test]
fn rect_invariants_tests_uniform_grid_fills_canvas() {
    let rects = grid_cell_rects(20, 30, 3840, 2160, 0).expect("valid grid");
    assert_eq!(rects.len(), 600);
    assert_rows_fill_canvas(&rects, 30, 3840, 2160);
    assert_eq!(rects[0], PixelRect::new(0, 0, 128, 108));
}

#[test]
fn rect_invariants_tests_largest_grid_stays_inside_canvas() {
    let rects = grid_cell_rects(200, 200, 1920, 1080, 0).expect("valid grid");
    assert_eq!(rects.len(), 40_000);
    assert_rows_fill_canvas(&rects, 200, 1920, 1080);
    assert!(
        rects
            .iter()
            .all(|rect| rect.right() <= 1920 && rect.bottom() <= 1080)
    );
}

#[test]
fn rect_invariants_tests_uniform_grid_applies_padding_inset() {
    let rects = grid_cell_rects(2, 2, 100, 100, 6).expect("valid grid");
    assert_eq!(rects[3], PixelRect::new(53, 53, 44, 44));
}

#[test]
fn rect_invariants_tests_balanced_quadtree_maps_without_seams() {
    let cells = generate_quadtree(3, SubdivisionStyle::Balanced, 42).expect("valid quadtree");
    let rects = cells_to_pixel_rects(&cells, 3840, 2160, 0);
    assert_rows_fill_canvas(&rects, 8, 3840, 2160);
}

#[test]
fn rect_invariants_tests_quadtree_seams_stay_within_one_pixel() {
    let cells =
        generate_quadtree(5, SubdivisionStyle::center_weighted(), 42).expect("valid quadtree");
    let rects = cells_to_pixel_rects(&cells, 1001, 999, 0);
    assert_eq!(rects.len(), cells.len());

    for (cell, rect) in cells.iter().zip(&rects) {
        let ideal_right = (cell.x + cell.w) * 1001.0;
        let ideal_bottom = (cell.y + cell.h) * 999.0;
        assert!((f64::from(rect.right()) - ideal_right).abs() <= 1.0);
        assert!((f64::from(rect.bottom()) - ideal_bottom).abs() <= 1.0);
    }
}

#[test]
fn rect_invariants_tests_quadtree_edge_cells_reach_odd_canvas_edges() {
    let cells = generate_quadtree(4, SubdivisionStyle::random(), 9).expect("valid quadtree");
    let rects = cells_to_pixel_rects(&cells, 1001, 999, 0);

    for (cell, rect) in cells.iter().zip(&rects) {
        if cell.x + cell.w >= 1.0 {
            assert_eq!(rect.right(), 1001);
        }
        if cell.y + cell.h >= 1.0 {
            assert_eq!(rect.bottom(), 999);
        }
    }
}
