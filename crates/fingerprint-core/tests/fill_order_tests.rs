//! Tests the fill-order bijection over a range of grid shapes.

use std::collections::HashSet;

use fingerprint_core::{FillOrder, FillPosition, compute_fill_order};

#[test]
fn fill_order_tests_every_policy_is_a_bijection() {
    for order in FillOrder::ALL {
        for rows in 1..=9 {
            for cols in 1..=9 {
                let positions = compute_fill_order(rows, cols, order);
                assert_eq!(positions.len(), rows * cols, "{order} {rows}x{cols}");

                let unique: HashSet<FillPosition> = positions.iter().copied().collect();
                assert_eq!(unique.len(), rows * cols, "{order} {rows}x{cols}");
                assert!(
                    positions
                        .iter()
                        .all(|position| position.row < rows && position.col < cols)
                );
            }
        }
    }
}

#[test]
fn fill_order_tests_standard_is_raster_order() {
    let positions = compute_fill_order(3, 4, FillOrder::Standard);
    for (index, position) in positions.iter().enumerate() {
        assert_eq!(position.raster_index(4), index);
    }
}

#[test]
fn fill_order_tests_orders_are_deterministic() {
    for order in FillOrder::ALL {
        assert_eq!(
            compute_fill_order(7, 5, order),
            compute_fill_order(7, 5, order)
        );
    }
}
