//! Synthetic street grid.

use tpd_core::{NodeId, Point};
use tpd_spatial::{RoadNetwork, RoadNetworkBuilder};

/// `side × side` intersections `spacing` metres apart.
///
/// East–west streets are two-way.  North–south avenues alternate: even
/// columns are two-way, odd columns one-way northbound.
pub fn build_grid(side: u32, spacing: f64) -> RoadNetwork {
    let mut b = RoadNetworkBuilder::new();
    let mut ids = Vec::with_capacity((side * side) as usize);
    for row in 0..side {
        for col in 0..side {
            ids.push(b.add_node(Point::new(col as f64 * spacing, row as f64 * spacing)));
        }
    }
    let at = |row: u32, col: u32| -> NodeId { ids[(row * side + col) as usize] };

    for row in 0..side {
        for col in 0..side {
            if col + 1 < side {
                b.add_road(at(row, col), at(row, col + 1), spacing);
            }
            if row + 1 < side {
                if col % 2 == 0 {
                    b.add_road(at(row, col), at(row + 1, col), spacing);
                } else {
                    b.add_directed_edge(at(row, col), at(row + 1, col), spacing);
                }
            }
        }
    }
    b.build()
}
