//! Rectangular hole grid drilled through a panel.

use tracing::{debug, instrument};
use wall_kernel::SolidHandle;

use crate::config::HolePattern;
use crate::error::Result;
use crate::kernel_ext::KernelBundle;

/// Hole centres `(x, y)` in the panel's base frame.
///
/// `x` steps from `x_start` by `x_dist` while strictly below `height`; for
/// each `x`, `y` restarts at `y_start` and steps by `y_dist` while strictly
/// below `width`.
pub fn hole_centers(pattern: &HolePattern, height: f64, width: f64) -> Vec<[f64; 2]> {
    let xs = steps(pattern.x_start, pattern.x_dist, height);
    let ys = steps(pattern.y_start, pattern.y_dist, width);
    xs.iter()
        .flat_map(|&x| ys.iter().map(move |&y| [x, y]))
        .collect()
}

fn steps(start: f64, dist: f64, limit: f64) -> Vec<f64> {
    if !(dist > 0.0) {
        return Vec::new();
    }
    (0..)
        .map(|i| start + i as f64 * dist)
        .take_while(|v| *v < limit)
        .collect()
}

/// Drill every hole of the pattern along +Z, returning the drilled solid.
#[instrument(skip(kb, board))]
pub fn drill_holes(
    kb: &mut dyn KernelBundle,
    board: &SolidHandle,
    pattern: &HolePattern,
    height: f64,
    width: f64,
) -> Result<SolidHandle> {
    let radius = pattern.diameter / 2.0;
    let centers = hole_centers(pattern, height, width);
    let mut current = board.clone();
    for [x, y] in &centers {
        current = kb.make_cylindrical_hole(&current, [*x, *y, 0.0], [0.0, 0.0, 1.0], radius)?;
    }
    debug!(holes = centers.len(), "panel drilled");
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wall_kernel::{Kernel, KernelIntrospect, MockKernel};

    #[test]
    fn grid_of_thirty_on_a_small_panel() {
        let centers = hole_centers(&HolePattern::default(), 1200.0, 1000.0);
        assert_eq!(centers.len(), 30);
        for i in 0..6 {
            for j in 0..5 {
                let expected = [100.0 + 200.0 * i as f64, 100.0 + 200.0 * j as f64];
                assert!(centers.contains(&expected), "missing {:?}", expected);
            }
        }
    }

    #[test]
    fn bounds_are_strict() {
        // 1100 is the last x below 1200; a 1100-high panel stops at 900.
        let centers = hole_centers(&HolePattern::default(), 1100.0, 300.0);
        let xs: Vec<f64> = centers.iter().map(|c| c[0]).collect();
        assert_eq!(xs, vec![100.0, 300.0, 500.0, 700.0, 900.0]);
    }

    #[test]
    fn start_past_the_edge_drills_nothing() {
        let pattern = HolePattern {
            x_start: 500.0,
            ..HolePattern::default()
        };
        assert!(hole_centers(&pattern, 400.0, 1000.0).is_empty());
    }

    #[test]
    fn drilled_holes_run_through_the_thickness() {
        let mut kernel = MockKernel::new();
        let board = kernel.make_box(600.0, 400.0, 21.0).unwrap();
        let drilled = drill_holes(&mut kernel, &board, &HolePattern::default(), 600.0, 400.0).unwrap();

        let holes = kernel.list_holes(&drilled);
        assert_eq!(holes.len(), 6);
        for hole in &holes {
            assert_eq!(hole.direction, [0.0, 0.0, 1.0]);
            assert_eq!(hole.radius, 6.5);
            assert_eq!(hole.origin[2], 0.0);
        }
        assert!(kernel.list_holes(&board).is_empty());
    }
}
