//! Procedural layout of the free-standing, overhanging climbing wall.
//!
//! Frame conventions (w = bar width, h = bar height, A = wall angle):
//! the floor bars run along -Y from the back of the wall, the back bar joins
//! them along +X, three diagonal braces rise from the back bar at angle A
//! from vertical, two panels rest on the first brace, and the front legs
//! carry a top bar.

use tracing::{debug, info, instrument};

use crate::bar::Bar;
use crate::config::{Section, WallParams};
use crate::error::Result;
use crate::kernel_ext::KernelBundle;
use crate::panel::Panel;
use crate::part::{Assembly, PartId, Pose};
use crate::trim::{self, TrimPlanes};

/// Number of parts produced by [`climbing_wall`].
pub const PART_COUNT: usize = 11;

/// The generated wall with named handles to each group of parts.
///
/// Parts sit in the assembly in build order: floor bars, back bar,
/// diagonals, panels, vertical bars, top bar.
#[derive(Debug, Clone)]
pub struct ClimbingWall {
    pub assembly: Assembly,
    pub params: WallParams,
    /// Left, right.
    pub floor: [PartId; 2],
    pub back: PartId,
    pub diagonals: [PartId; 3],
    /// Lower, upper.
    pub panels: [PartId; 2],
    /// Left, right.
    pub verticals: [PartId; 2],
    pub top: PartId,
}

/// Generate every part of the wall.
///
/// Either all parts are built or an error is returned.
#[instrument(skip(kb))]
pub fn climbing_wall(kb: &mut dyn KernelBundle, params: &WallParams) -> Result<ClimbingWall> {
    params.validate()?;

    let angle = params.angle.to_radians();
    let (sin, cos, tan) = (angle.sin(), angle.cos(), angle.tan());
    let w = params.bar_section.width;
    let h = params.bar_section.height;
    let rise = params.height + params.gap;
    let mut assembly = Assembly::new();

    // Floor bars
    let floor_length = w + rise * sin + params.safety;
    let floor_bar = Bar::new(floor_length, params.bar_section)?;
    let left = assembly.add_bar(kb, floor_bar, Pose::new([0.0; 3], [0.0, 0.0, -90.0]), None)?;
    let right = assembly.add_bar(
        kb,
        floor_bar,
        Pose::new([params.width + w, 0.0, 0.0], [0.0, 0.0, -90.0]),
        None,
    )?;
    debug!(floor_length, "floor bars placed");

    // Back bar
    let back = assembly.add_bar(
        kb,
        Bar::new(params.width + 2.0 * w, params.bar_section)?,
        Pose::new([w, 0.0, h], [0.0, 0.0, 90.0]),
        Some(left),
    )?;

    // Diagonal braces
    let diagonal_length = params.height + 2.0 * w / tan + params.gap;
    let diagonal = Bar::new(diagonal_length, Section::new(h, w))?;
    let dy = w * sin * tan;
    let dz = h - w * sin;
    let diag1 = assembly.add_bar(
        kb,
        diagonal,
        Pose::new([w, dy, dz], [-90.0, params.angle - 90.0, 0.0]),
        Some(back),
    )?;
    let spacing = Pose::at([0.0, (params.width - h) / 2.0, 0.0]);
    let diag2 = assembly.add_bar(kb, diagonal, spacing, Some(diag1))?;
    let diag3 = assembly.add_bar(kb, diagonal, spacing, Some(diag2))?;
    let diagonals = [diag1, diag2, diag3];
    trim::trim_diagonals(kb, &mut assembly, &diagonals, &TrimPlanes::from_params(params))?;
    debug!(diagonal_length, "diagonals placed and trimmed");

    // Panels
    let panel = Panel::new(params.width, params.height / 2.0, params.thickness, params.holes)?;
    let lower = assembly.add_panel(
        kb,
        panel,
        Pose::at([tan * diagonal.section.height, 0.0, -params.thickness]),
        Some(diag1),
    )?;
    let upper = assembly.add_panel(kb, panel, Pose::at([panel.height, 0.0, 0.0]), Some(lower))?;

    // Front legs and top bar
    let leg_length = rise * cos + h;
    let leg = Bar::new(leg_length, params.front_section)?;
    let leg_pose = Pose::new([2.0 * w + rise * sin, 0.0, h], [90.0, 90.0, -90.0]);
    let vertical_left = assembly.add_bar(kb, leg, leg_pose, Some(left))?;
    let vertical_right = assembly.add_bar(kb, leg, leg_pose, Some(right))?;
    let top = assembly.add_bar(
        kb,
        Bar::new(params.width + 2.0 * w, params.front_section)?,
        Pose::new(
            [h + params.front_section.width + rise * cos, 0.0, 0.0],
            [90.0, 0.0, 0.0],
        ),
        Some(vertical_left),
    )?;

    let bounds = assembly.bounding_box(kb.as_introspect())?;
    info!(parts = assembly.len(), ?bounds, "climbing wall generated");
    Ok(ClimbingWall {
        assembly,
        params: *params,
        floor: [left, right],
        back,
        diagonals,
        panels: [lower, upper],
        verticals: [vertical_left, vertical_right],
        top,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WallError;
    use wall_kernel::MockKernel;

    #[test]
    fn default_wall_has_every_part() {
        let mut kernel = MockKernel::new();
        let wall = climbing_wall(&mut kernel, &WallParams::default()).unwrap();
        assert_eq!(wall.assembly.len(), PART_COUNT);
        assert_eq!(wall.floor[0].index(), 0);
        assert_eq!(wall.top.index(), PART_COUNT - 1);
        assert!(wall.assembly.parts().iter().all(|p| p.is_placed()));
    }

    #[test]
    fn invalid_parameters_build_nothing() {
        let mut kernel = MockKernel::new();
        let params = WallParams {
            angle: 0.0,
            ..WallParams::default()
        };
        let err = climbing_wall(&mut kernel, &params).unwrap_err();
        assert!(matches!(err, WallError::Validation { .. }));
        assert_eq!(kernel.solid_count(), 0);
    }
}
