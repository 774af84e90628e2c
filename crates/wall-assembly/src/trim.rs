//! Two-plane trim of the diagonal braces.

use tracing::{debug, instrument};
use wall_kernel::SolidHandle;

use crate::config::WallParams;
use crate::error::Result;
use crate::kernel_ext::KernelBundle;
use crate::part::{Assembly, PartId};

/// World-space planes the diagonal braces are cut against.
///
/// Kept material lies at or above `floor_z` and at or in front of
/// `front_y` (towards +Y).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimPlanes {
    /// Top of the back bar, `2 * bar height`.
    pub floor_z: f64,
    /// Outer face of the front legs, `-(bar width + (height + gap) * sin(angle))`.
    pub front_y: f64,
}

impl TrimPlanes {
    pub fn from_params(params: &WallParams) -> Self {
        let sin = params.angle.to_radians().sin();
        Self {
            floor_z: 2.0 * params.bar_section.height,
            front_y: -(params.bar_section.width + (params.height + params.gap) * sin),
        }
    }

    /// Half-space tools holding the material to remove: below `floor_z`,
    /// then behind `front_y`.
    pub fn tools(&self, kb: &mut dyn KernelBundle) -> Result<[SolidHandle; 2]> {
        let floor = kb.make_plane([0.0, 0.0, self.floor_z], [0.0, 0.0, 1.0])?;
        let below = kb.make_half_space(&floor, [0.0, 0.0, 0.0])?;

        let front = kb.make_plane([0.0, self.front_y, 0.0], [0.0, 1.0, 0.0])?;
        let behind = kb.make_half_space(&front, [0.0, self.front_y - 1.0, 0.0])?;
        Ok([below, behind])
    }
}

/// Cut every listed part by both tools, in order.
#[instrument(skip(kb, assembly))]
pub fn trim_diagonals(
    kb: &mut dyn KernelBundle,
    assembly: &mut Assembly,
    diagonals: &[PartId],
    planes: &TrimPlanes,
) -> Result<()> {
    let tools = planes.tools(kb)?;
    for &id in diagonals {
        for tool in &tools {
            assembly.trim(kb, id, tool)?;
        }
        debug!(?id, "diagonal trimmed");
    }
    Ok(())
}
