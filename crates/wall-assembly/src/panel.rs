use tracing::debug;
use wall_kernel::SolidHandle;

use crate::config::HolePattern;
use crate::drill;
use crate::error::{require_positive, Result};
use crate::kernel_ext::KernelBundle;

/// A flat climbing panel drilled with a regular grid of holes.
///
/// The base solid spans `height` along local X, `width` along Y and
/// `thickness` along Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Panel {
    pub width: f64,
    pub height: f64,
    pub thickness: f64,
    pub holes: HolePattern,
}

impl Panel {
    pub fn new(width: f64, height: f64, thickness: f64, holes: HolePattern) -> Result<Self> {
        require_positive(&[
            ("panel width", width),
            ("panel height", height),
            ("panel thickness", thickness),
        ])?;
        holes.validate()?;
        Ok(Self {
            width,
            height,
            thickness,
            holes,
        })
    }

    /// Build the unplaced, drilled board.
    pub fn build(&self, kb: &mut dyn KernelBundle) -> Result<SolidHandle> {
        let board = kb.make_box(self.height, self.width, self.thickness)?;
        let drilled = drill::drill_holes(kb, &board, &self.holes, self.height, self.width)?;
        debug!(width = self.width, height = self.height, "panel base built");
        Ok(drilled)
    }

    pub fn dimensions(&self) -> [f64; 3] {
        [self.height, self.width, self.thickness]
    }
}
