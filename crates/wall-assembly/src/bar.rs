use tracing::debug;
use wall_kernel::SolidHandle;

use crate::config::Section;
use crate::error::{require_positive, Result};
use crate::kernel_ext::KernelBundle;

/// A straight structural bar with a rectangular section.
///
/// The base solid runs along local X from the origin, with the section's
/// width along Y and its height along Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub length: f64,
    pub section: Section,
}

impl Bar {
    pub fn new(length: f64, section: Section) -> Result<Self> {
        require_positive(&[("bar length", length)])?;
        section.validate()?;
        Ok(Self { length, section })
    }

    /// Build the unplaced box.
    pub fn build(&self, kb: &mut dyn KernelBundle) -> Result<SolidHandle> {
        let handle = kb.make_box(self.length, self.section.width, self.section.height)?;
        debug!(length = self.length, section = ?self.section, "bar base built");
        Ok(handle)
    }

    /// Nominal outer dimensions in base-frame axis order.
    pub fn dimensions(&self) -> [f64; 3] {
        [self.length, self.section.width, self.section.height]
    }
}
