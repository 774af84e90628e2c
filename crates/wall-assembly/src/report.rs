//! Per-part reports and the bill of materials.

use std::fmt;

use serde::{Deserialize, Serialize};
use wall_kernel::{AngleUnit, KernelIntrospect};

use crate::error::{Result, WallError};
use crate::part::{Assembly, PartKind};

/// Snapshot of one placed part, in world coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartReport {
    pub index: usize,
    pub kind: PartKind,
    /// Bars: length, section width, section height.
    /// Panels: height, width, thickness.
    pub dimensions: [f64; 3],
    pub parent: Option<usize>,
    /// World position of the part's local origin.
    pub position: [f64; 3],
    /// World Z-X-Z orientation in degrees.
    pub orientation: [f64; 3],
    pub holes: usize,
    pub trims: usize,
}

impl Assembly {
    /// Report every placed part in build order.
    pub fn reports(&self, kernel: &dyn KernelIntrospect) -> Vec<PartReport> {
        self.ids()
            .zip(self.parts())
            .filter_map(|(id, part)| {
                let world = part.world_transform()?;
                let holes = part
                    .placed_shape()
                    .map(|s| kernel.list_holes(s).len())
                    .unwrap_or(0);
                Some(PartReport {
                    index: id.index(),
                    kind: part.kind(),
                    dimensions: part.shape().dimensions(),
                    parent: part.parent().map(|p| p.index()),
                    position: world.translation_part(),
                    orientation: world.to_euler_zxz(AngleUnit::Degrees),
                    holes,
                    trims: part.trims().len(),
                })
            })
            .collect()
    }

    /// Pretty-printed JSON array of [`PartReport`]s.
    pub fn report_json(&self, kernel: &dyn KernelIntrospect) -> Result<String> {
        serde_json::to_string_pretty(&self.reports(kernel)).map_err(|e| WallError::Config {
            reason: format!("cannot serialize part reports: {e}"),
        })
    }

    /// Parts grouped by kind and nominal size, in order of first appearance.
    pub fn bill_of_materials(&self) -> Vec<MaterialLine> {
        let mut lines: Vec<MaterialLine> = Vec::new();
        for part in self.parts() {
            let size = nominal_size(part.shape().dimensions());
            match lines
                .iter_mut()
                .find(|l| l.kind == part.kind() && l.size == size)
            {
                Some(line) => line.count += 1,
                None => lines.push(MaterialLine {
                    kind: part.kind(),
                    size,
                    count: 1,
                }),
            }
        }
        lines
    }
}

/// Dimensions in tenths of a millimetre, smallest first.
fn nominal_size(dimensions: [f64; 3]) -> [i64; 3] {
    let mut size = dimensions.map(|d| (d * 10.0).round() as i64);
    size.sort_unstable();
    size
}

/// One bill-of-materials entry, e.g. `3x bar 80x100x2928.9`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialLine {
    pub kind: PartKind,
    /// Tenths of a millimetre, ascending.
    pub size: [i64; 3],
    pub count: usize,
}

impl MaterialLine {
    /// Size in millimetres.
    pub fn dimensions(&self) -> [f64; 3] {
        self.size.map(|s| s as f64 / 10.0)
    }
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartKind::Bar => write!(f, "bar"),
            PartKind::Panel => write!(f, "panel"),
        }
    }
}

impl fmt::Display for MaterialLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.size.map(format_tenths);
        write!(f, "{}x {} {}x{}x{}", self.count, self.kind, a, b, c)
    }
}

fn format_tenths(tenths: i64) -> String {
    if tenths % 10 == 0 {
        format!("{}", tenths / 10)
    } else {
        format!("{:.1}", tenths as f64 / 10.0)
    }
}
