use serde::{Deserialize, Serialize};

/// Opaque handle to a solid in the geometry kernel.
/// NEVER persisted. Valid only for the kernel instance that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SolidHandle(pub(crate) u64);

impl SolidHandle {
    pub(crate) fn id(&self) -> u64 {
        self.0
    }
}

/// Opaque handle to an unbounded planar face (the boundary of a half-space).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FaceHandle(pub(crate) u64);

impl FaceHandle {
    pub(crate) fn id(&self) -> u64 {
        self.0
    }
}

/// Errors from kernel operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum KernelError {
    #[error("boolean operation failed: {reason}")]
    BooleanFailed { reason: String },

    #[error("feature operation failed: {reason}")]
    FeatureFailed { reason: String },

    #[error("degenerate geometry: {reason}")]
    DegenerateGeometry { reason: String },

    #[error("entity not found: {id}")]
    EntityNotFound { id: u64 },

    #[error("operation not supported: {operation}")]
    NotSupported { operation: String },
}

/// Infinite plane given by a point on it and its (unit) normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub point: [f64; 3],
    pub normal: [f64; 3],
}

/// A cylindrical through-hole recorded on a solid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoleFeature {
    /// A point on the hole axis.
    pub origin: [f64; 3],
    /// Unit direction of the hole axis.
    pub direction: [f64; 3],
    pub radius: f64,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingBox {
    /// Smallest box containing every point, or None for an empty iterator.
    pub fn from_points<I: IntoIterator<Item = [f64; 3]>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = BoundingBox {
            min: first,
            max: first,
        };
        for p in iter {
            for i in 0..3 {
                bbox.min[i] = bbox.min[i].min(p[i]);
                bbox.max[i] = bbox.max[i].max(p[i]);
            }
        }
        Some(bbox)
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let mut out = *self;
        for i in 0..3 {
            out.min[i] = out.min[i].min(other.min[i]);
            out.max[i] = out.max[i].max(other.max[i]);
        }
        out
    }

    /// Extent along each axis.
    pub fn size(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    /// Whether the line `origin + t * direction` runs through the box over a
    /// segment of positive length. Lines lying on a face count as crossing.
    pub fn crossed_by_line(&self, origin: [f64; 3], direction: [f64; 3]) -> bool {
        const EPS: f64 = 1e-6;
        let mut lo = f64::NEG_INFINITY;
        let mut hi = f64::INFINITY;
        for i in 0..3 {
            if direction[i].abs() < 1e-12 {
                if origin[i] < self.min[i] - EPS || origin[i] > self.max[i] + EPS {
                    return false;
                }
                continue;
            }
            let a = (self.min[i] - origin[i]) / direction[i];
            let b = (self.max[i] - origin[i]) / direction[i];
            lo = lo.max(a.min(b));
            hi = hi.min(a.max(b));
        }
        hi - lo > EPS
    }

    pub fn center(&self) -> [f64; 3] {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
            (self.min[2] + self.max[2]) / 2.0,
        ]
    }
}
