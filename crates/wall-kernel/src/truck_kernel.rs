//! TruckKernel: real geometry kernel wrapping truck's API.

use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3 as NaVector3};
use tracing::{debug, instrument};

use crate::primitives;
use crate::traits::{Kernel, KernelIntrospect};
use crate::transform::RigidTransform;
use crate::types::*;

// Import truck types selectively to avoid shadowing std::result::Result
use truck_modeling::builder;
use truck_modeling::topology::Solid;
use truck_modeling::Matrix4;

/// Half-spaces are realised as cubes of this half-width (model units).
const HALF_SPACE_EXTENT: f64 = 1.0e4;

/// Tolerance handed to truck's boolean operations.
const BOOLEAN_TOLERANCE: f64 = 0.05;

/// A stored truck solid plus the bookkeeping truck does not track for us.
#[derive(Debug, Clone)]
struct TruckSolid {
    solid: Solid,
    holes: Vec<HoleFeature>,
    /// Stand-in block for an unbounded half-space.
    half_space: bool,
}

/// Real geometry kernel backed by the truck BREP library.
pub struct TruckKernel {
    next_handle: u64,
    solids: HashMap<u64, TruckSolid>,
    faces: HashMap<u64, Plane>,
}

impl TruckKernel {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            solids: HashMap::new(),
            faces: HashMap::new(),
        }
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_handle;
        self.next_handle += 1;
        id
    }

    fn store_solid(&mut self, solid: TruckSolid) -> SolidHandle {
        let handle = SolidHandle(self.alloc_id());
        self.solids.insert(handle.id(), solid);
        handle
    }

    fn get_solid(&self, handle: &SolidHandle) -> Result<&TruckSolid, KernelError> {
        self.solids
            .get(&handle.id())
            .ok_or(KernelError::EntityNotFound { id: handle.id() })
    }

    /// Borrow the underlying truck solid, e.g. for tessellation by a viewer.
    pub fn solid(&self, handle: &SolidHandle) -> Option<&Solid> {
        self.solids.get(&handle.id()).map(|s| &s.solid)
    }
}

impl Default for TruckKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel for TruckKernel {
    #[instrument(skip(self))]
    fn make_box(&mut self, dx: f64, dy: f64, dz: f64) -> Result<SolidHandle, KernelError> {
        if ![dx, dy, dz].iter().all(|d| d.is_finite() && *d > 0.0) {
            return Err(KernelError::DegenerateGeometry {
                reason: format!("box dimensions must be positive, got {dx} x {dy} x {dz}"),
            });
        }
        Ok(self.store_solid(TruckSolid {
            solid: primitives::make_box(dx, dy, dz),
            holes: Vec::new(),
            half_space: false,
        }))
    }

    fn make_cylindrical_hole(
        &mut self,
        solid: &SolidHandle,
        axis_origin: [f64; 3],
        axis_direction: [f64; 3],
        radius: f64,
    ) -> Result<SolidHandle, KernelError> {
        let base = self.get_solid(solid)?;
        if base.half_space {
            return Err(KernelError::NotSupported {
                operation: "hole in an unbounded solid".to_string(),
            });
        }
        if !(radius.is_finite() && radius > 0.0) {
            return Err(KernelError::FeatureFailed {
                reason: format!("hole radius must be positive, got {radius}"),
            });
        }
        let direction = NaVector3::from(axis_direction)
            .try_normalize(1e-12)
            .ok_or_else(|| KernelError::FeatureFailed {
                reason: "hole axis has zero length".to_string(),
            })?;
        let bbox = solid_bbox(&base.solid).ok_or_else(|| KernelError::FeatureFailed {
            reason: "cannot drill a solid without vertices".to_string(),
        })?;

        // Drill long enough to leave the solid on both sides of the origin.
        let center = NaVector3::from(bbox.center());
        let size = NaVector3::from(bbox.size());
        let reach = (NaVector3::from(axis_origin) - center).norm() + size.norm() + 1.0;

        let placement = RigidTransform::from(Isometry3::from_parts(
            Translation3::new(axis_origin[0], axis_origin[1], axis_origin[2]),
            rotation_from_z(&direction),
        ));
        let mut drill = builder::transformed(
            &primitives::make_drill(radius, 2.0 * reach)?,
            to_truck_matrix(&placement),
        );
        drill.not();

        let result = truck_shapeops::and(&base.solid, &drill, BOOLEAN_TOLERANCE).ok_or_else(
            || KernelError::BooleanFailed {
                reason: "truck and() returned None for hole".to_string(),
            },
        )?;
        let mut holes = base.holes.clone();
        holes.push(HoleFeature {
            origin: axis_origin,
            direction: [direction.x, direction.y, direction.z],
            radius,
        });
        Ok(self.store_solid(TruckSolid {
            solid: result,
            holes,
            half_space: false,
        }))
    }

    fn make_plane(
        &mut self,
        point: [f64; 3],
        normal: [f64; 3],
    ) -> Result<FaceHandle, KernelError> {
        let n = NaVector3::from(normal)
            .try_normalize(1e-12)
            .ok_or_else(|| KernelError::DegenerateGeometry {
                reason: "plane normal has zero length".to_string(),
            })?;
        let face = FaceHandle(self.alloc_id());
        self.faces.insert(
            face.id(),
            Plane {
                point,
                normal: [n.x, n.y, n.z],
            },
        );
        Ok(face)
    }

    fn make_half_space(
        &mut self,
        face: &FaceHandle,
        reference_point: [f64; 3],
    ) -> Result<SolidHandle, KernelError> {
        let plane = *self
            .faces
            .get(&face.id())
            .ok_or(KernelError::EntityNotFound { id: face.id() })?;
        let normal = NaVector3::from(plane.normal);
        let side = normal.dot(&(NaVector3::from(reference_point) - NaVector3::from(plane.point)));
        if side.abs() <= 1e-9 {
            return Err(KernelError::DegenerateGeometry {
                reason: "half-space reference point lies on its plane".to_string(),
            });
        }

        // Block with its top (or bottom) face on the plane, in plane-local coordinates.
        let e = HALF_SPACE_EXTENT;
        let lift = if side > 0.0 { 0.0 } else { -e };
        let block = primitives::make_box(2.0 * e, 2.0 * e, e);
        let placement = RigidTransform::from(
            Isometry3::from_parts(
                Translation3::new(plane.point[0], plane.point[1], plane.point[2]),
                rotation_from_z(&normal),
            ) * Isometry3::translation(-e, -e, lift),
        );
        debug!(?plane, side, "truck half-space block");
        Ok(self.store_solid(TruckSolid {
            solid: builder::transformed(&block, to_truck_matrix(&placement)),
            holes: Vec::new(),
            half_space: true,
        }))
    }

    fn cut(
        &mut self,
        solid: &SolidHandle,
        tool: &SolidHandle,
    ) -> Result<SolidHandle, KernelError> {
        let target = self.get_solid(solid)?;
        if target.half_space {
            return Err(KernelError::NotSupported {
                operation: "cut of an unbounded solid".to_string(),
            });
        }
        let mut cutter = self.get_solid(tool)?.solid.clone();

        // Subtraction = A ∩ ¬B. not() mutates in place.
        cutter.not();
        let result = truck_shapeops::and(&target.solid, &cutter, BOOLEAN_TOLERANCE)
            .ok_or_else(|| KernelError::BooleanFailed {
                reason: "truck and() returned None for subtraction".to_string(),
            })?;
        // Keep only holes whose axis still runs through what is left.
        let holes = match solid_bbox(&result) {
            Some(bbox) => target
                .holes
                .iter()
                .filter(|h| bbox.crossed_by_line(h.origin, h.direction))
                .copied()
                .collect(),
            None => Vec::new(),
        };
        Ok(self.store_solid(TruckSolid {
            solid: result,
            holes,
            half_space: false,
        }))
    }

    fn transform(
        &mut self,
        solid: &SolidHandle,
        transform: &RigidTransform,
        copy: bool,
    ) -> Result<SolidHandle, KernelError> {
        let source = self.get_solid(solid)?;
        let moved = TruckSolid {
            solid: builder::transformed(&source.solid, to_truck_matrix(transform)),
            holes: source
                .holes
                .iter()
                .map(|h| HoleFeature {
                    origin: transform.apply_point(h.origin),
                    direction: transform.apply_vector(h.direction),
                    radius: h.radius,
                })
                .collect(),
            half_space: source.half_space,
        };
        if copy {
            Ok(self.store_solid(moved))
        } else {
            self.solids.insert(solid.id(), moved);
            Ok(solid.clone())
        }
    }
}

impl KernelIntrospect for TruckKernel {
    fn bounding_box(&self, solid: &SolidHandle) -> Result<BoundingBox, KernelError> {
        let stored = self.get_solid(solid)?;
        if stored.half_space {
            return Err(KernelError::DegenerateGeometry {
                reason: "unbounded solid has no bounding box".to_string(),
            });
        }
        solid_bbox(&stored.solid).ok_or_else(|| KernelError::DegenerateGeometry {
            reason: "solid has no vertices".to_string(),
        })
    }

    fn list_vertices(&self, solid: &SolidHandle) -> Vec<[f64; 3]> {
        self.solids
            .get(&solid.id())
            .map(|s| solid_vertices(&s.solid))
            .unwrap_or_default()
    }

    fn list_holes(&self, solid: &SolidHandle) -> Vec<HoleFeature> {
        self.solids
            .get(&solid.id())
            .map(|s| s.holes.clone())
            .unwrap_or_default()
    }

    fn contains_solid(&self, solid: &SolidHandle) -> bool {
        self.solids.contains_key(&solid.id())
    }
}

/// Rotation taking +Z onto `direction` (a unit vector).
fn rotation_from_z(direction: &NaVector3<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::rotation_between(&NaVector3::z(), direction)
        .unwrap_or_else(|| UnitQuaternion::from_axis_angle(&NaVector3::x_axis(), PI))
}

/// nalgebra homogeneous matrix → truck (cgmath, column-major) matrix.
#[rustfmt::skip]
fn to_truck_matrix(transform: &RigidTransform) -> Matrix4 {
    let m = transform.to_homogeneous();
    Matrix4::new(
        m[(0, 0)], m[(1, 0)], m[(2, 0)], m[(3, 0)],
        m[(0, 1)], m[(1, 1)], m[(2, 1)], m[(3, 1)],
        m[(0, 2)], m[(1, 2)], m[(2, 2)], m[(3, 2)],
        m[(0, 3)], m[(1, 3)], m[(2, 3)], m[(3, 3)],
    )
}

/// Unique vertex positions over every shell.
fn solid_vertices(solid: &Solid) -> Vec<[f64; 3]> {
    let mut seen = HashSet::new();
    let mut points = Vec::new();
    for shell in solid.boundaries() {
        for v in shell.vertex_iter() {
            if seen.insert(v.id()) {
                let p = v.point();
                points.push([p[0], p[1], p[2]]);
            }
        }
    }
    points
}

fn solid_bbox(solid: &Solid) -> Option<BoundingBox> {
    BoundingBox::from_points(solid_vertices(solid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::AngleUnit;

    #[test]
    fn test_truck_box_bounding_box() {
        let mut kernel = TruckKernel::new();
        let b = kernel.make_box(2.0, 3.0, 4.0).unwrap();
        let bbox = kernel.bounding_box(&b).unwrap();
        assert_eq!(bbox.min, [0.0, 0.0, 0.0]);
        assert_eq!(bbox.max, [2.0, 3.0, 4.0]);
        assert_eq!(kernel.list_vertices(&b).len(), 8);
    }

    #[test]
    fn test_truck_transform_copy_moves_box() {
        let mut kernel = TruckKernel::new();
        let b = kernel.make_box(1.0, 2.0, 3.0).unwrap();
        let t = RigidTransform::translation([10.0, 0.0, 0.0])
            * RigidTransform::from_euler_zxz([90.0, 0.0, 0.0], AngleUnit::Degrees);

        let moved = kernel.transform(&b, &t, true).unwrap();
        let bbox = kernel.bounding_box(&moved).unwrap();
        assert!((bbox.min[0] - 8.0).abs() < 1e-9);
        assert!((bbox.max[0] - 10.0).abs() < 1e-9);
        assert!((bbox.max[2] - 3.0).abs() < 1e-9);

        // Source untouched.
        assert_eq!(kernel.bounding_box(&b).unwrap().max, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_truck_half_space_block_lies_on_reference_side() {
        let mut kernel = TruckKernel::new();
        let face = kernel.make_plane([0.0, 0.0, 160.0], [0.0, 0.0, 1.0]).unwrap();
        let below = kernel.make_half_space(&face, [0.0, 0.0, 0.0]).unwrap();

        assert!(kernel.bounding_box(&below).is_err());
        let vertices = kernel.list_vertices(&below);
        assert_eq!(vertices.len(), 8);
        for v in vertices {
            assert!(v[2] <= 160.0 + 1e-6, "vertex {:?} above the plane", v);
        }
    }

    #[test]
    fn test_truck_degenerate_inputs() {
        let mut kernel = TruckKernel::new();
        assert!(kernel.make_box(0.0, 1.0, 1.0).is_err());
        assert!(kernel.make_plane([0.0; 3], [0.0; 3]).is_err());
        let face = kernel.make_plane([0.0; 3], [0.0, 1.0, 0.0]).unwrap();
        assert!(kernel.make_half_space(&face, [5.0, 0.0, 5.0]).is_err());
    }

    #[test]
    fn test_truck_cut_drops_holes_in_the_removed_part() {
        let mut kernel = TruckKernel::new();
        let board = kernel.make_box(200.0, 100.0, 21.0).unwrap();
        let board = kernel
            .make_cylindrical_hole(&board, [50.0, 50.0, 0.0], [0.0, 0.0, 1.0], 5.0)
            .unwrap();
        let board = kernel
            .make_cylindrical_hole(&board, [150.0, 50.0, 0.0], [0.0, 0.0, 1.0], 5.0)
            .unwrap();
        assert_eq!(kernel.list_holes(&board).len(), 2);

        let face = kernel.make_plane([100.0, 0.0, 0.0], [1.0, 0.0, 0.0]).unwrap();
        let right = kernel.make_half_space(&face, [200.0, 50.0, 10.0]).unwrap();
        let left = kernel.cut(&board, &right).unwrap();

        let holes = kernel.list_holes(&left);
        assert_eq!(holes.len(), 1);
        assert_eq!(holes[0].origin, [50.0, 50.0, 0.0]);
    }
}
