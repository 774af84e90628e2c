//! MockKernel: deterministic test double implementing Kernel + KernelIntrospect.
//!
//! Every solid is a convex intersection of half-spaces (boxes and their planar
//! trims), so vertices and bounding boxes are exact. Drilled holes are recorded
//! as features on the solid rather than subtracted from it.
//! Used by wall-assembly for unit testing and fast previews.

use std::collections::HashMap;

use nalgebra::{Matrix3, Point3, Vector3};
use tracing::{debug, instrument};

use crate::traits::{Kernel, KernelIntrospect};
use crate::transform::RigidTransform;
use crate::types::*;

/// Points closer than this to a plane lie on it.
const PLANE_TOLERANCE: f64 = 1e-6;

/// Smallest triple product (mm³) that still counts as a solid.
const VOLUME_TOLERANCE: f64 = 1e-6;

/// The closed region `normal · x <= offset`, with a unit normal.
#[derive(Debug, Clone, Copy)]
struct HalfPlane {
    normal: Vector3<f64>,
    offset: f64,
}

impl HalfPlane {
    fn signed_distance(&self, p: &Point3<f64>) -> f64 {
        self.normal.dot(&p.coords) - self.offset
    }

    fn contains(&self, p: &Point3<f64>) -> bool {
        self.signed_distance(p) <= PLANE_TOLERANCE
    }

    fn complement(&self) -> HalfPlane {
        HalfPlane {
            normal: -self.normal,
            offset: -self.offset,
        }
    }

    fn transformed(&self, transform: &RigidTransform) -> HalfPlane {
        let iso = transform.isometry();
        let normal = iso.rotation * self.normal;
        HalfPlane {
            normal,
            offset: self.offset + normal.dot(&iso.translation.vector),
        }
    }
}

/// A convex solid. Unbounded solids (half-spaces) have no vertices.
#[derive(Debug, Clone)]
struct MockSolid {
    planes: Vec<HalfPlane>,
    vertices: Vec<Point3<f64>>,
    holes: Vec<HoleFeature>,
}

impl MockSolid {
    fn from_planes(planes: Vec<HalfPlane>, holes: Vec<HoleFeature>) -> Self {
        let vertices = enumerate_vertices(&planes);
        Self {
            planes,
            vertices,
            holes,
        }
    }

    fn is_bounded(&self) -> bool {
        !self.vertices.is_empty()
    }
}

/// Deterministic geometry kernel for convex solids.
pub struct MockKernel {
    next_handle: u64,
    solids: HashMap<u64, MockSolid>,
    faces: HashMap<u64, Plane>,
}

impl MockKernel {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            solids: HashMap::new(),
            faces: HashMap::new(),
        }
    }

    /// Number of solids currently stored.
    pub fn solid_count(&self) -> usize {
        self.solids.len()
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_handle;
        self.next_handle += 1;
        id
    }

    fn store_solid(&mut self, solid: MockSolid) -> SolidHandle {
        let handle = SolidHandle(self.alloc_id());
        self.solids.insert(handle.id(), solid);
        handle
    }

    fn get_solid(&self, handle: &SolidHandle) -> Result<&MockSolid, KernelError> {
        self.solids
            .get(&handle.id())
            .ok_or(KernelError::EntityNotFound { id: handle.id() })
    }
}

impl Default for MockKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel for MockKernel {
    #[instrument(skip(self))]
    fn make_box(&mut self, dx: f64, dy: f64, dz: f64) -> Result<SolidHandle, KernelError> {
        if ![dx, dy, dz].iter().all(|d| d.is_finite() && *d > 0.0) {
            return Err(KernelError::DegenerateGeometry {
                reason: format!("box dimensions must be positive, got {dx} x {dy} x {dz}"),
            });
        }
        let axis = |x: f64, y: f64, z: f64, offset: f64| HalfPlane {
            normal: Vector3::new(x, y, z),
            offset,
        };
        let planes = vec![
            axis(-1.0, 0.0, 0.0, 0.0),
            axis(1.0, 0.0, 0.0, dx),
            axis(0.0, -1.0, 0.0, 0.0),
            axis(0.0, 1.0, 0.0, dy),
            axis(0.0, 0.0, -1.0, 0.0),
            axis(0.0, 0.0, 1.0, dz),
        ];
        let handle = self.store_solid(MockSolid::from_planes(planes, Vec::new()));
        debug!(?handle, dx, dy, dz, "mock box created");
        Ok(handle)
    }

    fn make_cylindrical_hole(
        &mut self,
        solid: &SolidHandle,
        axis_origin: [f64; 3],
        axis_direction: [f64; 3],
        radius: f64,
    ) -> Result<SolidHandle, KernelError> {
        let base = self.get_solid(solid)?;
        if !base.is_bounded() {
            return Err(KernelError::NotSupported {
                operation: "hole in an unbounded solid".to_string(),
            });
        }
        if !(radius.is_finite() && radius > 0.0) {
            return Err(KernelError::FeatureFailed {
                reason: format!("hole radius must be positive, got {radius}"),
            });
        }
        let direction = unit_vector(axis_direction).ok_or_else(|| KernelError::FeatureFailed {
            reason: "hole axis has zero length".to_string(),
        })?;
        let origin = Point3::new(axis_origin[0], axis_origin[1], axis_origin[2]);
        if !axis_passes_through(&base.planes, &origin, &direction) {
            return Err(KernelError::FeatureFailed {
                reason: format!("hole axis through {axis_origin:?} misses the solid"),
            });
        }

        let mut drilled = base.clone();
        drilled.holes.push(HoleFeature {
            origin: axis_origin,
            direction: [direction.x, direction.y, direction.z],
            radius,
        });
        Ok(self.store_solid(drilled))
    }

    fn make_plane(
        &mut self,
        point: [f64; 3],
        normal: [f64; 3],
    ) -> Result<FaceHandle, KernelError> {
        let n = unit_vector(normal).ok_or_else(|| KernelError::DegenerateGeometry {
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
        let normal = Vector3::from(plane.normal);
        let offset = normal.dot(&Vector3::from(plane.point));
        let side = normal.dot(&Vector3::from(reference_point)) - offset;
        if side.abs() <= PLANE_TOLERANCE {
            return Err(KernelError::DegenerateGeometry {
                reason: "half-space reference point lies on its plane".to_string(),
            });
        }
        let bound = HalfPlane { normal, offset };
        let kept = if side < 0.0 { bound } else { bound.complement() };
        Ok(self.store_solid(MockSolid {
            planes: vec![kept],
            vertices: Vec::new(),
            holes: Vec::new(),
        }))
    }

    fn cut(
        &mut self,
        solid: &SolidHandle,
        tool: &SolidHandle,
    ) -> Result<SolidHandle, KernelError> {
        let target = self.get_solid(solid)?;
        let cutter = self.get_solid(tool)?;
        if !target.is_bounded() {
            return Err(KernelError::NotSupported {
                operation: "cut of an unbounded solid".to_string(),
            });
        }
        if cutter.is_bounded() || cutter.planes.len() != 1 {
            return Err(KernelError::NotSupported {
                operation: "cut by a bounded tool".to_string(),
            });
        }

        let keep = cutter.planes[0].complement();
        if target.vertices.iter().all(|v| keep.contains(v)) {
            let untouched = target.clone();
            return Ok(self.store_solid(untouched));
        }

        let mut planes = target.planes.clone();
        planes.push(keep);
        let holes = target
            .holes
            .iter()
            .filter(|h| {
                axis_passes_through(
                    &planes,
                    &Point3::from(h.origin),
                    &Vector3::from(h.direction),
                )
            })
            .copied()
            .collect();
        let result = MockSolid::from_planes(planes, holes);
        if !has_volume(&result.vertices) {
            return Err(KernelError::BooleanFailed {
                reason: "cut removed the whole solid".to_string(),
            });
        }
        let handle = self.store_solid(result);
        debug!(?solid, ?tool, ?handle, "mock cut");
        Ok(handle)
    }

    fn transform(
        &mut self,
        solid: &SolidHandle,
        transform: &RigidTransform,
        copy: bool,
    ) -> Result<SolidHandle, KernelError> {
        let source = self.get_solid(solid)?;
        let iso = transform.isometry();
        let moved = MockSolid {
            planes: source.planes.iter().map(|p| p.transformed(transform)).collect(),
            vertices: source
                .vertices
                .iter()
                .map(|v| iso.transform_point(v))
                .collect(),
            holes: source
                .holes
                .iter()
                .map(|h| HoleFeature {
                    origin: transform.apply_point(h.origin),
                    direction: transform.apply_vector(h.direction),
                    radius: h.radius,
                })
                .collect(),
        };
        if copy {
            Ok(self.store_solid(moved))
        } else {
            self.solids.insert(solid.id(), moved);
            Ok(solid.clone())
        }
    }
}

impl KernelIntrospect for MockKernel {
    fn bounding_box(&self, solid: &SolidHandle) -> Result<BoundingBox, KernelError> {
        let s = self.get_solid(solid)?;
        BoundingBox::from_points(s.vertices.iter().map(|v| [v.x, v.y, v.z])).ok_or_else(|| {
            KernelError::DegenerateGeometry {
                reason: "unbounded solid has no bounding box".to_string(),
            }
        })
    }

    fn list_vertices(&self, solid: &SolidHandle) -> Vec<[f64; 3]> {
        self.solids
            .get(&solid.id())
            .map(|s| s.vertices.iter().map(|v| [v.x, v.y, v.z]).collect())
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

fn unit_vector(v: [f64; 3]) -> Option<Vector3<f64>> {
    let v = Vector3::from(v);
    let len = v.norm();
    if len < 1e-12 || !len.is_finite() {
        None
    } else {
        Some(v / len)
    }
}

/// Corners of a convex polytope: every point where three planes meet that
/// lies inside all of them.
fn enumerate_vertices(planes: &[HalfPlane]) -> Vec<Point3<f64>> {
    let mut out: Vec<Point3<f64>> = Vec::new();
    let n = planes.len();
    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                let (a, b, c) = (&planes[i], &planes[j], &planes[k]);
                let m = Matrix3::from_rows(&[
                    a.normal.transpose(),
                    b.normal.transpose(),
                    c.normal.transpose(),
                ]);
                if m.determinant().abs() < 1e-12 {
                    continue;
                }
                let Some(inv) = m.try_inverse() else {
                    continue;
                };
                let p = Point3::from(inv * Vector3::new(a.offset, b.offset, c.offset));
                let inside = planes.iter().all(|pl| pl.contains(&p));
                let duplicate = out
                    .iter()
                    .any(|q| nalgebra::distance(q, &p) < PLANE_TOLERANCE);
                if inside && !duplicate {
                    out.push(p);
                }
            }
        }
    }
    out
}

/// True if some four vertices span a tetrahedron of non-zero volume.
fn has_volume(vertices: &[Point3<f64>]) -> bool {
    let Some((p0, rest)) = vertices.split_first() else {
        return false;
    };
    let edges: Vec<Vector3<f64>> = rest.iter().map(|p| p - p0).collect();
    for (i, a) in edges.iter().enumerate() {
        for (j, b) in edges.iter().enumerate().skip(i + 1) {
            let ab = a.cross(b);
            if edges.iter().skip(j + 1).any(|c| ab.dot(c).abs() > VOLUME_TOLERANCE) {
                return true;
            }
        }
    }
    false
}

/// Whether the line `origin + t * direction` crosses the polytope over a
/// segment of non-zero length.
fn axis_passes_through(
    planes: &[HalfPlane],
    origin: &Point3<f64>,
    direction: &Vector3<f64>,
) -> bool {
    let mut lo = f64::NEG_INFINITY;
    let mut hi = f64::INFINITY;
    for plane in planes {
        let along = plane.normal.dot(direction);
        let dist = plane.signed_distance(origin);
        if along.abs() < 1e-12 {
            if dist > PLANE_TOLERANCE {
                return false;
            }
            continue;
        }
        let t = -dist / along;
        if along > 0.0 {
            hi = hi.min(t);
        } else {
            lo = lo.max(t);
        }
    }
    hi - lo > PLANE_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::AngleUnit;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn box_has_eight_exact_corners() {
        let mut kernel = MockKernel::new();
        let b = kernel.make_box(2.0, 3.0, 4.0).unwrap();

        assert_eq!(kernel.list_vertices(&b).len(), 8);
        let bbox = kernel.bounding_box(&b).unwrap();
        assert_eq!(bbox.min, [0.0, 0.0, 0.0]);
        assert_eq!(bbox.max, [2.0, 3.0, 4.0]);
    }

    #[test]
    fn box_rejects_zero_dimension() {
        let mut kernel = MockKernel::new();
        let err = kernel.make_box(1.0, 0.0, 1.0).unwrap_err();
        assert!(matches!(err, KernelError::DegenerateGeometry { .. }));
    }

    #[test]
    fn cut_by_half_space_keeps_far_side() {
        let mut kernel = MockKernel::new();
        let b = kernel.make_box(10.0, 10.0, 10.0).unwrap();
        let face = kernel.make_plane([0.0, 0.0, 4.0], [0.0, 0.0, 1.0]).unwrap();
        // Reference below the plane: the tool is the lower region.
        let tool = kernel.make_half_space(&face, [0.0, 0.0, 0.0]).unwrap();

        let trimmed = kernel.cut(&b, &tool).unwrap();
        let bbox = kernel.bounding_box(&trimmed).unwrap();
        assert!(approx(bbox.min[2], 4.0));
        assert!(approx(bbox.max[2], 10.0));
        assert_eq!(kernel.list_vertices(&trimmed).len(), 8);
    }

    #[test]
    fn cut_with_tool_above_keeps_lower_part() {
        let mut kernel = MockKernel::new();
        let b = kernel.make_box(10.0, 10.0, 10.0).unwrap();
        let face = kernel.make_plane([0.0, 0.0, 4.0], [0.0, 0.0, 1.0]).unwrap();
        let tool = kernel.make_half_space(&face, [0.0, 0.0, 9.0]).unwrap();

        let trimmed = kernel.cut(&b, &tool).unwrap();
        let bbox = kernel.bounding_box(&trimmed).unwrap();
        assert!(approx(bbox.min[2], 0.0));
        assert!(approx(bbox.max[2], 4.0));
    }

    #[test]
    fn oblique_cut_produces_wedge() {
        let mut kernel = MockKernel::new();
        let b = kernel.make_box(10.0, 10.0, 10.0).unwrap();
        let face = kernel.make_plane([5.0, 0.0, 5.0], [1.0, 0.0, 1.0]).unwrap();
        let tool = kernel.make_half_space(&face, [10.0, 0.0, 10.0]).unwrap();

        let wedge = kernel.cut(&b, &tool).unwrap();
        // Corner (10, y, 10) is gone, the x + z = 10 diagonal is the new face.
        assert_eq!(kernel.list_vertices(&wedge).len(), 6);
        for v in kernel.list_vertices(&wedge) {
            assert!(v[0] + v[2] <= 10.0 + 1e-6);
        }
    }

    #[test]
    fn cut_missing_the_solid_leaves_it_unchanged() {
        let mut kernel = MockKernel::new();
        let b = kernel.make_box(1.0, 1.0, 1.0).unwrap();
        let face = kernel.make_plane([0.0, -5.0, 0.0], [0.0, 1.0, 0.0]).unwrap();
        let tool = kernel.make_half_space(&face, [0.0, -6.0, 0.0]).unwrap();

        let same = kernel.cut(&b, &tool).unwrap();
        assert_eq!(
            kernel.bounding_box(&same).unwrap(),
            kernel.bounding_box(&b).unwrap()
        );
    }

    #[test]
    fn cut_removing_everything_fails() {
        let mut kernel = MockKernel::new();
        let b = kernel.make_box(1.0, 1.0, 1.0).unwrap();
        let face = kernel.make_plane([0.0, 0.0, 5.0], [0.0, 0.0, 1.0]).unwrap();
        let tool = kernel.make_half_space(&face, [0.0, 0.0, 0.0]).unwrap();

        let err = kernel.cut(&b, &tool).unwrap_err();
        assert!(matches!(err, KernelError::BooleanFailed { .. }));
    }

    #[test]
    fn cut_by_bounded_tool_is_not_supported() {
        let mut kernel = MockKernel::new();
        let a = kernel.make_box(1.0, 1.0, 1.0).unwrap();
        let b = kernel.make_box(1.0, 1.0, 1.0).unwrap();
        let err = kernel.cut(&a, &b).unwrap_err();
        assert!(matches!(err, KernelError::NotSupported { .. }));
    }

    #[test]
    fn half_space_needs_off_plane_reference() {
        let mut kernel = MockKernel::new();
        let face = kernel.make_plane([0.0, 0.0, 1.0], [0.0, 0.0, 1.0]).unwrap();
        let err = kernel.make_half_space(&face, [3.0, 3.0, 1.0]).unwrap_err();
        assert!(matches!(err, KernelError::DegenerateGeometry { .. }));
        assert!(kernel.make_plane([0.0; 3], [0.0; 3]).is_err());
    }

    #[test]
    fn half_space_has_no_bounding_box() {
        let mut kernel = MockKernel::new();
        let face = kernel.make_plane([0.0; 3], [1.0, 0.0, 0.0]).unwrap();
        let hs = kernel.make_half_space(&face, [-1.0, 0.0, 0.0]).unwrap();
        assert!(kernel.bounding_box(&hs).is_err());
        assert!(kernel.list_vertices(&hs).is_empty());
    }

    #[test]
    fn hole_is_recorded_on_a_new_solid() {
        let mut kernel = MockKernel::new();
        let plate = kernel.make_box(100.0, 50.0, 5.0).unwrap();
        let drilled = kernel
            .make_cylindrical_hole(&plate, [20.0, 10.0, 0.0], [0.0, 0.0, 2.0], 3.0)
            .unwrap();

        assert!(kernel.list_holes(&plate).is_empty());
        let holes = kernel.list_holes(&drilled);
        assert_eq!(holes.len(), 1);
        assert_eq!(holes[0].direction, [0.0, 0.0, 1.0]);
        assert_eq!(holes[0].radius, 3.0);
    }

    #[test]
    fn hole_outside_the_solid_fails() {
        let mut kernel = MockKernel::new();
        let plate = kernel.make_box(100.0, 50.0, 5.0).unwrap();
        let err = kernel
            .make_cylindrical_hole(&plate, [200.0, 10.0, 0.0], [0.0, 0.0, 1.0], 3.0)
            .unwrap_err();
        assert!(matches!(err, KernelError::FeatureFailed { .. }));
    }

    #[test]
    fn transform_copy_keeps_the_source() {
        let mut kernel = MockKernel::new();
        let b = kernel.make_box(1.0, 2.0, 3.0).unwrap();
        let t = RigidTransform::translation([10.0, 0.0, 0.0])
            * RigidTransform::from_euler_zxz([90.0, 0.0, 0.0], AngleUnit::Degrees);

        let moved = kernel.transform(&b, &t, true).unwrap();
        assert_ne!(moved, b);
        assert_eq!(kernel.bounding_box(&b).unwrap().max, [1.0, 2.0, 3.0]);

        let bbox = kernel.bounding_box(&moved).unwrap();
        assert!(approx(bbox.min[0], 8.0));
        assert!(approx(bbox.max[0], 10.0));
        assert!(approx(bbox.min[1], 0.0));
        assert!(approx(bbox.max[1], 1.0));
    }

    #[test]
    fn transform_in_place_reuses_the_handle() {
        let mut kernel = MockKernel::new();
        let b = kernel.make_box(1.0, 1.0, 1.0).unwrap();
        let count = kernel.solid_count();

        let same = kernel
            .transform(&b, &RigidTransform::translation([0.0, 0.0, 5.0]), false)
            .unwrap();
        assert_eq!(same, b);
        assert_eq!(kernel.solid_count(), count);
        assert!(approx(kernel.bounding_box(&b).unwrap().min[2], 5.0));
    }

    #[test]
    fn transformed_solid_can_still_be_cut() {
        let mut kernel = MockKernel::new();
        let b = kernel.make_box(10.0, 10.0, 10.0).unwrap();
        let t = RigidTransform::from_euler_zxz([0.0, 90.0, 0.0], AngleUnit::Degrees);
        let moved = kernel.transform(&b, &t, true).unwrap();
        // After Rx(90) the box spans z in [0, 10], y in [-10, 0].
        let face = kernel.make_plane([0.0, -5.0, 0.0], [0.0, 1.0, 0.0]).unwrap();
        let tool = kernel.make_half_space(&face, [0.0, -6.0, 0.0]).unwrap();

        let trimmed = kernel.cut(&moved, &tool).unwrap();
        let bbox = kernel.bounding_box(&trimmed).unwrap();
        assert!(approx(bbox.min[1], -5.0));
        assert!(approx(bbox.max[1], 0.0));
    }

    #[test]
    fn unknown_handle_is_reported() {
        let kernel = MockKernel::new();
        let err = kernel.bounding_box(&SolidHandle(99)).unwrap_err();
        assert!(matches!(err, KernelError::EntityNotFound { id: 99 }));
        assert!(!kernel.contains_solid(&SolidHandle(99)));
    }
}
