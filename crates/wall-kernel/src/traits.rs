use crate::transform::RigidTransform;
use crate::types::*;

/// Core geometry kernel trait. Provides the solid construction and modification
/// operations the wall layout relies on.
/// Implemented by TruckKernel (wraps real truck) and MockKernel (exact convex test double).
pub trait Kernel {
    /// Axis-aligned box with one corner at the origin, extending to (dx, dy, dz).
    fn make_box(&mut self, dx: f64, dy: f64, dz: f64) -> Result<SolidHandle, KernelError>;

    /// Drill a cylindrical hole through the whole solid along the given axis.
    fn make_cylindrical_hole(
        &mut self,
        solid: &SolidHandle,
        axis_origin: [f64; 3],
        axis_direction: [f64; 3],
        radius: f64,
    ) -> Result<SolidHandle, KernelError>;

    /// Unbounded planar face through `point` with the given normal.
    fn make_plane(&mut self, point: [f64; 3], normal: [f64; 3])
        -> Result<FaceHandle, KernelError>;

    /// Half-space bounded by `face`, on the side containing `reference_point`.
    fn make_half_space(
        &mut self,
        face: &FaceHandle,
        reference_point: [f64; 3],
    ) -> Result<SolidHandle, KernelError>;

    /// Boolean subtraction: solid minus tool.
    fn cut(&mut self, solid: &SolidHandle, tool: &SolidHandle)
        -> Result<SolidHandle, KernelError>;

    /// Apply a rigid transform. With `copy` the input stays untouched and a new
    /// handle is returned; without it the stored solid is replaced in place.
    fn transform(
        &mut self,
        solid: &SolidHandle,
        transform: &RigidTransform,
        copy: bool,
    ) -> Result<SolidHandle, KernelError>;
}

/// Read-only queries on kernel geometry.
pub trait KernelIntrospect {
    /// Axis-aligned bounding box of a bounded solid.
    fn bounding_box(&self, solid: &SolidHandle) -> Result<BoundingBox, KernelError>;

    /// Corner points of the solid's boundary.
    fn list_vertices(&self, solid: &SolidHandle) -> Vec<[f64; 3]>;

    /// Holes drilled into the solid.
    fn list_holes(&self, solid: &SolidHandle) -> Vec<HoleFeature>;

    /// Whether the handle refers to a live solid in this kernel.
    fn contains_solid(&self, solid: &SolidHandle) -> bool;
}
