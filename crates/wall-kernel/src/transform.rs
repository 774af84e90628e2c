//! Rigid transforms (rotation + translation) and Z-X-Z Euler conversion.

use std::ops::Mul;

use nalgebra::{Isometry3, Matrix3, Matrix4, Point3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Below this |sin(beta)| the Z-X-Z decomposition is treated as gimbal-locked.
const GIMBAL_EPS: f64 = 1e-9;

/// Unit of Euler angle inputs and outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AngleUnit {
    #[default]
    Degrees,
    Radians,
}

impl AngleUnit {
    fn to_radians(self, angle: f64) -> f64 {
        match self {
            AngleUnit::Degrees => angle.to_radians(),
            AngleUnit::Radians => angle,
        }
    }

    fn from_radians(self, angle: f64) -> f64 {
        match self {
            AngleUnit::Degrees => angle.to_degrees(),
            AngleUnit::Radians => angle,
        }
    }
}

/// An immutable rotation followed by a translation.
///
/// `a.compose(&b)` (or `a * b`) applies `b` first, then `a`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    iso: Isometry3<f64>,
}

impl RigidTransform {
    pub fn identity() -> Self {
        Self {
            iso: Isometry3::identity(),
        }
    }

    /// Pure translation.
    pub fn translation(offset: [f64; 3]) -> Self {
        Self {
            iso: Isometry3::from_parts(
                Translation3::new(offset[0], offset[1], offset[2]),
                UnitQuaternion::identity(),
            ),
        }
    }

    /// Rotation from three Z-X-Z Euler angles.
    ///
    /// Applied to a point, the result rotates about Z by `angles[0]`, then
    /// about X by `angles[1]`, then about Z by `angles[2]`, i.e. the matrix is
    /// `Rz(angles[2]) * Rx(angles[1]) * Rz(angles[0])`.
    pub fn from_euler_zxz(angles: [f64; 3], unit: AngleUnit) -> Self {
        let [first, second, third] = angles.map(|a| unit.to_radians(a));
        let rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), third)
            * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), second)
            * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), first);
        Self {
            iso: Isometry3::from_parts(Translation3::identity(), rotation),
        }
    }

    /// `self ∘ other`: applies `other` first, then `self`.
    pub fn compose(&self, other: &RigidTransform) -> RigidTransform {
        RigidTransform {
            iso: self.iso * other.iso,
        }
    }

    pub fn inverse(&self) -> RigidTransform {
        RigidTransform {
            iso: self.iso.inverse(),
        }
    }

    pub fn apply_point(&self, p: [f64; 3]) -> [f64; 3] {
        let q = self.iso.transform_point(&Point3::new(p[0], p[1], p[2]));
        [q.x, q.y, q.z]
    }

    /// Rotate a direction (translation is ignored).
    pub fn apply_vector(&self, v: [f64; 3]) -> [f64; 3] {
        let w = self.iso.transform_vector(&Vector3::new(v[0], v[1], v[2]));
        [w.x, w.y, w.z]
    }

    /// Where the local origin ends up.
    pub fn translation_part(&self) -> [f64; 3] {
        let t = self.iso.translation.vector;
        [t.x, t.y, t.z]
    }

    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        *self.iso.rotation.to_rotation_matrix().matrix()
    }

    /// Decompose the rotation back into Z-X-Z angles accepted by
    /// [`RigidTransform::from_euler_zxz`].
    ///
    /// When the middle angle is 0 or 180 degrees only the sum of the outer
    /// angles is defined; the first angle is reported as 0 then.
    pub fn to_euler_zxz(&self, unit: AngleUnit) -> [f64; 3] {
        let m = self.rotation_matrix();
        let sin_beta = m[(0, 2)].hypot(m[(1, 2)]);
        let beta = sin_beta.atan2(m[(2, 2)]);
        let (alpha, gamma) = if sin_beta < GIMBAL_EPS {
            (m[(1, 0)].atan2(m[(0, 0)]), 0.0)
        } else {
            (m[(0, 2)].atan2(-m[(1, 2)]), m[(2, 0)].atan2(m[(2, 1)]))
        };
        [gamma, beta, alpha].map(|a| unit.from_radians(a))
    }

    /// Translations within `tol` and rotations within `tol` radians.
    pub fn approx_eq(&self, other: &RigidTransform, tol: f64) -> bool {
        let dt = (self.iso.translation.vector - other.iso.translation.vector).norm();
        dt <= tol && self.iso.rotation.angle_to(&other.iso.rotation) <= tol
    }

    pub fn to_homogeneous(&self) -> Matrix4<f64> {
        self.iso.to_homogeneous()
    }

    pub fn isometry(&self) -> &Isometry3<f64> {
        &self.iso
    }
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<Isometry3<f64>> for RigidTransform {
    fn from(iso: Isometry3<f64>) -> Self {
        Self { iso }
    }
}

impl Mul for RigidTransform {
    type Output = RigidTransform;

    fn mul(self, rhs: RigidTransform) -> RigidTransform {
        self.compose(&rhs)
    }
}
