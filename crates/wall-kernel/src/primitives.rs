//! Solid builders on top of truck's sweep API.

use std::f64::consts::PI;
use truck_modeling::builder;
use truck_modeling::topology::Solid;
use truck_modeling::{Point3, Rad, Vector3};

use crate::types::KernelError;

/// Box from the origin to (dx, dy, dz): vertex → edge → face → solid.
pub fn make_box(dx: f64, dy: f64, dz: f64) -> Solid {
    let corner = builder::vertex(Point3::new(0.0, 0.0, 0.0));
    let edge = builder::tsweep(&corner, Vector3::new(dx, 0.0, 0.0));
    let face = builder::tsweep(&edge, Vector3::new(0.0, dy, 0.0));
    builder::tsweep(&face, Vector3::new(0.0, 0.0, dz))
}

/// Drill body: a cylinder on the Z axis spanning `-length / 2 ..= length / 2`.
pub fn make_drill(radius: f64, length: f64) -> Result<Solid, KernelError> {
    let half = length / 2.0;
    let rim = builder::vertex(Point3::new(radius, 0.0, -half));
    let circle = builder::rsweep(
        &rim,
        Point3::new(0.0, 0.0, -half),
        Vector3::unit_z(),
        Rad(2.0 * PI),
    );
    let disc = builder::try_attach_plane(&[circle]).map_err(|e| KernelError::FeatureFailed {
        reason: format!("cannot cap drill circle: {e}"),
    })?;
    Ok(builder::tsweep(&disc, Vector3::new(0.0, 0.0, length)))
}
