//! Procedural geometry of a free-standing, overhanging climbing wall.
//!
//! [`climbing_wall`] turns a handful of [`WallParams`] into bars and drilled
//! panels, each placed relative to a parent part through any kernel that
//! implements [`wall_kernel::Kernel`] and [`wall_kernel::KernelIntrospect`].

pub mod bar;
pub mod config;
pub mod drill;
pub mod error;
pub mod kernel_ext;
pub mod layout;
pub mod panel;
pub mod part;
pub mod report;
pub mod trim;

pub use bar::Bar;
pub use config::{HolePattern, Section, WallParams};
pub use drill::{drill_holes, hole_centers};
pub use error::{Result, WallError};
pub use kernel_ext::KernelBundle;
pub use layout::{climbing_wall, ClimbingWall, PART_COUNT};
pub use panel::Panel;
pub use part::{Assembly, Part, PartId, PartKind, PartShape, Pose};
pub use report::{MaterialLine, PartReport};
pub use trim::{trim_diagonals, TrimPlanes};
