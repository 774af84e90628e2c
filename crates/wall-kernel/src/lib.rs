pub mod mock_kernel;
pub mod primitives;
pub mod traits;
pub mod transform;
pub mod truck_kernel;
pub mod types;

pub use mock_kernel::MockKernel;
pub use traits::*;
pub use transform::{AngleUnit, RigidTransform};
pub use truck_kernel::TruckKernel;
pub use types::*;
