pub mod classify;
pub mod iges;
pub mod mock_kernel;
pub mod primitives;
pub mod step_entities;
pub mod step_export;
pub mod tessellation;
pub mod traits;
pub mod truck_kernel;
pub mod types;

pub use mock_kernel::MockKernel;
pub use tessellation::{assemble, tessellate, LINEAR_DEFLECTION};
pub use traits::*;
pub use truck_kernel::TruckKernel;
pub use types::*;
