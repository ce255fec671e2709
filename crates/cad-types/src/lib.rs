pub mod bounds;
pub mod format;
pub mod mesh;
pub mod result;
pub mod surface;

pub use bounds::*;
pub use format::*;
pub use mesh::*;
pub use result::*;
pub use surface::*;
