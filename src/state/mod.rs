pub mod device;
pub mod hierarchy;
pub mod packet;
pub mod project;

pub use device::*;
pub use hierarchy::*;
pub use packet::*;
pub use project::*;
