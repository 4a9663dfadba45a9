pub mod json;
pub mod log;

pub use json::*;
pub use log::*;
