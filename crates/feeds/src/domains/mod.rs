pub mod firms;
pub mod stations;

pub use firms::*;
pub use stations::*;
