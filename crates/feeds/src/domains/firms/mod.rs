pub mod hotspots;

pub use hotspots::*;
