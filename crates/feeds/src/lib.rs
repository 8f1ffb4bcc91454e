mod domains;
mod error;
mod fetcher;
pub mod geojson;
pub mod normalize;
mod service;

#[cfg(test)]
mod fixtures;

pub use domains::*;
pub use error::*;
pub use fetcher::*;
pub use geojson::*;
pub use service::*;
