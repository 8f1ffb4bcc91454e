pub mod feed_routes;
pub mod health;

pub use feed_routes::*;
pub use health::*;
