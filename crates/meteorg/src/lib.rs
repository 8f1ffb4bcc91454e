mod cache;
mod error;
pub mod routes;
pub mod secrets;
mod startup;
mod utils;

pub use cache::*;
pub use error::*;
pub use routes::*;
pub use startup::*;
pub use utils::*;
