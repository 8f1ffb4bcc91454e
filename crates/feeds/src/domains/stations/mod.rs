pub mod agromet;
pub mod dmc;
pub mod reading;
pub mod reconcile;

pub use agromet::*;
pub use dmc::*;
pub use reading::*;
pub use reconcile::*;
