pub mod angle;
pub mod control;
pub mod energy;
pub mod stoch;

pub use angle::*;
pub use control::*;
pub use stoch::*;
