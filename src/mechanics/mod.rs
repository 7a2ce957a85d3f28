pub mod control;
pub mod pricing;
pub mod softcap;
pub mod stoch;

pub use control::*;
pub use pricing::*;
pub use softcap::*;
pub use stoch::*;
