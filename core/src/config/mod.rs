mod system;

pub use crate::scf::ScfOptions;
pub use system::ConfigSystem;
