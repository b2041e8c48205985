pub mod chi;
pub mod config;
pub mod error;
pub mod ionic;
pub mod occupation;
pub mod scf;
