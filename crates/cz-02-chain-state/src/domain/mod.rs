pub mod config;
pub mod errors;
pub mod objects;

pub use config::*;
pub use errors::*;
pub use objects::*;
