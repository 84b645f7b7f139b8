//! Configuration module.

mod credentials;
mod loader;
mod types;

pub use credentials::*;
pub use loader::*;
pub use types::*;
