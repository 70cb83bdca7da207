//! Domain types shared by the resize workflow crates.

pub mod domain;
pub mod error;

pub use domain::*;
pub use error::CoreError;
