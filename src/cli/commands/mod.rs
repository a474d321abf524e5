//! CLI command implementations

pub mod config;
pub mod manifest;

pub use config::execute as config;
pub use manifest::{eval, load};
