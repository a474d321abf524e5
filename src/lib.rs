//! Glacier - load-once, deep-frozen manifest cache
//!
//! Materializes manifests from disk (parsed JSON/TOML or evaluated
//! JavaScript), caches each path once, and deep-freezes cached values so no
//! caller can change what another caller observes.

pub mod cli;
pub mod config;
pub mod error;
pub mod freeze;
pub mod manifest;
pub mod ui;
pub mod value;

pub use error::{GlacierError, GlacierResult};
pub use freeze::freeze;
pub use manifest::ManifestCache;
pub use value::{Array, Object, Value};
