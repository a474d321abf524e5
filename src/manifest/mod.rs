//! Manifest loading and caching
//!
//! A manifest is a file materialized into a [`Value`](crate::value::Value)
//! in one of two ways:
//!
//! | Strategy | Source | Result |
//! |----------|--------|--------|
//! | Parse | JSON, or TOML for `.toml` files | The parsed document |
//! | Evaluate | JavaScript | The root binding object of an isolated context |
//!
//! [`ManifestCache`] materializes each path once when caching is requested,
//! deep-freezes the result and hands out shared handles to it until the
//! path is explicitly evicted.

pub mod cache;
pub mod eval;
pub mod source;
pub mod store;

pub use cache::{CacheStats, ManifestCache};
pub use eval::{Evaluator, QuickJsEvaluator};
pub use source::{DocumentFormat, FsReader, SourceReader};
pub use store::{CacheEntry, EntryInfo, ManifestStore, Strategy};
