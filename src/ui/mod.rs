//! Terminal output helpers
//!
//! Plain `[OK]`/`[FAIL]` prefixes when not attached to a terminal (CI,
//! pipes), colored symbols otherwise.

mod context;
mod output;

pub use context::UiContext;
pub use output::{key_value, step_error_detail, step_ok, step_ok_detail, step_warn_hint};
