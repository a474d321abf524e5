//! Deep freezing of manifest values
//!
//! [`freeze`] walks every container reachable from a value and marks it
//! immutable in place. Nothing is copied: handles held elsewhere observe the
//! frozen state too.
//!
//! Mutating a frozen container always fails with
//! [`GlacierError::MutationOnFrozenValue`](crate::error::GlacierError); it is
//! never silently ignored.

use crate::value::Value;
use std::collections::HashSet;

/// Recursively freeze `value` and every container reachable from it.
///
/// Scalars and `Null` return immediately. Freezing an already-frozen value is
/// a no-op. Each container is visited at most once per call, so cyclic graphs
/// terminate.
pub fn freeze(value: &Value) {
    let mut visited = HashSet::new();
    freeze_inner(value, &mut visited);
}

fn freeze_inner(value: &Value, visited: &mut HashSet<usize>) {
    match value {
        Value::Array(array) => {
            if !visited.insert(array.id()) {
                return;
            }
            for item in array.to_vec() {
                if item.is_container() {
                    freeze_inner(&item, visited);
                }
            }
            array.mark_frozen();
        }
        Value::Object(object) => {
            if !visited.insert(object.id()) {
                return;
            }
            for item in object.values() {
                if item.is_container() {
                    freeze_inner(&item, visited);
                }
            }
            object.mark_frozen();
        }
        _ => {}
    }
}
