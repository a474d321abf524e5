//! Dynamic manifest values
//!
//! A [`Value`] is the in-memory form of a loaded manifest. Scalars are plain
//! owned data. Arrays and objects are shared handles: cloning an [`Array`] or
//! [`Object`] clones the handle, not the contents, so two handles can point at
//! the same container and graphs (including cycles) can be built.
//!
//! Every container carries a frozen flag. Once set (see [`crate::freeze`]),
//! all mutating methods return [`GlacierError::MutationOnFrozenValue`] and
//! leave the container untouched. Reads are never affected.

use crate::error::{GlacierError, GlacierResult};
use parking_lot::{RwLock, RwLockWriteGuard};
use serde::{Serialize, Serializer};
use serde_json::Number;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A manifest value
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Array),
    Object(Object),
}

/// Shared storage behind an [`Array`] or [`Object`] handle
struct Container<T> {
    frozen: AtomicBool,
    items: RwLock<T>,
}

impl<T> Container<T> {
    fn new(items: T) -> Self {
        Self {
            frozen: AtomicBool::new(false),
            items: RwLock::new(items),
        }
    }

    fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    /// Take the write lock, refusing if the container is frozen.
    ///
    /// The flag is checked under the lock so a concurrent freeze cannot slip
    /// in between the check and the write.
    fn write(&self, kind: &'static str) -> GlacierResult<RwLockWriteGuard<'_, T>> {
        let guard = self.items.write();
        if self.is_frozen() {
            return Err(GlacierError::frozen(kind));
        }
        Ok(guard)
    }

    fn mark_frozen(&self) {
        let _guard = self.items.write();
        self.frozen.store(true, Ordering::Release);
    }
}

/// Ordered container handle
#[derive(Clone)]
pub struct Array(Arc<Container<Vec<Value>>>);

/// Keyed container handle
#[derive(Clone)]
pub struct Object(Arc<Container<BTreeMap<String, Value>>>);

impl Array {
    /// Create an empty, mutable array
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Wrap existing elements in a new, mutable array
    pub fn from_vec(items: Vec<Value>) -> Self {
        Self(Arc::new(Container::new(items)))
    }

    pub fn len(&self) -> usize {
        self.0.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.items.read().is_empty()
    }

    /// Element at `index` (a handle clone for containers)
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.items.read().get(index).cloned()
    }

    /// Snapshot of the elements
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.items.read().clone()
    }

    pub fn push(&self, value: impl Into<Value>) -> GlacierResult<()> {
        self.0.write("array")?.push(value.into());
        Ok(())
    }

    /// Replace the element at `index`, returning the previous one.
    ///
    /// Out-of-range indexes leave the array unchanged and return `Ok(None)`.
    pub fn set(&self, index: usize, value: impl Into<Value>) -> GlacierResult<Option<Value>> {
        let mut items = self.0.write("array")?;
        Ok(items
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, value.into())))
    }

    /// Remove the element at `index`, shifting later elements down
    pub fn remove(&self, index: usize) -> GlacierResult<Option<Value>> {
        let mut items = self.0.write("array")?;
        if index < items.len() {
            Ok(Some(items.remove(index)))
        } else {
            Ok(None)
        }
    }

    pub fn pop(&self) -> GlacierResult<Option<Value>> {
        Ok(self.0.write("array")?.pop())
    }

    pub fn is_frozen(&self) -> bool {
        self.0.is_frozen()
    }

    /// Whether both handles point at the same container
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    pub(crate) fn mark_frozen(&self) {
        self.0.mark_frozen();
    }
}

impl Default for Array {
    fn default() -> Self {
        Self::new()
    }
}

impl Object {
    /// Create an empty, mutable object
    pub fn new() -> Self {
        Self::from_map(BTreeMap::new())
    }

    /// Wrap existing entries in a new, mutable object
    pub fn from_map(entries: BTreeMap<String, Value>) -> Self {
        Self(Arc::new(Container::new(entries)))
    }

    pub fn len(&self) -> usize {
        self.0.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.items.read().is_empty()
    }

    /// Value stored under `key` (a handle clone for containers)
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.items.read().get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.items.read().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.items.read().keys().cloned().collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.0.items.read().values().cloned().collect()
    }

    /// Snapshot of the entries in key order
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .items
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Add or replace `key`, returning the previous value
    pub fn insert(
        &self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> GlacierResult<Option<Value>> {
        Ok(self.0.write("object")?.insert(key.into(), value.into()))
    }

    pub fn remove(&self, key: &str) -> GlacierResult<Option<Value>> {
        Ok(self.0.write("object")?.remove(key))
    }

    pub fn is_frozen(&self) -> bool {
        self.0.is_frozen()
    }

    /// Whether both handles point at the same container
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    pub(crate) fn mark_frozen(&self) {
        self.0.mark_frozen();
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether this value is an array or object
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Array(_) | Self::Object(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Look up `key` when this value is an object
    pub fn get(&self, key: &str) -> Option<Value> {
        self.as_object().and_then(|o| o.get(key))
    }

    /// Look up `index` when this value is an array
    pub fn get_index(&self, index: usize) -> Option<Value> {
        self.as_array().and_then(|a| a.get(index))
    }

    /// Resolve an RFC 6901 JSON pointer such as `/x/2/y`
    pub fn pointer(&self, pointer: &str) -> Option<Value> {
        if pointer.is_empty() {
            return Some(self.clone());
        }
        let rest = pointer.strip_prefix('/')?;
        let mut current = self.clone();
        for token in rest.split('/') {
            let token = token.replace("~1", "/").replace("~0", "~");
            current = match &current {
                Self::Object(o) => o.get(&token)?,
                Self::Array(a) => a.get(token.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Whether the value rejects structural mutation.
    ///
    /// Scalars have no structure to mutate and always report `true`.
    pub fn is_frozen(&self) -> bool {
        match self {
            Self::Array(a) => a.is_frozen(),
            Self::Object(o) => o.is_frozen(),
            _ => true,
        }
    }

    /// Reference identity. Only containers have identity; scalars never match.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Array(a), Self::Array(b)) => a.ptr_eq(b),
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Convert to a detached `serde_json::Value`.
    ///
    /// A container reached again through its own descendants is rendered as
    /// `null` at the point of re-entry.
    pub fn to_json(&self) -> serde_json::Value {
        let mut ancestors = HashSet::new();
        self.to_json_inner(&mut ancestors)
    }

    fn to_json_inner(&self, ancestors: &mut HashSet<usize>) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => serde_json::Value::Number(n.clone()),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Array(a) => {
                if !ancestors.insert(a.id()) {
                    return serde_json::Value::Null;
                }
                let items = a
                    .to_vec()
                    .iter()
                    .map(|v| v.to_json_inner(ancestors))
                    .collect();
                ancestors.remove(&a.id());
                serde_json::Value::Array(items)
            }
            Self::Object(o) => {
                if !ancestors.insert(o.id()) {
                    return serde_json::Value::Null;
                }
                let map = o
                    .entries()
                    .into_iter()
                    .map(|(k, v)| (k, v.to_json_inner(ancestors)))
                    .collect();
                ancestors.remove(&o.id());
                serde_json::Value::Object(map)
            }
        }
    }
}

/// Structural equality.
///
/// Handles to the same container are equal without inspecting contents.
/// Comparing two distinct cyclic graphs does not terminate.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a.ptr_eq(b) || a.to_vec() == b.to_vec(),
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b) || a.entries() == b.entries(),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_container() && self.is_frozen() {
            write!(f, "Frozen({})", self.to_json())
        } else {
            write!(f, "{}", self.to_json())
        }
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&Value::Array(self.clone()), f)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&Value::Object(self.clone()), f)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Array(Array::from_vec(items.into_iter().map(Value::from).collect()))
            }
            serde_json::Value::Object(map) => Self::Object(Object::from_map(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            )),
        }
    }
}

impl From<toml::Value> for Value {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Self::String(s),
            toml::Value::Integer(i) => Self::Number(i.into()),
            toml::Value::Float(f) => f.into(),
            toml::Value::Boolean(b) => Self::Bool(b),
            toml::Value::Datetime(dt) => Self::String(dt.to_string()),
            toml::Value::Array(items) => {
                Self::Array(Array::from_vec(items.into_iter().map(Value::from).collect()))
            }
            toml::Value::Table(table) => Self::Object(Object::from_map(
                table.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            )),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Number(i.into())
    }
}

/// Non-finite floats have no JSON form and become `Null`
impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Number::from_f64(f).map_or(Self::Null, Self::Number)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Self::Array(a)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Self::Object(o)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn handles_share_containers() {
        let obj = Object::new();
        let alias = obj.clone();
        alias.insert("name", "glacier").unwrap();

        assert_eq!(obj.get("name").unwrap().as_str(), Some("glacier"));
        assert!(obj.ptr_eq(&alias));
        assert!(!obj.ptr_eq(&Object::new()));
    }

    #[test]
    fn array_mutation() {
        let arr = Array::new();
        arr.push(1i64).unwrap();
        arr.push("two").unwrap();
        assert_eq!(arr.len(), 2);

        let old = arr.set(0, 10i64).unwrap();
        assert_eq!(old.and_then(|v| v.as_i64()), Some(1));
        assert!(arr.set(9, 0i64).unwrap().is_none());
        assert_eq!(arr.len(), 2);

        assert_eq!(arr.remove(1).unwrap().unwrap().as_str(), Some("two"));
        assert!(arr.remove(5).unwrap().is_none());
        assert_eq!(arr.pop().unwrap().and_then(|v| v.as_i64()), Some(10));
        assert!(arr.is_empty());
    }

    #[test]
    fn frozen_containers_reject_writes() {
        let obj = Object::new();
        obj.insert("a", 1i64).unwrap();
        obj.mark_frozen();

        let err = obj.insert("b", 2i64).unwrap_err();
        assert!(matches!(err, GlacierError::MutationOnFrozenValue { kind: "object" }));
        assert!(obj.remove("a").is_err());
        assert_eq!(obj.len(), 1);
        assert_eq!(obj.get("a").and_then(|v| v.as_i64()), Some(1));

        let arr = Array::from_vec(vec![Value::Null]);
        arr.mark_frozen();
        assert!(arr.push(true).is_err());
        assert!(arr.set(0, true).is_err());
        assert!(arr.pop().is_err());
        assert!(arr.get(0).unwrap().is_null());
    }

    #[test]
    fn converts_from_json_and_back() {
        let source = json!({"x": [1, 2, {"y": 3}], "name": "a", "on": true, "none": null});
        let value = Value::from(source.clone());

        assert_eq!(value.to_json(), source);
        assert_eq!(value.pointer("/x/2/y").and_then(|v| v.as_i64()), Some(3));
        assert_eq!(value.get("name").unwrap().as_str(), Some("a"));
        assert!(value.pointer("/x/9").is_none());
        assert!(value.pointer("x").is_none());
    }

    #[test]
    fn pointer_unescapes_tokens() {
        let value = Value::from(json!({"a/b": {"c~d": 1}}));
        assert_eq!(value.pointer("/a~1b/c~0d").and_then(|v| v.as_i64()), Some(1));
        assert!(value.pointer("").unwrap().ptr_eq(&value));
    }

    #[test]
    fn converts_from_toml() {
        let table: toml::Value = toml::from_str(
            r#"
name = "web"
port = 8080
ratio = 0.5

[routes]
paths = ["/", "/about"]
"#,
        )
        .unwrap();
        let value = Value::from(table);

        assert_eq!(value.get("port").and_then(|v| v.as_i64()), Some(8080));
        assert_eq!(value.get("ratio").and_then(|v| v.as_f64()), Some(0.5));
        assert_eq!(
            value.pointer("/routes/paths/1").unwrap().as_str(),
            Some("/about")
        );
    }

    #[test]
    fn structural_equality() {
        let a = Value::from(json!({"k": [1, {"z": false}]}));
        let b = Value::from(json!({"k": [1, {"z": false}]}));
        let c = Value::from(json!({"k": [1, {"z": true}]}));

        assert_eq!(a, b);
        assert!(!a.ptr_eq(&b));
        assert_ne!(a, c);
        assert!(!Value::from(1i64).ptr_eq(&Value::from(1i64)));
    }

    #[test]
    fn to_json_breaks_cycles() {
        let arr = Array::new();
        arr.push(1i64).unwrap();
        arr.push(Value::Array(arr.clone())).unwrap();

        assert_eq!(Value::Array(arr.clone()).to_json(), json!([1, null]));
        // Break the cycle so the test does not leak.
        arr.pop().unwrap();
    }

    #[test]
    fn shared_subtrees_render_fully() {
        let shared = Value::from(json!({"v": 1}));
        let root = Object::new();
        root.insert("a", shared.clone()).unwrap();
        root.insert("b", shared).unwrap();

        assert_eq!(
            Value::Object(root).to_json(),
            json!({"a": {"v": 1}, "b": {"v": 1}})
        );
    }

    #[test]
    fn scalars_report_frozen() {
        assert!(Value::Null.is_frozen());
        assert!(Value::from("s").is_frozen());
        assert!(!Value::Object(Object::new()).is_frozen());
        assert!(Value::from(f64::NAN).is_null());
    }

    #[test]
    fn serializes_as_json() {
        let value = Value::from(json!({"b": [true], "a": 1}));
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"{"a":1,"b":[true]}"#);
        assert_eq!(value.to_string(), r#"{"a":1,"b":[true]}"#);
    }
}
