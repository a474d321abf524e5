//! Isolated evaluation of script manifests
//!
//! Script manifests are JavaScript files that assign their data to globals,
//! e.g. `var routes = ["/", "/about"]` or `globalThis.__BUILD = {...}`.
//! Each evaluation gets its own QuickJS runtime and context, so a manifest
//! can neither see the host nor any previously evaluated manifest.

use crate::config::schema::EvalConfig;
use crate::value::{Array, Object, Value};
use rquickjs::context::EvalOptions;
use rquickjs::function::This;
use rquickjs::{
    Array as JsArray, CatchResultExt, Context, Ctx, Object as JsObject, Runtime, Value as JsValue,
};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Deepest array/object nesting exported from a script
const MAX_EXPORT_DEPTH: usize = 1024;

/// Largest float magnitude that still converts to an exact integer
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Executes manifest source against a fresh scope
pub trait Evaluator: Send + Sync {
    /// Run `source` in a new isolated scope and return the scope's root
    /// binding object. `origin` is the path the source was read from.
    fn evaluate(&self, source: &str, origin: &Path) -> Result<Object, String>;
}

impl<E: Evaluator + ?Sized> Evaluator for Arc<E> {
    fn evaluate(&self, source: &str, origin: &Path) -> Result<Object, String> {
        (**self).evaluate(source, origin)
    }
}

/// QuickJS-backed evaluator.
///
/// Scripts run as sloppy-mode global code, so `var x`, `x = ...` and
/// `globalThis.x = ...` all define exported bindings. The returned object
/// holds every enumerable global the script added, converted directly from
/// the script's values: object identity is kept, so shared references and
/// cycles come back as shared [`Array`]/[`Object`] handles. Like JSON,
/// functions, symbols and `undefined` are dropped from objects and become
/// `null` inside arrays, and `toJSON` methods are honoured. Top-level
/// `let`/`const` are not properties of the global object and are not
/// exported.
#[derive(Debug, Clone)]
pub struct QuickJsEvaluator {
    memory_limit: usize,
    max_stack_size: usize,
}

impl QuickJsEvaluator {
    /// Create an evaluator with default limits
    pub fn new() -> Self {
        Self::from_config(&EvalConfig::default())
    }

    /// Create an evaluator with limits from configuration
    pub fn from_config(config: &EvalConfig) -> Self {
        Self {
            memory_limit: config.memory_limit_bytes,
            max_stack_size: config.max_stack_size_bytes,
        }
    }
}

impl Default for QuickJsEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator for QuickJsEvaluator {
    fn evaluate(&self, source: &str, origin: &Path) -> Result<Object, String> {
        let runtime = Runtime::new().map_err(|e| format!("creating JS runtime: {}", e))?;
        runtime.set_memory_limit(self.memory_limit);
        runtime.set_max_stack_size(self.max_stack_size);
        let context = Context::full(&runtime).map_err(|e| format!("creating JS context: {}", e))?;

        context.with(|ctx| {
            let globals = ctx.globals();
            let baseline = globals
                .keys::<String>()
                .collect::<rquickjs::Result<HashSet<String>>>()
                .map_err(|e| e.to_string())?;

            let mut options = EvalOptions::default();
            options.strict = false;
            ctx.eval_with_options::<(), _>(source, options)
                .catch(&ctx)
                .map_err(|e| e.to_string())?;

            let scope = Object::new();
            let mut exporter = Exporter::new(ctx.clone());
            exporter.seen.insert(globals.as_value().clone(), Value::Object(scope.clone()));

            for prop in globals.props::<String, JsValue>() {
                let (key, value) = prop.catch(&ctx).map_err(|e| e.to_string())?;
                if baseline.contains(&key) {
                    continue;
                }

                let exported = exporter
                    .export(value, 0)
                    .map_err(|e| format!("exporting `{}`: {}", key, e))?;
                match exported {
                    Some(value) => {
                        scope.insert(key, value).map_err(|e| e.to_string())?;
                    }
                    None => debug!("Skipping non-data binding `{}` in {}", key, origin.display()),
                }
            }

            Ok(scope)
        })
    }
}

/// Converts script values into manifest values.
///
/// `seen` maps each script object already converted to its handle, so a
/// second reference to the same object reuses the handle instead of copying.
struct Exporter<'js> {
    ctx: Ctx<'js>,
    seen: HashMap<JsValue<'js>, Value>,
}

impl<'js> Exporter<'js> {
    fn new(ctx: Ctx<'js>) -> Self {
        Self {
            ctx,
            seen: HashMap::new(),
        }
    }

    fn js<T>(&self, result: rquickjs::Result<T>) -> Result<T, String> {
        result.catch(&self.ctx).map_err(|e| e.to_string())
    }

    /// Convert one value; `None` means it has no data form.
    fn export(&mut self, value: JsValue<'js>, depth: usize) -> Result<Option<Value>, String> {
        if let Some(handle) = self.seen.get(&value) {
            return Ok(Some(handle.clone()));
        }
        if depth > MAX_EXPORT_DEPTH {
            return Err(format!("nesting deeper than {} levels", MAX_EXPORT_DEPTH));
        }

        if value.is_null() {
            return Ok(Some(Value::Null));
        }
        if let Some(b) = value.as_bool() {
            return Ok(Some(Value::Bool(b)));
        }
        if let Some(i) = value.as_int() {
            return Ok(Some(Value::from(i64::from(i))));
        }
        if let Some(f) = value.as_float() {
            return Ok(Some(number(f)));
        }
        if let Some(s) = value.as_string() {
            return self.js(s.to_string()).map(|s| Some(Value::String(s)));
        }
        if value.is_function() {
            return Ok(None);
        }
        if let Some(array) = value.as_array() {
            return self.export_array(&value, array, depth).map(Some);
        }
        if let Some(object) = value.as_object() {
            let to_json: JsValue = self.js(object.get("toJSON"))?;
            if let Some(to_json) = to_json.as_function() {
                let replaced: JsValue = self.js(to_json.call((This(object.clone()),)))?;
                return self.export(replaced, depth + 1);
            }
            return self.export_object(&value, object, depth).map(Some);
        }

        // undefined, symbols, bigints
        Ok(None)
    }

    fn export_array(
        &mut self,
        value: &JsValue<'js>,
        array: &JsArray<'js>,
        depth: usize,
    ) -> Result<Value, String> {
        let out = Array::new();
        self.seen.insert(value.clone(), Value::Array(out.clone()));

        for index in 0..array.len() {
            let item: JsValue = self.js(array.get(index))?;
            let item = self.export(item, depth + 1)?.unwrap_or(Value::Null);
            out.push(item).map_err(|e| e.to_string())?;
        }
        Ok(Value::Array(out))
    }

    fn export_object(
        &mut self,
        value: &JsValue<'js>,
        object: &JsObject<'js>,
        depth: usize,
    ) -> Result<Value, String> {
        let out = Object::new();
        self.seen.insert(value.clone(), Value::Object(out.clone()));

        for prop in object.props::<String, JsValue>() {
            let (key, item) = self.js(prop)?;
            if let Some(item) = self.export(item, depth + 1)? {
                out.insert(key, item).map_err(|e| e.to_string())?;
            }
        }
        Ok(Value::Object(out))
    }
}

/// Integral floats in the exact range come back as integers, as they print in JS
fn number(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER {
        Value::from(f as i64)
    } else {
        Value::from(f)
    }
}
