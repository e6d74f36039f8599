//! Best-effort primitive coercion applied before dispatch.
//!
//! Coercion never raises and never rejects: a value that cannot be coerced is
//! left as-is for the checker to refuse with a proper violation record.
//! Composite values (objects, arrays) are never touched.

use crate::registry::Registry;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Custom coercion function: receives the current value and the whole subject
/// object, returns the replacement value.
pub type ConvertFn = Arc<dyn Fn(&Value, &Value) -> Value + Send + Sync>;

/// Coercion target for a rule's `convert_type` or a registered type's default
/// coercion.
#[derive(Clone)]
pub enum ConvertSpec {
    /// Truncating integer parse (prefix digits for strings).
    Int,
    /// Float parse; empty string becomes `0`.
    Number,
    /// Stringify numbers and booleans.
    String,
    /// Truthiness: nonzero numbers and non-empty strings are `true`.
    Boolean,
    /// Defer to the named type's registered default coercion.
    Named(String),
    /// Custom function, takes `(value, subject)`.
    Func(ConvertFn),
}

impl ConvertSpec {
    /// Wrap a closure as a custom coercion.
    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&Value, &Value) -> Value + Send + Sync + 'static,
    {
        ConvertSpec::Func(Arc::new(f))
    }
}

impl fmt::Debug for ConvertSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertSpec::Int => f.write_str("Int"),
            ConvertSpec::Number => f.write_str("Number"),
            ConvertSpec::String => f.write_str("String"),
            ConvertSpec::Boolean => f.write_str("Boolean"),
            ConvertSpec::Named(name) => f.debug_tuple("Named").field(name).finish(),
            ConvertSpec::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl PartialEq for ConvertSpec {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ConvertSpec::Int, ConvertSpec::Int) => true,
            (ConvertSpec::Number, ConvertSpec::Number) => true,
            (ConvertSpec::String, ConvertSpec::String) => true,
            (ConvertSpec::Boolean, ConvertSpec::Boolean) => true,
            (ConvertSpec::Named(a), ConvertSpec::Named(b)) => a == b,
            (ConvertSpec::Func(a), ConvertSpec::Func(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for ConvertSpec {
    fn from(name: &str) -> Self {
        match name {
            "int" | "integer" => ConvertSpec::Int,
            "number" => ConvertSpec::Number,
            "string" => ConvertSpec::String,
            "bool" | "boolean" => ConvertSpec::Boolean,
            other => ConvertSpec::Named(other.to_string()),
        }
    }
}

impl From<String> for ConvertSpec {
    fn from(name: String) -> Self {
        ConvertSpec::from(name.as_str())
    }
}

impl From<ConvertFn> for ConvertSpec {
    fn from(f: ConvertFn) -> Self {
        ConvertSpec::Func(f)
    }
}

// Named specs may chain through the registry's default coercions; cap the
// walk so a cycle cannot spin forever.
const MAX_NAMED_HOPS: usize = 8;

/// Apply a coercion spec to `value` in place.
pub(crate) fn apply(registry: &Registry, spec: &ConvertSpec, value: &mut Value, subject: &Value) {
    if value.is_object() || value.is_array() {
        return;
    }
    let mut spec = spec.clone();
    let mut hops = 0;
    loop {
        match spec {
            ConvertSpec::Int => {
                if let Some(n) = to_int(value) {
                    *value = Value::from(n);
                }
                return;
            }
            ConvertSpec::Number => {
                if let Some(n) = to_number(value) {
                    *value = n;
                }
                return;
            }
            ConvertSpec::String => {
                if let Some(s) = to_string_value(value) {
                    *value = Value::String(s);
                }
                return;
            }
            ConvertSpec::Boolean => {
                if let Some(b) = to_boolean(value) {
                    *value = Value::Bool(b);
                }
                return;
            }
            ConvertSpec::Func(f) => {
                *value = f(value, subject);
                return;
            }
            ConvertSpec::Named(name) => {
                hops += 1;
                if hops > MAX_NAMED_HOPS {
                    return;
                }
                match registry.default_convert(&name) {
                    Some(next) => spec = next.clone(),
                    None => return,
                }
            }
        }
    }
}

fn to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i)
            } else {
                n.as_f64().map(|f| f.trunc() as i64)
            }
        }
        // parseInt semantics: leading digits (with optional sign) parse,
        // the rest is ignored
        Value::String(s) => {
            let s = s.trim();
            let (sign, digits) = match s.strip_prefix('-') {
                Some(rest) => (-1i64, rest),
                None => (1i64, s.strip_prefix('+').unwrap_or(s)),
            };
            let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
            if end == 0 {
                return None;
            }
            digits[..end].parse::<i64>().ok().map(|n| sign * n)
        }
        _ => None,
    }
}

fn to_number(value: &Value) -> Option<Value> {
    match value {
        Value::Number(_) => Some(value.clone()),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Some(Value::from(0));
            }
            let f = s.parse::<f64>().ok().filter(|f| f.is_finite())?;
            if f.fract() == 0.0 && f.abs() < (i64::MAX as f64) {
                Some(Value::from(f as i64))
            } else {
                Some(Value::from(f))
            }
        }
        Value::Bool(b) => Some(Value::from(if *b { 1 } else { 0 })),
        _ => None,
    }
}

fn to_string_value(value: &Value) -> Option<String> {
    match value {
        Value::String(_) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn to_boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(_) => None,
        Value::Number(n) => Some(n.as_f64().map(|f| f != 0.0).unwrap_or(true)),
        Value::String(s) => Some(!s.is_empty()),
        _ => None,
    }
}
