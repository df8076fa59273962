//! Helpers over record values.
//!
//! Record values arrive as [`serde_json::Value`], already type-converted
//! by the upstream adapter layer. This engine treats them as opaque
//! except for two concerns it owns: empty/absent detection for the
//! `required_if` / `required_unless` rules, and numeric coercion for
//! `greater_than` / `less_than`.

use serde_json::Value;

/// Return `true` if a *present* value counts as empty.
///
/// Empty means JSON null or a string that is empty after trimming.
/// Zero, `false`, and empty arrays are **not** empty — they are real
/// values the upstream converter produced deliberately.
#[must_use]
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Coerce a value to `f64` for ordering comparisons.
///
/// JSON numbers pass through; strings are parsed after trimming.
/// Everything else is `None`, which the rule evaluator reports as a
/// validation failure rather than an error.
#[must_use]
pub fn as_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Flatten a value into the list of scalar entries it carries.
///
/// Arrays yield each element's string form; scalars yield one entry.
/// Null and empty strings yield nothing. Used by relationship wiring
/// where a multi-valued source field emits one edge per value.
#[must_use]
pub fn scalar_entries(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().flat_map(scalar_entries).collect(),
        Value::Null => Vec::new(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Vec::new()
            } else {
                vec![trimmed.to_string()]
            }
        }
        Value::Number(n) => vec![n.to_string()],
        Value::Bool(b) => vec![b.to_string()],
        Value::Object(_) => Vec::new(),
    }
}
