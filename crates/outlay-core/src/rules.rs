//! Cross-field dependency rules and their stateless evaluator.
//!
//! # Overview
//!
//! A [`Dependency`] declares that one field's validity depends on the
//! value of another, already-validated field. The evaluator is a pure
//! function of `(kind, field value, target value, rule)` — it holds no
//! state and never signals through errors: every outcome is the `bool`
//! pass/fail result the orchestrator folds into the record report.
//!
//! # Rule semantics
//!
//! - `required_if`: fails only when the target matches the rule's
//!   `equals` condition AND the dependent field is absent/empty.
//! - `required_unless`: fails only when the target does NOT match AND
//!   the dependent field is absent/empty.
//! - `equals` / `not_equals`: direct value comparison, no coercion.
//! - `greater_than` / `less_than`: numeric ordering; a non-numeric
//!   operand is a validation failure, not an error.
//! - `custom`: delegates to a named rule resolved through the
//!   [`RuleRegistry`] — an explicit factory table, no reflection.
//!
//! A target that is missing from the validated set always fails:
//! dependencies can never be satisfied against unvalidated state.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::ErrorCode;
use crate::value::{as_numeric, is_empty};

// ---------------------------------------------------------------------------
// Rule vocabulary
// ---------------------------------------------------------------------------

/// Severity attached to a dependency violation.
///
/// Only `Error` halts further validation of the record; `Warning` and
/// `Info` are advisory and accumulate without stopping evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorLevel {
    #[default]
    Error,
    Warning,
    Info,
}

impl fmt::Display for ErrorLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// The kind of cross-field dependency being evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    RequiredIf,
    RequiredUnless,
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Custom,
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RequiredIf => "required_if",
            Self::RequiredUnless => "required_unless",
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::Custom => "custom",
        };
        write!(f, "{s}")
    }
}

/// Parameters attached to a dependency declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyRule {
    /// Condition value for `required_if` / `required_unless`. When
    /// absent, the condition is "target is non-empty".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals: Option<Value>,
    /// Name of the registered rule for `custom` dependencies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<String>,
}

/// A single field-level dependency as registered with the resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub field_name: String,
    pub target_field: String,
    pub kind: DependencyKind,
    #[serde(default)]
    pub rule: DependencyRule,
    #[serde(default)]
    pub level: ErrorLevel,
    /// Optional validation group gating this dependency. Dependencies
    /// in a disabled group are never evaluated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

// ---------------------------------------------------------------------------
// Custom rule registry
// ---------------------------------------------------------------------------

/// A named rule with caller-defined semantics.
///
/// The evaluator only supplies the call site; the rule owns the
/// semantics entirely.
pub trait CustomRule: Send + Sync {
    fn evaluate(&self, field_value: Option<&Value>, target_value: &Value) -> bool;
}

impl<F> CustomRule for F
where
    F: Fn(Option<&Value>, &Value) -> bool + Send + Sync,
{
    fn evaluate(&self, field_value: Option<&Value>, target_value: &Value) -> bool {
        self(field_value, target_value)
    }
}

/// Registry mapping rule names to implementations, populated at
/// startup. Replaces reflection-style class loading with an explicit
/// factory table.
#[derive(Default, Clone)]
pub struct RuleRegistry {
    rules: HashMap<String, Arc<dyn CustomRule>>,
}

impl RuleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, rule: Arc<dyn CustomRule>) {
        self.rules.insert(name.into(), rule);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn CustomRule>> {
        self.rules.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("RuleRegistry").field("rules", &names).finish()
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluate one dependency rule.
///
/// `field_value` is the dependent field's raw value (`None` when the
/// field key is present in the record but carries no usable value —
/// absence of the key itself is the orchestrator's skip case, not
/// handled here). `target_value` is the target field's value from the
/// validated-fields map; `None` means the target has not been
/// validated, which is always a failure.
///
/// Returns `true` when the dependency is satisfied.
#[must_use]
pub fn evaluate(
    kind: DependencyKind,
    field_value: Option<&Value>,
    target_value: Option<&Value>,
    rule: &DependencyRule,
    registry: &RuleRegistry,
) -> bool {
    let Some(target) = target_value else {
        // Unvalidated/unknown targets never satisfy a dependency.
        return false;
    };

    let field_present = field_value.is_some_and(|v| !is_empty(v));

    match kind {
        DependencyKind::RequiredIf => !(condition_matches(target, rule) && !field_present),
        DependencyKind::RequiredUnless => {
            !(!condition_matches(target, rule) && !field_present)
        }
        DependencyKind::Equals => field_value.is_some_and(|v| v == target),
        DependencyKind::NotEquals => field_value.is_some_and(|v| v != target),
        DependencyKind::GreaterThan => compare_numeric(field_value, target, f64::gt),
        DependencyKind::LessThan => compare_numeric(field_value, target, f64::lt),
        DependencyKind::Custom => evaluate_custom(field_value, target, rule, registry),
    }
}

/// Does the target satisfy the rule's condition?
///
/// With an `equals` value the condition is an exact match; without
/// one it is "target is non-empty".
fn condition_matches(target: &Value, rule: &DependencyRule) -> bool {
    match &rule.equals {
        Some(expected) => target == expected,
        None => !is_empty(target),
    }
}

fn compare_numeric(
    field_value: Option<&Value>,
    target: &Value,
    op: impl Fn(&f64, &f64) -> bool,
) -> bool {
    let (Some(lhs), Some(rhs)) = (field_value.and_then(as_numeric), as_numeric(target)) else {
        return false;
    };
    op(&lhs, &rhs)
}

fn evaluate_custom(
    field_value: Option<&Value>,
    target: &Value,
    rule: &DependencyRule,
    registry: &RuleRegistry,
) -> bool {
    let Some(name) = rule.custom.as_deref() else {
        warn!(code = %ErrorCode::UnknownCustomRule, "custom dependency without a rule name");
        return false;
    };
    match registry.get(name) {
        Some(custom) => custom.evaluate(field_value, target),
        None => {
            warn!(code = %ErrorCode::UnknownCustomRule, rule = name, "custom rule not registered");
            false
        }
    }
}
