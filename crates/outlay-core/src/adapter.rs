//! Field adapters: per-field validate/transform behavior behind an
//! explicit registry.
//!
//! # Overview
//!
//! Each field may declare one adapter in its validation config. The
//! adapter checks the field's (already type-converted) value and
//! produces the normalized form recorded into the validated-fields
//! map. Concrete kinds: `pattern` (regex), `date` (chrono format +
//! range), `numeric` (range), `code` (allowed-value set), `composite`
//! (ordered chain of sub-adapters).
//!
//! # Registry
//!
//! Adapter kinds are resolved through [`AdapterRegistry`], a string →
//! constructor table populated at startup. This replaces dynamic
//! class loading with an explicit factory table: unknown kinds are a
//! configuration error at build time, never a runtime lookup failure.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::value::as_numeric;

// ---------------------------------------------------------------------------
// Spec and errors
// ---------------------------------------------------------------------------

/// Declarative adapter options as they appear in field config.
///
/// One flat option bag shared by every kind; each constructor reads
/// the options it needs and rejects specs it cannot satisfy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdapterSpec {
    pub kind: String,
    /// `pattern`: regular expression the string value must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// `date`: chrono format string, default `%Y-%m-%d`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// `numeric`: inclusive lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// `numeric`: inclusive upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// `date`: inclusive earliest date, in the adapter's format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_date: Option<String>,
    /// `date`: inclusive latest date, in the adapter's format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_date: Option<String>,
    /// `code`: accepted values (compared case-insensitively).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<String>,
    /// `composite`: ordered sub-adapter specs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<AdapterSpec>,
}

/// Errors raised while constructing adapters from config.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("unknown adapter kind '{0}'")]
    UnknownKind(String),
    #[error("adapter '{kind}' missing required option '{option}'")]
    MissingOption { kind: String, option: String },
    #[error("invalid regex pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid date bound '{0}' for the configured format")]
    InvalidDateBound(String),
}

// ---------------------------------------------------------------------------
// FieldAdapter trait
// ---------------------------------------------------------------------------

/// Per-field validation + normalization behavior.
///
/// Implementations are pure functions of the input value so one
/// adapter instance can be shared across validation workers.
pub trait FieldAdapter: Send + Sync {
    /// Does the value satisfy this adapter?
    fn validate(&self, value: &Value) -> bool;

    /// Normalized form recorded into the validated-fields map. Called
    /// only after `validate` passes; must be a no-op on values the
    /// adapter cannot interpret.
    fn transform(&self, value: &Value) -> Value;

    /// Human-readable failure descriptions for a rejected value.
    fn errors(&self, value: &Value) -> Vec<String>;
}

impl std::fmt::Debug for dyn FieldAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FieldAdapter")
    }
}

// ---------------------------------------------------------------------------
// Concrete adapters
// ---------------------------------------------------------------------------

struct PatternAdapter {
    regex: Regex,
}

impl FieldAdapter for PatternAdapter {
    fn validate(&self, value: &Value) -> bool {
        match value {
            Value::String(s) => self.regex.is_match(s.trim()),
            _ => false,
        }
    }

    fn transform(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(s.trim().to_string()),
            other => other.clone(),
        }
    }

    fn errors(&self, value: &Value) -> Vec<String> {
        if self.validate(value) {
            return Vec::new();
        }
        vec![format!(
            "value {value} does not match pattern '{}'",
            self.regex.as_str()
        )]
    }
}

struct DateAdapter {
    format: String,
    min: Option<NaiveDate>,
    max: Option<NaiveDate>,
}

impl DateAdapter {
    fn parse(&self, value: &Value) -> Option<NaiveDate> {
        match value {
            Value::String(s) => NaiveDate::parse_from_str(s.trim(), &self.format).ok(),
            _ => None,
        }
    }
}

impl FieldAdapter for DateAdapter {
    fn validate(&self, value: &Value) -> bool {
        let Some(date) = self.parse(value) else {
            return false;
        };
        self.min.is_none_or(|min| date >= min) && self.max.is_none_or(|max| date <= max)
    }

    fn transform(&self, value: &Value) -> Value {
        // Normalize to ISO-8601 regardless of the input format.
        match self.parse(value) {
            Some(date) => Value::String(date.format("%Y-%m-%d").to_string()),
            None => value.clone(),
        }
    }

    fn errors(&self, value: &Value) -> Vec<String> {
        match self.parse(value) {
            None => vec![format!(
                "value {value} is not a date in format '{}'",
                self.format
            )],
            Some(date) => {
                let mut out = Vec::new();
                if let Some(min) = self.min
                    && date < min
                {
                    out.push(format!("date {date} is before earliest allowed {min}"));
                }
                if let Some(max) = self.max
                    && date > max
                {
                    out.push(format!("date {date} is after latest allowed {max}"));
                }
                out
            }
        }
    }
}

struct NumericAdapter {
    min: Option<f64>,
    max: Option<f64>,
}

impl FieldAdapter for NumericAdapter {
    fn validate(&self, value: &Value) -> bool {
        let Some(n) = as_numeric(value) else {
            return false;
        };
        self.min.is_none_or(|min| n >= min) && self.max.is_none_or(|max| n <= max)
    }

    fn transform(&self, value: &Value) -> Value {
        as_numeric(value)
            .and_then(serde_json::Number::from_f64)
            .map_or_else(|| value.clone(), Value::Number)
    }

    fn errors(&self, value: &Value) -> Vec<String> {
        match as_numeric(value) {
            None => vec![format!("value {value} is not numeric")],
            Some(n) => {
                let mut out = Vec::new();
                if let Some(min) = self.min
                    && n < min
                {
                    out.push(format!("value {n} is below minimum {min}"));
                }
                if let Some(max) = self.max
                    && n > max
                {
                    out.push(format!("value {n} is above maximum {max}"));
                }
                out
            }
        }
    }
}

struct CodeAdapter {
    allowed: HashSet<String>,
}

impl CodeAdapter {
    fn canonical(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.trim().to_uppercase()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl FieldAdapter for CodeAdapter {
    fn validate(&self, value: &Value) -> bool {
        Self::canonical(value).is_some_and(|code| self.allowed.contains(&code))
    }

    fn transform(&self, value: &Value) -> Value {
        Self::canonical(value).map_or_else(|| value.clone(), Value::String)
    }

    fn errors(&self, value: &Value) -> Vec<String> {
        if self.validate(value) {
            return Vec::new();
        }
        vec![format!("value {value} is not an allowed code")]
    }
}

struct CompositeAdapter {
    parts: Vec<Box<dyn FieldAdapter>>,
}

impl FieldAdapter for CompositeAdapter {
    fn validate(&self, value: &Value) -> bool {
        // Each part sees the previous part's transformed value.
        let mut current = value.clone();
        for part in &self.parts {
            if !part.validate(&current) {
                return false;
            }
            current = part.transform(&current);
        }
        true
    }

    fn transform(&self, value: &Value) -> Value {
        self.parts
            .iter()
            .fold(value.clone(), |v, part| part.transform(&v))
    }

    fn errors(&self, value: &Value) -> Vec<String> {
        let mut current = value.clone();
        for part in &self.parts {
            if !part.validate(&current) {
                return part.errors(&current);
            }
            current = part.transform(&current);
        }
        Vec::new()
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Constructor for one adapter kind. Receives the registry so
/// composite kinds can build their parts.
pub type AdapterCtor =
    fn(&AdapterSpec, &AdapterRegistry) -> Result<Box<dyn FieldAdapter>, AdapterError>;

/// String-keyed adapter factory table, populated at startup.
pub struct AdapterRegistry {
    ctors: HashMap<String, AdapterCtor>,
}

impl AdapterRegistry {
    /// Registry with the built-in kinds: `pattern`, `date`, `numeric`,
    /// `code`, `composite`.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self {
            ctors: HashMap::new(),
        };
        registry.register("pattern", build_pattern);
        registry.register("date", build_date);
        registry.register("numeric", build_numeric);
        registry.register("code", build_code);
        registry.register("composite", build_composite);
        registry
    }

    pub fn register(&mut self, kind: impl Into<String>, ctor: AdapterCtor) {
        self.ctors.insert(kind.into(), ctor);
    }

    /// Construct the adapter a spec describes.
    ///
    /// # Errors
    ///
    /// [`AdapterError::UnknownKind`] for unregistered kinds, or the
    /// constructor's own error for invalid options.
    pub fn build(&self, spec: &AdapterSpec) -> Result<Box<dyn FieldAdapter>, AdapterError> {
        let ctor = self
            .ctors
            .get(&spec.kind)
            .ok_or_else(|| AdapterError::UnknownKind(spec.kind.clone()))?;
        ctor(spec, self)
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn build_pattern(
    spec: &AdapterSpec,
    _registry: &AdapterRegistry,
) -> Result<Box<dyn FieldAdapter>, AdapterError> {
    let pattern = spec.pattern.as_deref().ok_or_else(|| AdapterError::MissingOption {
        kind: "pattern".to_string(),
        option: "pattern".to_string(),
    })?;
    let regex = Regex::new(pattern).map_err(|source| AdapterError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;
    Ok(Box::new(PatternAdapter { regex }))
}

fn build_date(
    spec: &AdapterSpec,
    _registry: &AdapterRegistry,
) -> Result<Box<dyn FieldAdapter>, AdapterError> {
    let format = spec.format.clone().unwrap_or_else(|| "%Y-%m-%d".to_string());
    let parse_bound = |bound: &Option<String>| -> Result<Option<NaiveDate>, AdapterError> {
        bound
            .as_deref()
            .map(|raw| {
                NaiveDate::parse_from_str(raw, &format)
                    .map_err(|_| AdapterError::InvalidDateBound(raw.to_string()))
            })
            .transpose()
    };
    let min = parse_bound(&spec.min_date)?;
    let max = parse_bound(&spec.max_date)?;
    Ok(Box::new(DateAdapter { format, min, max }))
}

fn build_numeric(
    spec: &AdapterSpec,
    _registry: &AdapterRegistry,
) -> Result<Box<dyn FieldAdapter>, AdapterError> {
    Ok(Box::new(NumericAdapter {
        min: spec.min,
        max: spec.max,
    }))
}

fn build_code(
    spec: &AdapterSpec,
    _registry: &AdapterRegistry,
) -> Result<Box<dyn FieldAdapter>, AdapterError> {
    if spec.allowed.is_empty() {
        return Err(AdapterError::MissingOption {
            kind: "code".to_string(),
            option: "allowed".to_string(),
        });
    }
    let allowed = spec
        .allowed
        .iter()
        .map(|code| code.trim().to_uppercase())
        .collect();
    Ok(Box::new(CodeAdapter { allowed }))
}

fn build_composite(
    spec: &AdapterSpec,
    registry: &AdapterRegistry,
) -> Result<Box<dyn FieldAdapter>, AdapterError> {
    if spec.parts.is_empty() {
        return Err(AdapterError::MissingOption {
            kind: "composite".to_string(),
            option: "parts".to_string(),
        });
    }
    let parts = spec
        .parts
        .iter()
        .map(|part| registry.build(part))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Box::new(CompositeAdapter { parts }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(kind: &str) -> AdapterSpec {
        AdapterSpec {
            kind: kind.to_string(),
            ..AdapterSpec::default()
        }
    }

    // -----------------------------------------------------------------------
    // pattern
    // -----------------------------------------------------------------------

    #[test]
    fn pattern_adapter_matches_and_trims() {
        let registry = AdapterRegistry::with_builtins();
        let adapter = registry
            .build(&AdapterSpec {
                pattern: Some(r"^\d{4}$".to_string()),
                ..spec("pattern")
            })
            .expect("build");

        assert!(adapter.validate(&json!("  2024 ")));
        assert!(!adapter.validate(&json!("20x4")));
        assert!(!adapter.validate(&json!(2024)));
        assert_eq!(adapter.transform(&json!("  2024 ")), json!("2024"));
        assert!(!adapter.errors(&json!("bad")).is_empty());
    }

    #[test]
    fn invalid_regex_is_a_build_error() {
        let registry = AdapterRegistry::with_builtins();
        let err = registry
            .build(&AdapterSpec {
                pattern: Some("([".to_string()),
                ..spec("pattern")
            })
            .expect_err("must fail");
        assert!(matches!(err, AdapterError::InvalidPattern { .. }));
    }

    // -----------------------------------------------------------------------
    // date
    // -----------------------------------------------------------------------

    #[test]
    fn date_adapter_parses_and_normalizes() {
        let registry = AdapterRegistry::with_builtins();
        let adapter = registry
            .build(&AdapterSpec {
                format: Some("%m/%d/%Y".to_string()),
                ..spec("date")
            })
            .expect("build");

        assert!(adapter.validate(&json!("09/30/2024")));
        assert_eq!(adapter.transform(&json!("09/30/2024")), json!("2024-09-30"));
        assert!(!adapter.validate(&json!("2024-09-30")));
    }

    #[test]
    fn date_adapter_enforces_range() {
        let registry = AdapterRegistry::with_builtins();
        let adapter = registry
            .build(&AdapterSpec {
                min_date: Some("2000-10-01".to_string()),
                max_date: Some("2025-09-30".to_string()),
                ..spec("date")
            })
            .expect("build");

        assert!(adapter.validate(&json!("2020-01-15")));
        assert!(!adapter.validate(&json!("1999-12-31")));
        assert!(!adapter.validate(&json!("2026-01-01")));
        assert!(!adapter.errors(&json!("1999-12-31")).is_empty());
    }

    #[test]
    fn bad_date_bound_is_a_build_error() {
        let registry = AdapterRegistry::with_builtins();
        let err = registry
            .build(&AdapterSpec {
                min_date: Some("not-a-date".to_string()),
                ..spec("date")
            })
            .expect_err("must fail");
        assert!(matches!(err, AdapterError::InvalidDateBound(_)));
    }

    // -----------------------------------------------------------------------
    // numeric
    // -----------------------------------------------------------------------

    #[test]
    fn numeric_adapter_range_and_coercion() {
        let registry = AdapterRegistry::with_builtins();
        let adapter = registry
            .build(&AdapterSpec {
                min: Some(0.0),
                max: Some(1_000_000.0),
                ..spec("numeric")
            })
            .expect("build");

        assert!(adapter.validate(&json!(150)));
        assert!(adapter.validate(&json!("42.5")));
        assert!(!adapter.validate(&json!(-1)));
        assert!(!adapter.validate(&json!("abc")));
        // Numeric strings normalize to numbers.
        assert_eq!(adapter.transform(&json!("42.5")), json!(42.5));
    }

    // -----------------------------------------------------------------------
    // code
    // -----------------------------------------------------------------------

    #[test]
    fn code_adapter_is_case_insensitive() {
        let registry = AdapterRegistry::with_builtins();
        let adapter = registry
            .build(&AdapterSpec {
                allowed: vec!["A".to_string(), "B07".to_string()],
                ..spec("code")
            })
            .expect("build");

        assert!(adapter.validate(&json!("a")));
        assert!(adapter.validate(&json!(" b07 ")));
        assert!(!adapter.validate(&json!("C")));
        assert_eq!(adapter.transform(&json!("a")), json!("A"));
    }

    // -----------------------------------------------------------------------
    // composite
    // -----------------------------------------------------------------------

    #[test]
    fn composite_chains_parts_in_order() {
        let registry = AdapterRegistry::with_builtins();
        // Pattern first (string form), then numeric range on the result.
        let adapter = registry
            .build(&AdapterSpec {
                parts: vec![
                    AdapterSpec {
                        pattern: Some(r"^\d+$".to_string()),
                        ..spec("pattern")
                    },
                    AdapterSpec {
                        min: Some(1.0),
                        max: Some(99.0),
                        ..spec("numeric")
                    },
                ],
                ..spec("composite")
            })
            .expect("build");

        assert!(adapter.validate(&json!(" 42 ")));
        assert!(!adapter.validate(&json!("7x")), "first part rejects");
        assert!(!adapter.validate(&json!("420")), "second part rejects");
        assert_eq!(adapter.transform(&json!(" 42 ")), json!(42.0));
    }

    // -----------------------------------------------------------------------
    // registry
    // -----------------------------------------------------------------------

    #[test]
    fn unknown_kind_is_rejected() {
        let registry = AdapterRegistry::with_builtins();
        let err = registry.build(&spec("telepathic")).expect_err("must fail");
        assert!(matches!(err, AdapterError::UnknownKind(_)));
    }

    #[test]
    fn custom_kinds_can_be_registered() {
        fn build_always_ok(
            _spec: &AdapterSpec,
            _registry: &AdapterRegistry,
        ) -> Result<Box<dyn FieldAdapter>, AdapterError> {
            struct AlwaysOk;
            impl FieldAdapter for AlwaysOk {
                fn validate(&self, _value: &Value) -> bool {
                    true
                }
                fn transform(&self, value: &Value) -> Value {
                    value.clone()
                }
                fn errors(&self, _value: &Value) -> Vec<String> {
                    Vec::new()
                }
            }
            Ok(Box::new(AlwaysOk))
        }

        let mut registry = AdapterRegistry::with_builtins();
        registry.register("always_ok", build_always_ok);
        let adapter = registry.build(&spec("always_ok")).expect("build");
        assert!(adapter.validate(&json!("anything")));
    }
}
