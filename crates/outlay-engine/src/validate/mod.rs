//! Per-record validation orchestration.
//!
//! # Overview
//!
//! The [`ValidationOrchestrator`] ties the ordering machinery to the
//! rule evaluator: fields are visited in dependency order, each
//! field's cross-field dependencies are evaluated against the values
//! validated so far, and a passing field's adapter output is recorded
//! as the value later fields see. One record in, one
//! [`RecordReport`] out.
//!
//! # Fail-fast
//!
//! The first error-level violation aborts the rest of the record.
//! Warning- and info-level violations accumulate without stopping
//! evaluation, so a report can carry advisories for a record that is
//! still valid.

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error};

use outlay_core::ErrorCode;
use outlay_core::adapter::{AdapterError, AdapterRegistry, FieldAdapter};
use outlay_core::config::DatasetConfig;
use outlay_core::rules::{self, Dependency, DependencyKind, ErrorLevel, RuleRegistry};
use outlay_core::value::as_numeric;

use crate::order::{FieldDependencyResolver, GroupConfigError, ValidationGroupResolver};

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Overall verdict for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    Valid,
    Invalid,
}

/// What happened to one field during record validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOutcome {
    Passed,
    Failed,
    /// The record carries no key for this field.
    Skipped,
}

/// One recorded violation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub target: Option<String>,
    pub level: ErrorLevel,
    pub code: ErrorCode,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} {}] {}: {}",
            self.code, self.level, self.field, self.message
        )
    }
}

/// The outcome of validating one record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordReport {
    pub status: RecordStatus,
    pub errors: Vec<ValidationError>,
    pub outcomes: BTreeMap<String, FieldOutcome>,
    /// Field values as validated, with adapter transforms applied.
    /// Aborted and skipped fields are absent.
    pub validated: Map<String, Value>,
}

impl RecordReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.status == RecordStatus::Valid
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Configuration defects that abort orchestrator construction.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("validation group config: {0}")]
    Group(#[from] GroupConfigError),
    #[error("adapter for field '{field}': {source}")]
    Adapter {
        field: String,
        #[source]
        source: AdapterError,
    },
}

/// Drives record validation in dependency order.
pub struct ValidationOrchestrator {
    fields: FieldDependencyResolver,
    groups: Option<ValidationGroupResolver>,
    rules: RuleRegistry,
    adapters: HashMap<String, Box<dyn FieldAdapter>>,
}

impl ValidationOrchestrator {
    /// Build an orchestrator from a dataset config.
    ///
    /// # Errors
    ///
    /// [`BuildError::Group`] for group misconfiguration (fatal by
    /// policy) and [`BuildError::Adapter`] when a field's adapter spec
    /// cannot be constructed.
    pub fn from_config(
        config: &DatasetConfig,
        adapter_registry: &AdapterRegistry,
        rules: RuleRegistry,
    ) -> Result<Self, BuildError> {
        let fields = FieldDependencyResolver::from_config(&config.fields);

        let groups = if config.groups.is_empty() {
            None
        } else {
            Some(ValidationGroupResolver::new(config.groups.clone())?)
        };

        let mut adapters: HashMap<String, Box<dyn FieldAdapter>> = HashMap::new();
        for (field_name, field_cfg) in &config.fields {
            if let Some(spec) = &field_cfg.validation.adapter {
                let adapter = adapter_registry.build(spec).map_err(|source| {
                    error!(
                        code = %ErrorCode::AdapterBuildFailed,
                        field = %field_name,
                        kind = %spec.kind,
                        "adapter construction failed"
                    );
                    BuildError::Adapter {
                        field: field_name.clone(),
                        source,
                    }
                })?;
                adapters.insert(field_name.clone(), adapter);
            }
        }

        Ok(Self {
            fields,
            groups,
            rules,
            adapters,
        })
    }

    #[must_use]
    pub fn field_resolver(&self) -> &FieldDependencyResolver {
        &self.fields
    }

    #[must_use]
    pub fn group_resolver(&self) -> Option<&ValidationGroupResolver> {
        self.groups.as_ref()
    }

    // -----------------------------------------------------------------------
    // Record validation
    // -----------------------------------------------------------------------

    /// Validate one record.
    ///
    /// Fields run in dependency order. A field whose key is absent
    /// from the record is skipped and never enters the validated set,
    /// so anything depending on it fails with a target-not-validated
    /// violation. The first error-level violation stops the record.
    #[must_use]
    pub fn validate_record(&self, record: &Map<String, Value>) -> RecordReport {
        let mut report = RecordReport {
            status: RecordStatus::Valid,
            errors: Vec::new(),
            outcomes: BTreeMap::new(),
            validated: Map::new(),
        };

        'fields: for field_name in self.fields.validation_order() {
            let Some(value) = record.get(&field_name) else {
                report.outcomes.insert(field_name, FieldOutcome::Skipped);
                continue;
            };

            let mut failed = false;
            for dep in self.fields.field_dependencies(&field_name) {
                if self.group_disabled(dep) {
                    continue;
                }

                let target_value = report.validated.get(&dep.target_field);
                if rules::evaluate(dep.kind, Some(value), target_value, &dep.rule, &self.rules) {
                    continue;
                }

                failed = true;
                let violation = self.describe_violation(dep, value, target_value);
                let halt = violation.level == ErrorLevel::Error;
                report.errors.push(violation);
                if halt {
                    report.status = RecordStatus::Invalid;
                    report.outcomes.insert(field_name, FieldOutcome::Failed);
                    break 'fields;
                }
            }

            if failed {
                report.outcomes.insert(field_name.clone(), FieldOutcome::Failed);
                continue;
            }

            // Dependencies passed; the adapter has the final say and
            // decides the value later fields compare against.
            match self.apply_adapter(&field_name, value) {
                Ok(validated_value) => {
                    report.validated.insert(field_name.clone(), validated_value);
                    report.outcomes.insert(field_name, FieldOutcome::Passed);
                }
                Err(violation) => {
                    report.errors.push(violation);
                    report.status = RecordStatus::Invalid;
                    report.outcomes.insert(field_name, FieldOutcome::Failed);
                    break 'fields;
                }
            }
        }

        debug!(
            status = ?report.status,
            errors = report.errors.len(),
            fields = report.outcomes.len(),
            "record validated"
        );
        report
    }

    fn group_disabled(&self, dep: &Dependency) -> bool {
        match (&self.groups, &dep.group) {
            (Some(groups), Some(group)) => !groups.is_enabled(group),
            // Without a group resolver, group tags are inert.
            _ => false,
        }
    }

    fn describe_violation(
        &self,
        dep: &Dependency,
        value: &Value,
        target_value: Option<&Value>,
    ) -> ValidationError {
        let (code, message) = match target_value {
            None => (
                ErrorCode::TargetNotValidated,
                format!(
                    "'{}' depends on '{}', which was not validated",
                    dep.field_name, dep.target_field
                ),
            ),
            Some(target) => match dep.kind {
                DependencyKind::GreaterThan | DependencyKind::LessThan
                    if as_numeric(value).is_none() || as_numeric(target).is_none() =>
                {
                    (
                        ErrorCode::NonNumericComparison,
                        format!(
                            "'{}' {} '{}' requires numeric values on both sides",
                            dep.field_name, dep.kind, dep.target_field
                        ),
                    )
                }
                _ => (
                    ErrorCode::DependencyViolation,
                    format!(
                        "'{}' violates {} against '{}'",
                        dep.field_name, dep.kind, dep.target_field
                    ),
                ),
            },
        };

        ValidationError {
            field: dep.field_name.clone(),
            target: Some(dep.target_field.clone()),
            level: dep.level,
            code,
            message,
        }
    }

    fn apply_adapter(&self, field_name: &str, value: &Value) -> Result<Value, ValidationError> {
        let Some(adapter) = self.adapters.get(field_name) else {
            return Ok(value.clone());
        };
        if adapter.validate(value) {
            return Ok(adapter.transform(value));
        }
        Err(ValidationError {
            field: field_name.to_string(),
            target: None,
            level: ErrorLevel::Error,
            code: ErrorCode::AdapterRejectedValue,
            message: adapter.errors(value).join("; "),
        })
    }
}

impl fmt::Debug for ValidationOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut adapter_fields: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        adapter_fields.sort_unstable();
        f.debug_struct("ValidationOrchestrator")
            .field("fields", &self.fields)
            .field("groups", &self.groups)
            .field("rules", &self.rules)
            .field("adapters", &adapter_fields)
            .finish()
    }
}
