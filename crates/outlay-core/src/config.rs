//! Declarative dataset configuration.
//!
//! The serde model for everything the engine consumes from config:
//! per-field cross-field dependencies and adapters, validation
//! groups, and per-entity relationship declarations. Schema
//! validation of the raw file (JSON-Schema) happens upstream; this
//! module only parses and applies defaults.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::adapter::AdapterSpec;
use crate::rules::{Dependency, DependencyKind, DependencyRule, ErrorLevel};

/// Root of a dataset's processing configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Field name → validation config, for one record layout.
    #[serde(default)]
    pub fields: BTreeMap<String, FieldConfig>,
    /// Validation groups (static rule sets with group dependencies).
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
    /// Entity type → relationship declarations.
    #[serde(default)]
    pub entities: BTreeMap<String, EntityConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldConfig {
    #[serde(default)]
    pub validation: FieldValidation,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldValidation {
    #[serde(default)]
    pub dependencies: Vec<DependencyConfig>,
    /// Optional adapter run after the field's dependencies pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adapter: Option<AdapterSpec>,
}

/// One dependency entry under a field's `validation.dependencies`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyConfig {
    #[serde(rename = "type")]
    pub kind: DependencyKind,
    pub target_field: String,
    #[serde(default)]
    pub validation_rule: DependencyRule,
    #[serde(default)]
    pub error_level: ErrorLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl DependencyConfig {
    /// Attach the owning field's name to produce a full [`Dependency`].
    #[must_use]
    pub fn into_dependency(self, field_name: &str) -> Dependency {
        Dependency {
            field_name: field_name.to_string(),
            target_field: self.target_field,
            kind: self.kind,
            rule: self.validation_rule,
            level: self.error_level,
            group: self.group,
        }
    }
}

/// A validation group: a named, toggleable set of rule ids with
/// dependencies on other groups. Group misconfiguration is fatal at
/// resolver construction — groups come from static config, not from
/// record data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rules: Vec<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub error_level: ErrorLevel,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityConfig {
    #[serde(default)]
    pub relationships: RelationshipSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationshipSection {
    /// Parent/child links subject to cycle prevention.
    #[serde(default)]
    pub hierarchical: Vec<RelationshipConfig>,
    /// Plain typed links with no hierarchy semantics.
    #[serde(default)]
    pub flat: Vec<RelationshipConfig>,
}

/// One declarative relationship. Flat configs use
/// `from_field`/`to_field` (record field names whose values are entity
/// keys); hierarchical configs use `from_level`/`to_level` (named
/// levels of the entity hierarchy for one record).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipConfig {
    #[serde(rename = "type")]
    pub relation_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverse_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_level: Option<String>,
    #[serde(default)]
    pub rules: RelationshipRules,
}

/// Constraints on a relationship type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipRules {
    /// At most one outgoing edge of this type per source.
    #[serde(default)]
    pub exclusive: bool,
    /// Upper bound on outgoing edges of this type per source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cardinality: Option<usize>,
}

/// Load a dataset config from a YAML file.
///
/// A missing file yields the default (empty) config; a present file
/// that fails to parse is an error.
///
/// # Errors
///
/// Read or parse failures, with the path in context.
pub fn load_dataset_config(path: &Path) -> Result<DatasetConfig> {
    if !path.exists() {
        return Ok(DatasetConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    serde_yaml::from_str::<DatasetConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

const fn default_true() -> bool {
    true
}
