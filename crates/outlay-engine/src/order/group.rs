//! Validation-group ordering.
//!
//! Groups come from static configuration, so a broken group layout is
//! a deployment defect: an unknown dependency or a dependency cycle
//! fails resolver construction instead of degrading at runtime.
//!
//! # Edge Direction
//!
//! The group graph stores `group → dependency`. Evaluation therefore
//! runs the topological order in reverse, so every group's
//! dependencies are evaluated before the group itself.

#![allow(clippy::module_name_repetitions)]

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::error;

use outlay_core::ErrorCode;
use outlay_core::config::GroupConfig;
use outlay_core::rules::ErrorLevel;

use crate::graph::{DependencyGraph, find_cycle_groups};

/// A resolved validation group.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationGroup {
    pub id: String,
    pub name: String,
    pub rules: Vec<String>,
    pub enabled: bool,
    pub error_level: ErrorLevel,
    pub dependencies: Vec<String>,
}

impl From<GroupConfig> for ValidationGroup {
    fn from(cfg: GroupConfig) -> Self {
        Self {
            id: cfg.id,
            name: cfg.name,
            rules: cfg.rules,
            enabled: cfg.enabled,
            error_level: cfg.error_level,
            dependencies: cfg.dependencies,
        }
    }
}

/// Fatal group configuration defects.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GroupConfigError {
    #[error("group '{group}' depends on unknown group '{dependency}'")]
    UnknownDependency { group: String, dependency: String },
    #[error("dependency cycle between validation groups: {members:?}")]
    CycleDetected { members: Vec<String> },
    #[error("duplicate validation group id '{0}'")]
    DuplicateGroup(String),
}

/// Resolves validation groups into a dependency-respecting order.
#[derive(Debug)]
pub struct ValidationGroupResolver {
    groups: BTreeMap<String, ValidationGroup>,
    /// Group ids in evaluation order (dependencies first).
    evaluation_order: Vec<String>,
}

impl ValidationGroupResolver {
    /// Build a resolver from group configs.
    ///
    /// # Errors
    ///
    /// [`GroupConfigError::DuplicateGroup`] on a repeated id,
    /// [`GroupConfigError::UnknownDependency`] when a group names a
    /// dependency that is not itself a group, and
    /// [`GroupConfigError::CycleDetected`] when the dependency graph
    /// is cyclic. All three abort processing: the config must be
    /// fixed, not worked around.
    pub fn new(configs: Vec<GroupConfig>) -> Result<Self, GroupConfigError> {
        let mut groups: BTreeMap<String, ValidationGroup> = BTreeMap::new();
        for cfg in configs {
            if groups.contains_key(&cfg.id) {
                return Err(GroupConfigError::DuplicateGroup(cfg.id));
            }
            groups.insert(cfg.id.clone(), cfg.into());
        }

        let mut graph = DependencyGraph::new();
        for group in groups.values() {
            graph.add_node(&group.id);
            for dep in &group.dependencies {
                if !groups.contains_key(dep) {
                    error!(
                        code = %ErrorCode::UnknownGroupDependency,
                        group = %group.id,
                        dependency = %dep,
                        "unknown group dependency"
                    );
                    return Err(GroupConfigError::UnknownDependency {
                        group: group.id.clone(),
                        dependency: dep.clone(),
                    });
                }
                graph.add_edge(&group.id, dep);
            }
        }

        let (order, acyclic) = graph.topological_order();
        if !acyclic {
            let members: Vec<String> =
                find_cycle_groups(&graph).into_iter().flatten().collect();
            error!(
                code = %ErrorCode::GroupCycleDetected,
                members = ?members,
                "validation group dependency cycle"
            );
            return Err(GroupConfigError::CycleDetected { members });
        }

        // Edges point group → dependency, so reverse to run
        // dependencies first.
        let evaluation_order: Vec<String> = order.into_iter().rev().collect();

        Ok(Self {
            groups,
            evaluation_order,
        })
    }

    /// Group ids in evaluation order, dependencies before dependents.
    #[must_use]
    pub fn evaluation_order(&self) -> &[String] {
        &self.evaluation_order
    }

    /// Rule ids of a group, or empty when the group is unknown or
    /// disabled.
    #[must_use]
    pub fn group_rules(&self, id: &str) -> Vec<String> {
        self.groups
            .get(id)
            .filter(|g| g.enabled)
            .map(|g| g.rules.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_enabled(&self, id: &str) -> bool {
        self.groups.get(id).is_some_and(|g| g.enabled)
    }

    #[must_use]
    pub fn group(&self, id: &str) -> Option<&ValidationGroup> {
        self.groups.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(id: &str, deps: &[&str]) -> GroupConfig {
        GroupConfig {
            id: id.to_string(),
            name: id.to_string(),
            rules: vec![format!("{id}_rule")],
            enabled: true,
            error_level: ErrorLevel::Error,
            dependencies: deps.iter().map(ToString::to_string).collect(),
        }
    }

    // -----------------------------------------------------------------------
    // Ordering
    // -----------------------------------------------------------------------

    #[test]
    fn dependencies_evaluate_before_dependents() {
        let resolver = ValidationGroupResolver::new(vec![
            group("derived", &["base", "amounts"]),
            group("base", &[]),
            group("amounts", &["base"]),
        ])
        .expect("valid config");

        let order = resolver.evaluation_order();
        let pos = |id: &str| order.iter().position(|g| g == id).expect("present");
        assert!(pos("base") < pos("amounts"));
        assert!(pos("amounts") < pos("derived"));
        assert_eq!(order.len(), 3);
    }

    #[test]
    fn independent_groups_all_appear() {
        let resolver =
            ValidationGroupResolver::new(vec![group("a", &[]), group("b", &[])])
                .expect("valid config");
        let mut order = resolver.evaluation_order().to_vec();
        order.sort_unstable();
        assert_eq!(order, vec!["a", "b"]);
    }

    // -----------------------------------------------------------------------
    // Fatal configuration defects
    // -----------------------------------------------------------------------

    #[test]
    fn unknown_dependency_is_fatal() {
        let err = ValidationGroupResolver::new(vec![group("a", &["missing"])])
            .expect_err("must fail");
        assert_eq!(
            err,
            GroupConfigError::UnknownDependency {
                group: "a".to_string(),
                dependency: "missing".to_string(),
            }
        );
    }

    #[test]
    fn cycle_is_fatal_and_names_members() {
        let err = ValidationGroupResolver::new(vec![
            group("a", &["b"]),
            group("b", &["a"]),
            group("c", &[]),
        ])
        .expect_err("must fail");
        match err {
            GroupConfigError::CycleDetected { mut members } => {
                members.sort_unstable();
                assert_eq!(members, vec!["a", "b"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_group_id_is_fatal() {
        let err = ValidationGroupResolver::new(vec![group("a", &[]), group("a", &[])])
            .expect_err("must fail");
        assert_eq!(err, GroupConfigError::DuplicateGroup("a".to_string()));
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    #[test]
    fn disabled_group_yields_no_rules() {
        let mut disabled = group("dates", &[]);
        disabled.enabled = false;

        let resolver = ValidationGroupResolver::new(vec![group("amounts", &[]), disabled])
            .expect("valid config");

        assert_eq!(resolver.group_rules("amounts"), vec!["amounts_rule"]);
        assert!(resolver.group_rules("dates").is_empty());
        assert!(resolver.group_rules("unknown").is_empty());
        assert!(resolver.is_enabled("amounts"));
        assert!(!resolver.is_enabled("dates"));
        assert!(!resolver.is_enabled("unknown"));

        // The group itself stays inspectable even when disabled.
        assert!(resolver.group("dates").is_some());
        assert_eq!(resolver.len(), 2);
    }
}
