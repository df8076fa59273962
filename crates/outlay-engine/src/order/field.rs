//! Field-level dependency ordering.
//!
//! # Edge Direction
//!
//! A dependency "`field` depends on `target`" is stored as the edge
//! `target → field`: the target must be validated first, and the
//! graph's topological order ("from before to") is then directly the
//! validation order.
//!
//! # Cycle Policy
//!
//! A cycle in the field graph does **not** halt processing. The order
//! request degrades to a deterministic lexicographic order over all
//! known fields, logs an error with the cycle members, and counts the
//! event — the degradation changes validation semantics without
//! failing the run, so it must stay loud and observable.

#![allow(clippy::module_name_repetitions)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, error};

use outlay_core::ErrorCode;
use outlay_core::config::FieldConfig;
use outlay_core::rules::Dependency;

use crate::graph::{DependencyGraph, find_cycle_groups};

/// Resolves the order in which record fields must be validated.
#[derive(Debug, Default)]
pub struct FieldDependencyResolver {
    graph: DependencyGraph,
    /// Declared dependencies per field, in declaration order.
    dependencies: BTreeMap<String, Vec<Dependency>>,
    /// Times an order request fell back to lexicographic ordering.
    cycle_fallbacks: AtomicU64,
}

impl FieldDependencyResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a resolver from per-field configs. Every configured field
    /// becomes a node even when it declares no dependencies, so it
    /// still appears in the validation order.
    #[must_use]
    pub fn from_config(fields: &BTreeMap<String, FieldConfig>) -> Self {
        let mut resolver = Self::new();
        for (field_name, cfg) in fields {
            resolver.graph.add_node(field_name);
            for dep_cfg in &cfg.validation.dependencies {
                resolver.add_dependency(dep_cfg.clone().into_dependency(field_name));
            }
        }
        resolver
    }

    /// Register one dependency: `dep.field_name` depends on
    /// `dep.target_field`. Invalidates any cached order.
    pub fn add_dependency(&mut self, dep: Dependency) {
        // Target first: edge target → field.
        self.graph.add_edge(&dep.target_field, &dep.field_name);
        self.dependencies
            .entry(dep.field_name.clone())
            .or_default()
            .push(dep);
    }

    /// The order in which fields must be validated.
    ///
    /// Topological when the graph is acyclic. On a cycle: every known
    /// field in lexicographic order, with an error logged naming the
    /// cycle groups — degrade, don't crash.
    #[must_use]
    pub fn validation_order(&self) -> Vec<String> {
        let (order, acyclic) = self.graph.topological_order();
        if acyclic {
            debug!(fields = order.len(), "field validation order computed");
            return order;
        }

        self.cycle_fallbacks.fetch_add(1, Ordering::Relaxed);
        let fallback = self.graph.nodes();
        error!(
            code = %ErrorCode::FieldCycleFallback,
            cycles = ?self.cycle_groups(),
            "field dependency cycle; falling back to lexicographic order"
        );
        fallback
    }

    /// Fields whose validation depends (directly) on `field`.
    #[must_use]
    pub fn dependent_fields(&self, field: &str) -> Vec<String> {
        self.graph.successors(field)
    }

    /// The declared dependencies of one field, in declaration order.
    #[must_use]
    pub fn field_dependencies(&self, field: &str) -> &[Dependency] {
        self.dependencies
            .get(field)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Would registering "`field` depends on `target`" create a cycle?
    ///
    /// True when `target` is already (transitively) waiting on `field`
    /// in the existing graph. Checked *before* the edge is added, so
    /// config loaders can reject the entry instead of degrading later.
    /// Relies on `has_path` treating a node as trivially reachable
    /// from itself; that is what makes `field == target` circular
    /// here, with no self-edge required.
    #[must_use]
    pub fn is_circular_dependency(&self, field: &str, target: &str) -> bool {
        self.graph.has_path(field, target)
    }

    /// Cycle groups currently present in the field graph.
    #[must_use]
    pub fn cycle_groups(&self) -> Vec<Vec<String>> {
        find_cycle_groups(&self.graph)
    }

    /// How many order requests degraded to the lexicographic fallback.
    #[must_use]
    pub fn cycle_fallbacks(&self) -> u64 {
        self.cycle_fallbacks.load(Ordering::Relaxed)
    }

    /// All fields known to the resolver, sorted.
    #[must_use]
    pub fn known_fields(&self) -> Vec<String> {
        self.graph.nodes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outlay_core::rules::{DependencyKind, DependencyRule, ErrorLevel};

    fn dep(field: &str, target: &str) -> Dependency {
        Dependency {
            field_name: field.to_string(),
            target_field: target.to_string(),
            kind: DependencyKind::Equals,
            rule: DependencyRule::default(),
            level: ErrorLevel::Error,
            group: None,
        }
    }

    // -----------------------------------------------------------------------
    // Ordering
    // -----------------------------------------------------------------------

    #[test]
    fn targets_come_before_dependents() {
        let mut r = FieldDependencyResolver::new();
        r.add_dependency(dep("amount", "max_amount"));
        r.add_dependency(dep("fee", "amount"));

        let order = r.validation_order();
        let pos = |f: &str| order.iter().position(|n| n == f).expect("present");
        assert!(pos("max_amount") < pos("amount"));
        assert!(pos("amount") < pos("fee"));
        assert_eq!(r.cycle_fallbacks(), 0);
    }

    #[test]
    fn order_is_a_permutation_of_all_fields() {
        let mut r = FieldDependencyResolver::new();
        r.add_dependency(dep("b", "a"));
        r.add_dependency(dep("d", "c"));

        let mut order = r.validation_order();
        order.sort_unstable();
        assert_eq!(order, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn cycle_falls_back_to_lexicographic() {
        let mut r = FieldDependencyResolver::new();
        r.add_dependency(dep("a", "b"));
        r.add_dependency(dep("b", "a"));

        let order = r.validation_order();
        assert_eq!(order, vec!["a", "b"], "deterministic lexicographic order");
        assert_eq!(r.cycle_fallbacks(), 1);

        // Every request counts; the defect stays observable.
        let again = r.validation_order();
        assert_eq!(again, order);
        assert_eq!(r.cycle_fallbacks(), 2);
        assert_eq!(r.cycle_groups(), vec![vec!["a".to_string(), "b".to_string()]]);
    }

    #[test]
    fn independent_fields_still_appear_in_order() {
        let mut fields: BTreeMap<String, FieldConfig> = BTreeMap::new();
        fields.insert("standalone".to_string(), FieldConfig::default());
        fields.insert("other".to_string(), FieldConfig::default());

        let r = FieldDependencyResolver::from_config(&fields);
        let mut order = r.validation_order();
        order.sort_unstable();
        assert_eq!(order, vec!["other", "standalone"]);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    #[test]
    fn dependent_fields_are_graph_successors() {
        let mut r = FieldDependencyResolver::new();
        r.add_dependency(dep("amount", "max_amount"));
        r.add_dependency(dep("fee", "max_amount"));

        assert_eq!(r.dependent_fields("max_amount"), vec!["amount", "fee"]);
        assert!(r.dependent_fields("amount").is_empty());
    }

    #[test]
    fn field_dependencies_keep_declaration_order() {
        let mut r = FieldDependencyResolver::new();
        r.add_dependency(dep("x", "b"));
        r.add_dependency(dep("x", "a"));

        let deps = r.field_dependencies("x");
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].target_field, "b");
        assert_eq!(deps[1].target_field, "a");
        assert!(r.field_dependencies("unknown").is_empty());
    }

    #[test]
    fn circular_dependency_check_before_adding() {
        let mut r = FieldDependencyResolver::new();
        r.add_dependency(dep("b", "a")); // edge a → b

        // "a depends on b" would close the loop.
        assert!(r.is_circular_dependency("a", "b"));
        // "c depends on a" is fine.
        assert!(!r.is_circular_dependency("c", "a"));
        // Self-dependency is circular by definition.
        assert!(r.is_circular_dependency("a", "a"));
    }

    #[test]
    fn self_dependency_is_circular_without_a_self_edge() {
        let mut fields: BTreeMap<String, FieldConfig> = BTreeMap::new();
        fields.insert("amount".to_string(), FieldConfig::default());
        let r = FieldDependencyResolver::from_config(&fields);

        // No edges exist; the check still refuses field == target for
        // any known field.
        assert!(r.is_circular_dependency("amount", "amount"));
        assert!(!r.is_circular_dependency("unknown", "unknown"));
    }
}
