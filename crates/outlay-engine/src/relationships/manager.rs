//! The [`RelationshipManager`] and its edge admission rules.

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use outlay_core::ErrorCode;
use outlay_core::config::{EntityConfig, RelationshipConfig, RelationshipRules};
use outlay_core::value::scalar_entries;

use super::chain::RelationshipChain;

// ---------------------------------------------------------------------------
// Types and outcomes
// ---------------------------------------------------------------------------

/// A registered relationship type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipTypeDef {
    pub name: String,
    /// Inverse type recorded automatically on every add.
    pub inverse: Option<String>,
    /// Hierarchical types get cycle prevention.
    pub hierarchical: bool,
    pub rules: RelationshipRules,
}

/// Why an edge was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    UnknownType(String),
    ExclusiveConflict,
    CardinalityExceeded(usize),
    WouldCreateCycle,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownType(ty) => write!(f, "relationship type '{ty}' is not configured"),
            Self::ExclusiveConflict => write!(f, "exclusive relationship already present"),
            Self::CardinalityExceeded(max) => {
                write!(f, "cardinality limit of {max} already reached")
            }
            Self::WouldCreateCycle => write!(f, "edge would create a hierarchy cycle"),
        }
    }
}

/// Result of one `add_relationship` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// The exact edge already exists; nothing changed.
    Duplicate,
    Rejected(RejectReason),
}

/// Tally for a batch of edge insertions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkSummary {
    pub added: usize,
    pub duplicates: usize,
    pub rejected: usize,
}

impl LinkSummary {
    fn record(&mut self, outcome: &AddOutcome) {
        match outcome {
            AddOutcome::Added => self.added += 1,
            AddOutcome::Duplicate => self.duplicates += 1,
            AddOutcome::Rejected(_) => self.rejected += 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

/// Typed adjacency over entity keys with inverse maintenance,
/// exclusivity and cardinality enforcement, and hierarchy cycle
/// prevention.
#[derive(Debug, Default)]
pub struct RelationshipManager {
    types: BTreeMap<String, RelationshipTypeDef>,
    /// entity → relationship type → targets, in insertion order.
    edges: HashMap<String, BTreeMap<String, Vec<String>>>,
    flat: Vec<RelationshipConfig>,
    hierarchical: Vec<RelationshipConfig>,
}

impl RelationshipManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a manager from per-entity relationship config, keeping
    /// the declarations around for record processing.
    #[must_use]
    pub fn from_config(entities: &BTreeMap<String, EntityConfig>) -> Self {
        let mut manager = Self::new();
        for entity_cfg in entities.values() {
            for cfg in &entity_cfg.relationships.hierarchical {
                manager.register_config(cfg, true);
                manager.hierarchical.push(cfg.clone());
            }
            for cfg in &entity_cfg.relationships.flat {
                manager.register_config(cfg, false);
                manager.flat.push(cfg.clone());
            }
        }
        manager
    }

    /// Register a relationship type. When an inverse is named and not
    /// yet registered, it gets a mirrored definition; rule checks only
    /// run on the primary direction.
    pub fn register_type(
        &mut self,
        name: impl Into<String>,
        inverse: Option<String>,
        hierarchical: bool,
        rules: RelationshipRules,
    ) {
        let name = name.into();
        if let Some(inv) = &inverse
            && !self.types.contains_key(inv)
        {
            self.types.insert(
                inv.clone(),
                RelationshipTypeDef {
                    name: inv.clone(),
                    inverse: Some(name.clone()),
                    hierarchical,
                    rules: RelationshipRules::default(),
                },
            );
        }
        self.types.insert(
            name.clone(),
            RelationshipTypeDef {
                name,
                inverse,
                hierarchical,
                rules,
            },
        );
    }

    fn register_config(&mut self, cfg: &RelationshipConfig, hierarchical: bool) {
        self.register_type(
            cfg.relation_type.clone(),
            cfg.inverse_type.clone(),
            hierarchical,
            cfg.rules,
        );
    }

    #[must_use]
    pub fn type_def(&self, name: &str) -> Option<&RelationshipTypeDef> {
        self.types.get(name)
    }

    // -----------------------------------------------------------------------
    // Edge admission
    // -----------------------------------------------------------------------

    /// Add one typed edge `from → to`, maintaining the inverse.
    ///
    /// Checks run in order: the type must be registered, the exact
    /// edge must not already exist, exclusivity and cardinality caps
    /// must hold, and for hierarchical types the edge must not close a
    /// cycle (self-links included). The inverse edge is recorded with
    /// deduplication only; its rules are never re-checked.
    pub fn add_relationship(&mut self, from: &str, rel_type: &str, to: &str) -> AddOutcome {
        let Some(def) = self.types.get(rel_type) else {
            warn!(
                code = %ErrorCode::UnknownRelationType,
                rel_type,
                "relationship type not configured"
            );
            return AddOutcome::Rejected(RejectReason::UnknownType(rel_type.to_string()));
        };
        let def = def.clone();

        if def.hierarchical && from == to {
            warn!(
                code = %ErrorCode::RelationshipCycleSkipped,
                from, rel_type,
                "self-link rejected"
            );
            return AddOutcome::Rejected(RejectReason::WouldCreateCycle);
        }

        let existing = self.related_entities(from, rel_type);
        if existing.iter().any(|t| t == to) {
            return AddOutcome::Duplicate;
        }
        if def.rules.exclusive && !existing.is_empty() {
            warn!(
                code = %ErrorCode::ExclusiveConflict,
                from, rel_type, to,
                current = %existing[0],
                "exclusive relationship already present"
            );
            return AddOutcome::Rejected(RejectReason::ExclusiveConflict);
        }
        if let Some(max) = def.rules.max_cardinality
            && existing.len() >= max
        {
            warn!(
                code = %ErrorCode::CardinalityExceeded,
                from, rel_type, to, max,
                "cardinality limit reached"
            );
            return AddOutcome::Rejected(RejectReason::CardinalityExceeded(max));
        }

        // Cycle check: if the hierarchy already reaches `from` when
        // walking down from `to`, this edge would close a loop.
        if def.hierarchical && self.reaches(rel_type, to, from) {
            warn!(
                code = %ErrorCode::RelationshipCycleSkipped,
                from, rel_type, to,
                "edge would create a hierarchy cycle"
            );
            return AddOutcome::Rejected(RejectReason::WouldCreateCycle);
        }

        self.insert_edge(from, rel_type, to);
        if let Some(inverse) = &def.inverse {
            self.insert_edge(to, inverse, from);
        }
        debug!(from, rel_type, to, "relationship added");
        AddOutcome::Added
    }

    fn insert_edge(&mut self, from: &str, rel_type: &str, to: &str) -> bool {
        let targets = self
            .edges
            .entry(from.to_string())
            .or_default()
            .entry(rel_type.to_string())
            .or_default();
        if targets.iter().any(|t| t == to) {
            return false;
        }
        targets.push(to.to_string());
        true
    }

    /// Is `goal` reachable from `start` along edges of `rel_type`?
    fn reaches(&self, rel_type: &str, start: &str, goal: &str) -> bool {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(start);
        seen.insert(start);
        while let Some(current) = queue.pop_front() {
            if current == goal {
                return true;
            }
            for next in self.related_entities(current, rel_type) {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        false
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Targets of `entity` under `rel_type`, in insertion order.
    #[must_use]
    pub fn related_entities(&self, entity: &str, rel_type: &str) -> &[String] {
        self.edges
            .get(entity)
            .and_then(|by_type| by_type.get(rel_type))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every relationship of an entity, grouped by type name.
    #[must_use]
    pub fn all_relationships(&self, entity: &str) -> Vec<(&str, &[String])> {
        self.edges
            .get(entity)
            .map(|by_type| {
                by_type
                    .iter()
                    .map(|(ty, targets)| (ty.as_str(), targets.as_slice()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Lazily walk `path` outward from `start`, one relationship type
    /// per hop. See [`RelationshipChain`] for traversal semantics.
    #[must_use]
    pub fn relationship_chain<'a>(
        &'a self,
        start: &str,
        path: &'a [String],
    ) -> RelationshipChain<'a> {
        RelationshipChain::new(self, start, path)
    }

    // -----------------------------------------------------------------------
    // Record processing
    // -----------------------------------------------------------------------

    /// Apply every configured flat relationship to one record: each
    /// entry in the from-field links to each entry in the to-field
    /// (multi-valued fields produce the cross product).
    pub fn process_flat_relationships(&mut self, record: &Map<String, Value>) -> LinkSummary {
        let configs = self.flat.clone();
        self.process_configs(&configs, record, |cfg| {
            (cfg.from_field.as_deref(), cfg.to_field.as_deref())
        })
    }

    /// Apply every configured hierarchical relationship to one
    /// record's named hierarchy levels.
    pub fn process_hierarchical_relationships(
        &mut self,
        levels: &Map<String, Value>,
    ) -> LinkSummary {
        let configs = self.hierarchical.clone();
        self.process_configs(&configs, levels, |cfg| {
            (cfg.from_level.as_deref(), cfg.to_level.as_deref())
        })
    }

    fn process_configs(
        &mut self,
        configs: &[RelationshipConfig],
        record: &Map<String, Value>,
        keys: impl Fn(&RelationshipConfig) -> (Option<&str>, Option<&str>),
    ) -> LinkSummary {
        let mut summary = LinkSummary::default();
        for cfg in configs {
            let (Some(from_key), Some(to_key)) = keys(cfg) else {
                continue;
            };
            let (Some(from_value), Some(to_value)) = (record.get(from_key), record.get(to_key))
            else {
                continue;
            };
            for from in scalar_entries(from_value) {
                for to in scalar_entries(to_value) {
                    let outcome = self.add_relationship(&from, &cfg.relation_type, &to);
                    summary.record(&outcome);
                }
            }
        }
        summary
    }
}
