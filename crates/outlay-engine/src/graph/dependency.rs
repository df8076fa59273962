//! The [`DependencyGraph`] type.

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::RwLock;

use petgraph::Direction;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};

/// A directed graph over string ids with a cached topological order.
///
/// Mutation (`add_node`, `add_edge`) requires `&mut self`; reads are
/// `&self` and may run concurrently. The cached order is invalidated
/// by a version counter bumped on every mutation.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    pub(crate) graph: DiGraph<String, ()>,
    pub(crate) node_map: HashMap<String, NodeIndex>,
    version: u64,
    cached: RwLock<Option<CachedOrder>>,
}

#[derive(Debug, Clone)]
struct CachedOrder {
    version: u64,
    order: Vec<String>,
    acyclic: bool,
}

impl DependencyGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node if absent. Returns `true` when the node was new.
    pub fn add_node(&mut self, id: &str) -> bool {
        if self.node_map.contains_key(id) {
            return false;
        }
        let idx = self.graph.add_node(id.to_string());
        self.node_map.insert(id.to_string(), idx);
        self.version += 1;
        true
    }

    /// Insert a directed edge `from → to`, creating missing endpoint
    /// nodes. Adding an existing edge is a no-op; returns `true` when
    /// the edge was new. Self-loops are inserted as given — they show
    /// up as cycles, never get silently dropped.
    pub fn add_edge(&mut self, from: &str, to: &str) -> bool {
        self.add_node(from);
        self.add_node(to);
        let from_idx = self.node_map[from];
        let to_idx = self.node_map[to];
        if self.graph.contains_edge(from_idx, to_idx) {
            return false;
        }
        self.graph.add_edge(from_idx, to_idx, ());
        self.version += 1;
        true
    }

    #[must_use]
    pub fn contains_node(&self, id: &str) -> bool {
        self.node_map.contains_key(id)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All node ids, sorted.
    #[must_use]
    pub fn nodes(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.node_map.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    /// Direct successors of a node, sorted. Unknown nodes yield empty.
    #[must_use]
    pub fn successors(&self, id: &str) -> Vec<String> {
        self.neighbor_ids(id, Direction::Outgoing)
    }

    /// Direct predecessors of a node, sorted. Unknown nodes yield empty.
    #[must_use]
    pub fn predecessors(&self, id: &str) -> Vec<String> {
        self.neighbor_ids(id, Direction::Incoming)
    }

    fn neighbor_ids(&self, id: &str, dir: Direction) -> Vec<String> {
        let Some(&idx) = self.node_map.get(id) else {
            return Vec::new();
        };
        let mut out: Vec<String> = self
            .graph
            .neighbors_directed(idx, dir)
            .filter_map(|n| self.graph.node_weight(n).cloned())
            .collect();
        out.sort_unstable();
        out
    }

    /// A topological order respecting every edge as "from before to".
    ///
    /// Returns `(order, true)` on success. When the graph contains a
    /// cycle, returns `(empty, false)` — the caller decides the
    /// fallback policy (and must log it as a configuration defect,
    /// never accept it as correct ordering).
    ///
    /// The result is cached against the graph's version; repeated
    /// reads between mutations are free.
    #[must_use]
    pub fn topological_order(&self) -> (Vec<String>, bool) {
        if let Ok(guard) = self.cached.read()
            && let Some(cached) = guard.as_ref()
            && cached.version == self.version
        {
            return (cached.order.clone(), cached.acyclic);
        }

        let (order, acyclic) = match toposort(&self.graph, None) {
            Ok(indices) => (
                indices
                    .into_iter()
                    .filter_map(|idx| self.graph.node_weight(idx).cloned())
                    .collect(),
                true,
            ),
            Err(_) => (Vec::new(), false),
        };

        if let Ok(mut guard) = self.cached.write() {
            *guard = Some(CachedOrder {
                version: self.version,
                order: order.clone(),
                acyclic,
            });
        }

        (order, acyclic)
    }

    /// Strongly connected components, each sorted, outer list sorted.
    ///
    /// A component of size > 1 (or a self-loop) marks a cycle group;
    /// see [`super::cycles::find_cycle_groups`] for that filtered view.
    #[must_use]
    pub fn strongly_connected_components(&self) -> Vec<Vec<String>> {
        let mut components: Vec<Vec<String>> = tarjan_scc(&self.graph)
            .into_iter()
            .map(|component| {
                let mut ids: Vec<String> = component
                    .into_iter()
                    .filter_map(|idx| self.graph.node_weight(idx).cloned())
                    .collect();
                ids.sort_unstable();
                ids
            })
            .collect();
        components.sort_unstable();
        components
    }

    /// Is `to` reachable from `from` along directed edges?
    ///
    /// `from == to` is reachable by the trivial path whenever the node
    /// exists. Unknown endpoints are never reachable. Self-dependency
    /// rejection in the field resolver leans on the trivial-path case;
    /// switching this to edge-respecting reachability would need a
    /// self-edge check there.
    #[must_use]
    pub fn has_path(&self, from: &str, to: &str) -> bool {
        let (Some(&start), Some(&goal)) = (self.node_map.get(from), self.node_map.get(to)) else {
            return false;
        };
        if start == goal {
            return true;
        }

        let mut queue: VecDeque<NodeIndex> = VecDeque::from([start]);
        let mut visited: HashSet<NodeIndex> = HashSet::from([start]);
        while let Some(current) = queue.pop_front() {
            for next in self.graph.neighbors_directed(current, Direction::Outgoing) {
                if next == goal {
                    return true;
                }
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        false
    }

    /// Every node with a directed path **to** `id` (excluding `id`).
    #[must_use]
    pub fn ancestors(&self, id: &str) -> BTreeSet<String> {
        self.reachable(id, Direction::Incoming)
    }

    /// Every node with a directed path **from** `id` (excluding `id`).
    #[must_use]
    pub fn descendants(&self, id: &str) -> BTreeSet<String> {
        self.reachable(id, Direction::Outgoing)
    }

    fn reachable(&self, id: &str, dir: Direction) -> BTreeSet<String> {
        let Some(&start) = self.node_map.get(id) else {
            return BTreeSet::new();
        };

        let mut out = BTreeSet::new();
        let mut queue: VecDeque<NodeIndex> = VecDeque::from([start]);
        let mut visited: HashSet<NodeIndex> = HashSet::from([start]);
        while let Some(current) = queue.pop_front() {
            for next in self.graph.neighbors_directed(current, dir) {
                if visited.insert(next) {
                    if let Some(name) = self.graph.node_weight(next) {
                        out.insert(name.clone());
                    }
                    queue.push_back(next);
                }
            }
        }
        out
    }
}
