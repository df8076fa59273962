//! Incremental and full-cycle detection over a [`DependencyGraph`].
//!
//! # Edge Direction
//!
//! Edges mean "from before to". Adding `from → to` closes a cycle
//! exactly when `from` is already reachable from `to` through
//! existing edges.

#![allow(clippy::module_name_repetitions)]

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::Direction;
use petgraph::graph::NodeIndex;

use super::dependency::DependencyGraph;

/// Check whether adding `from → to` would introduce a cycle.
///
/// Returns the concrete cycle path when one would be created,
/// formatted `from → to → … → from`. An edge that already exists
/// returns `None` — no *new* cycle is created. Unknown endpoints are
/// safe: a node not yet in the graph cannot close anything.
#[must_use]
pub fn would_create_cycle(
    graph: &DependencyGraph,
    from: &str,
    to: &str,
) -> Option<Vec<String>> {
    if from == to {
        return Some(vec![from.to_string(), from.to_string()]);
    }

    let (Some(&from_idx), Some(&to_idx)) = (graph.node_map.get(from), graph.node_map.get(to))
    else {
        return None;
    };

    if graph.graph.contains_edge(from_idx, to_idx) {
        return None;
    }

    // Walk the frontier outward from `to`; hitting `from` means the
    // prospective edge would close a loop, and the recorded parents
    // give the path to report.
    let mut queue: VecDeque<NodeIndex> = VecDeque::from([to_idx]);
    let mut visited: HashSet<NodeIndex> = HashSet::from([to_idx]);
    let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();

    while let Some(current) = queue.pop_front() {
        if current == from_idx {
            return Some(reconstruct_cycle_path(graph, from_idx, to_idx, &parent));
        }
        for next in graph.graph.neighbors_directed(current, Direction::Outgoing) {
            if visited.insert(next) {
                parent.insert(next, current);
                queue.push_back(next);
            }
        }
    }

    None
}

/// All cycle groups currently in the graph: SCCs of size > 1 plus
/// self-loops, each sorted, outer list sorted. Used for diagnostics
/// when an order request discovers a misconfigured dependency set.
#[must_use]
pub fn find_cycle_groups(graph: &DependencyGraph) -> Vec<Vec<String>> {
    graph
        .strongly_connected_components()
        .into_iter()
        .filter(|component| component.len() > 1 || has_self_loop(graph, component))
        .collect()
}

fn has_self_loop(graph: &DependencyGraph, component: &[String]) -> bool {
    component.first().is_some_and(|id| {
        graph
            .node_map
            .get(id)
            .is_some_and(|&idx| graph.graph.find_edge(idx, idx).is_some())
    })
}

fn reconstruct_cycle_path(
    graph: &DependencyGraph,
    from: NodeIndex,
    to: NodeIndex,
    parent: &HashMap<NodeIndex, NodeIndex>,
) -> Vec<String> {
    // Follow parent links back from `from` to `to`, then put `from`
    // at the head to stand for the edge that would close the loop.
    let mut reversed: Vec<NodeIndex> = vec![from];
    let mut cursor = from;
    while cursor != to {
        let Some(&next) = parent.get(&cursor) else {
            break;
        };
        cursor = next;
        reversed.push(cursor);
    }
    reversed.reverse();

    let name = |idx: NodeIndex| {
        graph
            .graph
            .node_weight(idx)
            .cloned()
            .unwrap_or_else(|| format!("#{}", idx.index()))
    };

    let mut cycle: Vec<String> = Vec::with_capacity(reversed.len() + 1);
    cycle.push(name(from));
    cycle.extend(reversed.into_iter().map(name));
    cycle
}
