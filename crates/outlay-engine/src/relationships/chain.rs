//! Lazy multi-hop relationship traversal.

use std::collections::VecDeque;

use super::manager::RelationshipManager;

/// Iterator over the entities reached by following a relationship
/// path outward from a start entity, one type per hop.
///
/// Expansion is buffered per hop: the next hop's frontier is only
/// computed once the current hop's entities have all been yielded.
/// Every arrival is yielded, so an entity reachable through several
/// routes appears once per route. The start entity is a position, not
/// an arrival; it shows up only if the path leads back to it. The
/// iterator is single-pass.
#[derive(Debug)]
pub struct RelationshipChain<'a> {
    manager: &'a RelationshipManager,
    path: &'a [String],
    hop: usize,
    /// Entities at the current hop, pending expansion.
    frontier: Vec<String>,
    pending: VecDeque<String>,
}

impl<'a> RelationshipChain<'a> {
    pub(super) fn new(manager: &'a RelationshipManager, start: &str, path: &'a [String]) -> Self {
        Self {
            manager,
            path,
            hop: 0,
            frontier: vec![start.to_string()],
            pending: VecDeque::new(),
        }
    }
}

impl Iterator for RelationshipChain<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if let Some(entity) = self.pending.pop_front() {
                return Some(entity);
            }
            if self.hop >= self.path.len() || self.frontier.is_empty() {
                return None;
            }

            let rel_type = &self.path[self.hop];
            self.hop += 1;
            let next: Vec<String> = self
                .frontier
                .iter()
                .flat_map(|entity| self.manager.related_entities(entity, rel_type))
                .cloned()
                .collect();
            self.pending.extend(next.iter().cloned());
            self.frontier = next;
        }
    }
}
