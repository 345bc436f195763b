//! Cycle detection over filtered sub-graphs.
//!
//! Both entry points build the successor lists of the induced sub-graph and
//! run Kahn's elimination over them: vertices with no remaining incoming
//! edges are peeled off until none are left. Whatever survives lies on or
//! behind a cycle. No recursion, so graph depth does not matter.

use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;

use tracing::trace;

use crate::graph::Graph;

type Successors<V> = HashMap<V, Vec<V>>;

impl<V, E> Graph<V, E>
where
    V: Hash + Eq + Clone,
    E: Hash + Eq + Clone,
{
    /// Returns `true` if the sub-graph of vertices passing `node_filter` and
    /// edges passing `edge_filter` contains a directed cycle.
    pub fn has_cycles(
        &self,
        node_filter: impl Fn(&V) -> bool,
        edge_filter: impl Fn(&V, &E, &V) -> bool,
    ) -> bool {
        let mut successors = Successors::new();
        for vertex in self.nodes().iter() {
            if node_filter(&vertex) {
                let next = self.successors(&vertex, &node_filter, &edge_filter);
                successors.insert(vertex, next);
            }
        }
        let cyclic = has_cycle(&successors);
        trace!(vertices = successors.len(), cyclic, "checked graph for cycles");
        cyclic
    }

    /// Like [`has_cycles`](Self::has_cycles), restricted to cycles reachable
    /// from `start`.
    pub fn has_cycles_from(
        &self,
        node_filter: impl Fn(&V) -> bool,
        edge_filter: impl Fn(&V, &E, &V) -> bool,
        start: &V,
    ) -> bool {
        if !self.contains_node(start) || !node_filter(start) {
            return false;
        }
        let mut successors = Successors::new();
        let mut queue = VecDeque::from([start.clone()]);
        let mut seen = HashSet::from([start.clone()]);
        while let Some(vertex) = queue.pop_front() {
            let next = self.successors(&vertex, &node_filter, &edge_filter);
            for target in &next {
                if seen.insert(target.clone()) {
                    queue.push_back(target.clone());
                }
            }
            successors.insert(vertex, next);
        }
        let cyclic = has_cycle(&successors);
        trace!(reachable = successors.len(), cyclic, "checked graph for cycles from start");
        cyclic
    }

    /// Targets of `vertex` joined by at least one accepted edge.
    fn successors(
        &self,
        vertex: &V,
        node_filter: &impl Fn(&V) -> bool,
        edge_filter: &impl Fn(&V, &E, &V) -> bool,
    ) -> Vec<V> {
        let Some(adj) = self.outgoing.get_entry(vertex) else {
            return Vec::new();
        };
        let mut next = Vec::new();
        adj.by_vertex().for_each(|target, weights| {
            if node_filter(target) && weights.iter().any(|w| edge_filter(vertex, &w, target)) {
                next.push(target.clone());
            }
        });
        next
    }
}

/// Kahn's elimination. `successors` must hold every vertex its lists name.
fn has_cycle<V: Hash + Eq>(successors: &Successors<V>) -> bool {
    let mut in_degree: HashMap<&V, usize> = successors.keys().map(|v| (v, 0)).collect();
    for targets in successors.values() {
        for target in targets {
            if let Some(degree) = in_degree.get_mut(target) {
                *degree += 1;
            }
        }
    }

    let mut queue: VecDeque<&V> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(v, _)| *v)
        .collect();
    let mut removed = 0usize;
    while let Some(vertex) = queue.pop_front() {
        removed += 1;
        for target in successors.get(vertex).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(target) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(target);
                }
            }
        }
    }
    removed < successors.len()
}
