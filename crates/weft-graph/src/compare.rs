use std::fmt;
use std::hash::Hash;

use weft_collections::{MapChange, PersistentSet};

use crate::adjacency::Adjacency;
use crate::edge::Edge;
use crate::graph::Graph;

/// The edges leaving one vertex that differ between two graphs.
pub struct GraphDelta<V, E> {
    /// Source vertex of every edge in `before` and `after`.
    pub vertex: V,
    /// Edges only the older graph has.
    pub before: Graph<V, E>,
    /// Edges only the newer graph has.
    pub after: Graph<V, E>,
}

impl<V, E> Graph<V, E>
where
    V: Hash + Eq + Clone,
    E: Hash + Eq + Clone,
{
    /// One [`GraphDelta`] per source vertex whose outgoing edges differ
    /// between `self` and `newer`. Each changed edge appears exactly once.
    pub fn compare(&self, newer: &Self) -> Vec<GraphDelta<V, E>> {
        if self.outgoing.shares_storage(&newer.outgoing) {
            return Vec::new();
        }
        let mut deltas = Vec::new();
        for change in self.outgoing.diff(&newer.outgoing) {
            let (vertex, old, new) = match change {
                MapChange::Added { key, value } => (key, Adjacency::new(), value),
                MapChange::Removed { key, value } => (key, value, Adjacency::new()),
                MapChange::Modified { key, old, new } => (key, old, new),
            };
            let (before, after) = edge_changes(&vertex, &old, &new);
            if !before.is_empty() || !after.is_empty() {
                deltas.push(GraphDelta {
                    vertex,
                    before,
                    after,
                });
            }
        }
        deltas
    }
}

/// `(removed, added)` edges out of `source`.
fn edge_changes<V, E>(
    source: &V,
    old: &Adjacency<V, E>,
    new: &Adjacency<V, E>,
) -> (Graph<V, E>, Graph<V, E>)
where
    V: Hash + Eq + Clone,
    E: Hash + Eq + Clone,
{
    let mut removed = Vec::new();
    let mut added = Vec::new();
    let edges = |target: &V, weights: PersistentSet<E>| {
        weights
            .iter()
            .map(|w| Edge::new(source.clone(), w, target.clone()))
            .collect::<Vec<_>>()
    };
    for change in old.by_vertex().diff(new.by_vertex()) {
        match change {
            MapChange::Added { key, value } => added.extend(edges(&key, value)),
            MapChange::Removed { key, value } => removed.extend(edges(&key, value)),
            MapChange::Modified { key, old, new } => {
                let (gone, came) = old.diff(&new);
                removed.extend(edges(&key, gone));
                added.extend(edges(&key, came));
            }
        }
    }
    (Graph::from_edges(removed), Graph::from_edges(added))
}

impl<V: Clone, E> Clone for GraphDelta<V, E> {
    fn clone(&self) -> Self {
        Self {
            vertex: self.vertex.clone(),
            before: self.before.clone(),
            after: self.after.clone(),
        }
    }
}

impl<V, E> PartialEq for GraphDelta<V, E>
where
    V: Hash + Eq + Clone,
    E: Hash + Eq + Clone,
{
    fn eq(&self, other: &Self) -> bool {
        self.vertex == other.vertex && self.before == other.before && self.after == other.after
    }
}

impl<V, E> fmt::Debug for GraphDelta<V, E>
where
    V: Hash + Eq + Clone + fmt::Debug,
    E: Hash + Eq + Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphDelta")
            .field("vertex", &self.vertex)
            .field("before", &self.before)
            .field("after", &self.after)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type G = Graph<String, i32>;

    fn graph(edges: &[(&str, i32, &str)]) -> G {
        edges
            .iter()
            .map(|(s, w, t)| Edge::new(s.to_string(), *w, t.to_string()))
            .collect()
    }

    fn dense() -> G {
        let letters: Vec<String> = ('a'..='j').map(String::from).collect();
        let mut g = G::new();
        for src in &letters {
            for dst in &letters {
                for w in 1..=10 {
                    g = g.put_edge(src.clone(), dst.clone(), w);
                }
            }
        }
        g
    }

    #[test]
    fn equal_graphs_compare_empty() {
        let g = graph(&[("a", 1, "b")]);
        assert!(g.compare(&g.clone()).is_empty());
        assert!(g.compare(&graph(&[("a", 1, "b")])).is_empty());
    }

    #[test]
    fn changed_weight_is_one_delta() {
        let old = graph(&[("a", 1, "b"), ("c", 1, "d")]);
        let new = old.remove_edge(&"a".into(), &"b".into(), &1).put_edge("a".into(), "b".into(), 2);

        let deltas = old.compare(&new);

        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].vertex, "a");
        assert_eq!(deltas[0].before, graph(&[("a", 1, "b")]));
        assert_eq!(deltas[0].after, graph(&[("a", 2, "b")]));
    }

    #[test]
    fn deltas_isolate_each_source() {
        let g = dense();
        let mutated = g
            .remove_edge(&"a".into(), &"b".into(), &1)
            .remove_edge(&"b".into(), &"c".into(), &2)
            .put_edge("a".into(), "b".into(), 0);

        let mut deltas = g.compare(&mutated);
        deltas.sort_by(|x, y| x.vertex.cmp(&y.vertex));

        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0].vertex, "a");
        assert_eq!(deltas[0].before, graph(&[("a", 1, "b")]));
        assert_eq!(deltas[0].after, graph(&[("a", 0, "b")]));
        assert_eq!(deltas[1].vertex, "b");
        assert_eq!(deltas[1].before, graph(&[("b", 2, "c")]));
        assert!(deltas[1].after.is_empty());
    }

    #[test]
    fn vanished_and_new_sources() {
        let old = graph(&[("a", 1, "b")]);
        let new = graph(&[("c", 1, "b")]);
        let mut deltas = old.compare(&new);
        deltas.sort_by(|x, y| x.vertex.cmp(&y.vertex));
        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0].before, old);
        assert!(deltas[0].after.is_empty());
        assert!(deltas[1].before.is_empty());
        assert_eq!(deltas[1].after, new);
    }
}
