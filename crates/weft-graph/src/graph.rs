use std::fmt;
use std::hash::{Hash, Hasher};

use tracing::debug;
use weft_collections::{Cursor, DefaultMap, PersistentSet};
use weft_types::{CollectionError, CollectionResult};

use crate::adjacency::Adjacency;
use crate::edge::Edge;

/// Vertex to adjacency, for one direction.
pub type Index<V, E> = DefaultMap<V, Adjacency<V, E>>;

/// An immutable directed multigraph.
///
/// Edges are `(source, weight, target)` triples; any number of differently
/// weighted edges may join the same pair of vertices. The graph keeps two
/// indices, `outgoing` (source to targets) and `incoming` (target to
/// sources), which are always exact transposes of each other.
///
/// Vertices exist only through their edges: removing a vertex's last edge
/// removes the vertex.
pub struct Graph<V, E> {
    pub(crate) outgoing: Index<V, E>,
    pub(crate) incoming: Index<V, E>,
}

impl<V, E> Graph<V, E> {
    pub fn new() -> Self {
        Self {
            outgoing: DefaultMap::new(),
            incoming: DefaultMap::new(),
        }
    }

    pub(crate) fn from_indices(outgoing: Index<V, E>, incoming: Index<V, E>) -> Self {
        Self { outgoing, incoming }
    }

    pub fn outgoing_index(&self) -> &Index<V, E> {
        &self.outgoing
    }

    pub fn incoming_index(&self) -> &Index<V, E> {
        &self.incoming
    }

    pub fn is_empty(&self) -> bool {
        self.outgoing.is_empty()
    }

    /// The same edges, each pointing the other way. O(1).
    pub fn inverted(&self) -> Self {
        Self {
            outgoing: self.incoming.clone(),
            incoming: self.outgoing.clone(),
        }
    }

    /// Returns `true` if both graphs currently use the same storage for both
    /// indices.
    pub fn shares_storage(&self, other: &Self) -> bool {
        self.outgoing.shares_storage(&other.outgoing) && self.incoming.shares_storage(&other.incoming)
    }

    pub fn clear(&self) -> Self {
        Self::new()
    }
}

impl<V, E> Graph<V, E>
where
    V: Hash + Eq + Clone,
    E: Hash + Eq + Clone,
{
    pub fn from_edges(edges: impl IntoIterator<Item = Edge<V, E>>) -> Self {
        Self::new().add_all(edges)
    }

    /// Build from an outgoing index, deriving the incoming one.
    pub fn from_outgoing(outgoing: Index<V, E>) -> Self {
        let incoming = transpose(&outgoing);
        Self::from_indices(outgoing, incoming)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn contains_node(&self, vertex: &V) -> bool {
        self.outgoing.contains_key(vertex) || self.incoming.contains_key(vertex)
    }

    pub fn nodes(&self) -> PersistentSet<V> {
        let sources: PersistentSet<V> = self.outgoing.keys().collect();
        sources.insert_all(self.incoming.keys())
    }

    pub fn contains_edge(&self, source: &V, target: &V, weight: &E) -> bool {
        self.outgoing
            .get_entry(source)
            .is_some_and(|adj| adj.contains(target, weight))
    }

    pub fn contains(&self, edge: &Edge<V, E>) -> bool {
        self.contains_edge(&edge.source, &edge.target, &edge.weight)
    }

    /// Weights of the edges from `source` to `target`.
    ///
    /// `None` if either vertex does not exist; an empty set if both exist but
    /// are not joined.
    pub fn get_edges(&self, source: &V, target: &V) -> Option<PersistentSet<E>> {
        if !self.contains_node(source) || !self.contains_node(target) {
            return None;
        }
        Some(self.outgoing.get(source).by_vertex().get(target))
    }

    /// Sources of the edges into `vertex`, by weight.
    pub fn get_incoming(&self, vertex: &V) -> Option<DefaultMap<E, PersistentSet<V>>> {
        self.adjacency(&self.incoming, vertex)
            .map(|adj| adj.by_weight().clone())
    }

    /// Targets of the edges out of `vertex`, by weight.
    pub fn get_outgoing(&self, vertex: &V) -> Option<DefaultMap<E, PersistentSet<V>>> {
        self.adjacency(&self.outgoing, vertex)
            .map(|adj| adj.by_weight().clone())
    }

    /// Sources of the `weight` edges into `vertex`.
    pub fn get_incoming_with(&self, vertex: &V, weight: &E) -> Option<PersistentSet<V>> {
        self.adjacency(&self.incoming, vertex)
            .map(|adj| adj.by_weight().get(weight))
    }

    /// Targets of the `weight` edges out of `vertex`.
    pub fn get_outgoing_with(&self, vertex: &V, weight: &E) -> Option<PersistentSet<V>> {
        self.adjacency(&self.outgoing, vertex)
            .map(|adj| adj.by_weight().get(weight))
    }

    pub fn incoming_weights(&self, vertex: &V) -> Option<PersistentSet<E>> {
        self.adjacency(&self.incoming, vertex)
            .map(|adj| adj.by_weight().keys().collect())
    }

    pub fn outgoing_weights(&self, vertex: &V) -> Option<PersistentSet<E>> {
        self.adjacency(&self.outgoing, vertex)
            .map(|adj| adj.by_weight().keys().collect())
    }

    pub fn incoming_nodes(&self, vertex: &V) -> Option<PersistentSet<V>> {
        self.adjacency(&self.incoming, vertex)
            .map(|adj| adj.by_vertex().keys().collect())
    }

    pub fn outgoing_nodes(&self, vertex: &V) -> Option<PersistentSet<V>> {
        self.adjacency(&self.outgoing, vertex)
            .map(|adj| adj.by_vertex().keys().collect())
    }

    /// The adjacency of an existing vertex, empty if it has no edges in
    /// `index`'s direction.
    fn adjacency(&self, index: &Index<V, E>, vertex: &V) -> Option<Adjacency<V, E>> {
        self.contains_node(vertex).then(|| index.get(vertex))
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        let mut count = 0;
        self.outgoing
            .for_each(|_, adj| count += adj.edge_count());
        count
    }

    // -----------------------------------------------------------------------
    // Edits
    // -----------------------------------------------------------------------

    /// Graph with the edge `source --weight--> target`, creating vertices as
    /// needed. Adding an existing edge returns a graph sharing this one's
    /// storage.
    pub fn put_edge(&self, source: V, target: V, weight: E) -> Self {
        if self.contains_edge(&source, &target, &weight) {
            return self.clone();
        }
        let outgoing = self.outgoing.update(source.clone(), |adj| {
            adj.insert(target.clone(), weight.clone())
        });
        let incoming = self
            .incoming
            .update(target, |adj| adj.insert(source, weight));
        Self::from_indices(outgoing, incoming)
    }

    /// Graph without the edge; vertices left without edges disappear.
    pub fn remove_edge(&self, source: &V, target: &V, weight: &E) -> Self {
        if !self.contains_edge(source, target, weight) {
            return self.clone();
        }
        let outgoing = self
            .outgoing
            .update(source.clone(), |adj| adj.remove(target, weight));
        let incoming = self
            .incoming
            .update(target.clone(), |adj| adj.remove(source, weight));
        Self::from_indices(outgoing, incoming)
    }

    /// Graph without any edge from `source` to `target`.
    pub fn remove_edges(&self, source: &V, target: &V) -> Self {
        let joined = self
            .outgoing
            .get_entry(source)
            .is_some_and(|adj| adj.by_vertex().contains_key(target));
        if !joined {
            return self.clone();
        }
        let outgoing = self
            .outgoing
            .update(source.clone(), |adj| adj.remove_vertex(target));
        let incoming = self
            .incoming
            .update(target.clone(), |adj| adj.remove_vertex(source));
        Self::from_indices(outgoing, incoming)
    }

    /// Graph without `vertex` and every edge touching it.
    pub fn remove_node(&self, vertex: &V) -> Self {
        if !self.contains_node(vertex) {
            return self.clone();
        }
        let out = self.outgoing.get(vertex);
        let inc = self.incoming.get(vertex);

        let mut incoming = self.incoming.clone();
        for target in out.by_vertex().keys() {
            incoming = incoming.update(target, |adj| adj.remove_vertex(vertex));
        }
        let mut outgoing = self.outgoing.clone();
        for source in inc.by_vertex().keys() {
            outgoing = outgoing.update(source, |adj| adj.remove_vertex(vertex));
        }
        debug!(
            outgoing = out.edge_count(),
            incoming = inc.edge_count(),
            "removed graph node"
        );
        Self::from_indices(outgoing.remove_key(vertex), incoming.remove_key(vertex))
    }

    pub fn add(&self, edge: Edge<V, E>) -> Self {
        self.put_edge(edge.source, edge.target, edge.weight)
    }

    pub fn add_all(&self, edges: impl IntoIterator<Item = Edge<V, E>>) -> Self {
        edges.into_iter().fold(self.clone(), |graph, edge| graph.add(edge))
    }

    pub fn remove(&self, edge: &Edge<V, E>) -> Self {
        self.remove_edge(&edge.source, &edge.target, &edge.weight)
    }

    pub fn remove_all<'a>(&self, edges: impl IntoIterator<Item = &'a Edge<V, E>>) -> Self
    where
        V: 'a,
        E: 'a,
    {
        edges.into_iter().fold(self.clone(), |graph, edge| graph.remove(edge))
    }

    /// Swap `old` for `new`; unchanged if `old` is absent.
    pub fn replace(&self, old: &Edge<V, E>, new: Edge<V, E>) -> Self {
        if self.contains(old) {
            self.remove(old).add(new)
        } else {
            self.clone()
        }
    }

    // -----------------------------------------------------------------------
    // Traversal
    // -----------------------------------------------------------------------

    /// Every edge, grouped by source and then by weight.
    pub fn iter(&self) -> impl Iterator<Item = Edge<V, E>> {
        self.outgoing.iter().flat_map(|(source, adj)| {
            adj.by_weight().iter().flat_map(move |(weight, targets)| {
                let source = source.clone();
                targets
                    .iter()
                    .map(move |target| Edge::new(source.clone(), weight.clone(), target))
            })
        })
    }

    pub fn edges(&self) -> Vec<Edge<V, E>> {
        self.iter().collect()
    }

    /// The `index`-th edge in iteration order.
    ///
    /// Skips whole weight groups by size and never builds the edge list, but
    /// the cost still grows with the vertices before `index`. Walk every edge
    /// with [`cursor`](Graph::cursor) or [`iter`](Graph::iter) instead.
    pub fn get_index(&self, index: usize) -> CollectionResult<Edge<V, E>> {
        let mut rest = index;
        for (source, adj) in self.outgoing.iter() {
            for (weight, targets) in adj.by_weight().iter() {
                if rest < targets.len() {
                    let target = targets.get_index(rest)?;
                    return Ok(Edge::new(source, weight, target));
                }
                rest -= targets.len();
            }
        }
        Err(CollectionError::IndexOutOfRange {
            index,
            len: index - rest,
        })
    }

    /// Cursor before the first edge. The edges are collected once here, so
    /// each step is O(1).
    pub fn cursor(&self) -> Cursor<Vec<Edge<V, E>>> {
        Cursor::at_start(self.edges())
    }

    pub fn cursor_at(&self, index: usize) -> CollectionResult<Cursor<Vec<Edge<V, E>>>> {
        Cursor::new(self.edges(), index)
    }

    pub fn cursor_at_end(&self) -> Cursor<Vec<Edge<V, E>>> {
        Cursor::at_end(self.edges())
    }

    /// Compare with `other` and, if equal, make both share storage.
    pub fn deduplicate(&self, other: &Self) -> bool {
        self == other
    }
}

/// The incoming index matching `outgoing`.
fn transpose<V, E>(outgoing: &Index<V, E>) -> Index<V, E>
where
    V: Hash + Eq + Clone,
    E: Hash + Eq + Clone,
{
    let mut incoming: Index<V, E> = DefaultMap::new();
    for (source, adj) in outgoing.iter() {
        for (target, weights) in adj.by_vertex().iter() {
            for weight in weights.iter() {
                incoming = incoming.update(target.clone(), |a| a.insert(source.clone(), weight));
            }
        }
    }
    incoming
}

impl<V, E> Clone for Graph<V, E> {
    fn clone(&self) -> Self {
        Self::from_indices(self.outgoing.clone(), self.incoming.clone())
    }
}

impl<V, E> Default for Graph<V, E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Both indices take part, so equal graphs converge on shared storage for
/// each.
impl<V, E> PartialEq for Graph<V, E>
where
    V: Hash + Eq + Clone,
    E: Hash + Eq + Clone,
{
    fn eq(&self, other: &Self) -> bool {
        self.outgoing == other.outgoing && self.incoming == other.incoming
    }
}

impl<V, E> Eq for Graph<V, E>
where
    V: Hash + Eq + Clone,
    E: Hash + Eq + Clone,
{
}

impl<V, E> Hash for Graph<V, E>
where
    V: Hash + Eq + Clone,
    E: Hash + Eq + Clone,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.outgoing.hash(state);
    }
}

impl<V, E> fmt::Display for Graph<V, E>
where
    V: Hash + Eq + Clone + fmt::Display,
    E: Hash + Eq + Clone + fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for edge in self.iter() {
            write!(f, "{edge}")?;
        }
        f.write_str("]")
    }
}

impl<V, E> fmt::Debug for Graph<V, E>
where
    V: Hash + Eq + Clone + fmt::Debug,
    E: Hash + Eq + Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<V, E> FromIterator<Edge<V, E>> for Graph<V, E>
where
    V: Hash + Eq + Clone,
    E: Hash + Eq + Clone,
{
    fn from_iter<I: IntoIterator<Item = Edge<V, E>>>(iter: I) -> Self {
        Self::from_edges(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type G = Graph<&'static str, i32>;

    fn graph(edges: &[(&'static str, i32, &'static str)]) -> G {
        edges.iter().map(|e| Edge::from(*e)).collect()
    }

    fn set<T: Hash + Eq + Clone>(items: impl IntoIterator<Item = T>) -> PersistentSet<T> {
        items.into_iter().collect()
    }

    // -----------------------------------------------------------------------
    // Vertices
    // -----------------------------------------------------------------------

    #[test]
    fn vertices_come_from_edges() {
        let g = graph(&[("a", 1, "b"), ("a", 2, "d")]);
        assert!(g.contains_node(&"a"));
        assert!(g.contains_node(&"b"));
        assert!(!g.contains_node(&"c"));
        assert!(g.contains_node(&"d"));
        assert_eq!(g.nodes(), set(["a", "b", "d"]));
    }

    #[test]
    fn removing_only_edge_makes_vertex_vanish() {
        let g = G::new().put_edge("a", "a", 0).remove_edge(&"a", &"a", &0);
        assert_eq!(g, G::new());
        assert!(!g.contains_node(&"a"));
        assert!(g.nodes().is_empty());
        assert!(g.is_empty());
    }

    #[test]
    fn remove_node_drops_touching_edges() {
        let g = graph(&[("a", 0, "b"), ("b", 0, "c"), ("c", 0, "a"), ("b", 1, "b")]);
        let without_b = g.remove_node(&"b");
        assert_eq!(without_b, graph(&[("c", 0, "a")]));
        assert!(!without_b.contains_node(&"b"));
        assert_eq!(without_b.get_outgoing(&"a"), Some(DefaultMap::new()));

        let self_loop = G::new().put_edge("a", "a", 0).remove_node(&"a");
        assert_eq!(self_loop, G::new());
        assert!(g.remove_node(&"zz").shares_storage(&g));
    }

    // -----------------------------------------------------------------------
    // Edges
    // -----------------------------------------------------------------------

    #[test]
    fn contains_edge_checks_all_three_parts() {
        let g = graph(&[("a", 1, "b"), ("a", 2, "d")]);
        assert!(g.contains_edge(&"a", &"b", &1));
        assert!(!g.contains_edge(&"a", &"d", &1));
        assert!(!g.contains_edge(&"a", &"b", &2));
        assert!(g.contains_edge(&"a", &"d", &2));
        assert!(!g.contains_edge(&"a", &"c", &1));
        assert!(g.contains(&Edge::new("a", 2, "d")));
    }

    #[test]
    fn putting_existing_edge_is_idempotent() {
        let g = graph(&[("a", 0, "b")]);
        let again = g.put_edge("a", "b", 0);
        assert!(again.shares_storage(&g));
        assert_eq!(again.len(), 1);
        assert_eq!(graph(&[("a", 0, "b"), ("b", 0, "b"), ("b", 0, "b")]).len(), 2);
    }

    #[test]
    fn absent_vertex_differs_from_missing_edge() {
        let g = graph(&[("a", 1, "b"), ("a", 2, "d")]);
        assert_eq!(g.get_edges(&"a", &"b"), Some(set([1])));
        assert_eq!(g.get_edges(&"a", &"d"), Some(set([2])));
        assert_eq!(g.get_edges(&"a", &"c"), None);

        let with_e = g.put_edge("e", "e", 0);
        assert_eq!(with_e.get_edges(&"a", &"e"), Some(PersistentSet::new()));
        let without_e = with_e.remove_edge(&"e", &"e", &0);
        assert_eq!(without_e.get_edges(&"a", &"e"), None);
    }

    #[test]
    fn parallel_edges_keep_their_weights() {
        let g = G::new().put_edge("a", "b", 0).put_edge("a", "b", 1);
        assert_eq!(g.get_edges(&"a", &"b"), Some(set([0, 1])));
        let one = g.remove_edge(&"a", &"b", &0);
        assert_eq!(one, graph(&[("a", 1, "b")]));
        assert!(g.remove_edge(&"a", &"b", &7).shares_storage(&g));
    }

    #[test]
    fn remove_edges_drops_every_weight() {
        let g = graph(&[("a", 0, "b"), ("a", 1, "b"), ("a", 0, "c")]);
        let trimmed = g.remove_edges(&"a", &"b");
        assert_eq!(trimmed, graph(&[("a", 0, "c")]));
        assert!(!trimmed.contains_node(&"b"));
        assert!(g.remove_edges(&"b", &"a").shares_storage(&g));
    }

    #[test]
    fn neighbourhood_queries() {
        let g = graph(&[("a", 1, "b"), ("c", 1, "b"), ("c", 2, "b"), ("b", 3, "a")]);
        assert_eq!(g.incoming_nodes(&"b"), Some(set(["a", "c"])));
        assert_eq!(g.incoming_weights(&"b"), Some(set([1, 2])));
        assert_eq!(g.get_incoming_with(&"b", &1), Some(set(["a", "c"])));
        assert_eq!(g.outgoing_nodes(&"b"), Some(set(["a"])));
        assert_eq!(g.outgoing_weights(&"c"), Some(set([1, 2])));
        assert_eq!(g.get_outgoing_with(&"c", &2), Some(set(["b"])));
        assert_eq!(g.get_outgoing_with(&"c", &9), Some(PersistentSet::new()));
        assert_eq!(g.incoming_nodes(&"c"), Some(PersistentSet::new()));
        assert_eq!(g.get_incoming(&"zz"), None);
        assert_eq!(g.get_outgoing(&"a").map(|m| m.get(&1)), Some(set(["b"])));
    }

    #[test]
    fn inversion_swaps_directions() {
        let g = graph(&[("a", 1, "b"), ("b", 2, "c")]);
        let inv = g.inverted();
        assert_eq!(inv, graph(&[("b", 1, "a"), ("c", 2, "b")]));
        assert_eq!(inv.inverted(), g);
    }

    #[test]
    fn transpose_matches_incremental_index() {
        let g = graph(&[("a", 1, "b"), ("b", 2, "c"), ("c", 1, "a"), ("a", 2, "b")]);
        let rebuilt = G::from_outgoing(g.outgoing_index().clone());
        assert_eq!(rebuilt, g);
    }

    #[test]
    fn replace_and_bulk_edits() {
        let g = graph(&[("a", 0, "a"), ("a", 0, "b")]);
        let replaced = g.replace(&Edge::new("a", 0, "b"), Edge::new("a", 5, "c"));
        assert_eq!(replaced, graph(&[("a", 0, "a"), ("a", 5, "c")]));
        assert!(g.replace(&Edge::new("x", 0, "y"), Edge::new("a", 5, "c")).shares_storage(&g));

        let edges = [Edge::new("a", 0, "a"), Edge::new("a", 0, "b")];
        assert!(g.remove_all(&edges).is_empty());
        assert!(g.clear().is_empty());
    }

    // -----------------------------------------------------------------------
    // Traversal
    // -----------------------------------------------------------------------

    #[test]
    fn iteration_and_positional_access_agree() {
        let g = graph(&[("a", 0, "b"), ("a", 1, "b"), ("b", 0, "c"), ("c", 2, "a")]);
        let edges = g.edges();
        assert_eq!(edges.len(), 4);
        for (i, edge) in edges.iter().enumerate() {
            assert_eq!(&g.get_index(i).unwrap(), edge);
        }
        assert_eq!(
            g.get_index(4),
            Err(CollectionError::IndexOutOfRange { index: 4, len: 4 })
        );
    }

    #[test]
    fn cursors_walk_every_edge() {
        let g = graph(&[("a", 0, "a"), ("a", 0, "b")]);
        let mut forward = g.cursor();
        let mut seen = Vec::new();
        while forward.has_next() {
            seen.push(forward.next().unwrap());
        }
        let mut backward = g.cursor_at_end();
        let mut reversed = Vec::new();
        while backward.has_previous() {
            reversed.push(backward.previous().unwrap());
        }
        reversed.reverse();
        assert_eq!(seen, reversed);
        assert_eq!(seen.len(), 2);
        assert!(g.cursor_at(3).is_err());
    }

    #[test]
    fn display_lists_triples() {
        let g = graph(&[("a", 1, "b")]);
        assert_eq!(g.to_string(), "[(a,1,b)]");
        assert_eq!(G::new().to_string(), "[]");
    }

    // -----------------------------------------------------------------------
    // Equality
    // -----------------------------------------------------------------------

    #[test]
    fn equality_ignores_construction_order() {
        use std::collections::hash_map::DefaultHasher;
        let a = graph(&[("a", 0, "a"), ("b", 0, "b")]);
        let b = graph(&[("b", 0, "b"), ("a", 0, "a")]);
        let digest = |g: &G| {
            let mut h = DefaultHasher::new();
            g.hash(&mut h);
            h.finish()
        };
        assert_eq!(digest(&a), digest(&b));
        assert_eq!(a, b);
        assert!(a.shares_storage(&b));
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    proptest::proptest! {
        #[test]
        fn indices_stay_transposes_of_each_other(
            added in proptest::collection::vec((0u8..10, 0u8..4, 0u8..10), 0..40),
            removed in proptest::collection::vec((0u8..10, 0u8..4, 0u8..10), 0..20),
        ) {
            let mut g: Graph<u8, u8> = Graph::new();
            for (s, w, t) in &added {
                g = g.put_edge(*s, *t, *w);
            }
            for (s, w, t) in &removed {
                g = g.remove_edge(s, t, w);
            }
            let rebuilt = Graph::from_outgoing(g.outgoing_index().clone());
            proptest::prop_assert_eq!(rebuilt.incoming_index(), g.incoming_index());
            proptest::prop_assert_eq!(g.len(), g.iter().count());
            proptest::prop_assert_eq!(g.inverted().inverted(), g.clone());
        }
    }
}
