//! One vertex's view of its edges in one direction.

use std::fmt;
use std::hash::{Hash, Hasher};

use weft_collections::{DefaultMap, Mergeable, PersistentSet};
use weft_types::CollectionResult;

/// Edges of one vertex in one direction, indexed both by neighbour and by
/// weight. The two maps always describe the same edge set.
///
/// In the outgoing index the neighbours are targets; in the incoming index
/// they are sources. An adjacency with no edges equals the default, so a
/// [`DefaultMap`] of adjacencies drops it.
pub struct Adjacency<V, E> {
    by_vertex: DefaultMap<V, PersistentSet<E>>,
    by_weight: DefaultMap<E, PersistentSet<V>>,
}

impl<V, E> Adjacency<V, E> {
    pub fn new() -> Self {
        Self {
            by_vertex: DefaultMap::new(),
            by_weight: DefaultMap::new(),
        }
    }

    /// Weights of the edges to each neighbour.
    pub fn by_vertex(&self) -> &DefaultMap<V, PersistentSet<E>> {
        &self.by_vertex
    }

    /// Neighbours reached through each weight.
    pub fn by_weight(&self) -> &DefaultMap<E, PersistentSet<V>> {
        &self.by_weight
    }

    pub fn is_empty(&self) -> bool {
        self.by_vertex.is_empty()
    }
}

impl<V, E> Adjacency<V, E>
where
    V: Hash + Eq + Clone,
    E: Hash + Eq + Clone,
{
    /// Build from the neighbour index alone, deriving the weight index.
    pub fn from_by_vertex(by_vertex: DefaultMap<V, PersistentSet<E>>) -> Self {
        let mut by_weight: DefaultMap<E, PersistentSet<V>> = DefaultMap::new();
        for (vertex, weights) in by_vertex.iter() {
            for weight in weights.iter() {
                by_weight = by_weight.update(weight, |set| set.insert(vertex.clone()));
            }
        }
        Self {
            by_vertex,
            by_weight,
        }
    }

    pub fn contains(&self, vertex: &V, weight: &E) -> bool {
        self.by_vertex
            .get_entry(vertex)
            .is_some_and(|weights| weights.contains(weight))
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        let mut count = 0;
        self.by_vertex.for_each(|_, weights| count += weights.len());
        count
    }

    pub fn insert(&self, vertex: V, weight: E) -> Self {
        Self {
            by_vertex: self
                .by_vertex
                .update(vertex.clone(), |set| set.insert(weight.clone())),
            by_weight: self.by_weight.update(weight, |set| set.insert(vertex)),
        }
    }

    pub fn remove(&self, vertex: &V, weight: &E) -> Self {
        Self {
            by_vertex: self
                .by_vertex
                .update(vertex.clone(), |set| set.remove(weight)),
            by_weight: self.by_weight.update(weight.clone(), |set| set.remove(vertex)),
        }
    }

    /// Drop every edge to `vertex`.
    pub fn remove_vertex(&self, vertex: &V) -> Self {
        let Some(weights) = self.by_vertex.get_entry(vertex) else {
            return self.clone();
        };
        let mut by_weight = self.by_weight.clone();
        for weight in weights.iter() {
            by_weight = by_weight.update(weight, |set| set.remove(vertex));
        }
        Self {
            by_vertex: self.by_vertex.remove_key(vertex),
            by_weight,
        }
    }
}

impl<V, E> Clone for Adjacency<V, E> {
    fn clone(&self) -> Self {
        Self {
            by_vertex: self.by_vertex.clone(),
            by_weight: self.by_weight.clone(),
        }
    }
}

impl<V, E> Default for Adjacency<V, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, E> PartialEq for Adjacency<V, E>
where
    V: Hash + Eq + Clone,
    E: Hash + Eq + Clone,
{
    fn eq(&self, other: &Self) -> bool {
        self.by_vertex == other.by_vertex && self.by_weight == other.by_weight
    }
}

impl<V, E> Eq for Adjacency<V, E>
where
    V: Hash + Eq + Clone,
    E: Hash + Eq + Clone,
{
}

impl<V, E> Hash for Adjacency<V, E>
where
    V: Hash + Eq + Clone,
    E: Hash + Eq + Clone,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.by_vertex.hash(state);
    }
}

impl<V: fmt::Debug, E: fmt::Debug> fmt::Debug for Adjacency<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.by_vertex, f)
    }
}

/// Both indices merge as maps of sets; every sibling's edge additions and
/// removals apply.
impl<V, E> Mergeable for Adjacency<V, E>
where
    V: Hash + Eq + Clone,
    E: Hash + Eq + Clone,
{
    fn merge(&self, branches: &[Self]) -> CollectionResult<Self> {
        let by_vertex: Vec<_> = branches.iter().map(|b| b.by_vertex.clone()).collect();
        let by_weight: Vec<_> = branches.iter().map(|b| b.by_weight.clone()).collect();
        Ok(Self {
            by_vertex: self.by_vertex.merge(&by_vertex)?,
            by_weight: self.by_weight.merge(&by_weight)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjacency(edges: &[(&'static str, u8)]) -> Adjacency<&'static str, u8> {
        edges
            .iter()
            .fold(Adjacency::new(), |adj, (v, w)| adj.insert(*v, *w))
    }

    #[test]
    fn both_indices_track_inserts() {
        let adj = adjacency(&[("b", 1), ("b", 2), ("c", 1)]);
        assert_eq!(adj.edge_count(), 3);
        assert_eq!(adj.by_vertex().get(&"b"), PersistentSet::from_iter([1, 2]));
        assert_eq!(adj.by_weight().get(&1), PersistentSet::from_iter(["b", "c"]));
        assert!(adj.contains(&"c", &1));
        assert!(!adj.contains(&"c", &2));
    }

    #[test]
    fn removing_last_edge_leaves_default() {
        let adj = adjacency(&[("b", 1)]).remove(&"b", &1);
        assert!(adj.is_empty());
        assert_eq!(adj, Adjacency::new());
    }

    #[test]
    fn remove_vertex_clears_weight_index() {
        let adj = adjacency(&[("b", 1), ("b", 2), ("c", 2)]).remove_vertex(&"b");
        assert_eq!(adj, adjacency(&[("c", 2)]));
        assert!(!adj.by_weight().contains_key(&1));
    }

    #[test]
    fn weight_index_is_derivable() {
        let adj = adjacency(&[("b", 1), ("c", 1), ("c", 4)]);
        let rebuilt = Adjacency::from_by_vertex(adj.by_vertex().clone());
        assert_eq!(rebuilt, adj);
    }

    #[test]
    fn merge_applies_each_branch() {
        let base = adjacency(&[("b", 1), ("c", 1)]);
        let left = base.insert("d", 7);
        let right = base.remove(&"c", &1);
        let merged = base.merge(&[left, right]).unwrap();
        assert_eq!(merged, adjacency(&[("b", 1), ("d", 7)]));
    }
}
