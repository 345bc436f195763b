use std::hash::Hash;

use weft_collections::{DefaultMap, MergeStats, Mergeable, PersistentSet};
use weft_types::CollectionResult;

use crate::adjacency::Adjacency;
use crate::graph::{Graph, Index};

impl<V, E> Graph<V, E>
where
    V: Hash + Eq + Clone,
    E: Hash + Eq + Clone,
{
    /// N-way merge where `reducer` decides the weight set of every
    /// `(source, target)` pair the branches changed in different ways.
    ///
    /// The reducer receives the source, the target, the ancestor's weights
    /// and the weights of each branch that touched the pair. The incoming
    /// index is rebuilt from the merged outgoing one.
    pub fn merge_with<F>(&self, branches: &[Self], mut reducer: F) -> CollectionResult<Self>
    where
        F: FnMut(&V, &V, &PersistentSet<E>, &[PersistentSet<E>]) -> CollectionResult<PersistentSet<E>>,
    {
        let siblings: Vec<Index<V, E>> = branches.iter().map(|b| b.outgoing.clone()).collect();
        let outgoing = self.outgoing.merge_with(&siblings, |source, ancestor, touched| {
            let by_vertex: Vec<DefaultMap<V, PersistentSet<E>>> =
                touched.iter().map(|adj| adj.by_vertex().clone()).collect();
            let merged = ancestor
                .by_vertex()
                .merge_with(&by_vertex, |target, base, weights| {
                    reducer(source, target, base, weights)
                })?;
            Ok(Adjacency::from_by_vertex(merged))
        })?;
        Ok(Self::from_outgoing(outgoing))
    }

    /// Default merge, also reporting the work done on each index.
    pub fn merge_with_stats(&self, branches: &[Self]) -> CollectionResult<(Self, [MergeStats; 2])> {
        let outgoing: Vec<Index<V, E>> = branches.iter().map(|b| b.outgoing.clone()).collect();
        let incoming: Vec<Index<V, E>> = branches.iter().map(|b| b.incoming.clone()).collect();
        let (merged_out, out_stats) = self
            .outgoing
            .merge_with_stats(&outgoing, |_, ancestor, touched| ancestor.merge(touched))?;
        let (merged_in, in_stats) = self
            .incoming
            .merge_with_stats(&incoming, |_, ancestor, touched| ancestor.merge(touched))?;
        Ok((Self::from_indices(merged_out, merged_in), [out_stats, in_stats]))
    }
}

/// Each index merges on its own; weight sets merge three-way, so every
/// branch's edge additions and removals apply.
impl<V, E> Mergeable for Graph<V, E>
where
    V: Hash + Eq + Clone,
    E: Hash + Eq + Clone,
{
    fn merge(&self, branches: &[Self]) -> CollectionResult<Self> {
        self.merge_with_stats(branches).map(|(merged, _)| merged)
    }
}
