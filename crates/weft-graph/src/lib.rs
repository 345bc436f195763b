//! Persistent directed multigraph for weft.
//!
//! A [`Graph`] is a set of [`Edge`]s `(source, weight, target)`. Two vertices
//! may be joined by several edges with different weights, and self-loops are
//! allowed. Vertices exist only through their edges: removing the last edge
//! touching a vertex removes the vertex.
//!
//! The graph keeps two indices, outgoing and incoming, each a
//! [`weft_collections::DefaultMap`] from vertex to [`Adjacency`]. They are
//! exact transposes of each other, which makes [`Graph::inverted`] an O(1)
//! swap and lets every neighbourhood query answer from one lookup.
//!
//! Lookups distinguish a vertex that does not exist (`None`) from one that
//! exists without matching edges (an empty container).
//!
//! Graphs merge n-way through [`weft_collections::Mergeable`], compare into
//! per-source [`GraphDelta`]s, and check filtered sub-graphs for cycles.

pub mod adjacency;
mod codec;
pub mod compare;
mod cycles;
pub mod edge;
pub mod graph;
mod merge;

pub use adjacency::Adjacency;
pub use compare::GraphDelta;
pub use edge::Edge;
pub use graph::{Graph, Index};
