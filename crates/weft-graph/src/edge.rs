use std::fmt;

use serde::{Deserialize, Serialize};

/// A directed, weighted edge: `source --weight--> target`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge<V, E> {
    pub source: V,
    pub weight: E,
    pub target: V,
}

impl<V, E> Edge<V, E> {
    pub fn new(source: V, weight: E, target: V) -> Self {
        Self {
            source,
            weight,
            target,
        }
    }

    /// Returns `true` for an edge from a vertex to itself.
    pub fn is_loop(&self) -> bool
    where
        V: PartialEq,
    {
        self.source == self.target
    }

    /// The same edge pointing the other way.
    pub fn reversed(self) -> Self {
        Self::new(self.target, self.weight, self.source)
    }
}

impl<V, E> From<(V, E, V)> for Edge<V, E> {
    fn from((source, weight, target): (V, E, V)) -> Self {
        Self::new(source, weight, target)
    }
}

impl<V: fmt::Display, E: fmt::Display> fmt::Display for Edge<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.source, self.weight, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_as_triple() {
        let edge = Edge::new("a", 1, "b");
        assert_eq!(edge.to_string(), "(a,1,b)");
    }

    #[test]
    fn reversal_swaps_ends() {
        let edge: Edge<&str, u8> = ("a", 3, "b").into();
        assert_eq!(edge.clone().reversed(), Edge::new("b", 3, "a"));
        assert!(!edge.is_loop());
        assert!(Edge::new("x", 0, "x").is_loop());
    }
}
