//! Transport for graphs: a count of `(source, weight, target)` records.
//! Only the outgoing index travels; the reader rebuilds the incoming one.

use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::Serialize;
use weft_codec::{read_sequence, write_sequence, CodecResult, ElementReader, ElementWriter, Transport};

use crate::edge::Edge;
use crate::graph::Graph;

impl<V, E> Transport for Graph<V, E>
where
    V: Hash + Eq + Clone + Serialize + DeserializeOwned,
    E: Hash + Eq + Clone + Serialize + DeserializeOwned,
{
    fn write_to<W: ElementWriter>(&self, writer: &mut W) -> CodecResult<()> {
        write_sequence(writer, self.len(), self.iter())
    }

    fn read_from<R: ElementReader>(reader: &mut R) -> CodecResult<Self> {
        let edges: Vec<Edge<V, E>> = read_sequence(reader)?;
        Ok(Self::from_edges(edges))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_codec::{decode, decode_with, encode, CodecConfig, CodecError};

    #[test]
    fn roundtrip_ignores_insertion_order() {
        let edges: Vec<Edge<String, u32>> = (0..50)
            .map(|i| Edge::new(format!("v{}", i % 7), i % 3, format!("v{}", (i * 5) % 11)))
            .collect();
        let forward: Graph<String, u32> = edges.iter().cloned().collect();
        let backward: Graph<String, u32> = edges.iter().rev().cloned().collect();

        let a: Graph<String, u32> = decode(&encode(&forward).unwrap()).unwrap();
        let b: Graph<String, u32> = decode(&encode(&backward).unwrap()).unwrap();

        assert_eq!(a, forward);
        assert_eq!(b, forward);
        assert_eq!(a.incoming_index(), forward.incoming_index());
    }

    #[test]
    fn empty_graph_is_a_bare_count() {
        let bytes = encode(&Graph::<u8, u8>::new()).unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 0]);
        let back: Graph<u8, u8> = decode(&bytes).unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn parallel_edges_and_loops_survive() {
        let g: Graph<String, i8> = [("a", 1, "b"), ("a", 2, "b"), ("b", -1, "b")]
            .into_iter()
            .map(|(s, w, t)| Edge::new(s.to_string(), w, t.to_string()))
            .collect();
        let bytes = encode(&g).unwrap();
        let back: Graph<String, i8> = decode(&bytes).unwrap();
        assert_eq!(back.len(), 3);
        assert!(back.contains_edge(&"b".to_string(), &"b".to_string(), &-1));
    }

    #[test]
    fn element_limit_applies_to_edges() {
        let g: Graph<u8, u8> = (0..6).map(|i| Edge::new(i, 0, i + 1)).collect();
        let bytes = encode(&g).unwrap();
        let err = decode_with::<Graph<u8, u8>>(&bytes, CodecConfig::default().with_max_elements(4))
            .unwrap_err();
        assert!(matches!(err, CodecError::TooManyElements { count: 6, max: 4 }));
    }
}
