//! Transport for maps, default maps and sets.
//!
//! Maps travel as a count of `(key, value)` records, sets as a count of
//! elements. Default maps carry their stored entries only; the reading side
//! supplies the default function.

use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::Serialize;
use weft_codec::{read_sequence, write_sequence, CodecResult, ElementReader, ElementWriter, Transport};

use crate::default_map::{DefaultFn, DefaultMap};
use crate::map::PersistentMap;
use crate::set::PersistentSet;

impl<K, V> Transport for PersistentMap<K, V>
where
    K: Hash + Eq + Clone + Serialize + DeserializeOwned,
    V: PartialEq + Clone + Serialize + DeserializeOwned,
{
    fn write_to<W: ElementWriter>(&self, writer: &mut W) -> CodecResult<()> {
        let storage = self.snapshot();
        write_sequence(writer, storage.len(), storage.iter())
    }

    fn read_from<R: ElementReader>(reader: &mut R) -> CodecResult<Self> {
        let entries: Vec<(K, V)> = read_sequence(reader)?;
        Ok(Self::from_entries(entries))
    }
}

impl<K, V, D> Transport for DefaultMap<K, V, D>
where
    K: Hash + Eq + Clone + Serialize + DeserializeOwned,
    V: PartialEq + Clone + Serialize + DeserializeOwned,
    D: DefaultFn<K, V> + Default,
{
    fn write_to<W: ElementWriter>(&self, writer: &mut W) -> CodecResult<()> {
        self.as_map().write_to(writer)
    }

    fn read_from<R: ElementReader>(reader: &mut R) -> CodecResult<Self> {
        let entries: Vec<(K, V)> = read_sequence(reader)?;
        Ok(Self::from_entries(D::default(), entries))
    }
}

impl<T> Transport for PersistentSet<T>
where
    T: Hash + Eq + Clone + Serialize + DeserializeOwned,
{
    fn write_to<W: ElementWriter>(&self, writer: &mut W) -> CodecResult<()> {
        let storage = self.snapshot();
        write_sequence(writer, storage.len(), storage.iter().map(|(e, _)| e))
    }

    fn read_from<R: ElementReader>(reader: &mut R) -> CodecResult<Self> {
        let elements: Vec<T> = read_sequence(reader)?;
        Ok(Self::from_elements(elements))
    }
}
