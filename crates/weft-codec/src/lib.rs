//! Transport contract for weft collections.
//!
//! Every collection travels as a count followed by exactly that many element
//! records. What an element record looks like is up to the
//! [`ElementWriter`]/[`ElementReader`] pair; this crate ships a bincode-backed
//! pair behind a 4-byte big-endian count.

mod bincode_io;
pub mod config;
pub mod error;

pub use bincode_io::{BincodeReader, BincodeWriter};
pub use config::CodecConfig;
pub use error::{CodecError, CodecResult};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Sink for a count-prefixed element sequence.
pub trait ElementWriter {
    fn write_count(&mut self, count: usize) -> CodecResult<()>;
    fn write_element<T: Serialize + ?Sized>(&mut self, element: &T) -> CodecResult<()>;
}

/// Source of a count-prefixed element sequence.
pub trait ElementReader {
    fn read_count(&mut self) -> CodecResult<usize>;
    fn read_element<T: DeserializeOwned>(&mut self) -> CodecResult<T>;
}

/// A collection that can cross a transport boundary.
///
/// Reading back what was written yields a value equal to the original.
pub trait Transport: Sized {
    fn write_to<W: ElementWriter>(&self, writer: &mut W) -> CodecResult<()>;
    fn read_from<R: ElementReader>(reader: &mut R) -> CodecResult<Self>;
}

/// Write `count` followed by the elements of `items`.
///
/// Fails with [`CodecError::CountMismatch`] if `items` does not yield exactly
/// `count` elements.
pub fn write_sequence<W, T, I>(writer: &mut W, count: usize, items: I) -> CodecResult<()>
where
    W: ElementWriter,
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    writer.write_count(count)?;
    let mut written = 0usize;
    for item in items {
        if written == count {
            return Err(CodecError::CountMismatch {
                declared: count,
                written: written + 1,
            });
        }
        writer.write_element(&item)?;
        written += 1;
    }
    if written != count {
        return Err(CodecError::CountMismatch {
            declared: count,
            written,
        });
    }
    Ok(())
}

/// Read a count and that many elements.
pub fn read_sequence<R, T>(reader: &mut R) -> CodecResult<Vec<T>>
where
    R: ElementReader,
    T: DeserializeOwned,
{
    let count = reader.read_count()?;
    // A hostile count must not drive the allocation.
    let mut items = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        items.push(reader.read_element()?);
    }
    Ok(items)
}

/// Encode `value` with the bincode pair.
pub fn encode<T: Transport>(value: &T) -> CodecResult<Vec<u8>> {
    encode_with(value, CodecConfig::default())
}

pub fn encode_with<T: Transport>(value: &T, config: CodecConfig) -> CodecResult<Vec<u8>> {
    let mut writer = BincodeWriter::with_config(config);
    value.write_to(&mut writer)?;
    Ok(writer.into_bytes())
}

/// Decode a value written by [`encode`]. The whole input must be consumed.
pub fn decode<T: Transport>(bytes: &[u8]) -> CodecResult<T> {
    decode_with(bytes, CodecConfig::default())
}

pub fn decode_with<T: Transport>(bytes: &[u8], config: CodecConfig) -> CodecResult<T> {
    let mut reader = BincodeReader::with_config(bytes, config);
    let value = T::read_from(&mut reader)?;
    match reader.remaining() {
        0 => Ok(value),
        n => Err(CodecError::TrailingBytes(n)),
    }
}
