use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::CodecConfig;
use crate::error::{CodecError, CodecResult};
use crate::{ElementReader, ElementWriter};

const COUNT_LEN: usize = 4;

/// Writes `[4 byte big-endian count][bincode element]*` into a buffer.
#[derive(Debug, Default)]
pub struct BincodeWriter {
    buf: Vec<u8>,
    config: CodecConfig,
}

impl BincodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CodecConfig) -> Self {
        Self {
            buf: Vec::new(),
            config,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl ElementWriter for BincodeWriter {
    fn write_count(&mut self, count: usize) -> CodecResult<()> {
        self.config.check(count)?;
        let count = u32::try_from(count).map_err(|_| CodecError::TooManyElements {
            count,
            max: u32::MAX as usize,
        })?;
        self.buf.extend_from_slice(&count.to_be_bytes());
        Ok(())
    }

    fn write_element<T: Serialize + ?Sized>(&mut self, element: &T) -> CodecResult<()> {
        bincode::serialize_into(&mut self.buf, element)
            .map_err(|e| CodecError::Serialization(e.to_string()))
    }
}

/// Reads what [`BincodeWriter`] wrote, consuming a borrowed input slice.
#[derive(Debug)]
pub struct BincodeReader<'a> {
    input: &'a [u8],
    config: CodecConfig,
}

impl<'a> BincodeReader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_config(input, CodecConfig::default())
    }

    pub fn with_config(input: &'a [u8], config: CodecConfig) -> Self {
        Self { input, config }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.input.len()
    }
}

impl ElementReader for BincodeReader<'_> {
    fn read_count(&mut self) -> CodecResult<usize> {
        if self.input.len() < COUNT_LEN {
            return Err(CodecError::Truncated {
                needed: COUNT_LEN,
                available: self.input.len(),
            });
        }
        let (head, rest) = self.input.split_at(COUNT_LEN);
        let mut raw = [0u8; COUNT_LEN];
        raw.copy_from_slice(head);
        let count = u32::from_be_bytes(raw) as usize;
        self.config.check(count)?;
        self.input = rest;
        Ok(count)
    }

    fn read_element<T: DeserializeOwned>(&mut self) -> CodecResult<T> {
        bincode::deserialize_from(&mut self.input)
            .map_err(|e| CodecError::Deserialization(e.to_string()))
    }
}
