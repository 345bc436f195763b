use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("truncated input: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("too many elements: {count} (max {max})")]
    TooManyElements { count: usize, max: usize },

    #[error("element count mismatch: declared {declared}, written {written}")]
    CountMismatch { declared: usize, written: usize },

    #[error("{0} trailing bytes after decoded value")]
    TrailingBytes(usize),
}

pub type CodecResult<T> = Result<T, CodecError>;
