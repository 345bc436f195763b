use thiserror::Error;

/// Errors produced by collection operations.
///
/// Most mutations define a no-op policy instead of failing (removing an
/// absent key returns the receiver unchanged). The variants below cover the
/// remaining cases; none of them leave a partially updated value behind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// An argument has no defined meaning for the operation, such as merging
    /// maps that carry different default functions.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Positional access or cursor placement outside the valid range.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// `next`/`previous` called on an exhausted cursor.
    #[error("no more elements")]
    NoMoreElements,

    /// Structural mutation attempted through a read-only cursor.
    #[error("unsupported mutation: {0}")]
    UnsupportedMutation(&'static str),
}

/// Convenience alias for collection results.
pub type CollectionResult<T> = Result<T, CollectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_out_of_range_message() {
        let err = CollectionError::IndexOutOfRange { index: 7, len: 3 };
        assert_eq!(err.to_string(), "index 7 out of range for length 3");
    }

    #[test]
    fn unsupported_mutation_names_operation() {
        let err = CollectionError::UnsupportedMutation("remove");
        assert_eq!(err.to_string(), "unsupported mutation: remove");
    }

    #[test]
    fn errors_compare_by_value() {
        assert_eq!(CollectionError::NoMoreElements, CollectionError::NoMoreElements);
        assert_ne!(
            CollectionError::InvalidArgument("a".into()),
            CollectionError::InvalidArgument("b".into())
        );
    }
}
