use serde::{Deserialize, Serialize};

/// Default bound on a declared element count.
pub const DEFAULT_MAX_ELEMENTS: usize = 1 << 24;

/// Limits applied by [`BincodeWriter`](crate::BincodeWriter) and
/// [`BincodeReader`](crate::BincodeReader).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Largest element count a sequence may declare.
    pub max_elements: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_elements: DEFAULT_MAX_ELEMENTS,
        }
    }
}

impl CodecConfig {
    pub fn with_max_elements(mut self, max_elements: usize) -> Self {
        self.max_elements = max_elements;
        self
    }

    pub(crate) fn check(&self, count: usize) -> crate::CodecResult<()> {
        if count > self.max_elements {
            return Err(crate::CodecError::TooManyElements {
                count,
                max: self.max_elements,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limit() {
        assert_eq!(CodecConfig::default().max_elements, 16_777_216);
    }

    #[test]
    fn json_roundtrip_and_partial() {
        let config = CodecConfig::default().with_max_elements(10);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: CodecConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);

        let empty: CodecConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, CodecConfig::default());
    }
}
