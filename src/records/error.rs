//! Error types for record parsing.

use thiserror::Error;

/// Errors raised while turning a document body into descriptors or records.
///
/// Parse errors are never retried: refetching the same body cannot fix them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The body is not a well-formed document at all.
    #[error("invalid document: {reason}")]
    InvalidDocument {
        /// Decoder message.
        reason: String,
    },

    /// The document decoded but has the wrong top-level shape.
    #[error("unexpected document shape: expected {expected}")]
    UnexpectedShape {
        /// What the parser was looking for.
        expected: &'static str,
    },

    /// One entry in a list could not be parsed; the rest of the list is unaffected.
    #[error("malformed entry at index {index}: {reason}")]
    MalformedEntry {
        /// Zero-based position in the list.
        index: usize,
        /// Why the entry was rejected.
        reason: String,
    },
}

impl ParseError {
    /// Creates an invalid-document error.
    pub fn invalid_document(reason: impl Into<String>) -> Self {
        Self::InvalidDocument {
            reason: reason.into(),
        }
    }

    /// Creates a malformed-entry error.
    pub fn malformed_entry(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedEntry {
            index,
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(error: serde_json::Error) -> Self {
        Self::invalid_document(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display_includes_index() {
        let error = ParseError::malformed_entry(3, "missing field `url`");
        let msg = error.to_string();
        assert!(msg.contains("index 3"), "Expected index in: {msg}");
        assert!(msg.contains("missing field `url`"));
    }

    #[test]
    fn test_parse_error_from_serde_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error = ParseError::from(json_error);
        assert!(matches!(error, ParseError::InvalidDocument { .. }));
    }
}
