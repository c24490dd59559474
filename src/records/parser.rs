//! Parser seam between raw document bodies and the data model.

use super::error::ParseError;
use super::model::{ItemDescriptor, Record};

/// Outcome of parsing an index document.
///
/// Malformed entries never fail the whole index; they land in `skipped`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexParse {
    /// Descriptors in document order.
    pub descriptors: Vec<ItemDescriptor>,
    /// Entries (or the whole document) that could not be parsed.
    pub skipped: Vec<ParseError>,
}

impl IndexParse {
    /// Creates an empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parsed descriptor.
    pub fn add_descriptor(&mut self, descriptor: ItemDescriptor) {
        self.descriptors.push(descriptor);
    }

    /// Records a skipped entry.
    pub fn add_skipped(&mut self, error: ParseError) {
        self.skipped.push(error);
    }

    /// Returns true if no descriptors were parsed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Returns count of parsed descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns count of skipped entries.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Turns document bodies into descriptors and records.
///
/// Parsing is synchronous and CPU-only; the pipeline calls it between fetches.
pub trait RecordParser: Send + Sync {
    /// Extracts descriptors from an index body.
    fn parse_index(&self, body: &str) -> IndexParse;

    /// Builds a record from a detail body.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] when the body cannot yield a record.
    fn parse_detail(&self, body: &str, descriptor: &ItemDescriptor) -> Result<Record, ParseError>;
}
