//! Data model shared by parsers, the pipeline and exporters.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pointer to one detail document, produced by index parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDescriptor {
    /// Identifier, unique within one run.
    pub id: String,
    /// Absolute URL of the detail document.
    pub url: String,
    /// Display title.
    pub title: String,
    /// Source or category label used for grouping.
    pub category: String,
}

impl ItemDescriptor {
    /// Creates a descriptor.
    pub fn new(
        id: impl Into<String>,
        url: impl Into<String>,
        title: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            title: title.into(),
            category: category.into(),
        }
    }
}

/// Who produced an [`Entry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryRole {
    /// The initiating party.
    Actor,
    /// The answering party.
    Responder,
}

impl std::fmt::Display for EntryRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Actor => write!(f, "actor"),
            Self::Responder => write!(f, "responder"),
        }
    }
}

/// One entry inside a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub role: EntryRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub entry_id: String,
}

/// Structured result of parsing one detail document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Matches the originating descriptor's id.
    pub id: String,
    pub title: String,
    pub category: String,
    pub entries: Vec<Entry>,
    /// When the record was parsed.
    pub captured_at: DateTime<Utc>,
    /// Free-form extra fields (source URL, entry count, ...).
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Record {
    /// Returns the number of entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the record has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clears every entry timestamp.
    pub fn strip_timestamps(&mut self) {
        for entry in &mut self.entries {
            entry.timestamp = None;
        }
    }
}
