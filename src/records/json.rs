//! Reference [`RecordParser`] for JSON index and detail documents.
//!
//! # Index shape
//!
//! Either a top-level array or an object with an `items` array. Each item
//! needs `id` (string or integer) and `url`; `title` and `category` (alias
//! `bot_name`) are optional.
//!
//! # Detail shape
//!
//! An object with optional `title`, `category` (alias `bot_name`) and an
//! `entries` array (alias `messages`). Entries carry `role`, `content`, and
//! optionally `timestamp` and `id`.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::error::ParseError;
use super::model::{Entry, EntryRole, ItemDescriptor, Record};
use super::parser::{IndexParse, RecordParser};

/// Category used when neither the document nor the descriptor names one.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawDescriptor {
    id: RawId,
    url: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "bot_name")]
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDetail {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "bot_name")]
    category: Option<String>,
    #[serde(default, alias = "messages")]
    entries: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    role: String,
    content: String,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default, alias = "entry_id")]
    id: Option<RawId>,
}

/// Parses JSON documents, resolving relative URLs against an optional base.
#[derive(Debug, Clone, Default)]
pub struct JsonRecordParser {
    base_url: Option<Url>,
}

impl JsonRecordParser {
    /// Creates a parser that requires absolute descriptor URLs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser that resolves relative descriptor URLs against `base_url`.
    #[must_use]
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            base_url: Some(base_url),
        }
    }

    fn resolve_url(&self, raw: &str) -> Result<String, String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err("empty url".to_string());
        }
        let resolved = match &self.base_url {
            Some(base) => base.join(trimmed),
            None => Url::parse(trimmed),
        };
        resolved
            .map(String::from)
            .map_err(|e| format!("invalid url '{trimmed}': {e}"))
    }

    fn descriptor_from(&self, index: usize, value: Value) -> Result<ItemDescriptor, ParseError> {
        let raw: RawDescriptor = serde_json::from_value(value)
            .map_err(|e| ParseError::malformed_entry(index, e.to_string()))?;

        let id = raw.id.into_string().trim().to_string();
        if id.is_empty() {
            return Err(ParseError::malformed_entry(index, "empty id"));
        }
        let url = self
            .resolve_url(&raw.url)
            .map_err(|reason| ParseError::malformed_entry(index, reason))?;

        Ok(ItemDescriptor {
            title: non_blank(raw.title).unwrap_or_else(|| id.clone()),
            category: non_blank(raw.category).unwrap_or_else(|| UNKNOWN_CATEGORY.to_string()),
            id,
            url,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn role_from(raw: &str) -> EntryRole {
    match raw.trim().to_ascii_lowercase().as_str() {
        "user" | "human" | "actor" => EntryRole::Actor,
        _ => EntryRole::Responder,
    }
}

fn entry_from(index: usize, value: Value) -> Result<Entry, ParseError> {
    let raw: RawEntry = serde_json::from_value(value)
        .map_err(|e| ParseError::malformed_entry(index, e.to_string()))?;
    Ok(Entry {
        role: role_from(&raw.role),
        content: raw.content.trim().to_string(),
        timestamp: non_blank(raw.timestamp),
        entry_id: raw.id.map(RawId::into_string).unwrap_or_default(),
    })
}

impl RecordParser for JsonRecordParser {
    fn parse_index(&self, body: &str) -> IndexParse {
        let mut result = IndexParse::new();

        let document: Value = match serde_json::from_str(body) {
            Ok(document) => document,
            Err(error) => {
                warn!(error = %error, "index body is not valid JSON");
                result.add_skipped(error.into());
                return result;
            }
        };

        let items = match document {
            Value::Array(items) => items,
            Value::Object(mut object) => match object.remove("items") {
                Some(Value::Array(items)) => items,
                _ => {
                    result.add_skipped(ParseError::UnexpectedShape {
                        expected: "array or object with an `items` array",
                    });
                    return result;
                }
            },
            _ => {
                result.add_skipped(ParseError::UnexpectedShape {
                    expected: "array or object with an `items` array",
                });
                return result;
            }
        };

        for (index, item) in items.into_iter().enumerate() {
            match self.descriptor_from(index, item) {
                Ok(descriptor) => result.add_descriptor(descriptor),
                Err(error) => {
                    warn!(error = %error, "skipping index entry");
                    result.add_skipped(error);
                }
            }
        }

        debug!(
            descriptors = result.len(),
            skipped = result.skipped_count(),
            "parsed index"
        );
        result
    }

    fn parse_detail(&self, body: &str, descriptor: &ItemDescriptor) -> Result<Record, ParseError> {
        let document: Value = serde_json::from_str(body)?;
        if !document.is_object() {
            return Err(ParseError::UnexpectedShape {
                expected: "object",
            });
        }
        let raw: RawDetail = serde_json::from_value(document)?;

        let mut entries = Vec::with_capacity(raw.entries.len());
        for (index, value) in raw.entries.into_iter().enumerate() {
            match entry_from(index, value) {
                Ok(entry) => entries.push(entry),
                Err(error) => {
                    warn!(item_id = %descriptor.id, error = %error, "skipping entry");
                }
            }
        }

        let mut metadata = BTreeMap::new();
        metadata.insert("url".to_string(), Value::from(descriptor.url.clone()));
        metadata.insert("entry_count".to_string(), Value::from(entries.len()));

        Ok(Record {
            id: descriptor.id.clone(),
            title: non_blank(raw.title).unwrap_or_else(|| descriptor.title.clone()),
            category: non_blank(raw.category).unwrap_or_else(|| descriptor.category.clone()),
            entries,
            captured_at: Utc::now(),
            metadata,
        })
    }
}
