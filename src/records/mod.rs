//! Records: the data model and the parser seam.
//!
//! # Overview
//!
//! - [`ItemDescriptor`] - Pointer to one detail document, produced from the index
//! - [`Record`] / [`Entry`] - Structured result of parsing a detail document
//! - [`RecordParser`] - Trait the pipeline calls to parse bodies
//! - [`JsonRecordParser`] - Reference parser for JSON documents
//!
//! # Example
//!
//! ```
//! use fetchline_core::records::{JsonRecordParser, RecordParser};
//!
//! let parser = JsonRecordParser::new();
//! let index = parser.parse_index(r#"[{"id": "a", "url": "https://example.com/a"}]"#);
//! assert_eq!(index.len(), 1);
//!
//! let record = parser
//!     .parse_detail(r#"{"entries": [{"role": "user", "content": "hi"}]}"#, &index.descriptors[0])
//!     .unwrap();
//! assert_eq!(record.entry_count(), 1);
//! ```

mod error;
mod json;
mod model;
mod parser;

pub use error::ParseError;
pub use json::{JsonRecordParser, UNKNOWN_CATEGORY};
pub use model::{Entry, EntryRole, ItemDescriptor, Record};
pub use parser::{IndexParse, RecordParser};
