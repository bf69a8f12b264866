//! Source maps for the svelte bundler plugin
//!
//! This crate provides the pieces needed to merge per-component stylesheet
//! maps into one map for a combined stylesheet:
//!
//! - [`decode`] / [`encode`]: the base64 VLQ line table codec
//! - [`Segment`] and [`Mappings`]: the decoded, absolute-valued line table
//! - [`SourceMapDocument`]: the version 3 JSON document that carries a line
//!   table together with its `sources` and `sourcesContent`
//!
//! # Example
//!
//! ```rust
//! use svelte_source_map::{decode, encode};
//!
//! let mut lines = decode("AAAA,SAAS;AACA").unwrap();
//! for segment in lines.iter_mut().flatten() {
//!     segment.set_source_index(2);
//! }
//! assert_eq!(encode(&lines), "AAEA,SAAS;AACA");
//! ```

pub mod codec;
pub mod document;
pub mod error;
pub mod segment;

pub use codec::{decode, encode};
pub use document::SourceMapDocument;
pub use error::{MalformedMapError, SourceMapError};
pub use segment::{MappingLine, Mappings, OriginalLocation, Segment};
