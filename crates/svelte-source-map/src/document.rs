//! Version 3 source map documents

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::codec::decode;
use crate::error::{MalformedMapError, SourceMapError};
use crate::segment::Mappings;

/// A version 3 source map as it appears on disk or in a data URL.
///
/// `sources` and `sources_content` are parallel: entry `i` of each describes
/// the same original file. Compilers emit `null` content for files they did
/// not embed, hence the `Option`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMapDocument {
    pub version: u32,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub sources_content: Vec<Option<String>>,
    #[serde(default)]
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMapDocument {
    /// Create a version 3 document with no names.
    pub fn new(
        file: Option<String>,
        sources: Vec<String>,
        sources_content: Vec<Option<String>>,
        mappings: String,
    ) -> Self {
        Self {
            version: 3,
            file,
            sources,
            sources_content,
            names: Vec::new(),
            mappings,
        }
    }

    /// Parse a document from JSON text.
    pub fn from_json(json: &str) -> Result<Self, SourceMapError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Compact JSON form.
    pub fn to_json(&self) -> Result<String, SourceMapError> {
        Ok(serde_json::to_string(self)?)
    }

    /// JSON indented with two spaces, as written next to output files.
    pub fn to_json_pretty(&self) -> Result<String, SourceMapError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Inline `data:` URL suitable for a `sourceMappingURL` comment.
    pub fn to_url(&self) -> Result<String, SourceMapError> {
        let json = self.to_json()?;
        Ok(format!(
            "data:application/json;charset=utf-8;base64,{}",
            STANDARD.encode(json)
        ))
    }

    /// Decode this document's line table.
    pub fn decoded_mappings(&self) -> Result<Mappings, MalformedMapError> {
        decode(&self.mappings)
    }

    /// First source path and its content, if any.
    ///
    /// Per-component stylesheet maps describe exactly one original file.
    pub fn primary_source(&self) -> Option<(&str, Option<&str>)> {
        let source = self.sources.first()?;
        let content = self.sources_content.first().and_then(|c| c.as_deref());
        Some((source.as_str(), content))
    }
}
