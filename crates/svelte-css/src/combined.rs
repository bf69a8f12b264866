//! The combined stylesheet artifact.
//!
//! Copyright (c) 2025 Posit, PBC

use svelte_source_map::SourceMapDocument;

/// All registered fragments folded into one stylesheet.
///
/// `sources[i]` and `sources_content[i]` describe the same component; every
/// source index in `mappings` is a valid index into `sources`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedCss {
    /// Fragment texts, each followed by a newline
    pub code: String,
    /// Component paths, in fragment order
    pub sources: Vec<String>,
    /// Component sources, parallel to `sources`
    pub sources_content: Vec<Option<String>>,
    /// Encoded line table for `code`
    pub mappings: String,
}

impl CombinedCss {
    /// Build the version 3 map document for this stylesheet.
    pub fn to_source_map(&self, file: Option<String>) -> SourceMapDocument {
        SourceMapDocument::new(
            file,
            self.sources.clone(),
            self.sources_content.clone(),
            self.mappings.clone(),
        )
    }
}
