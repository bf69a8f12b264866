//! Per-component stylesheet fragments.
//!
//! Copyright (c) 2025 Posit, PBC

use svelte_source_map::SourceMapDocument;

/// Stylesheet emitted by compiling one component.
///
/// The map, when present, describes a single original file (the component
/// source).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssFragment {
    /// Generated stylesheet text
    pub code: String,
    /// Map from `code` back to the component source
    pub map: Option<SourceMapDocument>,
}

impl CssFragment {
    /// Create a fragment with a source map.
    pub fn new(code: impl Into<String>, map: SourceMapDocument) -> Self {
        Self {
            code: code.into(),
            map: Some(map),
        }
    }

    /// Create a fragment without a source map.
    pub fn without_map(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            map: None,
        }
    }

    /// Check if the fragment has any stylesheet text
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Number of generated lines the fragment occupies once a newline
    /// separator is appended to it.
    pub fn line_span(&self) -> usize {
        self.code.bytes().filter(|&b| b == b'\n').count() + 1
    }
}
