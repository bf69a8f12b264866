//! Error types for stylesheet output.
//!
//! Copyright (c) 2025 Posit, PBC

use svelte_source_map::SourceMapError;
use thiserror::Error;

/// Errors that can occur while writing the combined stylesheet
#[derive(Debug, Error)]
pub enum CssError {
    /// Writing the stylesheet or its map failed
    #[error("Failed to write stylesheet: {0}")]
    Io(#[from] std::io::Error),

    /// The merged source map could not be serialized
    #[error("Failed to serialize stylesheet source map: {0}")]
    SourceMap(#[from] SourceMapError),
}
