//! Error types for source map handling

use thiserror::Error;

/// The `mappings` string of a source map could not be decoded.
///
/// Positions are byte offsets into the encoded string. Callers merging
/// several maps treat this as "no map" for the affected input rather than
/// failing the whole merge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedMapError {
    /// A character outside the base64 alphabet (and not `,` or `;`)
    #[error("invalid character {character:?} in mappings at offset {offset}")]
    InvalidCharacter { character: char, offset: usize },

    /// The string ended in the middle of a VLQ value
    #[error("unterminated VLQ value at offset {offset}")]
    UnterminatedValue { offset: usize },

    /// A segment had a field count other than 1, 4 or 5 (0 for an empty segment)
    #[error("segment at offset {offset} has {fields} fields (expected 1, 4 or 5)")]
    InvalidSegmentLength { offset: usize, fields: usize },

    /// A VLQ value or an accumulated position does not fit in 32 bits
    #[error("value out of range at offset {offset}")]
    Overflow { offset: usize },

    /// Relative deltas accumulated to a negative position
    #[error("negative {field} at offset {offset}")]
    NegativeValue { field: &'static str, offset: usize },
}

/// Errors reading or writing a source map document
#[derive(Debug, Error)]
pub enum SourceMapError {
    /// The document is not valid source map JSON
    #[error("invalid source map JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The document's `mappings` could not be decoded
    #[error(transparent)]
    Malformed(#[from] MalformedMapError),
}
