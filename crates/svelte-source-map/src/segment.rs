//! Decoded line table types
//!
//! All values are absolute (the relative deltas of the encoded form are
//! resolved by [`crate::decode`]), so segments taken from unrelated maps can
//! be edited and concatenated freely before re-encoding.

/// Position in an original source file that a generated column maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OriginalLocation {
    /// Index into the map's `sources`
    pub source_index: u32,
    /// Line in the original source (0-indexed)
    pub line: u32,
    /// Column in the original source (0-indexed)
    pub column: u32,
    /// Index into the map's `names`, if the segment carries one
    pub name_index: Option<u32>,
}

/// One mapping entry on a generated line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Segment {
    /// Column in the generated text (0-indexed)
    pub generated_column: u32,
    /// Original position, absent for 1-field segments
    pub original: Option<OriginalLocation>,
}

/// Segments of one generated line, ordered by generated column
pub type MappingLine = Vec<Segment>;

/// Lines of a decoded map, in generated line order
pub type Mappings = Vec<MappingLine>;

impl Segment {
    /// A segment with no original position
    pub fn unmapped(generated_column: u32) -> Self {
        Self {
            generated_column,
            original: None,
        }
    }

    /// A 4-field segment
    pub fn new(generated_column: u32, source_index: u32, line: u32, column: u32) -> Self {
        Self {
            generated_column,
            original: Some(OriginalLocation {
                source_index,
                line,
                column,
                name_index: None,
            }),
        }
    }

    /// A 5-field segment
    pub fn named(
        generated_column: u32,
        source_index: u32,
        line: u32,
        column: u32,
        name_index: u32,
    ) -> Self {
        Self {
            generated_column,
            original: Some(OriginalLocation {
                source_index,
                line,
                column,
                name_index: Some(name_index),
            }),
        }
    }

    /// Source index, if the segment maps to an original position
    pub fn source_index(&self) -> Option<u32> {
        self.original.map(|o| o.source_index)
    }

    /// Point the segment at another entry of `sources`.
    ///
    /// 1-field segments have no source and are left untouched.
    pub fn set_source_index(&mut self, index: u32) {
        if let Some(original) = self.original.as_mut() {
            original.source_index = index;
        }
    }

    /// Copy of the segment pointing at another entry of `sources`
    pub fn with_source_index(mut self, index: u32) -> Self {
        self.set_source_index(index);
        self
    }

    /// Number of fields this segment occupies in the encoded form
    pub fn field_count(&self) -> usize {
        match self.original {
            None => 1,
            Some(OriginalLocation {
                name_index: None, ..
            }) => 4,
            Some(_) => 5,
        }
    }
}
