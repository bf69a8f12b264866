//! Registration-ordered table of stylesheet fragments.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Every compiled component that carries styles registers its fragment under
//! a virtual `.css` id derived from the component path. The bundler asks for
//! those ids through the plugin's `load` hook, and at the end of the build the
//! whole table is folded into one [`CombinedCss`].
//!
//! Order matters for deterministic output: fragments are emitted in the order
//! they were first registered. A component that is transformed again during
//! an incremental rebuild replaces its fragment in place and keeps its slot.

use hashlink::LinkedHashMap;
use svelte_source_map::{Mappings, encode};

use crate::combined::CombinedCss;
use crate::fragment::CssFragment;

/// Stylesheet fragments keyed by virtual id, in registration order.
#[derive(Debug, Default)]
pub struct CssLookup {
    fragments: LinkedHashMap<String, CssFragment>,
}

impl CssLookup {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            fragments: LinkedHashMap::new(),
        }
    }

    /// Register a fragment, replacing any earlier fragment with the same id.
    ///
    /// A replaced fragment keeps its original position. Returns the previous
    /// fragment, if any.
    pub fn register(&mut self, id: impl Into<String>, fragment: CssFragment) -> Option<CssFragment> {
        let id = id.into();
        let previous = self.fragments.replace(id.clone(), fragment);
        tracing::debug!(id = %id, replaced = previous.is_some(), "Registered stylesheet fragment");
        previous
    }

    /// Check whether `id` is a registered virtual stylesheet
    pub fn is_registered(&self, id: &str) -> bool {
        self.fragments.contains_key(id)
    }

    /// Get the fragment registered under `id`
    pub fn get(&self, id: &str) -> Option<&CssFragment> {
        self.fragments.get(id)
    }

    /// Number of registered fragments
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Check if no fragment is registered
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Registered ids in output order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.fragments.keys().map(String::as_str)
    }

    /// Drop all fragments (used when a full rebuild starts over)
    pub fn clear(&mut self) {
        self.fragments.clear();
    }

    /// Fold all fragments into one stylesheet with a merged source map.
    ///
    /// Returns `None` if no fragment has any text.
    ///
    /// Each fragment's text is appended followed by a newline. Its map
    /// contributes its single source (and content), and its decoded lines
    /// with every source index pointed at that new entry. Lines are
    /// concatenated in the same order as the text; a fragment whose map has
    /// fewer lines than its text is padded with empty lines so the next
    /// fragment's mappings start on the right generated line. A fragment with
    /// no usable map contributes empty lines only.
    pub fn finalize(&self) -> Option<CombinedCss> {
        if self.fragments.values().all(CssFragment::is_empty) {
            return None;
        }

        let mut code = String::new();
        let mut sources = Vec::new();
        let mut sources_content = Vec::new();
        let mut mappings = Mappings::new();

        for (id, fragment) in &self.fragments {
            if fragment.is_empty() {
                continue;
            }

            code.push_str(&fragment.code);
            code.push('\n');

            let mut lines = Mappings::new();
            if let Some(map) = &fragment.map {
                match (map.decoded_mappings(), map.primary_source()) {
                    (Ok(decoded), Some((source, content))) => {
                        let index = sources.len() as u32;
                        sources.push(source.to_string());
                        sources_content.push(content.map(str::to_string));
                        lines = decoded;
                        for segment in lines.iter_mut().flatten() {
                            segment.set_source_index(index);
                        }
                    }
                    (Ok(_), None) => {
                        tracing::debug!(id = %id, "Stylesheet source map has no sources, skipping");
                    }
                    (Err(err), _) => {
                        tracing::warn!(id = %id, error = %err, "Dropping malformed stylesheet source map");
                    }
                }
            }

            lines.resize_with(fragment.line_span(), Vec::new);
            mappings.extend(lines);
        }

        tracing::debug!(
            fragments = self.fragments.len(),
            sources = sources.len(),
            "Combined stylesheet fragments"
        );

        Some(CombinedCss {
            code,
            sources,
            sources_content,
            mappings: encode(&mappings),
        })
    }
}
