//! Stylesheet aggregation for the svelte bundler plugin.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! This crate provides:
//! - [`CssLookup`]: per-component stylesheet fragments keyed by their virtual
//!   `.css` id, in registration order
//! - [`CombinedCss`]: the single stylesheet and merged source map produced
//!   when the bundle is finalized
//! - [`CssWriter`]: the handle given to the user's `css` callback for writing
//!   the combined stylesheet to disk

mod combined;
mod error;
mod fragment;
mod lookup;
mod writer;

pub use combined::CombinedCss;
pub use error::CssError;
pub use fragment::CssFragment;
pub use lookup::CssLookup;
pub use writer::{CssWriter, DEPRECATION_MESSAGE};
