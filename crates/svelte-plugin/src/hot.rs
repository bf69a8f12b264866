/*
 * hot.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Seam for the hot-module-reload layer.
 */

//! Hot-reload layering.
//!
//! When `hot` is enabled, a hot-reload layer is stacked on the plugin. The
//! layer contributes its own hooks (composed with the plugin's by
//! [`SveltePlugin::into_hooks`]) and gets the last word on each compiled
//! component's code, typically wrapping it in a proxy that swaps the
//! component on update.
//!
//! [`SveltePlugin::into_hooks`]: crate::SveltePlugin::into_hooks

use crate::compiler::{CompileOptions, Compiled};
use crate::context::PluginContext;
use crate::error::Result;
use crate::plugin::PluginHooks;

/// Everything the layer needs to augment one compiled component.
#[derive(Debug, Clone, Copy)]
pub struct HotTransformInput<'a> {
    pub id: &'a str,
    /// Compiler output, with the stylesheet import already appended when
    /// styles are emitted per component
    pub compiled: &'a Compiled,
    /// Component source after preprocessing
    pub original_code: &'a str,
    pub compile_options: &'a CompileOptions,
}

/// A hot-module-reload layer.
pub trait HotReload {
    /// Hooks of the layer. Its `name` becomes the composed plugin's name.
    fn hooks(&self) -> PluginHooks;

    /// Produce the final module code for a compiled component.
    fn transform(&self, host: &dyn PluginContext, input: HotTransformInput<'_>) -> Result<String>;
}
