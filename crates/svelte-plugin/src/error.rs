/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Error types for the svelte plugin.
 */

//! Error types for the svelte plugin.
//!
//! [`ConfigError`] is raised while constructing a plugin and is never
//! recovered. [`PluginError`] is what hooks return: a failure for one module
//! (compile or preprocess errors) or for the finalization step.

use svelte_css::CssError;
use svelte_source_map::SourceMapError;
use thiserror::Error;

use crate::compiler::CompileError;

/// Invalid plugin configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("options.css must be a boolean or a function")]
    InvalidCss,

    #[error("options.hot must be a boolean or an object")]
    InvalidHot,

    #[error("options.{0} must be set programmatically, it cannot come from JSON")]
    NotSerializable(&'static str),

    #[error("Invalid {field} pattern '{pattern}': {source}")]
    InvalidPattern {
        field: &'static str,
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Extension '{0}' must start with '.'")]
    InvalidExtension(String),

    #[error("options.{option} is not supported by svelte {major_version}")]
    UnsupportedOption {
        option: &'static str,
        major_version: u32,
    },

    #[error("Hot reloading is enabled but no hot-reload layer was provided")]
    MissingHotLayer,

    #[error("Invalid plugin options: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum PluginError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Compile(#[from] CompileError),

    #[error("Preprocessing {filename} failed: {message}")]
    Preprocess { filename: String, message: String },

    #[error(transparent)]
    Css(#[from] CssError),

    #[error("Stylesheet source map error: {0}")]
    SourceMap(#[from] SourceMapError),

    #[error("Failed to resolve '{importee}': {source}")]
    Resolve {
        importee: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{hook} hook failed: {message}")]
    Hook { hook: &'static str, message: String },
}

impl PluginError {
    /// Create a preprocessing error for `filename`.
    pub fn preprocess(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Preprocess {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an error raised by a hook implementation or user callback.
    pub fn hook(hook: &'static str, message: impl Into<String>) -> Self {
        Self::Hook {
            hook,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PluginError>;
