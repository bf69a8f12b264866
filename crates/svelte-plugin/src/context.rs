/*
 * context.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * The host bundler's side of the hook protocol.
 */

//! Capabilities the host bundler offers to hooks.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Line/column position in a component source (1-based line, 0-based column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// A compiler or plugin warning forwarded to the bundler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<String>,
}

impl Warning {
    /// Create a warning with just a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            filename: None,
            start: None,
            end: None,
            frame: None,
        }
    }

    /// Set the warning code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set the file the warning refers to
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Whether this is the compiler's "unused CSS selector" warning
    pub fn is_unused_selector(&self) -> bool {
        self.code.as_deref() == Some("css-unused-selector")
    }
}

/// The bundler's context, handed to every hook invocation.
///
/// Watch-file registration is an optional capability: bundlers that don't
/// support it report `false` from [`supports_watch_files`], and the plugin
/// returns dependencies alongside the transform output instead.
///
/// [`supports_watch_files`]: PluginContext::supports_watch_files
pub trait PluginContext {
    /// Report a warning to the user
    fn warn(&self, warning: Warning);

    fn supports_watch_files(&self) -> bool {
        false
    }

    /// Ask the bundler to rebuild when `path` changes
    fn add_watch_file(&self, _path: &str) {}
}

/// Shared handle to the bundler context
pub type Host = Rc<dyn PluginContext>;
