/*
 * compiler.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Interface to the svelte compiler.
 */

//! The svelte compiler as the plugin sees it.
//!
//! The compiler itself is external: an embedding supplies a [`Compiler`]
//! implementation (a JS engine binding, a subprocess, a test double). The
//! plugin only decides which options to pass and what to do with the output.
//!
//! Two generations of the compiler API exist. Svelte 1 and 2 produce `es`
//! modules, want a component `name` and import helpers from a `shared`
//! module. Svelte 3 and later produce `esm` modules that import the runtime
//! from `sveltePath`.

use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use svelte_source_map::SourceMapDocument;

use crate::context::{Position, Warning};
use crate::error::{ConfigError, Result};
use crate::options::SvelteOptions;

/// Default runtime import path for svelte 3 and later
pub const DEFAULT_SVELTE_PATH: &str = "svelte";

/// Default helpers module for svelte 1 and 2
pub const DEFAULT_SHARED: &str = "svelte/shared.js";

/// Which compiler API generation is in use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompilerApi {
    /// Svelte 1 and 2
    Legacy { shared: String },
    /// Svelte 3 and later
    Modern { svelte_path: String },
}

impl CompilerApi {
    /// Select the API for a compiler's major version.
    ///
    /// # Errors
    ///
    /// Fails if the options set a path that belongs to the other API.
    pub fn for_version(major_version: u32, options: &SvelteOptions) -> std::result::Result<Self, ConfigError> {
        if major_version >= 3 {
            if options.shared.is_some() {
                return Err(ConfigError::UnsupportedOption {
                    option: "shared",
                    major_version,
                });
            }
            Ok(Self::Modern {
                svelte_path: options
                    .svelte_path
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SVELTE_PATH.to_string()),
            })
        } else {
            if options.svelte_path.is_some() {
                return Err(ConfigError::UnsupportedOption {
                    option: "sveltePath",
                    major_version,
                });
            }
            Ok(Self::Legacy {
                shared: options
                    .shared
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SHARED.to_string()),
            })
        }
    }

    /// Module format the compiler is asked for
    pub fn format(&self) -> &'static str {
        match self {
            Self::Legacy { .. } => "es",
            Self::Modern { .. } => "esm",
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy { .. })
    }
}

/// Options for one `compile` call.
///
/// Serializes to the option object the compiler expects. Passthrough options
/// are flattened next to the fixed ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileOptions {
    pub filename: String,
    pub format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub svelte_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css: Option<bool>,
    pub dev: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsOutput {
    pub code: String,
    pub map: Option<SourceMapDocument>,
}

/// Component styles. `code` is `None` when the component has no styles (or
/// the compiler injected them into the JS).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CssOutput {
    pub code: Option<String>,
    pub map: Option<SourceMapDocument>,
}

/// Output of one `compile` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compiled {
    pub js: JsOutput,
    pub css: CssOutput,
    pub warnings: Vec<Warning>,
    /// Variable metadata (svelte 3 and later)
    pub vars: Option<Value>,
}

/// A compile failure, with the location when the compiler reports one.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub message: String,
    pub code: Option<String>,
    pub filename: Option<String>,
    pub start: Option<Position>,
    pub frame: Option<String>,
}

impl CompileError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            filename: None,
            start: None,
            frame: None,
        }
    }

    pub fn at(mut self, filename: impl Into<String>, start: Position) -> Self {
        self.filename = Some(filename.into());
        self.start = Some(start);
        self
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.filename, &self.start) {
            (Some(filename), Some(start)) => write!(
                f,
                "{}:{}:{}: {}",
                filename, start.line, start.column, self.message
            )?,
            (Some(filename), None) => write!(f, "{}: {}", filename, self.message)?,
            _ => write!(f, "{}", self.message)?,
        }
        if let Some(frame) = &self.frame {
            write!(f, "\n{}", frame)?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileError {}

/// Block of a component a preprocessing step applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreprocessTarget {
    Markup,
    Script,
    Style,
}

/// What a preprocessing step is given.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessInput {
    /// Whole component for markup steps, block content otherwise
    pub content: String,
    /// Attributes of the `<script>` or `<style>` tag
    pub attributes: Map<String, Value>,
    pub filename: String,
}

/// Result of a preprocessing step, or of the whole preprocessing pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Processed {
    pub code: String,
    /// Files the result depends on (imports resolved by the step)
    pub dependencies: Vec<String>,
}

impl Processed {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependency(mut self, path: impl Into<String>) -> Self {
        self.dependencies.push(path.into());
        self
    }
}

/// A user preprocessing step (for example a TypeScript or SCSS transform).
///
/// Returning `Ok(None)` leaves the block unchanged.
#[async_trait(?Send)]
pub trait PreprocessStep {
    fn target(&self) -> PreprocessTarget;

    async fn process(&self, input: PreprocessInput) -> Result<Option<Processed>>;
}

/// The svelte compiler.
#[async_trait(?Send)]
pub trait Compiler {
    /// Major version, which selects the [`CompilerApi`]
    fn major_version(&self) -> u32;

    fn compile(&self, source: &str, options: &CompileOptions) -> std::result::Result<Compiled, CompileError>;

    /// Run preprocessing steps over a component source.
    ///
    /// Svelte 1 and 2 don't report dependencies; the plugin records them
    /// from the steps itself.
    async fn preprocess(
        &self,
        source: &str,
        steps: &[Rc<dyn PreprocessStep>],
        filename: &str,
    ) -> Result<Processed>;

    /// Resolve an import of the svelte runtime itself (for example
    /// `svelte/internal`), if the compiler ships a resolver for it.
    fn resolve_runtime_id(&self, _importee: &str, _importer: Option<&str>) -> Option<String> {
        None
    }
}
