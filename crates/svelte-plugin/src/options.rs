/*
 * options.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Plugin configuration.
 */

//! Plugin configuration.
//!
//! Options can be built programmatically with the `with_*` methods, or read
//! from the JSON object a bundler config carries ([`SvelteOptions::from_json`]).
//! Callbacks (`css`, `onwarn`, `preprocess`) can only be set
//! programmatically.
//!
//! Every key the plugin doesn't consume itself is passed through to the
//! compiler unchanged ([`SvelteOptions::compiler_options`]).

use std::fmt;
use std::rc::Rc;

use serde::Deserialize;
use serde_json::{Map, Value};
use svelte_css::CssWriter;

use crate::compiler::PreprocessStep;
use crate::context::Warning;
use crate::error::{ConfigError, Result};

/// Default extensions of component files
pub const DEFAULT_EXTENSIONS: &[&str] = &[".html", ".svelte"];

/// User warning handler: receives each warning and a function that forwards
/// a warning to the bundler.
pub type WarningHandler = Rc<dyn Fn(&Warning, &dyn Fn(Warning))>;

/// User callback that receives the combined stylesheet at the end of the
/// build.
pub type CssCallback = Rc<dyn Fn(CssWriter) -> Result<()>>;

/// The `css` option.
#[derive(Clone, Default)]
pub enum CssOption {
    #[default]
    Unset,
    /// Passed to the compiler (true injects styles from the component code)
    Enabled(bool),
    /// Extract stylesheets and hand the combined result to a callback
    Callback(CssCallback),
}

impl CssOption {
    pub fn is_callback(&self) -> bool {
        matches!(self, Self::Callback(_))
    }

    /// Truthiness of the option as the user wrote it
    pub fn is_truthy(&self) -> bool {
        matches!(self, Self::Enabled(true) | Self::Callback(_))
    }

    fn from_json(value: Value) -> std::result::Result<Self, ConfigError> {
        match value {
            Value::Null => Ok(Self::Unset),
            Value::Bool(enabled) => Ok(Self::Enabled(enabled)),
            _ => Err(ConfigError::InvalidCss),
        }
    }
}

impl fmt::Debug for CssOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => f.write_str("Unset"),
            Self::Enabled(enabled) => f.debug_tuple("Enabled").field(enabled).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Options for the hot-reload layer.
///
/// The layer always sees `hot: true`, overlaid with whatever the user set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HotOptions(pub Map<String, Value>);

impl HotOptions {
    /// The options the hot-reload layer is created with
    pub fn merged(&self) -> Map<String, Value> {
        let mut merged = Map::new();
        merged.insert("hot".to_string(), Value::Bool(true));
        merged.extend(self.0.clone());
        merged
    }

    fn from_json(value: Value) -> std::result::Result<Option<Self>, ConfigError> {
        match value {
            Value::Null | Value::Bool(false) => Ok(None),
            Value::Bool(true) => Ok(Some(Self::default())),
            Value::Object(map) => Ok(Some(Self(map))),
            _ => Err(ConfigError::InvalidHot),
        }
    }
}

/// Accepts a single pattern or a list of patterns
#[derive(Deserialize)]
#[serde(untagged)]
enum Patterns {
    One(String),
    Many(Vec<String>),
}

impl Patterns {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(pattern) => vec![pattern],
            Self::Many(patterns) => patterns,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOptions {
    #[serde(default)]
    include: Option<Patterns>,
    #[serde(default)]
    exclude: Option<Patterns>,
    #[serde(default)]
    extensions: Option<Vec<String>>,
    #[serde(default)]
    emit_css: bool,
    #[serde(default)]
    hot: Value,
    #[serde(default)]
    css: Value,
    #[serde(default)]
    dev: bool,
    #[serde(default)]
    svelte_path: Option<String>,
    #[serde(default)]
    shared: Option<String>,
    #[serde(default)]
    preprocess: Value,
    #[serde(default)]
    onwarn: Value,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

/// Plugin options.
#[derive(Clone)]
pub struct SvelteOptions {
    /// Glob patterns of ids to transform (empty means all)
    pub include: Vec<String>,
    /// Glob patterns of ids to skip
    pub exclude: Vec<String>,
    /// Extensions (with leading dot) treated as components
    pub extensions: Vec<String>,
    /// Emit each component's styles as a virtual `.css` module
    pub emit_css: bool,
    pub preprocess: Option<Vec<Rc<dyn PreprocessStep>>>,
    pub hot: Option<HotOptions>,
    pub onwarn: Option<WarningHandler>,
    pub css: CssOption,
    pub dev: bool,
    /// Runtime import path for svelte 3 and later
    pub svelte_path: Option<String>,
    /// Shared helpers path for svelte 1 and 2
    pub shared: Option<String>,
    /// Passed to the compiler as-is
    pub compiler_options: Map<String, Value>,
}

impl Default for SvelteOptions {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| (*ext).to_string()).collect(),
            emit_css: false,
            preprocess: None,
            hot: None,
            onwarn: None,
            css: CssOption::Unset,
            dev: false,
            svelte_path: None,
            shared: None,
            compiler_options: Map::new(),
        }
    }
}

impl SvelteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read options from a bundler config object.
    ///
    /// # Errors
    ///
    /// Fails if the value is not an object, if `css` or `hot` has an
    /// unsupported type, or if a callback-only option (`preprocess`,
    /// `onwarn`) is present.
    pub fn from_json(value: Value) -> std::result::Result<Self, ConfigError> {
        let raw: RawOptions = serde_json::from_value(value)?;

        if !raw.preprocess.is_null() {
            return Err(ConfigError::NotSerializable("preprocess"));
        }
        if !raw.onwarn.is_null() {
            return Err(ConfigError::NotSerializable("onwarn"));
        }

        let defaults = Self::default();
        Ok(Self {
            include: raw.include.map(Patterns::into_vec).unwrap_or_default(),
            exclude: raw.exclude.map(Patterns::into_vec).unwrap_or_default(),
            extensions: raw.extensions.unwrap_or(defaults.extensions),
            emit_css: raw.emit_css,
            preprocess: None,
            hot: HotOptions::from_json(raw.hot)?,
            onwarn: None,
            css: CssOption::from_json(raw.css)?,
            dev: raw.dev,
            svelte_path: raw.svelte_path,
            shared: raw.shared,
            compiler_options: raw.rest,
        })
    }

    pub fn with_include(mut self, pattern: impl Into<String>) -> Self {
        self.include.push(pattern.into());
        self
    }

    pub fn with_exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    /// Replace the recognized extensions
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_emit_css(mut self, emit_css: bool) -> Self {
        self.emit_css = emit_css;
        self
    }

    /// Append a preprocessing step
    pub fn with_preprocess(mut self, step: Rc<dyn PreprocessStep>) -> Self {
        self.preprocess.get_or_insert_with(Vec::new).push(step);
        self
    }

    pub fn with_hot(mut self, hot: HotOptions) -> Self {
        self.hot = Some(hot);
        self
    }

    pub fn with_onwarn(mut self, handler: impl Fn(&Warning, &dyn Fn(Warning)) + 'static) -> Self {
        self.onwarn = Some(Rc::new(handler));
        self
    }

    pub fn with_css(mut self, enabled: bool) -> Self {
        self.css = CssOption::Enabled(enabled);
        self
    }

    /// Receive the combined stylesheet at the end of the build
    pub fn with_css_callback(mut self, callback: impl Fn(CssWriter) -> Result<()> + 'static) -> Self {
        self.css = CssOption::Callback(Rc::new(callback));
        self
    }

    pub fn with_dev(mut self, dev: bool) -> Self {
        self.dev = dev;
        self
    }

    pub fn with_svelte_path(mut self, path: impl Into<String>) -> Self {
        self.svelte_path = Some(path.into());
        self
    }

    pub fn with_shared(mut self, path: impl Into<String>) -> Self {
        self.shared = Some(path.into());
        self
    }

    /// Set a compiler option the plugin doesn't interpret
    pub fn with_compiler_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.compiler_options.insert(key.into(), value);
        self
    }

    /// Whether component styles are pulled out of the compiled code
    pub fn extracts_css(&self) -> bool {
        self.emit_css || self.css.is_callback()
    }

    /// Whether the compiler's unused-selector warning is dropped.
    ///
    /// It is noise when styles end up in one combined stylesheet (or are left
    /// to the compiler), and only kept when styles are emitted per component
    /// without a `css` setting.
    pub fn suppresses_unused_selector(&self) -> bool {
        self.css.is_truthy() || !self.emit_css
    }
}

impl fmt::Debug for SvelteOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SvelteOptions")
            .field("include", &self.include)
            .field("exclude", &self.exclude)
            .field("extensions", &self.extensions)
            .field("emit_css", &self.emit_css)
            .field("preprocess", &self.preprocess.as_ref().map(Vec::len))
            .field("hot", &self.hot)
            .field("onwarn", &self.onwarn.is_some())
            .field("css", &self.css)
            .field("dev", &self.dev)
            .field("svelte_path", &self.svelte_path)
            .field("shared", &self.shared)
            .field("compiler_options", &self.compiler_options)
            .finish()
    }
}
