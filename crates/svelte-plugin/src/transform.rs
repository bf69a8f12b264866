/*
 * transform.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Per-module transform: preprocess, compile, extract styles.
 */

//! The `transform` hook.
//!
//! Each module goes through a fixed sequence of stages:
//!
//! ```text
//! Filtering -> Preprocessing -> Compiling -> WarningReview
//!           -> StylesheetRegistration -> Augmentation -> Done
//! ```
//!
//! A module that fails the filter or has an unrecognized extension is
//! skipped (the hook produces nothing). A preprocessing or compile failure
//! fails the hook for that module only.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Value, json};
use svelte_css::CssFragment;
use svelte_source_map::SourceMapDocument;

use crate::compiler::{
    CompileOptions, Compiled, CompilerApi, PreprocessInput, PreprocessStep, PreprocessTarget,
    Processed,
};
use crate::context::{Host, Warning};
use crate::error::Result;
use crate::filter::extname;
use crate::hot::HotTransformInput;
use crate::options::CssOption;
use crate::plugin::SveltePlugin;

/// Arguments of the `transform` hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformArgs {
    pub code: String,
    pub id: String,
}

impl TransformArgs {
    pub fn new(code: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            id: id.into(),
        }
    }
}

/// Output of the `transform` hook for a component.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutput {
    pub code: String,
    pub map: Option<SourceMapDocument>,
    /// Files to watch, when the bundler can't register them itself
    pub dependencies: Vec<String>,
}

/// Stage of the per-module transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformStage {
    Filtering,
    Preprocessing,
    Compiling,
    WarningReview,
    StylesheetRegistration,
    Augmentation,
    Done,
}

impl fmt::Display for TransformStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Filtering => "filtering",
            Self::Preprocessing => "preprocessing",
            Self::Compiling => "compiling",
            Self::WarningReview => "warning-review",
            Self::StylesheetRegistration => "stylesheet-registration",
            Self::Augmentation => "augmentation",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

impl SveltePlugin {
    pub(crate) async fn transform_module(
        &self,
        host: &Host,
        args: TransformArgs,
    ) -> Result<Option<TransformOutput>> {
        let TransformArgs { code, id } = args;

        trace_stage(TransformStage::Filtering, &id);
        if !self.filter.matches(&id) {
            return Ok(None);
        }
        let extension = extname(&id);
        if !self.options.extensions.iter().any(|ext| ext == extension) {
            return Ok(None);
        }

        trace_stage(TransformStage::Preprocessing, &id);
        let mut dependencies = Vec::new();
        let code = self.preprocess(code, &id, &mut dependencies).await?;

        trace_stage(TransformStage::Compiling, &id);
        let compile_options = self.compile_options(&id);
        let mut compiled = self.compiler.compile(&code, &compile_options)?;

        trace_stage(TransformStage::WarningReview, &id);
        self.review_warnings(host, &compiled.warnings);

        trace_stage(TransformStage::StylesheetRegistration, &id);
        self.register_stylesheet(&id, extension, &mut compiled)?;

        if host.supports_watch_files() {
            for dependency in dependencies.drain(..) {
                host.add_watch_file(&dependency);
            }
        }

        trace_stage(TransformStage::Augmentation, &id);
        let output_code = match &self.hot {
            Some(hot) => hot.transform(
                host.as_ref(),
                HotTransformInput {
                    id: &id,
                    compiled: &compiled,
                    original_code: &code,
                    compile_options: &compile_options,
                },
            )?,
            None if self.options.dev => emulate_compile_export(&compiled.js.code, compiled.vars.as_ref()),
            None => compiled.js.code.clone(),
        };

        trace_stage(TransformStage::Done, &id);
        Ok(Some(TransformOutput {
            code: output_code,
            map: compiled.js.map,
            dependencies,
        }))
    }

    async fn preprocess(&self, code: String, id: &str, dependencies: &mut Vec<String>) -> Result<String> {
        let Some(steps) = self.options.preprocess.as_ref() else {
            return Ok(code);
        };

        if self.api.is_legacy() {
            // Svelte 1 and 2 don't report dependencies, so record them per step
            let recorded = Rc::new(RefCell::new(Vec::new()));
            let wrapped: Vec<Rc<dyn PreprocessStep>> = steps
                .iter()
                .map(|step| {
                    Rc::new(RecordDependencies {
                        inner: Rc::clone(step),
                        sink: Rc::clone(&recorded),
                    }) as Rc<dyn PreprocessStep>
                })
                .collect();
            let processed = self.compiler.preprocess(&code, &wrapped, id).await?;
            dependencies.append(&mut recorded.borrow_mut());
            Ok(processed.code)
        } else {
            let processed = self.compiler.preprocess(&code, steps, id).await?;
            dependencies.extend(processed.dependencies);
            Ok(processed.code)
        }
    }

    pub(crate) fn compile_options(&self, id: &str) -> CompileOptions {
        let (name, svelte_path, shared) = match &self.api {
            CompilerApi::Legacy { shared } => (Some(capitalize(&sanitize(id))), None, Some(shared.clone())),
            CompilerApi::Modern { svelte_path } => (None, Some(svelte_path.clone()), None),
        };

        let css = if self.options.extracts_css() {
            Some(false)
        } else {
            match self.options.css {
                CssOption::Enabled(enabled) => Some(enabled),
                _ => None,
            }
        };

        CompileOptions {
            filename: id.to_string(),
            format: self.api.format(),
            name,
            svelte_path,
            shared,
            css,
            dev: self.options.dev,
            extra: self.options.compiler_options.clone(),
        }
    }

    fn review_warnings(&self, host: &Host, warnings: &[Warning]) {
        let suppress_unused = self.options.suppresses_unused_selector();
        for warning in warnings {
            if suppress_unused && warning.is_unused_selector() {
                continue;
            }
            match &self.options.onwarn {
                Some(handler) => {
                    let forward = |warning: Warning| host.warn(warning);
                    handler(warning, &forward);
                }
                None => host.warn(warning.clone()),
            }
        }
    }

    fn register_stylesheet(&self, id: &str, extension: &str, compiled: &mut Compiled) -> Result<()> {
        if !self.options.extracts_css() {
            return Ok(());
        }
        let Some(css_code) = compiled.css.code.as_mut().filter(|code| !code.is_empty()) else {
            return Ok(());
        };

        let css_id = virtual_css_id(id, extension);
        if self.options.emit_css {
            if let Some(map) = &compiled.css.map {
                css_code.push_str(&format!("\n/*# sourceMappingURL={} */", map.to_url()?));
            }
            compiled
                .js
                .code
                .push_str(&format!("\nimport {};\n", Value::String(css_id.clone())));
        }

        self.css_lookup
            .borrow_mut()
            .register(
                css_id,
                CssFragment {
                    code: css_code.clone(),
                    map: compiled.css.map.clone(),
                },
            );
        Ok(())
    }
}

fn trace_stage(stage: TransformStage, id: &str) {
    tracing::trace!(stage = %stage, id, "Transform stage");
}

/// Wraps a user step to record the dependencies it reports.
struct RecordDependencies {
    inner: Rc<dyn PreprocessStep>,
    sink: Rc<RefCell<Vec<String>>>,
}

#[async_trait(?Send)]
impl PreprocessStep for RecordDependencies {
    fn target(&self) -> PreprocessTarget {
        self.inner.target()
    }

    async fn process(&self, input: PreprocessInput) -> Result<Option<Processed>> {
        let processed = self.inner.process(input).await?;
        if let Some(processed) = &processed {
            self.sink
                .borrow_mut()
                .extend(processed.dependencies.iter().cloned());
        }
        Ok(processed)
    }
}

static NON_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z_$0-9]+").expect("Invalid regex pattern for identifier characters"));

static DEFAULT_EXPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(export default ([^;]*);)").expect("Invalid regex pattern for default export"));

/// Identifier-safe form of a file's base name (without extension).
pub fn sanitize(input: &str) -> String {
    let name = input.rsplit(['/', '\\']).next().unwrap_or(input);
    let extension = extname(name);
    let stem = if extension.is_empty() {
        name.to_string()
    } else {
        name.replacen(extension, "", 1)
    };

    let replaced = NON_IDENTIFIER.replace_all(&stem, "_");
    let trimmed = replaced.strip_prefix('_').unwrap_or(&replaced);
    let trimmed = trimmed.strip_suffix('_').unwrap_or(trimmed);

    if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{trimmed}")
    } else {
        trimmed.to_string()
    }
}

/// Upper-case the first character.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Virtual id of a component's stylesheet: the component id with its
/// extension replaced by `.css`.
pub fn virtual_css_id(id: &str, extension: &str) -> String {
    let stem = id.strip_suffix(extension).unwrap_or(id);
    format!("{stem}.css")
}

/// Attach compile metadata to the default export, so dev tooling can
/// inspect `Component.$compile.vars` the way it can with the
/// hot-reload layer.
pub fn emulate_compile_export(code: &str, vars: Option<&Value>) -> String {
    let data = match vars {
        Some(vars) => json!({ "vars": vars }),
        None => json!({}),
    };
    DEFAULT_EXPORT
        .replace(code, |caps: &Captures| {
            format!("{}\n{}.$compile = {};\n", &caps[1], &caps[2], data)
        })
        .into_owned()
}
