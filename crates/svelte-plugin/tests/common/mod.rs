//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use svelte_plugin::{
    CompileError, CompileOptions, Compiled, Compiler, CssOutput, Host, HookResult, JsOutput,
    PluginContext, PluginError, Position, PreprocessInput, PreprocessStep, PreprocessTarget,
    Processed, Warning,
};
use svelte_source_map::SourceMapDocument;

/// Compiler double: turns a component into a fixed module shape and pulls
/// out whatever sits between `<style>` and `</style>`.
pub struct FakeCompiler {
    pub major: u32,
    pub warnings: Vec<Warning>,
    pub vars: Option<Value>,
    pub calls: RefCell<Vec<CompileOptions>>,
}

impl FakeCompiler {
    pub fn new(major: u32) -> Self {
        Self {
            major,
            warnings: Vec::new(),
            vars: None,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_warning(mut self, warning: Warning) -> Self {
        self.warnings.push(warning);
        self
    }

    pub fn with_vars(mut self, vars: Value) -> Self {
        self.vars = Some(vars);
        self
    }

    pub fn last_options(&self) -> CompileOptions {
        self.calls.borrow().last().cloned().expect("compile was called")
    }
}

fn map_for(filename: &str, source: &str) -> SourceMapDocument {
    SourceMapDocument::new(
        None,
        vec![filename.to_string()],
        vec![Some(source.to_string())],
        "AAAA".to_string(),
    )
}

#[async_trait(?Send)]
impl Compiler for FakeCompiler {
    fn major_version(&self) -> u32 {
        self.major
    }

    fn compile(&self, source: &str, options: &CompileOptions) -> Result<Compiled, CompileError> {
        self.calls.borrow_mut().push(options.clone());

        if source.contains("<error>") {
            return Err(CompileError::new("Unexpected token")
                .at(options.filename.clone(), Position { line: 1, column: 1 }));
        }

        let name = options.name.clone().unwrap_or_else(|| "Component".to_string());
        let styles = source
            .split_once("<style>")
            .and_then(|(_, rest)| rest.split_once("</style>"))
            .map(|(css, _)| css.trim().to_string())
            .filter(|css| !css.is_empty());

        Ok(Compiled {
            js: JsOutput {
                code: format!("const {name} = create_component();\nexport default {name};\n"),
                map: Some(map_for(&options.filename, source)),
            },
            css: CssOutput {
                map: styles.as_ref().map(|_| map_for(&options.filename, source)),
                code: styles,
            },
            warnings: self.warnings.clone(),
            vars: self.vars.clone(),
        })
    }

    async fn preprocess(
        &self,
        source: &str,
        steps: &[Rc<dyn PreprocessStep>],
        filename: &str,
    ) -> Result<Processed, PluginError> {
        let mut code = source.to_string();
        let mut dependencies = Vec::new();
        for step in steps {
            let input = PreprocessInput {
                content: code.clone(),
                attributes: Map::new(),
                filename: filename.to_string(),
            };
            if let Some(processed) = step.process(input).await? {
                code = processed.code;
                // Svelte 1 and 2 drop dependencies on the floor
                if self.major >= 3 {
                    dependencies.extend(processed.dependencies);
                }
            }
        }
        Ok(Processed { code, dependencies })
    }

    fn resolve_runtime_id(&self, importee: &str, _importer: Option<&str>) -> Option<String> {
        (importee == "svelte/internal").then(|| "/svelte/src/runtime/internal/index.js".to_string())
    }
}

/// Markup step that rewrites one string and reports a dependency.
pub struct Replace {
    pub from: &'static str,
    pub to: &'static str,
    pub dependency: Option<&'static str>,
}

#[async_trait(?Send)]
impl PreprocessStep for Replace {
    fn target(&self) -> PreprocessTarget {
        PreprocessTarget::Markup
    }

    async fn process(&self, input: PreprocessInput) -> Result<Option<Processed>, PluginError> {
        if !input.content.contains(self.from) {
            return Ok(None);
        }
        let mut processed = Processed::new(input.content.replace(self.from, self.to));
        if let Some(dependency) = self.dependency {
            processed = processed.with_dependency(dependency);
        }
        Ok(Some(processed))
    }
}

/// Markup step that fails on any component containing `marker`.
pub struct Reject {
    pub marker: &'static str,
}

#[async_trait(?Send)]
impl PreprocessStep for Reject {
    fn target(&self) -> PreprocessTarget {
        PreprocessTarget::Markup
    }

    async fn process(&self, input: PreprocessInput) -> Result<Option<Processed>, PluginError> {
        if input.content.contains(self.marker) {
            return Err(PluginError::preprocess(
                input.filename,
                format!("unsupported markup {:?}", self.marker),
            ));
        }
        Ok(None)
    }
}

/// Bundler context double that records what the plugin reports.
#[derive(Default)]
pub struct RecordingContext {
    pub warnings: RefCell<Vec<Warning>>,
    pub watch_files: RefCell<Vec<String>>,
    pub watch_capable: Cell<bool>,
}

impl RecordingContext {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn with_watch_files() -> Rc<Self> {
        let context = Self::default();
        context.watch_capable.set(true);
        Rc::new(context)
    }

    pub fn warning_codes(&self) -> Vec<Option<String>> {
        self.warnings.borrow().iter().map(|w| w.code.clone()).collect()
    }
}

impl PluginContext for RecordingContext {
    fn warn(&self, warning: Warning) {
        self.warnings.borrow_mut().push(warning);
    }

    fn supports_watch_files(&self) -> bool {
        self.watch_capable.get()
    }

    fn add_watch_file(&self, path: &str) {
        self.watch_files.borrow_mut().push(path.to_string());
    }
}

pub fn host(context: &Rc<RecordingContext>) -> Host {
    context.clone()
}

/// Drive a hook result to completion
pub fn settle<T: 'static>(result: HookResult<T>) -> T {
    pollster::block_on(result.resolve())
}
