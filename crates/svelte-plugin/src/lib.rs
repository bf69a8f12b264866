//! Bundler plugin that compiles svelte components.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! The plugin sits between a bundler and the svelte compiler. For every
//! component module it preprocesses the source, compiles it, forwards
//! compiler warnings, and pulls component styles out into virtual `.css`
//! modules. At the end of the build those stylesheets can be combined into
//! one file with a merged source map.
//!
//! ```ignore
//! let options = SvelteOptions::new()
//!     .with_include("src/**/*.svelte")
//!     .with_css_callback(|css| Ok(css.write("public/bundle.css", true)?));
//! let hooks = SveltePlugin::new(options, compiler)?.into_hooks();
//! ```
//!
//! The compiler is supplied by the embedding through the [`Compiler`] trait.
//! Hot module reloading is an optional layer ([`HotReload`]) whose hooks are
//! stacked on the plugin's with [`run_first`] and [`run_after`].

pub mod compiler;
pub mod context;
pub mod error;
pub mod filter;
pub mod hooks;
pub mod hot;
pub mod options;
pub mod plugin;
pub mod resolve;
pub mod transform;

pub use compiler::{
    CompileError, CompileOptions, Compiled, Compiler, CompilerApi, CssOutput, JsOutput,
    PreprocessInput, PreprocessStep, PreprocessTarget, Processed,
};
pub use context::{Host, PluginContext, Position, Warning};
pub use error::{ConfigError, PluginError, Result};
pub use filter::ModuleFilter;
pub use hooks::{Hook, HookFn, HookResult, HookValue, run_after, run_first};
pub use hot::{HotReload, HotTransformInput};
pub use options::{CssCallback, CssOption, HotOptions, SvelteOptions, WarningHandler};
pub use plugin::{LoadOutput, PLUGIN_NAME, PluginHooks, ResolveIdArgs, SveltePlugin, SveltePluginBuilder};
pub use resolve::{NodeModulesResolver, PackageResolver};
pub use transform::{TransformArgs, TransformOutput, TransformStage};

pub use svelte_css::{CssWriter, DEPRECATION_MESSAGE};
