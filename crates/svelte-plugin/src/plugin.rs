/*
 * plugin.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * The svelte plugin and its hook table.
 */

//! Plugin assembly.
//!
//! A [`SveltePlugin`] is built once per bundler configuration and turned into
//! a [`PluginHooks`] table. The plugin owns the stylesheet lookup for the
//! build; the bundler drives it by invoking hooks:
//!
//! - `resolve_id`: virtual stylesheet ids, the compiler's runtime ids, and
//!   packages with a `svelte` entry point
//! - `load`: contents of virtual stylesheets
//! - `transform`: compile components
//! - `generate_bundle`: hand the combined stylesheet to the `css` callback

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use svelte_css::{CombinedCss, CssLookup, CssWriter};
use svelte_source_map::SourceMapDocument;

use crate::compiler::{Compiler, CompilerApi};
use crate::context::{Host, Warning};
use crate::error::{ConfigError, PluginError, Result};
use crate::filter::ModuleFilter;
use crate::hooks::{Hook, HookResult, run_after, run_first};
use crate::hot::HotReload;
use crate::options::{CssOption, HotOptions, SvelteOptions};
use crate::resolve::{NodeModulesResolver, PackageResolver, resolve_bare_import};
use crate::transform::{TransformArgs, TransformOutput};

/// Name the plugin reports to the bundler
pub const PLUGIN_NAME: &str = "svelte";

/// Arguments of the `resolve_id` hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveIdArgs {
    pub importee: String,
    pub importer: Option<String>,
}

impl ResolveIdArgs {
    pub fn new(importee: impl Into<String>, importer: Option<&str>) -> Self {
        Self {
            importee: importee.into(),
            importer: importer.map(str::to_string),
        }
    }
}

/// Output of the `load` hook
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutput {
    pub code: String,
    pub map: Option<SourceMapDocument>,
}

/// The hooks a plugin exposes to the bundler.
#[derive(Debug, Clone)]
pub struct PluginHooks {
    pub name: String,
    pub resolve_id: Hook<ResolveIdArgs, Result<Option<String>>>,
    pub load: Hook<String, Result<Option<LoadOutput>>>,
    pub transform: Hook<TransformArgs, Result<Option<TransformOutput>>>,
    pub generate_bundle: Hook<(), Result<()>>,
}

impl PluginHooks {
    /// A hook table with every hook absent
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resolve_id: Hook::Absent,
            load: Hook::Absent,
            transform: Hook::Absent,
            generate_bundle: Hook::Absent,
        }
    }

    /// Stack `layer` on top of `self`.
    ///
    /// The layer answers `resolve_id` and `load` first, its `generate_bundle`
    /// runs after this one, and its name wins. `transform` stays this
    /// table's own: the layer participates through [`HotReload::transform`].
    pub fn layered(self, layer: PluginHooks) -> Self {
        Self {
            name: layer.name,
            resolve_id: run_first(layer.resolve_id, self.resolve_id),
            load: run_first(layer.load, self.load),
            transform: self.transform,
            generate_bundle: run_after(self.generate_bundle, layer.generate_bundle),
        }
    }
}

type HotFactory = Box<dyn FnOnce(&HotOptions) -> Rc<dyn HotReload>>;

/// Configures and validates a [`SveltePlugin`].
pub struct SveltePluginBuilder {
    options: SvelteOptions,
    compiler: Rc<dyn Compiler>,
    resolver: Rc<dyn PackageResolver>,
    base_dir: Option<PathBuf>,
    hot_factory: Option<HotFactory>,
}

impl SveltePluginBuilder {
    /// Resolver for bare package imports (Node.js lookup by default)
    pub fn resolver(mut self, resolver: Rc<dyn PackageResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Directory relative include/exclude patterns are anchored at
    /// (the working directory by default)
    pub fn base_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.base_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Layer created when `hot` is enabled. It receives the hot options.
    pub fn hot_layer(mut self, factory: impl FnOnce(&HotOptions) -> Rc<dyn HotReload> + 'static) -> Self {
        self.hot_factory = Some(Box::new(factory));
        self
    }

    /// Validate the options and create the plugin.
    ///
    /// # Errors
    ///
    /// Fails on invalid patterns or extensions, on paths that don't match
    /// the compiler's API generation, and when `hot` is enabled without a
    /// hot-reload layer.
    pub fn build(self) -> std::result::Result<Rc<SveltePlugin>, ConfigError> {
        let Self {
            options,
            compiler,
            resolver,
            base_dir,
            hot_factory,
        } = self;

        if let Some(extension) = options.extensions.iter().find(|ext| !ext.starts_with('.')) {
            return Err(ConfigError::InvalidExtension(extension.clone()));
        }

        let api = CompilerApi::for_version(compiler.major_version(), &options)?;

        let base_dir = base_dir
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        let filter = ModuleFilter::new(&options.include, &options.exclude, &base_dir)?;

        let hot = match (&options.hot, hot_factory) {
            (None, _) => None,
            (Some(_), None) => return Err(ConfigError::MissingHotLayer),
            (Some(hot_options), Some(factory)) => Some(factory(hot_options)),
        };

        tracing::debug!(
            api = api.format(),
            extensions = ?options.extensions,
            emit_css = options.emit_css,
            hot = hot.is_some(),
            "Created svelte plugin"
        );

        Ok(Rc::new(SveltePlugin {
            options,
            api,
            filter,
            compiler,
            resolver,
            css_lookup: RefCell::new(CssLookup::new()),
            hot,
        }))
    }
}

/// The svelte plugin.
///
/// Single-threaded: the bundler invokes hooks from one thread, and fragment
/// registration happens as transforms complete.
pub struct SveltePlugin {
    pub(crate) options: SvelteOptions,
    pub(crate) api: CompilerApi,
    pub(crate) filter: ModuleFilter,
    pub(crate) compiler: Rc<dyn Compiler>,
    resolver: Rc<dyn PackageResolver>,
    pub(crate) css_lookup: RefCell<CssLookup>,
    pub(crate) hot: Option<Rc<dyn HotReload>>,
}

impl SveltePlugin {
    pub fn builder(options: SvelteOptions, compiler: Rc<dyn Compiler>) -> SveltePluginBuilder {
        SveltePluginBuilder {
            options,
            compiler,
            resolver: Rc::new(NodeModulesResolver),
            base_dir: None,
            hot_factory: None,
        }
    }

    /// Create a plugin with default resolution and no hot-reload layer.
    pub fn new(options: SvelteOptions, compiler: Rc<dyn Compiler>) -> std::result::Result<Rc<Self>, ConfigError> {
        Self::builder(options, compiler).build()
    }

    pub fn api(&self) -> &CompilerApi {
        &self.api
    }

    /// Virtual stylesheet ids registered so far, in output order
    pub fn stylesheet_ids(&self) -> Vec<String> {
        self.css_lookup.borrow().ids().map(str::to_string).collect()
    }

    /// Forget all registered stylesheets (for a full rebuild)
    pub fn reset(&self) {
        self.css_lookup.borrow_mut().clear();
    }

    /// Turn the plugin into the hook table handed to the bundler.
    ///
    /// With a hot-reload layer, its hooks are stacked on top (see
    /// [`PluginHooks::layered`]).
    pub fn into_hooks(self: Rc<Self>) -> PluginHooks {
        let hot = self.hot.clone();
        let base = self.base_hooks();
        match hot {
            Some(layer) => base.layered(layer.hooks()),
            None => base,
        }
    }

    fn base_hooks(self: Rc<Self>) -> PluginHooks {
        let plugin = Rc::clone(&self);
        let resolve_id = Hook::new(move |_host, args: ResolveIdArgs| {
            HookResult::Ready(plugin.resolve_id(&args.importee, args.importer.as_deref()))
        });

        let plugin = Rc::clone(&self);
        let load = Hook::new(move |_host, id: String| HookResult::Ready(Ok(plugin.load(&id))));

        let plugin = Rc::clone(&self);
        let transform = Hook::new(move |host: Host, args: TransformArgs| {
            let plugin = Rc::clone(&plugin);
            HookResult::pending(async move { plugin.transform_module(&host, args).await })
        });

        let plugin = self;
        let generate_bundle = Hook::new(move |host: Host, ()| HookResult::Ready(plugin.generate_bundle(&host)));

        PluginHooks {
            name: PLUGIN_NAME.to_string(),
            resolve_id,
            load,
            transform,
            generate_bundle,
        }
    }

    fn resolve_id(&self, importee: &str, importer: Option<&str>) -> Result<Option<String>> {
        if self.css_lookup.borrow().is_registered(importee) {
            return Ok(Some(importee.to_string()));
        }
        if let Some(resolved) = self.compiler.resolve_runtime_id(importee, importer) {
            return Ok(Some(resolved));
        }
        let Some(importer) = importer else {
            return Ok(None);
        };

        let resolved = resolve_bare_import(self.resolver.as_ref(), importee, importer).map_err(|source| {
            PluginError::Resolve {
                importee: importee.to_string(),
                source,
            }
        })?;
        Ok(resolved.map(|path| path.to_string_lossy().into_owned()))
    }

    fn load(&self, id: &str) -> Option<LoadOutput> {
        self.css_lookup.borrow().get(id).map(|fragment| LoadOutput {
            code: fragment.code.clone(),
            map: fragment.map.clone(),
        })
    }

    fn generate_bundle(&self, host: &Host) -> Result<()> {
        let CssOption::Callback(callback) = &self.options.css else {
            return Ok(());
        };

        let combined = self.css_lookup.borrow().finalize().unwrap_or_else(|| {
            tracing::debug!("No stylesheets to combine, handing an empty stylesheet to the css callback");
            CombinedCss {
                code: String::new(),
                sources: Vec::new(),
                sources_content: Vec::new(),
                mappings: String::new(),
            }
        });

        let warn_host = Rc::clone(host);
        let writer = CssWriter::new(combined, move |message| warn_host.warn(Warning::new(message)));
        callback(writer)
    }
}
