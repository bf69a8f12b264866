//! The transform hook end to end, with a compiler double.

mod common;

use std::rc::Rc;

use common::{FakeCompiler, RecordingContext, Reject, Replace, host, settle};
use pretty_assertions::assert_eq;
use serde_json::json;
use svelte_plugin::{
    PluginError, PluginHooks, ResolveIdArgs, SveltePlugin, SvelteOptions, TransformArgs, Warning,
};

const APP: &str = "<h1>Hello</h1>\n<style>h1 { color: red; }</style>";

fn plugin(options: SvelteOptions, compiler: &Rc<FakeCompiler>) -> PluginHooks {
    SveltePlugin::builder(options, compiler.clone())
        .base_dir("/project")
        .build()
        .unwrap()
        .into_hooks()
}

fn transform(
    hooks: &PluginHooks,
    context: &Rc<RecordingContext>,
    code: &str,
    id: &str,
) -> svelte_plugin::Result<Option<svelte_plugin::TransformOutput>> {
    settle(hooks.transform.call(host(context), TransformArgs::new(code, id)))
}

#[test]
fn test_compiles_component_with_modern_api() {
    let compiler = Rc::new(FakeCompiler::new(4));
    let hooks = plugin(SvelteOptions::new(), &compiler);
    let context = RecordingContext::new();

    let output = transform(&hooks, &context, APP, "/project/src/App.svelte")
        .unwrap()
        .unwrap();
    assert_eq!(
        output.code,
        "const Component = create_component();\nexport default Component;\n"
    );
    assert!(output.map.is_some());
    assert!(output.dependencies.is_empty());

    let options = serde_json::to_value(compiler.last_options()).unwrap();
    assert_eq!(
        options,
        json!({
            "filename": "/project/src/App.svelte",
            "format": "esm",
            "sveltePath": "svelte",
            "dev": false
        })
    );
}

#[test]
fn test_legacy_api_names_component() {
    let compiler = Rc::new(FakeCompiler::new(2));
    let hooks = plugin(SvelteOptions::new(), &compiler);
    let context = RecordingContext::new();

    let output = transform(&hooks, &context, "<p/>", "/project/src/nav-bar.html")
        .unwrap()
        .unwrap();
    assert!(output.code.contains("export default Nav_bar;"));

    let options = compiler.last_options();
    assert_eq!(options.format, "es");
    assert_eq!(options.name.as_deref(), Some("Nav_bar"));
    assert_eq!(options.shared.as_deref(), Some("svelte/shared.js"));
    assert_eq!(options.svelte_path, None);
}

#[test]
fn test_skips_modules_outside_filter_and_extensions() {
    let compiler = Rc::new(FakeCompiler::new(3));
    let options = SvelteOptions::new()
        .with_include("src/**")
        .with_exclude("src/vendor/**");
    let hooks = plugin(options, &compiler);
    let context = RecordingContext::new();

    for id in [
        "/project/src/main.js",
        "/project/lib/App.svelte",
        "/project/src/vendor/Widget.svelte",
        "\0/project/src/App.svelte",
    ] {
        assert_eq!(transform(&hooks, &context, APP, id).unwrap(), None, "{id}");
    }
    assert!(compiler.calls.borrow().is_empty());

    assert!(transform(&hooks, &context, APP, "/project/src/App.svelte").unwrap().is_some());
}

#[test]
fn test_custom_extensions() {
    let compiler = Rc::new(FakeCompiler::new(3));
    let hooks = plugin(SvelteOptions::new().with_extensions([".svx"]), &compiler);
    let context = RecordingContext::new();

    assert!(transform(&hooks, &context, APP, "/project/Post.svx").unwrap().is_some());
    assert_eq!(transform(&hooks, &context, APP, "/project/App.svelte").unwrap(), None);
}

#[test]
fn test_compile_error_fails_the_module() {
    let compiler = Rc::new(FakeCompiler::new(3));
    let hooks = plugin(SvelteOptions::new(), &compiler);
    let context = RecordingContext::new();

    let err = transform(&hooks, &context, "<error>", "/project/src/Broken.svelte").unwrap_err();
    assert!(matches!(err, PluginError::Compile(_)));
    assert_eq!(err.to_string(), "/project/src/Broken.svelte:1:1: Unexpected token");
}

fn noisy_compiler() -> Rc<FakeCompiler> {
    Rc::new(
        FakeCompiler::new(3)
            .with_warning(Warning::new("Unused CSS selector").with_code("css-unused-selector"))
            .with_warning(Warning::new("A11y: <img> element should have an alt attribute").with_code("a11y-missing-attribute")),
    )
}

#[test]
fn test_unused_selector_warning_is_dropped_by_default() {
    let hooks = plugin(SvelteOptions::new(), &noisy_compiler());
    let context = RecordingContext::new();

    transform(&hooks, &context, APP, "/project/App.svelte").unwrap();
    assert_eq!(context.warning_codes(), vec![Some("a11y-missing-attribute".to_string())]);
}

#[test]
fn test_unused_selector_warning_surfaces_with_emit_css() {
    let hooks = plugin(SvelteOptions::new().with_emit_css(true), &noisy_compiler());
    let context = RecordingContext::new();

    transform(&hooks, &context, APP, "/project/App.svelte").unwrap();
    assert_eq!(
        context.warning_codes(),
        vec![
            Some("css-unused-selector".to_string()),
            Some("a11y-missing-attribute".to_string())
        ]
    );
}

#[test]
fn test_onwarn_handler_decides_what_is_forwarded() {
    let options = SvelteOptions::new().with_onwarn(|warning, forward| {
        if warning.code.as_deref() == Some("a11y-missing-attribute") {
            forward(Warning::new(format!("[a11y] {}", warning.message)));
        }
    });
    let hooks = plugin(options, &noisy_compiler());
    let context = RecordingContext::new();

    transform(&hooks, &context, APP, "/project/App.svelte").unwrap();
    let warnings = context.warnings.borrow();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.starts_with("[a11y] A11y:"));
}

#[test]
fn test_emit_css_appends_import_and_serves_stylesheet() {
    let compiler = Rc::new(FakeCompiler::new(3));
    let hooks = plugin(SvelteOptions::new().with_emit_css(true), &compiler);
    let context = RecordingContext::new();

    let output = transform(&hooks, &context, APP, "/project/src/App.svelte")
        .unwrap()
        .unwrap();
    assert!(output.code.ends_with("\nimport \"/project/src/App.css\";\n"));
    assert_eq!(compiler.last_options().css, Some(false));

    let resolved = settle(
        hooks
            .resolve_id
            .call(host(&context), ResolveIdArgs::new("/project/src/App.css", Some("/project/src/App.svelte"))),
    )
    .unwrap();
    assert_eq!(resolved.as_deref(), Some("/project/src/App.css"));

    let loaded = settle(hooks.load.call(host(&context), "/project/src/App.css".to_string()))
        .unwrap()
        .unwrap();
    assert!(loaded.code.starts_with("h1 { color: red; }\n/*# sourceMappingURL=data:application/json;charset=utf-8;base64,"));
    assert!(loaded.map.is_some());

    assert_eq!(
        settle(hooks.load.call(host(&context), "/project/src/Other.css".to_string())).unwrap(),
        None
    );
}

#[test]
fn test_component_without_styles_registers_nothing() {
    let compiler = Rc::new(FakeCompiler::new(3));
    let plugin = SveltePlugin::builder(SvelteOptions::new().with_emit_css(true), compiler)
        .base_dir("/project")
        .build()
        .unwrap();
    let hooks = plugin.clone().into_hooks();
    let context = RecordingContext::new();

    let output = transform(&hooks, &context, "<p>plain</p>", "/project/Plain.svelte")
        .unwrap()
        .unwrap();
    assert!(!output.code.contains("import"));
    assert!(plugin.stylesheet_ids().is_empty());
}

#[test]
fn test_css_option_is_passed_to_compiler() {
    let compiler = Rc::new(FakeCompiler::new(3));
    let hooks = plugin(SvelteOptions::new().with_css(true), &compiler);
    let context = RecordingContext::new();

    transform(&hooks, &context, APP, "/project/App.svelte").unwrap();
    assert_eq!(compiler.last_options().css, Some(true));
}

#[test]
fn test_passthrough_compiler_options() {
    let compiler = Rc::new(FakeCompiler::new(3));
    let options = SvelteOptions::from_json(json!({"accessors": true, "dev": true})).unwrap();
    let hooks = plugin(options, &compiler);
    let context = RecordingContext::new();

    transform(&hooks, &context, APP, "/project/App.svelte").unwrap();
    let options = compiler.last_options();
    assert!(options.dev);
    assert_eq!(options.extra.get("accessors"), Some(&json!(true)));
}

#[test]
fn test_dev_mode_attaches_compile_metadata() {
    let compiler = Rc::new(FakeCompiler::new(3).with_vars(json!([{"name": "count"}])));
    let hooks = plugin(SvelteOptions::new().with_dev(true), &compiler);
    let context = RecordingContext::new();

    let output = transform(&hooks, &context, APP, "/project/App.svelte")
        .unwrap()
        .unwrap();
    assert!(output.code.contains("export default Component;\nComponent.$compile = {\"vars\":[{\"name\":\"count\"}]};\n"));
}

fn preprocessed_options() -> SvelteOptions {
    SvelteOptions::new()
        .with_preprocess(Rc::new(Replace {
            from: "Hello",
            to: "Bonjour",
            dependency: Some("/project/src/i18n/fr.json"),
        }))
        .with_preprocess(Rc::new(Replace {
            from: "<p>",
            to: "<div>",
            dependency: None,
        }))
}

#[test]
fn test_preprocess_dependencies_are_returned_without_watch_support() {
    let compiler = Rc::new(FakeCompiler::new(3));
    let hooks = plugin(preprocessed_options(), &compiler);
    let context = RecordingContext::new();

    let output = transform(&hooks, &context, APP, "/project/src/App.svelte")
        .unwrap()
        .unwrap();
    assert_eq!(output.dependencies, vec!["/project/src/i18n/fr.json"]);
    assert!(context.watch_files.borrow().is_empty());
}

#[test]
fn test_preprocess_dependencies_are_watched_when_supported() {
    let compiler = Rc::new(FakeCompiler::new(3));
    let hooks = plugin(preprocessed_options(), &compiler);
    let context = RecordingContext::with_watch_files();

    let output = transform(&hooks, &context, APP, "/project/src/App.svelte")
        .unwrap()
        .unwrap();
    assert!(output.dependencies.is_empty());
    assert_eq!(*context.watch_files.borrow(), vec!["/project/src/i18n/fr.json"]);
}

#[test]
fn test_legacy_preprocess_records_dependencies_from_steps() {
    let compiler = Rc::new(FakeCompiler::new(2));
    let hooks = plugin(preprocessed_options(), &compiler);
    let context = RecordingContext::new();

    let output = transform(&hooks, &context, APP, "/project/src/App.svelte")
        .unwrap()
        .unwrap();
    assert_eq!(output.dependencies, vec!["/project/src/i18n/fr.json"]);
}

#[test]
fn test_failing_preprocess_step_fails_the_module() {
    for major in [2, 3] {
        let compiler = Rc::new(FakeCompiler::new(major));
        let options = preprocessed_options().with_preprocess(Rc::new(Reject { marker: "<marquee>" }));
        let hooks = plugin(options, &compiler);
        let context = RecordingContext::new();

        let err = transform(&hooks, &context, "<marquee>Hi</marquee>", "/project/src/Old.svelte").unwrap_err();
        match err {
            PluginError::Preprocess { filename, message } => {
                assert_eq!(filename, "/project/src/Old.svelte");
                assert_eq!(message, "unsupported markup \"<marquee>\"");
            }
            other => panic!("expected a preprocess error, got {other:?}"),
        }
        assert!(compiler.calls.borrow().is_empty());

        // Components the step accepts still compile
        transform(&hooks, &context, APP, "/project/src/App.svelte")
            .unwrap()
            .unwrap();
        assert_eq!(compiler.calls.borrow().len(), 1);
    }
}

#[test]
fn test_resolve_id_falls_back_to_runtime_and_packages() {
    let temp = tempfile::tempdir().unwrap();
    let package = temp.path().join("node_modules").join("ui-kit");
    std::fs::create_dir_all(&package).unwrap();
    std::fs::write(package.join("package.json"), r#"{"svelte":"src/index.js"}"#).unwrap();
    let importer = temp
        .path()
        .join("src")
        .join("App.svelte")
        .to_string_lossy()
        .into_owned();

    let compiler = Rc::new(FakeCompiler::new(3));
    let hooks = plugin(SvelteOptions::new(), &compiler);
    let context = RecordingContext::new();
    let resolve = |importee: &str, importer: Option<&str>| {
        settle(hooks.resolve_id.call(host(&context), ResolveIdArgs::new(importee, importer))).unwrap()
    };

    assert_eq!(
        resolve("svelte/internal", None).as_deref(),
        Some("/svelte/src/runtime/internal/index.js")
    );
    assert_eq!(
        resolve("ui-kit", Some(importer.as_str())),
        Some(package.join("src").join("index.js").to_string_lossy().into_owned())
    );
    assert_eq!(resolve("ui-kit", None), None);
    assert_eq!(resolve("./Button.svelte", Some(importer.as_str())), None);
    assert_eq!(resolve("left-pad", Some(importer.as_str())), None);
}
