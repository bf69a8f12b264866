/*
 * resolve.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Resolution of bare imports to a package's svelte entry point.
//!
//! A package can point svelte consumers at its uncompiled components with a
//! `svelte` field in `package.json`:
//!
//! ```json
//! { "name": "ui-kit", "main": "dist/index.js", "svelte": "src/index.js" }
//! ```
//!
//! `import { Button } from "ui-kit"` then resolves to
//! `node_modules/ui-kit/src/index.js`. Deep imports (`ui-kit/Button.svelte`)
//! resolve against the directory named by a top-level `"svelte.root"` key
//! when the package declares one and the file exists there:
//!
//! ```json
//! { "name": "ui-kit", "svelte.root": "src" }
//! ```

use std::io;
use std::path::{Component, Path, PathBuf};

use serde_json::Value;

/// How the plugin finds and reads package manifests.
pub trait PackageResolver {
    /// Locate `<name>/package.json` as seen from `dir`
    fn find_package_json(&self, name: &str, dir: &Path) -> Option<PathBuf>;

    /// Read and parse a manifest. `None` if it is unreadable or not JSON.
    fn read_package_json(&self, path: &Path) -> Option<Value>;

    fn exists(&self, path: &Path) -> io::Result<bool>;
}

/// Resolver following the Node.js `node_modules` lookup: the package is
/// searched in `node_modules` of `dir` and each of its ancestors.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeModulesResolver;

impl PackageResolver for NodeModulesResolver {
    fn find_package_json(&self, name: &str, dir: &Path) -> Option<PathBuf> {
        dir.ancestors()
            .map(|ancestor| ancestor.join("node_modules").join(name).join("package.json"))
            .find(|candidate| candidate.is_file())
    }

    fn read_package_json(&self, path: &Path) -> Option<Value> {
        let text = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&text).ok()
    }

    fn exists(&self, path: &Path) -> io::Result<bool> {
        match std::fs::metadata(path) {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }
}

/// A bare import split into package name and deep path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BareImport<'a> {
    /// Package name, including the scope for `@scope/name`
    pub name: String,
    pub subpath: Vec<&'a str>,
}

impl<'a> BareImport<'a> {
    /// Split `importee`. Returns `None` for relative, absolute and virtual
    /// ids, which are not package imports.
    pub fn parse(importee: &'a str) -> Option<Self> {
        if importee.is_empty()
            || importee.starts_with('.')
            || importee.starts_with('\0')
            || Path::new(importee).is_absolute()
        {
            return None;
        }

        let mut parts = importee.split('/');
        let first = parts.next()?;
        let name = if first.starts_with('@') {
            format!("{}/{}", first, parts.next()?)
        } else {
            first.to_string()
        };

        Some(Self {
            name,
            subpath: parts.filter(|part| !part.is_empty()).collect(),
        })
    }
}

/// Resolve `importee` (imported from the file `importer`) to a svelte entry
/// point or a file under the package's svelte root.
///
/// Returns `Ok(None)` when the import isn't a package import, the package
/// can't be found, or it declares nothing for svelte consumers.
///
/// # Errors
///
/// Only filesystem errors other than "not found" while probing a deep import.
pub fn resolve_bare_import(
    resolver: &dyn PackageResolver,
    importee: &str,
    importer: &str,
) -> io::Result<Option<PathBuf>> {
    let Some(import) = BareImport::parse(importee) else {
        return Ok(None);
    };

    let importer_dir = Path::new(importer).parent().unwrap_or(Path::new(""));
    let Some(manifest_path) = resolver.find_package_json(&import.name, importer_dir) else {
        tracing::trace!(importee, "No package.json found");
        return Ok(None);
    };
    let Some(manifest) = resolver.read_package_json(&manifest_path) else {
        tracing::debug!(manifest = %manifest_path.display(), "Unreadable package.json");
        return Ok(None);
    };
    let package_dir = manifest_path.parent().unwrap_or(Path::new(""));

    if !import.subpath.is_empty() {
        let Some(root) = manifest.get("svelte.root").and_then(Value::as_str) else {
            return Ok(None);
        };
        let mut candidate = package_dir.join(root);
        candidate.extend(&import.subpath);
        let candidate = normalize_path(&candidate);
        return if resolver.exists(&candidate)? {
            tracing::debug!(importee, resolved = %candidate.display(), "Resolved deep import from svelte.root");
            Ok(Some(candidate))
        } else {
            Ok(None)
        };
    }

    match manifest.get("svelte").and_then(Value::as_str) {
        Some(entry) => {
            let resolved = normalize_path(&package_dir.join(entry));
            tracing::debug!(importee, resolved = %resolved.display(), "Resolved svelte entry point");
            Ok(Some(resolved))
        }
        None => Ok(None),
    }
}

/// Lexically drop `.` segments and fold `..` segments.
fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_package(root: &Path, name: &str, manifest: &str) -> PathBuf {
        let dir = root.join("node_modules").join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("package.json"), manifest).unwrap();
        dir
    }

    #[test]
    fn test_parse_bare_import() {
        assert_eq!(
            BareImport::parse("ui-kit").unwrap(),
            BareImport {
                name: "ui-kit".to_string(),
                subpath: vec![]
            }
        );
        assert_eq!(
            BareImport::parse("@acme/ui/Button.svelte").unwrap(),
            BareImport {
                name: "@acme/ui".to_string(),
                subpath: vec!["Button.svelte"]
            }
        );
        assert!(BareImport::parse("./Button.svelte").is_none());
        assert!(BareImport::parse("/abs/Button.svelte").is_none());
        assert!(BareImport::parse("\0virtual").is_none());
        assert!(BareImport::parse("@acme").is_none());
    }

    #[test]
    fn test_resolves_svelte_field() {
        let temp = tempfile::tempdir().unwrap();
        let dir = write_package(
            temp.path(),
            "ui-kit",
            r#"{"name":"ui-kit","main":"dist/index.js","svelte":"./src/index.js"}"#,
        );
        let importer = temp.path().join("src").join("App.svelte");

        let resolved = resolve_bare_import(&NodeModulesResolver, "ui-kit", &importer.to_string_lossy())
            .unwrap()
            .unwrap();
        assert_eq!(resolved, dir.join("src").join("index.js"));
    }

    #[test]
    fn test_resolves_deep_import_under_svelte_root() {
        let temp = tempfile::tempdir().unwrap();
        let dir = write_package(
            temp.path(),
            "@acme/ui",
            r#"{"name":"@acme/ui","svelte.root":"src"}"#,
        );
        fs::create_dir_all(dir.join("src")).unwrap();
        fs::write(dir.join("src").join("Button.svelte"), "<button/>").unwrap();
        let importer = temp.path().join("App.svelte").to_string_lossy().into_owned();

        let resolved = resolve_bare_import(&NodeModulesResolver, "@acme/ui/Button.svelte", &importer).unwrap();
        assert_eq!(resolved, Some(dir.join("src").join("Button.svelte")));

        let missing = resolve_bare_import(&NodeModulesResolver, "@acme/ui/Missing.svelte", &importer).unwrap();
        assert_eq!(missing, None);
    }

    #[test]
    fn test_nested_svelte_root_object_is_not_a_root() {
        let temp = tempfile::tempdir().unwrap();
        let dir = write_package(temp.path(), "ui", r#"{"name":"ui","svelte":{"root":"src"}}"#);
        fs::create_dir_all(dir.join("src")).unwrap();
        fs::write(dir.join("src").join("Button.svelte"), "<button/>").unwrap();
        let importer = temp.path().join("App.svelte").to_string_lossy().into_owned();

        let resolved = resolve_bare_import(&NodeModulesResolver, "ui/Button.svelte", &importer).unwrap();
        assert_eq!(resolved, None);
    }

    #[test]
    fn test_packages_without_svelte_field_are_left_alone() {
        let temp = tempfile::tempdir().unwrap();
        write_package(temp.path(), "lodash", r#"{"name":"lodash","main":"lodash.js"}"#);
        write_package(temp.path(), "broken", "{ not json");
        let importer = temp.path().join("App.svelte").to_string_lossy().into_owned();

        assert_eq!(resolve_bare_import(&NodeModulesResolver, "lodash", &importer).unwrap(), None);
        assert_eq!(resolve_bare_import(&NodeModulesResolver, "lodash/fp", &importer).unwrap(), None);
        assert_eq!(resolve_bare_import(&NodeModulesResolver, "broken", &importer).unwrap(), None);
        assert_eq!(resolve_bare_import(&NodeModulesResolver, "missing", &importer).unwrap(), None);
    }

    #[test]
    fn test_lookup_walks_up_from_importer() {
        let temp = tempfile::tempdir().unwrap();
        let dir = write_package(temp.path(), "ui-kit", r#"{"svelte":"index.svelte"}"#);
        let importer = temp.path().join("src").join("routes").join("deep").join("Page.svelte");

        let resolved = resolve_bare_import(&NodeModulesResolver, "ui-kit", &importer.to_string_lossy()).unwrap();
        assert_eq!(resolved, Some(dir.join("index.svelte")));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize_path(Path::new("a/../../b")), PathBuf::from("../b"));
    }
}
