//! Writing the combined stylesheet to disk.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! A [`CssWriter`] is what the user's `css` callback receives at the end of
//! the build. It holds the combined stylesheet and its merged map, and knows
//! how to write both next to each other.

use std::cell::Cell;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use svelte_source_map::SourceMapDocument;

use crate::combined::CombinedCss;
use crate::error::CssError;

/// Advisory emitted when the writer is used as a plain string.
pub const DEPRECATION_MESSAGE: &str = "[DEPRECATION] The argument to the `css` callback is a \
    CssWriter, not a string. Use `css.write(file)` to emit the stylesheet, or `css.code()` to \
    read it.";

/// Handle to the combined stylesheet.
///
/// Formatting the writer with `Display` is the legacy way of getting at the
/// stylesheet text. It still works, but emits [`DEPRECATION_MESSAGE`] through
/// the warning callback the first time it happens.
pub struct CssWriter {
    code: String,
    map: SourceMapDocument,
    warn: Box<dyn Fn(&str)>,
    warned: Cell<bool>,
}

impl CssWriter {
    /// Create a writer for a combined stylesheet.
    ///
    /// `warn` receives advisory messages (it is usually the bundler's warning
    /// channel).
    pub fn new(combined: CombinedCss, warn: impl Fn(&str) + 'static) -> Self {
        let map = combined.to_source_map(None);
        Self {
            code: combined.code,
            map,
            warn: Box::new(warn),
            warned: Cell::new(false),
        }
    }

    /// The combined stylesheet text
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The merged source map (with no `file` set)
    pub fn map(&self) -> &SourceMapDocument {
        &self.map
    }

    /// Write the stylesheet to `dest`.
    ///
    /// Parent directories are created as needed. With `with_map`, the
    /// stylesheet ends with a `sourceMappingURL` comment and the map is
    /// written to `<dest>.map`, with `sources` made relative to the directory
    /// of `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory or file cannot be written, or the map
    /// cannot be serialized.
    pub fn write(&self, dest: impl AsRef<Path>, with_map: bool) -> Result<(), CssError> {
        let dest = std::path::absolute(dest.as_ref())?;
        let dir = dest.parent().map(Path::to_path_buf).unwrap_or_default();
        fs::create_dir_all(&dir)?;

        if !with_map {
            fs::write(&dest, &self.code)?;
            tracing::debug!(dest = %dest.display(), "Wrote combined stylesheet");
            return Ok(());
        }

        let basename = dest
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        fs::write(
            &dest,
            format!("{}\n/*# sourceMappingURL={}.map */", self.code, basename),
        )?;

        let map = SourceMapDocument {
            file: Some(basename),
            sources: self
                .map
                .sources
                .iter()
                .map(|source| relative_source(source, &dir))
                .collect(),
            names: Vec::new(),
            ..self.map.clone()
        };
        let map_path = map_path_for(&dest);
        fs::write(&map_path, map.to_json_pretty()?)?;

        tracing::debug!(
            dest = %dest.display(),
            map = %map_path.display(),
            "Wrote combined stylesheet with source map"
        );
        Ok(())
    }
}

impl fmt::Display for CssWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.warned.replace(true) {
            (self.warn)(DEPRECATION_MESSAGE);
        }
        f.write_str(&self.code)
    }
}

impl fmt::Debug for CssWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CssWriter")
            .field("code", &self.code)
            .field("map", &self.map)
            .finish_non_exhaustive()
    }
}

fn map_path_for(dest: &Path) -> PathBuf {
    let mut path = dest.as_os_str().to_owned();
    path.push(".map");
    PathBuf::from(path)
}

fn relative_source(source: &str, dir: &Path) -> String {
    let absolute = match std::path::absolute(source) {
        Ok(path) => path,
        Err(_) => return source.to_string(),
    };
    pathdiff::diff_paths(&absolute, dir).map_or_else(
        || source.to_string(),
        |path| path.to_string_lossy().into_owned(),
    )
}
