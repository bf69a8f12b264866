/*
 * filter.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Include/exclude matching of module ids.

use std::path::Path;

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};

use crate::error::ConfigError;

/// Decides which module ids the plugin transforms.
///
/// Relative patterns are anchored at a base directory (the working
/// directory by default). Excludes win over includes, and with no includes
/// every id not excluded matches. Ids containing a NUL byte belong to other
/// plugins and never match.
#[derive(Debug, Clone)]
pub struct ModuleFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl ModuleFilter {
    pub fn new(include: &[String], exclude: &[String], base: &Path) -> Result<Self, ConfigError> {
        Ok(Self {
            include: build_set("include", include, base)?,
            exclude: build_set("exclude", exclude, base)?,
        })
    }

    /// Filter that matches every regular id
    pub fn any() -> Self {
        Self {
            include: None,
            exclude: None,
        }
    }

    pub fn matches(&self, id: &str) -> bool {
        if id.contains('\0') {
            return false;
        }
        let id = id.replace('\\', "/");

        if self.exclude.as_ref().is_some_and(|set| set.is_match(&id)) {
            return false;
        }
        match &self.include {
            Some(set) => set.is_match(&id),
            None => true,
        }
    }
}

fn build_set(field: &'static str, patterns: &[String], base: &Path) -> Result<Option<GlobSet>, ConfigError> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(compile_glob(field, pattern, base)?);
    }
    builder
        .build()
        .map(Some)
        .map_err(|source| ConfigError::InvalidPattern {
            field,
            pattern: patterns.join(", "),
            source,
        })
}

fn compile_glob(field: &'static str, pattern: &str, base: &Path) -> Result<Glob, ConfigError> {
    GlobBuilder::new(&anchor_pattern(pattern, base))
        .literal_separator(true)
        .build()
        .map_err(|source| ConfigError::InvalidPattern {
            field,
            pattern: pattern.to_string(),
            source,
        })
}

/// Anchor a relative pattern at `base`. Absolute patterns and patterns
/// starting with a wildcard are left alone.
fn anchor_pattern(pattern: &str, base: &Path) -> String {
    if pattern.starts_with('*') || Path::new(pattern).is_absolute() {
        return pattern.to_string();
    }
    let base = base.to_string_lossy().replace('\\', "/");
    let relative = pattern.strip_prefix("./").unwrap_or(pattern);
    format!("{}/{}", base.trim_end_matches('/'), relative)
}

/// Extension of the last path segment of `id`, with its dot.
///
/// Returns an empty string when there is none (including for dotfiles).
pub fn extname(id: &str) -> &str {
    let name = id.rsplit(['/', '\\']).next().unwrap_or(id);
    match name.rfind('.') {
        Some(0) | None => "",
        Some(dot) => &name[dot..],
    }
}
