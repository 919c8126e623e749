//! shell-glob mask matching with gitignore translation
//!
//! masks follow `glob::Pattern` syntax. `*` and `?` also match the path
//! separator, so an unanchored mask like `*.log` matches a bare name and a
//! full path alike. every name is checked twice:
//!
//! - against the bare name (`debug.log`)
//! - against the project-relative path prefixed with `/` (`/src/debug.log`)
//!
//! so a mask starting with `/` is anchored at the project root while a
//! bare mask matches at any depth.

use std::fs;
use std::path::Path;

use glob::{MatchOptions, Pattern};

use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::types::join_rel;

/// name of the per-directory ignore file
pub const GITIGNORE: &str = ".gitignore";

/// case policy follows the host: case-insensitive on windows
const OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: !cfg!(windows),
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// true if `candidate` shell-glob matches `mask`; invalid masks never match
pub fn mask_matches(candidate: &str, mask: &str) -> bool {
    Pattern::new(mask)
        .map(|p| p.matches_with(candidate, OPTIONS))
        .unwrap_or(false)
}

/// true if any mask matches `candidate`
pub fn matches(candidate: &str, masks: &[String]) -> bool {
    masks.iter().any(|m| mask_matches(candidate, m))
}

/// a compiled list of masks
#[derive(Clone, Debug, Default)]
pub struct MaskSet {
    masks: Vec<(String, Pattern)>,
}

impl MaskSet {
    /// compile masks, failing on the first invalid one
    pub fn compile(masks: &[String]) -> Result<Self> {
        let mut set = Self::default();
        for mask in masks {
            let pattern = Pattern::new(mask).map_err(|e| Error::InvalidMask {
                mask: mask.clone(),
                message: e.to_string(),
            })?;
            set.masks.push((mask.clone(), pattern));
        }
        Ok(set)
    }

    /// compile masks, logging and dropping invalid ones
    pub fn compile_lenient(masks: &[String], ctx: &RunContext) -> Self {
        let mut set = Self::default();
        for mask in masks {
            match Pattern::new(mask) {
                Ok(pattern) => set.masks.push((mask.clone(), pattern)),
                Err(e) => ctx.fail(false, format!("skipping invalid mask {:?}: {}", mask, e)),
            }
        }
        set
    }

    /// a new set holding this set's masks followed by `more`
    pub fn with(&self, more: MaskSet) -> MaskSet {
        let mut masks = self.masks.clone();
        masks.extend(more.masks);
        MaskSet { masks }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.masks
            .iter()
            .any(|(_, p)| p.matches_with(candidate, OPTIONS))
    }

    /// basename or rooted-path match for an entry at `rel_path`
    pub fn hits(&self, name: &str, rel_path: &str) -> bool {
        self.matches(name) || self.matches(&format!("/{}", rel_path))
    }

    pub fn masks(&self) -> impl Iterator<Item = &str> {
        self.masks.iter().map(|(m, _)| m.as_str())
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }
}

/// translate gitignore text found in the directory `dir_path` into masks
///
/// returns the masks plus the lines that could not be expressed.
/// negations are unsupported. a leading `/` anchors the line to
/// `dir_path`; anything else stays a bare, match-anywhere mask.
pub fn gitignore_masks(content: &str, dir_path: &str) -> (Vec<String>, Vec<String>) {
    let mut masks = Vec::new();
    let mut unsupported = Vec::new();

    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('!') {
            unsupported.push(line.to_string());
            continue;
        }

        // directory-only marker and leading "**/" add nothing under these semantics
        let mut line = line.trim_end_matches('/');
        while let Some(rest) = line.strip_prefix("**/") {
            line = rest;
        }
        if line.is_empty() {
            continue;
        }

        match line.strip_prefix('/') {
            Some(rest) => {
                let rest = rest.trim_start_matches('/');
                if rest.is_empty() {
                    continue;
                }
                let base = Pattern::escape(dir_path);
                masks.push(format!("/{}", join_rel(&base, rest)));
            }
            None => masks.push(line.to_string()),
        }
    }

    (masks, unsupported)
}

/// read and translate the `.gitignore` of `dir`, if any
pub fn read_gitignore(dir: &Path, dir_path: &str, ctx: &RunContext) -> MaskSet {
    let path = dir.join(GITIGNORE);
    if !path.is_file() {
        return MaskSet::default();
    }

    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) => {
            ctx.fail(false, format!("cannot read {}: {}", path.display(), e));
            return MaskSet::default();
        }
    };

    let (masks, unsupported) = gitignore_masks(&content, dir_path);
    for line in unsupported {
        ctx.trace(format!("{}: unsupported gitignore line {:?}", path.display(), line));
    }
    ctx.trace(format!(
        "{}: {} mask(s) [{}]",
        path.display(),
        masks.len(),
        masks.join(";")
    ));
    MaskSet::compile_lenient(&masks, ctx)
}
