use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::context::RunContext;
use crate::error::{Error, IoResultExt, Result};
use crate::ops::diff::{diff, BuildDiff};
use crate::ops::instructions::write_instructions;
use crate::ops::pack::{pack, DroppedFile};
use crate::ops::retention::{builds_to_remove, list_builds, new_build_id, remove_builds};
use crate::ops::write::{write, WriteOptions, TOC_FILE_NAME};
use crate::scan::{resolve, walk, MaskSet, WalkRules};
use crate::types::{GroupMap, Toc};

/// name of the diff report inside a build directory
pub const DIFF_FILE_NAME: &str = "DIFF.txt";

/// outcome of one build
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub build_id: String,
    pub build_dir: PathBuf,
    pub files_packed: usize,
    pub containers: Vec<String>,
    pub bytes: u64,
    pub dropped: Vec<DroppedFile>,
    /// None for an initial build
    pub diff: Option<BuildDiff>,
    pub removed_builds: Vec<String>,
}

/// run the whole pipeline: resolve, walk, pack, write, diff, retain
pub fn build(settings: &Settings, ctx: &RunContext) -> Result<BuildSummary> {
    build_with_id(settings, &new_build_id(), ctx)
}

/// `build` with a caller-chosen build id
///
/// settings errors surface before anything is written. a build directory
/// whose pipeline fails is removed again so it never counts as a build.
pub fn build_with_id(settings: &Settings, build_id: &str, ctx: &RunContext) -> Result<BuildSummary> {
    let rules = WalkRules::new(
        MaskSet::compile(&settings.allow_masks)?,
        MaskSet::compile(&settings.deny_masks)?,
        settings.use_gitignore,
    );

    let dest_root = &settings.dest_root;
    fs::create_dir_all(dest_root).with_path(dest_root)?;

    let build_dir = dest_root.join(build_id);
    fs::create_dir(&build_dir).with_path(&build_dir)?;
    ctx.note(true, format!("build {} -> {}", build_id, build_dir.display()));
    ctx.trace(settings.summary());

    match run_pipeline(settings, &rules, build_id, &build_dir, ctx) {
        Ok(summary) => Ok(summary),
        Err(e) => {
            if let Err(cleanup) = fs::remove_dir_all(&build_dir) {
                ctx.fail(
                    false,
                    format!(
                        "cannot remove incomplete build {}: {}",
                        build_dir.display(),
                        cleanup
                    ),
                );
            }
            Err(e)
        }
    }
}

fn run_pipeline(
    settings: &Settings,
    rules: &WalkRules,
    build_id: &str,
    build_dir: &Path,
    ctx: &RunContext,
) -> Result<BuildSummary> {
    let dest_root = &settings.dest_root;

    let (keys, _) = resolve(
        &settings.group_paths,
        &settings.group_roots,
        &settings.project_root,
        ctx,
    );
    let mut groups = GroupMap::new(keys);
    walk(&settings.project_root, rules, &mut groups, ctx)?;

    let (chunks, pack_report) = pack(
        groups.into_groups(),
        settings.max_file_size,
        settings.max_container_size,
        ctx,
    );

    let opts = WriteOptions {
        auto_redact: settings.auto_redact,
        stub_extension: settings.stub_extension.clone(),
        secrets: settings.secrets.clone(),
    };
    let (toc, write_report) = write(&chunks, build_dir, build_id, &opts, ctx)?;
    let containers: Vec<String> = toc.groups.iter().map(|g| g.container.clone()).collect();

    ctx.note(
        true,
        format!(
            "packed {} file(s) into {} container(s), {} bytes",
            write_report.files, write_report.containers, write_report.bytes
        ),
    );

    let builds = list_builds(dest_root)?;
    let diff = diff_against_previous(dest_root, &builds, build_id, &toc, build_dir, ctx)?;

    write_instructions(
        build_dir,
        &settings.title,
        &settings.description,
        build_id,
        &containers,
    )?;

    let stale = builds_to_remove(&builds, settings.builds_to_keep);
    let removed_builds = remove_builds(dest_root, &stale, ctx);

    Ok(BuildSummary {
        build_id: build_id.to_string(),
        build_dir: build_dir.to_path_buf(),
        files_packed: write_report.files,
        containers,
        bytes: write_report.bytes,
        dropped: pack_report.dropped,
        diff,
        removed_builds,
    })
}

/// diff the current toc against the newest earlier build, if there is one
fn diff_against_previous(
    dest_root: &Path,
    builds: &[String],
    build_id: &str,
    toc: &Toc,
    build_dir: &Path,
    ctx: &RunContext,
) -> Result<Option<BuildDiff>> {
    // directories left by an interrupted run have no toc
    let previous = builds.iter().rev().find(|b| {
        b.as_str() < build_id && dest_root.join(b.as_str()).join(TOC_FILE_NAME).is_file()
    });

    let previous = match previous {
        Some(p) if builds.len() >= 2 => p,
        _ => {
            ctx.note(true, "initial build, nothing to compare");
            return Ok(None);
        }
    };

    let old = match load_toc(dest_root, previous) {
        Ok(t) => t,
        Err(e) => {
            ctx.fail(true, format!("cannot load previous build {}: {}", previous, e));
            return Ok(None);
        }
    };

    let result = diff(&old, toc);
    let path = build_dir.join(DIFF_FILE_NAME);
    fs::write(&path, result.render()).with_path(&path)?;

    ctx.note(true, format!("changes since {}:", previous));
    for line in result.lines() {
        ctx.note(true, format!("  {}", line));
    }
    Ok(Some(result))
}

/// read and parse the toc of a stored build
pub fn load_toc(dest_root: &Path, build_id: &str) -> Result<Toc> {
    let path = dest_root.join(build_id).join(TOC_FILE_NAME);
    if !path.is_file() {
        return Err(Error::BuildNotFound(build_id.to_string()));
    }
    let text = fs::read_to_string(&path).with_path(&path)?;
    Toc::parse(&text)
}

/// compare two stored builds by id
pub fn diff_builds(dest_root: &Path, old: &str, new: &str) -> Result<BuildDiff> {
    let old = load_toc(dest_root, old)?;
    let new = load_toc(dest_root, new)?;
    Ok(diff(&old, &new))
}
