use std::fs;
use std::path::Path;

use chrono::{Local, NaiveDateTime};
use walkdir::WalkDir;

use crate::context::RunContext;
use crate::error::{IoResultExt, Result};

/// build ids are local timestamps with millisecond precision, which sort
/// lexicographically in time order
pub const BUILD_ID_FORMAT: &str = "%Y%m%d-%H%M%S-%3f";

/// id for a build started now
pub fn new_build_id() -> String {
    Local::now().format(BUILD_ID_FORMAT).to_string()
}

/// true for names shaped like `YYYYMMDD-HHMMSS-mmm` with a valid date
pub fn is_build_id(name: &str) -> bool {
    let parts: Vec<&str> = name.split('-').collect();
    if parts.len() != 3
        || parts[0].len() != 8
        || parts[1].len() != 6
        || parts[2].len() != 3
        || !parts.iter().all(|p| p.bytes().all(|b| b.is_ascii_digit()))
    {
        return false;
    }
    NaiveDateTime::parse_from_str(&format!("{}-{}", parts[0], parts[1]), "%Y%m%d-%H%M%S").is_ok()
}

/// build ids found under `dest_root`, oldest first
pub fn list_builds(dest_root: &Path) -> Result<Vec<String>> {
    if !dest_root.is_dir() {
        return Ok(vec![]);
    }

    let mut builds = Vec::new();
    for entry in WalkDir::new(dest_root).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| crate::Error::Io {
            path: dest_root.to_path_buf(),
            source: e.into_io_error().unwrap_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::Other, "walkdir error")
            }),
        })?;

        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if is_build_id(&name) {
            builds.push(name.into_owned());
        }
    }

    builds.sort();
    Ok(builds)
}

/// oldest builds beyond the newest `keep` (0 keeps everything)
pub fn builds_to_remove(builds: &[String], keep: usize) -> Vec<String> {
    if keep == 0 || builds.len() <= keep {
        return vec![];
    }
    builds[..builds.len() - keep].to_vec()
}

/// delete build directories, logging failures; returns the ids removed
pub fn remove_builds(dest_root: &Path, ids: &[String], ctx: &RunContext) -> Vec<String> {
    let mut removed = Vec::new();
    for id in ids {
        if !is_build_id(id) {
            ctx.fail(false, format!("refusing to remove non-build directory {}", id));
            continue;
        }
        let path = dest_root.join(id);
        match fs::remove_dir_all(&path).with_path(&path) {
            Ok(()) => {
                ctx.note(false, format!("removed old build {}", id));
                removed.push(id.clone());
            }
            Err(e) => ctx.fail(true, format!("cannot remove old build: {}", e)),
        }
    }
    removed
}
